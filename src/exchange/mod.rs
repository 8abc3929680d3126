//! The membership exchange: how replicas of a partition publish and observe tracker snapshots.
mod api;
mod in_memory;

pub use api::ExchangeError;
pub use api::MembershipExchange;
pub use api::MembershipUpdates;
pub use api::MembershipView;
pub use in_memory::InMemoryExchange;
