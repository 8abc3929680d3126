//! Gap-aware export mastership: one coordinator per (partition, replica).
mod actor;
#[allow(clippy::module_inception)]
mod coordinator;
mod errors;
mod handle;
mod ids;
mod mastership_listener;
mod member_snapshot;
mod membership;
mod options;
mod retry;
mod wiring;

pub use coordinator::CoordinatorView;
pub use coordinator::Phase;
pub use errors::CoordinatorError;
pub use errors::QueryError;
pub use handle::ExportCoordinator;
pub use ids::Epoch;
pub use ids::PartitionId;
pub use ids::ReplicaId;
pub use ids::StreamId;
pub use mastership_listener::MastershipEvent;
pub use mastership_listener::MastershipListener;
pub use member_snapshot::MemberSnapshot;
pub use member_snapshot::SnapshotDecodeError;
pub use membership::Assignment;
pub use membership::ExportMaster;
pub use membership::MemberEntry;
pub use membership::MemberStatus;
pub use membership::MembershipSnapshot;
pub use membership::Ranking;
pub use options::CoordinatorOptions;
pub use wiring::try_create_export_coordinator;
pub use wiring::CoordinatorCreationError;
pub use wiring::ExportCoordinatorConfig;
