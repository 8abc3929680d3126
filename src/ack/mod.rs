//! Release acks between replicas of a partition.
mod message;
mod transport;

pub use message::AckDecodeError;
pub use message::AckMessage;
pub(crate) use message::MAX_ACK_SEQNO;
pub use transport::AckInbox;
pub use transport::AckTransport;
pub use transport::AckTransportError;
pub use transport::InMemoryAckNetwork;
