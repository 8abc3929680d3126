mod ack;
mod coordinator;
mod exchange;
mod logging;
mod pipeline;
mod tracker;

pub use ack::AckDecodeError;
pub use ack::AckInbox;
pub use ack::AckMessage;
pub use ack::AckTransport;
pub use ack::AckTransportError;
pub use ack::InMemoryAckNetwork;
pub use coordinator::try_create_export_coordinator;
pub use coordinator::Assignment;
pub use coordinator::CoordinatorCreationError;
pub use coordinator::CoordinatorError;
pub use coordinator::CoordinatorOptions;
pub use coordinator::CoordinatorView;
pub use coordinator::Epoch;
pub use coordinator::ExportCoordinator;
pub use coordinator::ExportCoordinatorConfig;
pub use coordinator::ExportMaster;
pub use coordinator::MastershipEvent;
pub use coordinator::MastershipListener;
pub use coordinator::MemberEntry;
pub use coordinator::MemberSnapshot;
pub use coordinator::MemberStatus;
pub use coordinator::MembershipSnapshot;
pub use coordinator::PartitionId;
pub use coordinator::Phase;
pub use coordinator::QueryError;
pub use coordinator::Ranking;
pub use coordinator::ReplicaId;
pub use coordinator::SnapshotDecodeError;
pub use coordinator::StreamId;
pub use exchange::ExchangeError;
pub use exchange::InMemoryExchange;
pub use exchange::MembershipExchange;
pub use exchange::MembershipUpdates;
pub use exchange::MembershipView;
pub use logging::create_root_logger_for_file;
pub use logging::create_root_logger_for_stdout;
pub use pipeline::send_to_peers;
pub use pipeline::spawn_ack_listener;
pub use pipeline::AckOutcome;
pub use pipeline::ExportBuffer;
pub use pipeline::TrackerProvider;
pub use tracker::SeqNo;
pub use tracker::SeqRange;
pub use tracker::SequenceNumberTracker;
pub use tracker::INFINITE_SEQNO;
pub use tracker::MIN_SEQNO;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. No `mod` is `pub`;
// everything public is exported through an individual `pub use`.
