//! The export data pipeline as far as the coordinator is concerned.
mod ack_listener;
mod export_buffer;
mod provider;

pub use ack_listener::send_to_peers;
pub use ack_listener::spawn_ack_listener;
pub use export_buffer::AckOutcome;
pub use export_buffer::ExportBuffer;
pub use provider::TrackerProvider;
