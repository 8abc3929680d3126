use crate::ack::{AckInbox, AckMessage, AckTransport};
use crate::coordinator::{ExportCoordinator, ReplicaId};
use crate::pipeline::export_buffer::{AckOutcome, ExportBuffer};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Applies acks arriving in `inbox` to `buffer`, and lets the coordinator know whenever one
/// released something. Stops when the inbox closes or the coordinator shuts down.
pub fn spawn_ack_listener(
    logger: slog::Logger,
    buffer: Arc<ExportBuffer>,
    mut inbox: AckInbox,
    coordinator: ExportCoordinator,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(bytes) = inbox.recv().await {
            let ack = match AckMessage::decode(bytes) {
                Ok(ack) => ack,
                Err(e) => {
                    slog::warn!(logger, "Dropping undecodable ack: {}", e);
                    continue;
                }
            };

            if let AckOutcome::Applied { released } = buffer.apply_ack(&ack) {
                slog::debug!(logger, "Ack through {} released {} sequence numbers", ack.seq_no, released);
                if coordinator.tracker_changed().await.is_err() {
                    break;
                }
            }
        }
        slog::debug!(logger, "Ack listener exited.");
    })
}

/// Sends `ack` to every peer. Peers that can't be reached are logged and skipped; they catch up
/// with the next ack.
pub async fn send_to_peers<T: AckTransport + ?Sized>(
    logger: &slog::Logger,
    transport: &T,
    local_id: &ReplicaId,
    peers: &[ReplicaId],
    ack: &AckMessage,
) {
    let bytes = ack.encode();
    for peer in peers.iter().filter(|p| *p != local_id) {
        if let Err(e) = transport.send(peer, bytes.clone()).await {
            slog::warn!(logger, "Failed to send ack through {} to {}: {}", ack.seq_no, peer, e);
        }
    }
}
