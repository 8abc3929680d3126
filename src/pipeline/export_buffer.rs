use crate::ack::{AckMessage, MAX_ACK_SEQNO};
use crate::coordinator::{Epoch, PartitionId, StreamId};
use crate::pipeline::provider::TrackerProvider;
use crate::tracker::{SeqNo, SeqRange, SequenceNumberTracker, MIN_SEQNO};
use std::sync::Mutex;

/// What became of a received ack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AckOutcome {
    Applied { released: u64 },
    /// From an older epoch. Nothing changed.
    Stale { ack_epoch: Epoch, current: Epoch },
    /// Meant for another partition or stream. Nothing changed.
    Mismatch,
}

/// ExportBuffer is the in-memory side of one replica's export stream: which sequence numbers it
/// holds, how far it has released, and in which epoch.
///
/// Durable storage and the push loop to the sink are not here. The coordinator only sees the
/// buffer through `TrackerProvider`.
pub struct ExportBuffer {
    logger: slog::Logger,
    partition_id: PartitionId,
    stream_id: StreamId,
    state: Mutex<BufferState>,
}

struct BufferState {
    tracker: SequenceNumberTracker,
    last_release: SeqNo,
    epoch: Epoch,
}

impl ExportBuffer {
    pub fn new(logger: slog::Logger, partition_id: PartitionId, stream_id: StreamId, epoch: Epoch) -> Self {
        Self::recovered(logger, partition_id, stream_id, epoch, Vec::new())
    }

    /// Rebuilds the buffer from ranges found in durable storage, in any order.
    pub fn recovered<I: IntoIterator<Item = SeqRange>>(
        logger: slog::Logger,
        partition_id: PartitionId,
        stream_id: StreamId,
        epoch: Epoch,
        ranges: I,
    ) -> Self {
        ExportBuffer {
            logger,
            partition_id,
            stream_id,
            state: Mutex::new(BufferState {
                tracker: SequenceNumberTracker::from_ranges(ranges),
                last_release: MIN_SEQNO,
                epoch,
            }),
        }
    }

    /// Records newly durable rows. Panics on out of order input, see `SequenceNumberTracker::append`.
    pub fn append(&self, start: SeqNo, end: SeqNo) {
        self.with_state(|state| state.tracker.append(start, end))
    }

    /// Merges rows obtained out of order, e.g. from a peer. Returns how many were new.
    pub fn add_range(&self, start: SeqNo, end: SeqNo) -> u64 {
        self.with_state(|state| state.tracker.add_range(start, end))
    }

    /// Rolls back everything after `seq`. Returns how many sequence numbers were dropped.
    pub fn truncate_after(&self, seq: SeqNo) -> u64 {
        self.with_state(|state| state.tracker.truncate_after(seq))
    }

    /// Marks everything through `seq` exported, and returns the ack telling peers to drop it too.
    /// Points past what an ack can carry are clamped to the last one it can.
    pub fn release(&self, seq: SeqNo) -> AckMessage {
        let seq = seq.min(MAX_ACK_SEQNO - 1);
        let epoch = self.with_state(|state| {
            Self::release_through(state, seq);
            state.epoch
        });

        AckMessage::release(self.partition_id, self.stream_id.clone(), seq.saturating_add(1), epoch)
    }

    /// Drops everything before the ack's `seq_no`, unless the ack is stale or not ours.
    pub fn apply_ack(&self, ack: &AckMessage) -> AckOutcome {
        if ack.partition_id != self.partition_id || ack.stream_id != self.stream_id {
            slog::warn!(
                self.logger,
                "Ignoring ack for partition {:?} stream {:?}",
                ack.partition_id,
                ack.stream_id
            );
            return AckOutcome::Mismatch;
        }

        self.with_state(|state| {
            if ack.epoch < state.epoch {
                slog::info!(
                    self.logger,
                    "Ignoring stale ack through {} from epoch {:?}, we are at {:?}",
                    ack.seq_no,
                    ack.epoch,
                    state.epoch
                );
                return AckOutcome::Stale {
                    ack_epoch: ack.epoch,
                    current: state.epoch,
                };
            }

            let released = match ack.seq_no.checked_sub(1) {
                Some(through) => Self::release_through(state, through),
                None => 0,
            };
            AckOutcome::Applied { released }
        })
    }

    /// Epochs only move forward. Going back is ignored.
    pub fn set_epoch(&self, epoch: Epoch) {
        self.with_state(|state| {
            if epoch < state.epoch {
                slog::warn!(self.logger, "Not moving epoch back from {:?} to {:?}", state.epoch, epoch);
            } else {
                state.epoch = epoch;
            }
        })
    }

    /// Number of sequence numbers held and not yet released.
    pub fn buffered_size(&self) -> u64 {
        self.with_state(|state| state.tracker.size_in_sequence())
    }

    fn release_through(state: &mut BufferState, seq: SeqNo) -> u64 {
        state.last_release = state.last_release.max(seq);
        state.tracker.truncate_before(seq.saturating_add(1))
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut BufferState) -> T) -> T {
        let mut state = self.state.lock().expect("ExportBuffer mutex guard poison");
        f(&mut state)
    }
}

impl TrackerProvider for ExportBuffer {
    fn tracker(&self) -> SequenceNumberTracker {
        self.with_state(|state| state.tracker.duplicate())
    }

    fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    fn stream_id(&self) -> StreamId {
        self.stream_id.clone()
    }

    fn last_release_seq_no(&self) -> SeqNo {
        self.with_state(|state| state.last_release)
    }

    fn epoch(&self) -> Epoch {
        self.with_state(|state| state.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::INFINITE_SEQNO;

    fn buffer(epoch: u64) -> ExportBuffer {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        ExportBuffer::recovered(
            logger,
            PartitionId::new(1),
            StreamId::new("orders"),
            Epoch::new(epoch),
            vec![SeqRange::new(200, 300), SeqRange::new(1, 100)],
        )
    }

    #[test]
    fn release_truncates_and_acks_next_point() {
        let buffer = buffer(2);
        let ack = buffer.release(50);

        assert_eq!(ack.seq_no, 51);
        assert_eq!(ack.epoch, Epoch::new(2));
        assert_eq!(buffer.last_release_seq_no(), 50);
        assert_eq!(buffer.buffered_size(), 50 + 101);
        assert_eq!(buffer.tracker().first_seq_no(), 51);
    }

    #[test]
    fn release_past_ack_range_is_clamped() {
        let buffer = buffer(1);
        let ack = buffer.release(INFINITE_SEQNO);

        assert_eq!(ack.seq_no, MAX_ACK_SEQNO);
        assert_eq!(AckMessage::decode(ack.encode()), Ok(ack));
        assert!(buffer.tracker().is_empty());
        assert_eq!(buffer.last_release_seq_no(), MAX_ACK_SEQNO - 1);
    }

    #[test]
    fn ack_from_same_or_newer_epoch_is_applied() {
        let peer = buffer(2);
        let ack = AckMessage::release(PartitionId::new(1), StreamId::new("orders"), 151, Epoch::new(2));

        assert_eq!(peer.apply_ack(&ack), AckOutcome::Applied { released: 100 });
        assert_eq!(peer.last_release_seq_no(), 150);
        assert_eq!(peer.tracker().first_gap(), Some(SeqRange::new(301, INFINITE_SEQNO)));

        let newer = AckMessage::release(PartitionId::new(1), StreamId::new("orders"), 251, Epoch::new(3));
        assert_eq!(peer.apply_ack(&newer), AckOutcome::Applied { released: 51 });
    }

    #[test]
    fn stale_ack_changes_nothing() {
        let peer = buffer(5);
        let before = (peer.tracker(), peer.buffered_size(), peer.last_release_seq_no());

        let stale = AckMessage::release(PartitionId::new(1), StreamId::new("orders"), 251, Epoch::new(4));
        assert_eq!(
            peer.apply_ack(&stale),
            AckOutcome::Stale {
                ack_epoch: Epoch::new(4),
                current: Epoch::new(5)
            }
        );

        assert_eq!((peer.tracker(), peer.buffered_size(), peer.last_release_seq_no()), before);
    }

    #[test]
    fn ack_for_other_stream_changes_nothing() {
        let peer = buffer(1);
        let other = AckMessage::release(PartitionId::new(1), StreamId::new("returns"), 251, Epoch::new(1));
        assert_eq!(peer.apply_ack(&other), AckOutcome::Mismatch);
        assert_eq!(peer.buffered_size(), 201);
    }

    #[test]
    fn epoch_only_moves_forward() {
        let buffer = buffer(3);
        buffer.set_epoch(Epoch::new(2));
        assert_eq!(buffer.epoch(), Epoch::new(3));
        buffer.set_epoch(Epoch::new(4));
        assert_eq!(buffer.epoch(), Epoch::new(4));
    }

    #[test]
    fn rollback_and_out_of_order_merge() {
        let buffer = buffer(1);
        assert_eq!(buffer.truncate_after(250), 50);
        assert_eq!(buffer.add_range(90, 210), 99);
        buffer.append(300, 310);
        assert_eq!(buffer.tracker().ranges(), &[SeqRange::new(1, 250), SeqRange::new(300, 310)]);
    }
}
