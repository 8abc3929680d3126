use crate::coordinator::{Epoch, PartitionId, StreamId};
use crate::tracker::{SeqNo, SequenceNumberTracker};

/// TrackerProvider is what the coordinator needs from the data pipeline that owns it.
pub trait TrackerProvider: Send + Sync + 'static {
    /// A copy of the pipeline's current tracker.
    fn tracker(&self) -> SequenceNumberTracker;

    fn partition_id(&self) -> PartitionId;

    fn stream_id(&self) -> StreamId;

    /// Highest sequence number released so far, `MIN_SEQNO` if none.
    fn last_release_seq_no(&self) -> SeqNo;

    fn epoch(&self) -> Epoch;
}
