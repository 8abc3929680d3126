//! Per-replica bookkeeping of which sequence numbers of an export stream are buffered locally.
mod seq_range;
mod sequence_number_tracker;

pub use seq_range::SeqNo;
pub use seq_range::SeqRange;
pub use seq_range::INFINITE_SEQNO;
pub use seq_range::MIN_SEQNO;
pub use sequence_number_tracker::SequenceNumberTracker;
