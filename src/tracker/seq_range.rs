use std::fmt;

/// SeqNo is the position of a committed row in a partition's export stream.
pub type SeqNo = u64;

/// Sits below every real sequence number. Real sequence numbers start at 1.
pub const MIN_SEQNO: SeqNo = 0;

/// Sits above every real sequence number; used as "no upper bound known yet".
pub const INFINITE_SEQNO: SeqNo = u64::MAX;

/// SeqRange is a closed range `[start, end]` of sequence numbers. It describes both covered runs
/// of a tracker and the gaps between them.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct SeqRange {
    pub start: SeqNo,
    pub end: SeqNo,
}

impl SeqRange {
    pub fn new(start: SeqNo, end: SeqNo) -> Self {
        assert!(start <= end, "Illegal range: start {} is after end {}", start, end);
        SeqRange { start, end }
    }

    /// Number of sequence numbers in the range. `[MIN_SEQNO, INFINITE_SEQNO]` saturates.
    pub fn len(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    pub fn contains(&self, seq: SeqNo) -> bool {
        self.start <= seq && seq <= self.end
    }

    /// Number of sequence numbers both ranges contain.
    pub fn overlap(&self, other: &SeqRange) -> u64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            SeqRange { start, end }.len()
        } else {
            0
        }
    }
}

impl fmt::Debug for SeqRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (start, INFINITE_SEQNO) => write!(f, "[{}, inf]", start),
            (start, end) => write!(f, "[{}, {}]", start, end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_and_overlap() {
        assert_eq!(SeqRange::new(1, 1).len(), 1);
        assert_eq!(SeqRange::new(1, 100).len(), 100);
        assert_eq!(SeqRange::new(MIN_SEQNO, INFINITE_SEQNO).len(), u64::MAX);

        let a = SeqRange::new(10, 20);
        assert_eq!(a.overlap(&SeqRange::new(15, 30)), 6);
        assert_eq!(a.overlap(&SeqRange::new(21, 30)), 0);
        assert_eq!(a.overlap(&SeqRange::new(1, 100)), 11);
    }

    #[test]
    #[should_panic]
    fn inverted_range_panics() {
        SeqRange::new(5, 4);
    }
}
