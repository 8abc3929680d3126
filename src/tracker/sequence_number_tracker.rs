use crate::tracker::seq_range::{SeqNo, SeqRange, INFINITE_SEQNO, MIN_SEQNO};
use std::fmt;

/// SequenceNumberTracker records which sequence numbers one replica has durably captured for one
/// export stream, as ascending, disjoint, non-adjacent closed ranges. Touching ranges are always
/// merged.
///
/// The tracker also remembers its truncation point: the highest point ever passed to
/// `truncate_before()`. Everything below it has been released for good, so it is never tracked
/// again and a leading gap starts there.
///
/// It is owned by a single replica's data pipeline. Hand out copies via `duplicate()`.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct SequenceNumberTracker {
    ranges: Vec<SeqRange>,
    truncation_point: SeqNo,
}

impl SequenceNumberTracker {
    pub fn new() -> Self {
        SequenceNumberTracker {
            ranges: Vec::new(),
            truncation_point: MIN_SEQNO,
        }
    }

    /// Builds a tracker from ranges in any order, possibly overlapping. Used when re-initializing
    /// from recovered durable state.
    pub fn from_ranges<I: IntoIterator<Item = SeqRange>>(ranges: I) -> Self {
        let mut tracker = Self::new();
        for range in ranges {
            tracker.add_range(range.start, range.end);
        }
        tracker
    }

    pub(crate) fn from_parts<I: IntoIterator<Item = SeqRange>>(truncation_point: SeqNo, ranges: I) -> Self {
        let mut tracker = Self::from_ranges(ranges);
        tracker.truncate_before(truncation_point);
        tracker
    }

    /// Independent deep copy, safe to hand to the membership exchange.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Appends `[start, end]` past everything tracked so far.
    ///
    /// Panics if `start > end`, or if `start` is not strictly greater than `last_seq_no()`. Callers
    /// must serialize their own appends; out of order input means the buffer is producing ranges
    /// incorrectly.
    pub fn append(&mut self, start: SeqNo, end: SeqNo) {
        assert!(start <= end, "Illegal append: start {} is after end {}", start, end);

        match self.ranges.last_mut() {
            Some(last) => {
                assert!(
                    start > last.end,
                    "Illegal append: [{}, {}] is not after last tracked seq-no {}",
                    start,
                    end,
                    last.end
                );
                if start == last.end + 1 {
                    last.end = end;
                    return;
                }
            }
            None => {
                assert!(
                    start >= self.truncation_point,
                    "Illegal append: [{}, {}] is before truncation point {}",
                    start,
                    end,
                    self.truncation_point
                );
            }
        }

        self.ranges.push(SeqRange::new(start, end));
    }

    /// Adds `[start, end]` anywhere in the tracker, merging with whatever it overlaps or touches.
    ///
    /// Returns how many sequence numbers were not covered before. Anything below the truncation
    /// point is ignored.
    pub fn add_range(&mut self, start: SeqNo, end: SeqNo) -> u64 {
        assert!(start <= end, "Illegal range: start {} is after end {}", start, end);
        if end < self.truncation_point {
            return 0;
        }
        let new = SeqRange::new(start.max(self.truncation_point), end);

        // [lo, hi) are the ranges overlapping or touching the new one.
        let lo = self.ranges.partition_point(|r| r.end.saturating_add(1) < new.start);
        let hi = lo + self.ranges[lo..].partition_point(|r| r.start <= new.end.saturating_add(1));

        let already_covered: u64 = self.ranges[lo..hi].iter().map(|r| r.overlap(&new)).sum();
        let merged = if lo < hi {
            SeqRange::new(new.start.min(self.ranges[lo].start), new.end.max(self.ranges[hi - 1].end))
        } else {
            new
        };
        self.ranges.splice(lo..hi, std::iter::once(merged));

        new.len() - already_covered
    }

    /// Discards everything strictly before `seq`. The range containing `seq` is clipped to start at
    /// `seq`. Returns how many sequence numbers were removed.
    pub fn truncate_before(&mut self, seq: SeqNo) -> u64 {
        if seq <= self.truncation_point {
            return 0;
        }
        self.truncation_point = seq;

        let fully_before = self.ranges.partition_point(|r| r.end < seq);
        let mut removed: u64 = self.ranges.drain(..fully_before).map(|r| r.len()).sum();

        if let Some(first) = self.ranges.first_mut() {
            if first.start < seq {
                removed += seq - first.start;
                first.start = seq;
            }
        }

        removed
    }

    /// Discards everything strictly after `seq`. Returns how many sequence numbers were removed.
    pub fn truncate_after(&mut self, seq: SeqNo) -> u64 {
        let keep = self.ranges.partition_point(|r| r.start <= seq);
        let mut removed: u64 = self.ranges.drain(keep..).map(|r| r.len()).sum();

        if let Some(last) = self.ranges.last_mut() {
            if last.end > seq {
                removed += last.end - seq;
                last.end = seq;
            }
        }

        removed
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// First tracked sequence number, or `INFINITE_SEQNO` if nothing is tracked.
    pub fn first_seq_no(&self) -> SeqNo {
        self.ranges.first().map(|r| r.start).unwrap_or(INFINITE_SEQNO)
    }

    /// Last tracked sequence number. An empty tracker reports the point right below its truncation
    /// point, which is `MIN_SEQNO` unless it has been truncated.
    pub fn last_seq_no(&self) -> SeqNo {
        self.ranges
            .last()
            .map(|r| r.end)
            .unwrap_or_else(|| self.truncation_point.saturating_sub(1))
    }

    pub fn truncation_point(&self) -> SeqNo {
        self.truncation_point
    }

    /// End of the first range: the highest sequence number reachable without crossing a gap.
    /// `MIN_SEQNO` when empty.
    pub fn safe_point(&self) -> SeqNo {
        self.ranges.first().map(|r| r.end).unwrap_or(MIN_SEQNO)
    }

    /// The gap right after the first contiguous run. An empty tracker is one big gap starting at
    /// its truncation point.
    pub fn first_gap(&self) -> Option<SeqRange> {
        if self.ranges.is_empty() {
            return Some(SeqRange::new(self.truncation_point, INFINITE_SEQNO));
        }
        self.gap_following(0)
    }

    /// The first gap at or after `seq`. If `seq` falls inside a gap, that whole gap is returned no
    /// matter where in it `seq` is. A gap with no known data after it ends at `INFINITE_SEQNO`.
    ///
    /// Returns `None` if nothing past `seq` can be missing, which is always the case at
    /// `INFINITE_SEQNO`.
    pub fn first_gap_after(&self, seq: SeqNo) -> Option<SeqRange> {
        if seq >= INFINITE_SEQNO {
            return None;
        }
        let seq = seq.max(self.truncation_point);

        let idx = self.ranges.partition_point(|r| r.end < seq);
        match self.ranges.get(idx) {
            None => {
                // `seq` is past every range, so `last.end + 1 <= seq` can't overflow.
                let start = self
                    .ranges
                    .last()
                    .map(|r| r.end + 1)
                    .unwrap_or(self.truncation_point);
                Some(SeqRange::new(start, INFINITE_SEQNO))
            }
            Some(r) if r.start <= seq => self.gap_following(idx),
            Some(r) => {
                let start = match idx {
                    0 => self.truncation_point,
                    _ => self.ranges[idx - 1].end + 1,
                };
                Some(SeqRange::new(start, r.start - 1))
            }
        }
    }

    fn gap_following(&self, idx: usize) -> Option<SeqRange> {
        let range = self.ranges[idx];
        if range.end == INFINITE_SEQNO {
            return None;
        }
        let end = self
            .ranges
            .get(idx + 1)
            .map(|next| next.start - 1)
            .unwrap_or(INFINITE_SEQNO);
        Some(SeqRange::new(range.end + 1, end))
    }

    pub fn contains(&self, seq: SeqNo) -> bool {
        self.range_containing(seq).is_some()
    }

    /// The tracked range `seq` falls in, if any.
    pub fn range_containing(&self, seq: SeqNo) -> Option<SeqRange> {
        let idx = self.ranges.partition_point(|r| r.end < seq);
        self.ranges.get(idx).filter(|r| r.start <= seq).copied()
    }

    /// Number of disjoint ranges.
    pub fn size(&self) -> usize {
        self.ranges.len()
    }

    /// Number of sequence numbers covered.
    pub fn size_in_sequence(&self) -> u64 {
        self.ranges.iter().map(|r| r.len()).sum()
    }

    pub fn ranges(&self) -> &[SeqRange] {
        &self.ranges
    }

    /// Number of sequence numbers covered by both trackers.
    pub fn intersection_size_in_sequences(&self, other: &SequenceNumberTracker) -> u64 {
        let (mut i, mut j) = (0, 0);
        let mut total = 0;
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a, b) = (&self.ranges[i], &other.ranges[j]);
            total += a.overlap(b);
            if a.end < b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        total
    }
}

impl fmt::Debug for SequenceNumberTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.truncation_point > MIN_SEQNO {
            write!(f, "(truncated before {}) ", self.truncation_point)?;
        }
        f.debug_list().entries(self.ranges.iter()).finish()
    }
}
