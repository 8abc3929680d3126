use crate::tracker::{SeqRange, SequenceNumberTracker};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// MemberSnapshot is what one replica publishes about itself through the membership exchange.
///
/// Byte representation (big endian):
///
/// ```text
/// | 0 | 1 | 2 ... 9 | 10 ... 13 | 14 ... 21 | 22 ... 29 | ... |
/// +---+---+---------+-----------+-----------+-----------+-...-+
/// |Vrs|Flg|  Floor  |   Count   |  Start 0  |   End 0   | ... |
/// +---+---+---------+-----------+-----------+-----------+-...-+
/// ```
///
/// * `Vrs` - version of the serialized payload
/// * `Flg` - bit 0 set if the member declared itself partition leader
/// * `Floor` - the tracker's truncation point
/// * `Count` - number of ranges that follow, each as inclusive `Start` and `End`
#[derive(Clone, Debug, PartialEq)]
pub struct MemberSnapshot {
    pub is_partition_leader: bool,
    pub tracker: SequenceNumberTracker,
}

const MEMBER_SNAPSHOT_FORMAT_VERSION: u8 = 1;
const FLAG_PARTITION_LEADER: u8 = 0b0000_0001;
const HEADER_LEN: usize = 1 + 1 + 8 + 4;
const RANGE_LEN: usize = 8 + 8;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SnapshotDecodeError {
    #[error("snapshot is {0} bytes, too short for a header")]
    Truncated(usize),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),
    #[error("snapshot claims {count} ranges but has {remaining} bytes left")]
    BadRangeCount { count: u32, remaining: usize },
    #[error("range {index} is not a valid range: [{start}, {end}]")]
    InvalidRange { index: u32, start: u64, end: u64 },
}

impl MemberSnapshot {
    pub fn encode(&self) -> Bytes {
        let ranges = self.tracker.ranges();
        let mut buf = BytesMut::with_capacity(HEADER_LEN + ranges.len() * RANGE_LEN);

        buf.put_u8(MEMBER_SNAPSHOT_FORMAT_VERSION);
        buf.put_u8(if self.is_partition_leader { FLAG_PARTITION_LEADER } else { 0 });
        buf.put_u64(self.tracker.truncation_point());
        buf.put_u32(ranges.len() as u32);
        for range in ranges {
            buf.put_u64(range.start);
            buf.put_u64(range.end);
        }

        buf.freeze()
    }

    pub fn decode(mut bytes: Bytes) -> Result<Self, SnapshotDecodeError> {
        if bytes.len() < HEADER_LEN {
            return Err(SnapshotDecodeError::Truncated(bytes.len()));
        }

        let version = bytes.get_u8();
        if version != MEMBER_SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotDecodeError::UnsupportedVersion(version));
        }
        let flags = bytes.get_u8();
        let truncation_point = bytes.get_u64();
        let count = bytes.get_u32();
        if bytes.remaining() != count as usize * RANGE_LEN {
            return Err(SnapshotDecodeError::BadRangeCount {
                count,
                remaining: bytes.remaining(),
            });
        }

        let mut ranges = Vec::with_capacity(count as usize);
        for index in 0..count {
            let (start, end) = (bytes.get_u64(), bytes.get_u64());
            if start > end {
                return Err(SnapshotDecodeError::InvalidRange { index, start, end });
            }
            ranges.push(SeqRange::new(start, end));
        }

        Ok(MemberSnapshot {
            is_partition_leader: flags & FLAG_PARTITION_LEADER != 0,
            tracker: SequenceNumberTracker::from_parts(truncation_point, ranges),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> MemberSnapshot {
        let mut tracker = SequenceNumberTracker::from_ranges(vec![SeqRange::new(1, 100), SeqRange::new(200, 300)]);
        tracker.truncate_before(20);
        MemberSnapshot {
            is_partition_leader: true,
            tracker,
        }
    }

    #[test]
    fn decodes_what_it_encodes() {
        let original = snapshot();
        let bytes = original.encode();
        assert_eq!(bytes.len(), HEADER_LEN + 2 * RANGE_LEN);
        assert_eq!(bytes[0], MEMBER_SNAPSHOT_FORMAT_VERSION);
        assert_eq!(bytes[1], FLAG_PARTITION_LEADER);

        let decoded = MemberSnapshot::decode(bytes).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.tracker.truncation_point(), 20);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            MemberSnapshot::decode(Bytes::from_static(&[1, 0, 0])),
            Err(SnapshotDecodeError::Truncated(3))
        );

        let mut wrong_version = snapshot().encode().to_vec();
        wrong_version[0] = 9;
        assert_eq!(
            MemberSnapshot::decode(Bytes::from(wrong_version)),
            Err(SnapshotDecodeError::UnsupportedVersion(9))
        );

        let encoded = snapshot().encode();
        let cut_short = encoded.slice(..encoded.len() - 3);
        assert!(matches!(
            MemberSnapshot::decode(cut_short),
            Err(SnapshotDecodeError::BadRangeCount { count: 2, .. })
        ));

        let mut inverted = BytesMut::new();
        inverted.put_u8(MEMBER_SNAPSHOT_FORMAT_VERSION);
        inverted.put_u8(0);
        inverted.put_u64(0);
        inverted.put_u32(1);
        inverted.put_u64(50);
        inverted.put_u64(10);
        assert_eq!(
            MemberSnapshot::decode(inverted.freeze()),
            Err(SnapshotDecodeError::InvalidRange {
                index: 0,
                start: 50,
                end: 10
            })
        );
    }
}
