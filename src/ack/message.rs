use crate::coordinator::{Epoch, PartitionId, StreamId};
use crate::tracker::SeqNo;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::str;

/// AckMessage is sent point to point by the export master after it released a point, telling
/// peers they can drop everything before `seq_no`.
///
/// Byte representation (big endian):
///
/// ```text
/// | 0 | 1 ... 4 | 5 ... 8 | 9 ... 9+N-1 | 9+N ... 9+N+7 | 9+N+8 ... 9+N+15 |
/// +---+---------+---------+-------------+---------------+------------------+
/// |Typ|Partition|   Len   |  Stream ID  |    Seq No     |      Epoch       |
/// +---+---------+---------+-------------+---------------+------------------+
/// ```
///
/// * `Typ` - message type, only `RELEASE` (1) exists
/// * `Len` - number of UTF-8 bytes `N` in `Stream ID`
///
/// Sequence numbers and epochs are written as signed 64 bit integers and must fit in one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AckMessage {
    pub partition_id: PartitionId,
    pub stream_id: StreamId,
    pub seq_no: SeqNo,
    pub epoch: Epoch,
}

const ACK_TYPE_RELEASE: u8 = 1;

/// Largest `seq_no` the layout can carry.
pub(crate) const MAX_ACK_SEQNO: SeqNo = i64::MAX as SeqNo;
const FIXED_LEN: usize = 1 + 4 + 4 + 8 + 8;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AckDecodeError {
    #[error("ack needs {needed} bytes but has {available}")]
    Truncated { needed: usize, available: usize },
    #[error("unknown ack type {0}")]
    UnknownType(u8),
    #[error("negative {field}: {value}")]
    Negative { field: &'static str, value: i64 },
    #[error("stream ID is not UTF-8: {0}")]
    InvalidStreamId(#[from] str::Utf8Error),
    #[error("{0} trailing bytes after ack")]
    TrailingBytes(usize),
}

impl AckMessage {
    pub fn release(partition_id: PartitionId, stream_id: StreamId, seq_no: SeqNo, epoch: Epoch) -> Self {
        AckMessage {
            partition_id,
            stream_id,
            seq_no,
            epoch,
        }
    }

    pub fn encode(&self) -> Bytes {
        let stream_id = self.stream_id.as_str().as_bytes();
        let mut buf = BytesMut::with_capacity(FIXED_LEN + stream_id.len());

        buf.put_u8(ACK_TYPE_RELEASE);
        buf.put_i32(self.partition_id.as_i32());
        buf.put_i32(stream_id.len() as i32);
        buf.put_slice(stream_id);
        buf.put_i64(self.seq_no as i64);
        buf.put_i64(self.epoch.as_u64() as i64);

        buf.freeze()
    }

    pub fn decode(mut bytes: Bytes) -> Result<Self, AckDecodeError> {
        check_len(&bytes, FIXED_LEN)?;

        let ack_type = bytes.get_u8();
        if ack_type != ACK_TYPE_RELEASE {
            return Err(AckDecodeError::UnknownType(ack_type));
        }
        let partition_id = PartitionId::new(bytes.get_i32());
        let stream_id_len = bytes.get_i32();
        if stream_id_len < 0 {
            return Err(AckDecodeError::Negative {
                field: "stream ID length",
                value: stream_id_len as i64,
            });
        }
        check_len(&bytes, stream_id_len as usize + 16)?;
        let stream_id = bytes.split_to(stream_id_len as usize);
        let stream_id = StreamId::new(str::from_utf8(&stream_id)?);
        let seq_no = non_negative("seq no", bytes.get_i64())?;
        let epoch = non_negative("epoch", bytes.get_i64())?;
        if bytes.has_remaining() {
            return Err(AckDecodeError::TrailingBytes(bytes.remaining()));
        }

        Ok(AckMessage {
            partition_id,
            stream_id,
            seq_no,
            epoch: Epoch::new(epoch),
        })
    }
}

fn check_len(bytes: &Bytes, needed: usize) -> Result<(), AckDecodeError> {
    if bytes.remaining() < needed {
        return Err(AckDecodeError::Truncated {
            needed,
            available: bytes.remaining(),
        });
    }
    Ok(())
}

fn non_negative(field: &'static str, value: i64) -> Result<u64, AckDecodeError> {
    if value < 0 {
        return Err(AckDecodeError::Negative { field, value });
    }
    Ok(value as u64)
}
