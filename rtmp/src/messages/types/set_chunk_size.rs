use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

use crate::messages::{MessageDeserializationError, RtmpMessage};

// The first bit of the chunk size is reserved and must be zero
const SIZE_MASK: u32 = 0x7fff_ffff;

pub fn deserialize(data: &[u8]) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data);
    let size = cursor.read_u32::<BigEndian>()? & SIZE_MASK;

    Ok(RtmpMessage::SetChunkSize { size })
}
