use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

use crate::messages::{MessageDeserializationError, RtmpMessage};

pub fn deserialize(data: &[u8]) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data);

    Ok(RtmpMessage::Abort {
        chunk_stream_id: cursor.read_u32::<BigEndian>()?,
    })
}
