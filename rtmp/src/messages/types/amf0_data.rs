use std::io::Cursor;

use ingest_amf0::Amf0DeserializerOptions;

use crate::messages::{MessageDeserializationError, RtmpMessage};

pub fn deserialize(
    data: &[u8],
    options: &Amf0DeserializerOptions,
) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data);
    let document = ingest_amf0::deserialize_with(&mut cursor, options.clone())?;

    Ok(RtmpMessage::Amf0Data { document })
}
