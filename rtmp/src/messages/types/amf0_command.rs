use std::io::Cursor;

use ingest_amf0::{Amf0DeserializerOptions, Amf0Value};

use crate::messages::{MessageDeserializationError, RtmpMessage};

/// Commands always lead with the command name and a transaction id.  The remaining values
/// (command object and arguments) are left in the document.
pub fn deserialize(
    data: &[u8],
    options: &Amf0DeserializerOptions,
) -> Result<RtmpMessage, MessageDeserializationError> {
    let mut cursor = Cursor::new(data);
    let document = ingest_amf0::deserialize_with(&mut cursor, options.clone())?;

    let command_name = match document.values.get(0) {
        Some(Amf0Value::Utf8String(value)) => value.clone(),
        _ => return Err(MessageDeserializationError::InvalidMessageFormat),
    };

    let transaction_id = match document.values.get(1).and_then(Amf0Value::as_number) {
        Some(value) => value,
        None => return Err(MessageDeserializationError::InvalidMessageFormat),
    };

    Ok(RtmpMessage::Amf0Command {
        command_name,
        transaction_id,
        document,
    })
}
