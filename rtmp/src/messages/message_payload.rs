use super::types;
use super::{type_ids, MessageDeserializationError, RtmpMessage};
use bytes::Bytes;
use ingest_amf0::Amf0DeserializerOptions;

/// Represents a raw RTMP message, as reassembled from one or more chunks
#[derive(PartialEq, Debug, Clone)]
pub struct MessagePayload {
    /// The chunk stream the message's chunks arrived on
    pub chunk_stream_id: u32,

    /// Absolute timestamp of the message in milliseconds.  Wraps around at 32 bits.
    pub timestamp: u32,
    pub type_id: u8,
    pub message_stream_id: u32,
    pub data: Bytes,
}

impl MessagePayload {
    /// True for AMF0 command and AMF0 data messages
    pub fn is_amf0(&self) -> bool {
        self.type_id == type_ids::AMF0_COMMAND || self.type_id == type_ids::AMF0_DATA
    }

    /// Interprets the payload based on its type id.  AMF0 payloads are decoded using the
    /// provided options.
    pub fn to_rtmp_message(
        &self,
        amf0_options: &Amf0DeserializerOptions,
    ) -> Result<RtmpMessage, MessageDeserializationError> {
        match self.type_id {
            type_ids::SET_CHUNK_SIZE => types::set_chunk_size::deserialize(&self.data[..]),
            type_ids::ABORT => types::abort::deserialize(&self.data[..]),
            type_ids::AMF0_DATA => types::amf0_data::deserialize(&self.data[..], amf0_options),
            type_ids::AMF0_COMMAND => {
                types::amf0_command::deserialize(&self.data[..], amf0_options)
            }

            _ => Ok(RtmpMessage::Other {
                type_id: self.type_id,
                data: self.data.clone(),
            }),
        }
    }
}
