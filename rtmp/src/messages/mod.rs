/*!
This module contains the RTMP messages an ingest server needs to interpret, as well as the
functionality to deserialize them out of message payloads.

`MessagePayload`s have auxiliary data about an RTMP message, such as which chunk and message
stream it arrived on, the timestamp for the message and what type of message it is.  Only the
protocol control messages that affect chunk framing and the AMF0 encoded command and data
messages are interpreted; everything else is passed along untouched.
*/

mod deserialization_errors;
mod message_payload;
mod types;

pub use self::deserialization_errors::MessageDeserializationError;
pub use self::message_payload::MessagePayload;

use bytes::Bytes;
use ingest_amf0::Amf0Document;

/// Well known RTMP message type ids
pub mod type_ids {
    pub const SET_CHUNK_SIZE: u8 = 1;
    pub const ABORT: u8 = 2;
    pub const AMF0_DATA: u8 = 18;
    pub const AMF0_COMMAND: u8 = 20;
}

/// An enumeration of the RTMP messages that are interpreted
#[derive(PartialEq, Debug, Clone)]
pub enum RtmpMessage {
    /// Any message that is not interpreted, such as audio and video data
    Other { type_id: u8, data: Bytes },

    /// Notifies the peer that if it is waiting for chunks to complete a message on the
    /// specified chunk stream, it should discard the chunks it has already received.
    Abort { chunk_stream_id: u32 },

    /// Tells the peer that the maximum chunk size for RTMP chunks it will be sending is changing
    /// to the specified size.
    SetChunkSize { size: u32 },

    /// A command being sent, encoded with amf0 values.  The command name and transaction id are
    /// the first two values of the document.
    Amf0Command {
        command_name: String,
        transaction_id: f64,
        document: Amf0Document,
    },

    /// A message containing a list of data encoded as amf0 values
    Amf0Data { document: Amf0Document },
}

impl RtmpMessage {
    pub fn get_message_type_id(&self) -> u8 {
        match *self {
            RtmpMessage::Other { type_id, .. } => type_id,
            RtmpMessage::Abort { .. } => type_ids::ABORT,
            RtmpMessage::SetChunkSize { .. } => type_ids::SET_CHUNK_SIZE,
            RtmpMessage::Amf0Command { .. } => type_ids::AMF0_COMMAND,
            RtmpMessage::Amf0Data { .. } => type_ids::AMF0_DATA,
        }
    }
}
