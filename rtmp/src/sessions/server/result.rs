use crate::messages::MessagePayload;
use bytes::Bytes;
use ingest_amf0::Amf0Document;

/// A single result that is returned when a server session processes some bytes
#[derive(PartialEq, Debug)]
pub enum SessionResult {
    /// Bytes that must be sent to the peer.  Responses must be sent in the order they were
    /// returned.
    OutboundResponse(Bytes),

    /// The handshake finished and every following byte is part of the chunk stream
    HandshakeCompleted,

    /// A reassembled message whose contents are not AMF0 encoded (or that were not decoded)
    MessageReceived(MessagePayload),

    /// An AMF0 command or data message along with its decoded values
    Amf0MessageReceived {
        payload: MessagePayload,
        values: Amf0Document,
    },
}
