use crate::chunk_io::ChunkDeserializationError;
use crate::handshake::HandshakeError;
use crate::messages::MessageDeserializationError;
use thiserror::Error;

/// Errors a server session can encounter.  The connection cannot continue after any of them.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Encountered when the peer did not follow the handshake protocol
    #[error("The handshake with the peer failed: {0}")]
    HandshakeError(#[from] HandshakeError),

    /// Encountered when an error occurs while deserializing the incoming byte data
    #[error("An error occurred deserializing incoming data: {0}")]
    ChunkDeserializationError(#[from] ChunkDeserializationError),

    /// Encountered when an error occurs while turning a message payload into an RTMP message
    #[error("An error occurred while attempting to turn a message payload into an RTMP message: {0}")]
    MessageDeserializationError(#[from] MessageDeserializationError),
}
