use super::HandshakePhase;
use std::io;
use thiserror::Error;

/// An enumeration defining all the possible errors that could occur while performing
/// the RTMP handshake.  Every one of them means the connection should be closed.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The block handed to the handshake was not the size the current phase requires
    #[error("Received a {received} byte block during the {phase:?} phase, but {expected} bytes were required")]
    InvalidBlockSize {
        phase: HandshakePhase,
        expected: usize,
        received: usize,
    },

    /// The peer's acknowledgement was not an exact copy of the packet 1 we sent it
    #[error("Peer's acknowledgement did not match the packet 1 sent to it")]
    AcknowledgementMismatch,

    /// Bytes were passed to a handshake that has already finished
    #[error("Handshake has already been completed")]
    HandshakeAlreadyCompleted,

    #[error("{0}")]
    Io(#[from] io::Error),
}
