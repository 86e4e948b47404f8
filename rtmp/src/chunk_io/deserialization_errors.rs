use super::ChunkHeaderFormat;
use std::io;
use thiserror::Error;

/// An enumeration defining all the possible errors that could occur while deserializing
/// RTMP chunks.  Chunk framing cannot be recovered once any of them occur.
#[derive(Debug, Error)]
pub enum ChunkDeserializationError {
    /// The RTMP chunk format requires that RTMP chunks that are not type 0 utilize information
    /// from the previously received chunk on that same chunk stream id.  This error occurs when a
    /// non-0 chunk is received on a stream that has not received a type 0 chunk yet.
    #[error(
        "Received chunk with non-zero chunk type on csid {csid} prior to receiving a type 0 chunk"
    )]
    NoPreviousChunkOnStream { csid: u32 },

    /// A chunk that starts a new message arrived while the chunk stream was still in the middle
    /// of reassembling another message
    #[error("Received a {format:?} chunk on csid {csid} while a message was partially received")]
    UnexpectedChunkFormat {
        csid: u32,
        format: ChunkHeaderFormat,
    },

    /// The max chunk size must be between 1 and 2,147,483,647 (it's encoded in only 31 bits of
    /// the SetChunkSize message)
    #[error("Requested an invalid max chunk size of {chunk_size}.  Chunk sizes must be between 1 and 2147483647")]
    InvalidMaxChunkSize { chunk_size: usize },

    /// An I/O error occurred while reading the input buffer
    #[error("{0}")]
    Io(#[from] io::Error),
}
