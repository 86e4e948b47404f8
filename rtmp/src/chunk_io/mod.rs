//! Reassembles RTMP messages out of the chunk stream sent by a peer

mod chunk_header;
mod deserialization_errors;
mod deserializer;

pub use self::chunk_header::{BasicHeader, ChunkHeaderFormat};
pub use self::deserialization_errors::ChunkDeserializationError;
pub use self::deserializer::{ChunkDeserializer, INITIAL_MAX_CHUNK_SIZE, MAX_CHUNK_SIZE};
