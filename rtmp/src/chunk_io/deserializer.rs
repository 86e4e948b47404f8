use super::chunk_header::{BasicHeader, ChunkHeaderFormat};
use super::ChunkDeserializationError;
use crate::messages::MessagePayload;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use bytes::BytesMut;
use std::cmp::min;
use std::collections::HashMap;
use std::io::Cursor;
use std::mem;
use tracing::{debug, trace};

/// The max chunk size every RTMP connection starts out with
pub const INITIAL_MAX_CHUNK_SIZE: usize = 128;

/// The largest chunk size a `SetChunkSize` message can express
pub const MAX_CHUNK_SIZE: usize = 2147483647;

const MAX_INITIAL_TIMESTAMP: u32 = 16777215;

/// Allows deserializing bytes representing RTMP chunks into RTMP message payloads.
///
/// Due to the nature of the RTMP chunk protocol it is required that every byte going through the
/// wire is sent to the same `ChunkDeserializer` instance, as future chunks can rely on previous
/// chunks, so any chunks missing from the stream may cause deserialization errors.
///
/// Every chunk stream id keeps its own header fields and its own partially received message,
/// so messages whose chunks are interleaved across chunk streams are reassembled independently.
pub struct ChunkDeserializer {
    max_chunk_size: usize,
    current_stage: ParseStage,
    current_chunk: CurrentChunk,
    current_stream: ChunkStreamState,
    buffer: BytesMut,
    chunk_streams: HashMap<u32, ChunkStreamState>,
}

/// Everything a chunk stream remembers between chunks
#[derive(Default)]
struct ChunkStreamState {
    timestamp: u32,
    timestamp_delta: u32,
    has_extended_timestamp: bool,
    message_length: u32,
    message_type_id: u8,
    message_stream_id: u32,
    payload: BytesMut,
}

/// Details about the chunk currently being parsed
struct CurrentChunk {
    csid: u32,
    format: ChunkHeaderFormat,
    timestamp_field: u32,
    starts_message: bool,
}

#[derive(Eq, PartialEq, Debug)]
enum ParseStage {
    BasicHeader,
    Timestamp,
    MessageLength,
    MessageTypeId,
    MessageStreamId,
    ExtendedTimestamp,
    MessagePayload,
}

#[derive(Eq, PartialEq, Debug)]
enum ParseStageResult {
    Success,
    NotEnoughBytes,
}

impl ChunkDeserializer {
    /// Create a new `ChunkDeserializer` with its initial properties.
    ///
    /// Per the RTMP specification an initial `ChunkDeserializer` is expecting RTMP chunks with
    /// a max size of 128 bytes.
    pub fn new() -> ChunkDeserializer {
        ChunkDeserializer {
            max_chunk_size: INITIAL_MAX_CHUNK_SIZE,
            current_stage: ParseStage::BasicHeader,
            current_chunk: CurrentChunk {
                csid: 0,
                format: ChunkHeaderFormat::Full,
                timestamp_field: 0,
                starts_message: true,
            },
            current_stream: ChunkStreamState::default(),
            buffer: BytesMut::with_capacity(4096),
            chunk_streams: HashMap::new(),
        }
    }

    /// Attempts to read a complete RTMP message from the passed in bytes.
    ///
    /// It is normal that one set of bytes will not form a complete RTMP message (or even a
    /// complete RTMP chunk).  The deserializer stores all bytes passed into it, so the same
    /// bytes must never be passed in twice.  When no message could be completed `Ok(None)` is
    /// returned and parsing resumes where it left off on the next call.
    ///
    /// Only one message is returned per call.  This gives the caller a chance to react to a
    /// `SetChunkSize` message with `set_max_chunk_size()` before any further chunks are parsed.
    /// Callers are expected to keep calling `get_next_message()` with an empty slice until
    /// `None` is returned.
    ///
    /// ## Examples
    ///
    /// ```
    /// use ingest_rtmp::chunk_io::ChunkDeserializer;
    ///
    /// // A type 0 chunk on csid 3 holding a 2 byte message, followed by a type 3 chunk
    /// // starting a second message with the same header
    /// let bytes = [
    ///     0x03, 0x00, 0x00, 0x64, 0x00, 0x00, 0x02, 0x14, 0x01, 0x00, 0x00, 0x00, 0xaa, 0xbb,
    ///     0xc3, 0xcc, 0xdd,
    /// ];
    ///
    /// let mut deserializer = ChunkDeserializer::new();
    /// let first = deserializer.get_next_message(&bytes).unwrap().unwrap();
    /// let second = deserializer.get_next_message(&[]).unwrap().unwrap();
    /// let third = deserializer.get_next_message(&[]).unwrap();
    ///
    /// assert_eq!(first.timestamp, 100);
    /// assert_eq!(&first.data[..], &[0xaa, 0xbb]);
    /// assert_eq!(second.timestamp, 100);
    /// assert_eq!(second.type_id, 20);
    /// assert_eq!(&second.data[..], &[0xcc, 0xdd]);
    /// assert_eq!(third, None);
    /// ```
    pub fn get_next_message(
        &mut self,
        bytes: &[u8],
    ) -> Result<Option<MessagePayload>, ChunkDeserializationError> {
        self.buffer.extend_from_slice(bytes);

        loop {
            let mut complete_message = None;
            let result = match self.current_stage {
                ParseStage::BasicHeader => self.get_basic_header()?,
                ParseStage::Timestamp => self.get_timestamp()?,
                ParseStage::MessageLength => self.get_message_length()?,
                ParseStage::MessageTypeId => self.get_message_type_id()?,
                ParseStage::MessageStreamId => self.get_message_stream_id()?,
                ParseStage::ExtendedTimestamp => self.get_extended_timestamp()?,
                ParseStage::MessagePayload => self.get_message_data(&mut complete_message)?,
            };

            if result == ParseStageResult::NotEnoughBytes || complete_message.is_some() {
                return Ok(complete_message);
            }
        }
    }

    /// Tells the deserializer that the peer will start sending RTMP chunks with a different
    /// max chunk size.
    ///
    /// The sender and the receiver must agree on the max chunk size exactly, as it decides
    /// where one chunk ends and the next one begins.  This should only be called in reaction
    /// to receiving a `SetChunkSize` message from the peer.
    pub fn set_max_chunk_size(&mut self, new_size: usize) -> Result<(), ChunkDeserializationError> {
        if new_size == 0 || new_size > MAX_CHUNK_SIZE {
            return Err(ChunkDeserializationError::InvalidMaxChunkSize {
                chunk_size: new_size,
            });
        }

        debug!(
            old_size = self.max_chunk_size,
            new_size, "Changing inbound max chunk size"
        );

        self.max_chunk_size = new_size;
        Ok(())
    }

    /// Returns the maximum size of any RTMP chunks that should be received
    pub fn get_max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    /// Discards the partially received message on the specified chunk stream, as requested by
    /// an `Abort` message.  The chunk stream's cached header fields are kept.
    ///
    /// Returns `false` if the chunk stream had no partially received message.
    pub fn abort_message(&mut self, csid: u32) -> bool {
        match self.chunk_streams.get_mut(&csid) {
            Some(stream) if !stream.payload.is_empty() => {
                debug!(
                    csid,
                    discarded_bytes = stream.payload.len(),
                    "Aborting partially received message"
                );

                stream.payload.clear();
                true
            }

            _ => false,
        }
    }

    fn get_basic_header(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        let header = match BasicHeader::parse(&self.buffer[..]) {
            Some(header) => header,
            None => return Ok(ParseStageResult::NotEnoughBytes),
        };

        let csid = header.chunk_stream_id;
        let stream = match header.format {
            ChunkHeaderFormat::Full => {
                let mut stream = self.chunk_streams.remove(&csid).unwrap_or_default();
                if !stream.payload.is_empty() {
                    debug!(
                        csid,
                        discarded_bytes = stream.payload.len(),
                        "Type 0 chunk replaced a partially received message"
                    );

                    stream.payload.clear();
                }

                stream
            }

            format => {
                let stream = match self.chunk_streams.remove(&csid) {
                    Some(stream) => stream,
                    None => return Err(ChunkDeserializationError::NoPreviousChunkOnStream { csid }),
                };

                // Only a type 3 chunk may continue a partially received message
                if format != ChunkHeaderFormat::Empty && !stream.payload.is_empty() {
                    return Err(ChunkDeserializationError::UnexpectedChunkFormat { csid, format });
                }

                stream
            }
        };

        let _ = self.buffer.split_to(header.size);
        self.current_chunk = CurrentChunk {
            csid,
            format: header.format,
            timestamp_field: 0,
            starts_message: stream.payload.is_empty(),
        };

        self.current_stream = stream;
        self.current_stage = ParseStage::Timestamp;
        Ok(ParseStageResult::Success)
    }

    fn get_timestamp(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_chunk.format == ChunkHeaderFormat::Empty {
            self.current_stage = ParseStage::MessageLength;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.len() < 3 {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        let timestamp;
        {
            let bytes = self.buffer.split_to(3);
            let mut cursor = Cursor::new(bytes);
            timestamp = cursor.read_u24::<BigEndian>()?;
        }

        self.current_chunk.timestamp_field = timestamp;
        self.current_stream.has_extended_timestamp = timestamp == MAX_INITIAL_TIMESTAMP;
        self.current_stage = ParseStage::MessageLength;
        Ok(ParseStageResult::Success)
    }

    fn get_message_length(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_chunk.format == ChunkHeaderFormat::TimeDeltaOnly
            || self.current_chunk.format == ChunkHeaderFormat::Empty
        {
            self.current_stage = ParseStage::MessageTypeId;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.len() < 3 {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        let length;
        {
            let bytes = self.buffer.split_to(3);
            let mut cursor = Cursor::new(bytes);
            length = cursor.read_u24::<BigEndian>()?;
        }

        self.current_stream.message_length = length;
        self.current_stage = ParseStage::MessageTypeId;
        Ok(ParseStageResult::Success)
    }

    fn get_message_type_id(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_chunk.format == ChunkHeaderFormat::TimeDeltaOnly
            || self.current_chunk.format == ChunkHeaderFormat::Empty
        {
            self.current_stage = ParseStage::MessageStreamId;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.is_empty() {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        self.current_stream.message_type_id = self.buffer[0];
        let _ = self.buffer.split_to(1);
        self.current_stage = ParseStage::MessageStreamId;
        Ok(ParseStageResult::Success)
    }

    fn get_message_stream_id(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        if self.current_chunk.format != ChunkHeaderFormat::Full {
            self.current_stage = ParseStage::ExtendedTimestamp;
            return Ok(ParseStageResult::Success);
        }

        if self.buffer.len() < 4 {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        let stream_id;
        {
            let bytes = self.buffer.split_to(4);
            let mut cursor = Cursor::new(bytes);
            stream_id = cursor.read_u32::<LittleEndian>()?;
        }

        self.current_stream.message_stream_id = stream_id;
        self.current_stage = ParseStage::ExtendedTimestamp;
        Ok(ParseStageResult::Success)
    }

    fn get_extended_timestamp(&mut self) -> Result<ParseStageResult, ChunkDeserializationError> {
        let value = if self.current_stream.has_extended_timestamp {
            if self.buffer.len() < 4 {
                return Ok(ParseStageResult::NotEnoughBytes);
            }

            let bytes = self.buffer.split_to(4);
            let mut cursor = Cursor::new(bytes);
            cursor.read_u32::<BigEndian>()?
        } else {
            self.current_chunk.timestamp_field
        };

        let stream = &mut self.current_stream;
        match self.current_chunk.format {
            ChunkHeaderFormat::Full => {
                stream.timestamp = value;
                stream.timestamp_delta = 0;
            }

            ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId
            | ChunkHeaderFormat::TimeDeltaOnly => {
                stream.timestamp_delta = value;
                stream.timestamp = stream.timestamp.wrapping_add(value);
            }

            // A type 3 chunk's extended timestamp only repeats what the stream already knows.
            // Continuation chunks must not re-apply the delta.
            ChunkHeaderFormat::Empty => {
                if self.current_chunk.starts_message {
                    stream.timestamp = stream.timestamp.wrapping_add(stream.timestamp_delta);
                }
            }
        }

        self.current_stage = ParseStage::MessagePayload;
        Ok(ParseStageResult::Success)
    }

    fn get_message_data(
        &mut self,
        message_to_return: &mut Option<MessagePayload>,
    ) -> Result<ParseStageResult, ChunkDeserializationError> {
        let message_length = self.current_stream.message_length as usize;
        let remaining_bytes = message_length - self.current_stream.payload.len();
        let chunk_length = min(remaining_bytes, self.max_chunk_size);

        if self.buffer.len() < chunk_length {
            return Ok(ParseStageResult::NotEnoughBytes);
        }

        // Buffers grow by the bytes received, never by the declared message length
        let bytes = self.buffer.split_to(chunk_length);
        self.current_stream.payload.extend_from_slice(&bytes[..]);

        let csid = self.current_chunk.csid;
        let mut stream = mem::take(&mut self.current_stream);
        if stream.payload.len() == message_length {
            trace!(
                csid,
                timestamp = stream.timestamp,
                type_id = stream.message_type_id,
                length = message_length,
                "Message reassembled"
            );

            *message_to_return = Some(MessagePayload {
                chunk_stream_id: csid,
                timestamp: stream.timestamp,
                type_id: stream.message_type_id,
                message_stream_id: stream.message_stream_id,
                data: stream.payload.split().freeze(),
            });
        }

        // This completes the current chunk, so cycle the stream back into the map
        self.chunk_streams.insert(csid, stream);
        self.current_stage = ParseStage::BasicHeader;
        Ok(ParseStageResult::Success)
    }
}

impl Default for ChunkDeserializer {
    fn default() -> Self {
        ChunkDeserializer::new()
    }
}
