/// The four RTMP chunk message header formats, identified by the top two bits of the
/// chunk's first byte.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ChunkHeaderFormat {
    Full,                            // Format 0
    TimeDeltaWithoutMessageStreamId, // Format 1
    TimeDeltaOnly,                   // Format 2
    Empty,                           // Format 3
}

impl ChunkHeaderFormat {
    pub fn from_fmt(fmt: u8) -> ChunkHeaderFormat {
        match fmt & 0b11 {
            0 => ChunkHeaderFormat::Full,
            1 => ChunkHeaderFormat::TimeDeltaWithoutMessageStreamId,
            2 => ChunkHeaderFormat::TimeDeltaOnly,
            _ => ChunkHeaderFormat::Empty,
        }
    }
}

/// The first one to three bytes of every chunk
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct BasicHeader {
    pub format: ChunkHeaderFormat,
    pub chunk_stream_id: u32,

    /// How many bytes the basic header took up
    pub size: usize,
}

impl BasicHeader {
    /// Reads the basic header at the front of the buffer.  `None` is returned when the buffer
    /// does not yet contain all of its bytes.
    pub fn parse(buffer: &[u8]) -> Option<BasicHeader> {
        const CSID_MASK: u8 = 0b0011_1111;

        let first_byte = *buffer.first()?;
        let format = ChunkHeaderFormat::from_fmt(first_byte >> 6);

        let (chunk_stream_id, size) = match first_byte & CSID_MASK {
            0 => {
                let next = *buffer.get(1)?;
                (next as u32 + 64, 2)
            }

            1 => {
                let low = *buffer.get(1)?;
                let high = *buffer.get(2)?;
                ((high as u32 * 256) + low as u32 + 64, 3)
            }

            x => (x as u32, 1),
        };

        Some(BasicHeader {
            format,
            chunk_stream_id,
            size,
        })
    }
}
