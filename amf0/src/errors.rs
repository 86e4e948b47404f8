use std::{io, string};
use thiserror::Error;

/// An enumeration defining all the possible errors that could occur while deserializing
/// AMF0 values.
#[derive(Debug, Error)]
pub enum Amf0DeserializationError {
    /// A reserved marker (movie clip, record set or unsupported) was encountered while the
    /// deserializer was configured to fail on them
    #[error("Encountered reserved AMF0 marker 0x{marker:02x}")]
    UnsupportedMarker { marker: u8 },

    /// The marker does not belong to the AMF0 format at all
    #[error("Encountered unknown marker 0x{marker:02x}")]
    UnknownMarker { marker: u8 },

    /// The AVM+ marker switches the rest of the stream to AMF3, which this crate does not decode
    #[error("Encountered the AVM+ marker; the remaining data is AMF3 encoded")]
    Amf3NotSupported,

    /// A reference marker pointed past the end of the reference table
    #[error("Reference index {index} is out of range, only {table_size} complex values were decoded")]
    InvalidReference { index: u16, table_size: usize },

    /// More complex values were decoded than a 16 bit reference can address
    #[error("Reference table is full")]
    ReferenceTableFull,

    /// The object end marker showed up where a strict array element was expected
    #[error("Encountered an object end marker outside of an object")]
    UnexpectedObjectEnd,

    #[error("Unexpected empty object property name")]
    UnexpectedEmptyObjectPropertyName,

    #[error("Complex values were nested deeper than the allowed {max_depth} levels")]
    NestingTooDeep { max_depth: usize },

    /// A marker or length prefix promised more bytes than the buffer contained
    #[error("Hit end of the byte buffer but was expecting more data")]
    UnexpectedEof,

    #[error("String was not valid UTF-8: {0}")]
    InvalidUtf8(#[from] string::FromUtf8Error),

    #[error("{0}")]
    Io(io::Error),
}

impl From<io::Error> for Amf0DeserializationError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::UnexpectedEof => Amf0DeserializationError::UnexpectedEof,
            _ => Amf0DeserializationError::Io(error),
        }
    }
}
