//! This module contains functionality to deserialize values from bytes
//! that were encoded via the AMF0 specification
//! (http://wwwimages.adobe.com/content/dam/Adobe/en/devnet/amf/pdf/amf0-file-format-specification.pdf)

use crate::errors::Amf0DeserializationError;
use crate::markers;
use crate::reference_table::{ComplexId, ReferenceTable};
use crate::{
    Amf0Complex, Amf0DeserializerOptions, Amf0Document, Amf0Properties, Amf0Value,
    UnsupportedMarkerPolicy,
};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Read;

/// Reads every AMF0 value out of the readable byte stream.
///
/// Reserved markers cause an error.  Use `deserialize_with()` to change that.
pub fn deserialize<R: Read>(bytes: &mut R) -> Result<Amf0Document, Amf0DeserializationError> {
    deserialize_with(bytes, Amf0DeserializerOptions::new())
}

/// Reads every AMF0 value out of the readable byte stream using the specified options
pub fn deserialize_with<R: Read>(
    bytes: &mut R,
    options: Amf0DeserializerOptions,
) -> Result<Amf0Document, Amf0DeserializationError> {
    let mut deserializer = Amf0Deserializer::with_options(bytes, options);
    let mut values = Vec::new();
    while let Some(value) = deserializer.next_value()? {
        values.push(value);
    }

    Ok(Amf0Document {
        values,
        references: deserializer.into_references(),
    })
}

/// Lazily decodes top level AMF0 values from a byte stream.
///
/// The reference table is owned by the deserializer, so references can only point at
/// complex values decoded by this same instance.  Decoding a new buffer requires a new
/// deserializer.
///
/// Once an error has been returned the iterator is fused and yields nothing further, as the
/// position in the stream can no longer be trusted.
pub struct Amf0Deserializer<R> {
    bytes: R,
    options: Amf0DeserializerOptions,
    references: ReferenceTable,
    depth: usize,
    failed: bool,
}

impl<R: Read> Amf0Deserializer<R> {
    pub fn new(bytes: R) -> Amf0Deserializer<R> {
        Amf0Deserializer::with_options(bytes, Amf0DeserializerOptions::new())
    }

    pub fn with_options(bytes: R, options: Amf0DeserializerOptions) -> Amf0Deserializer<R> {
        Amf0Deserializer {
            bytes,
            options,
            references: ReferenceTable::new(),
            depth: 0,
            failed: false,
        }
    }

    /// All complex values decoded so far
    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    pub fn into_references(self) -> ReferenceTable {
        self.references
    }

    /// Reads the next top level value, returning `Ok(None)` when the stream is exhausted
    pub fn next_value(&mut self) -> Result<Option<Amf0Value>, Amf0DeserializationError> {
        loop {
            let marker = match self.read_marker()? {
                Some(marker) => marker,
                None => return Ok(None),
            };

            // A stray object end sentinel (usually trailing an object) carries no data
            if marker == markers::OBJECT_END_MARKER {
                continue;
            }

            if let Some(value) = self.read_value(marker)? {
                return Ok(Some(value));
            }
        }
    }

    fn read_marker(&mut self) -> Result<Option<u8>, Amf0DeserializationError> {
        let mut buffer: [u8; 1] = [0];
        let bytes_read = self.bytes.read(&mut buffer)?;

        if bytes_read == 0 {
            return Ok(None);
        }

        Ok(Some(buffer[0]))
    }

    /// Decodes the value that follows an already consumed marker.  `None` is only returned
    /// for reserved markers that are being skipped.
    fn read_value(&mut self, marker: u8) -> Result<Option<Amf0Value>, Amf0DeserializationError> {
        let value = match marker {
            markers::NUMBER_MARKER => Amf0Value::Number(self.bytes.read_f64::<BigEndian>()?),
            markers::BOOLEAN_MARKER => Amf0Value::Boolean(self.bytes.read_u8()? != 0),
            markers::STRING_MARKER => Amf0Value::Utf8String(self.read_short_string()?),
            markers::NULL_MARKER => Amf0Value::Null,
            markers::UNDEFINED_MARKER => Amf0Value::Undefined,
            markers::REFERENCE_MARKER => self.parse_reference()?,
            markers::OBJECT_MARKER => self.parse_object()?,
            markers::ECMA_ARRAY_MARKER => self.parse_ecma_array()?,
            markers::STRICT_ARRAY_MARKER => self.parse_strict_array()?,
            markers::TYPED_OBJECT_MARKER => self.parse_typed_object()?,
            markers::DATE_MARKER => self.parse_date()?,
            markers::LONG_STRING_MARKER => Amf0Value::LongUtf8String(self.read_long_string()?),
            markers::XML_DOCUMENT_MARKER => Amf0Value::XmlDocument(self.read_long_string()?),

            markers::MOVIECLIP_MARKER | markers::UNSUPPORTED_MARKER | markers::RECORDSET_MARKER => {
                return match self.options.unsupported_markers {
                    UnsupportedMarkerPolicy::Skip => Ok(None),
                    UnsupportedMarkerPolicy::Fail => {
                        Err(Amf0DeserializationError::UnsupportedMarker { marker })
                    }
                };
            }

            markers::AVMPLUS_OBJECT_MARKER => {
                return Err(Amf0DeserializationError::Amf3NotSupported)
            }

            _ => return Err(Amf0DeserializationError::UnknownMarker { marker }),
        };

        Ok(Some(value))
    }

    fn parse_date(&mut self) -> Result<Amf0Value, Amf0DeserializationError> {
        let unix_time_ms = self.bytes.read_f64::<BigEndian>()?;
        let time_zone = self.bytes.read_i16::<BigEndian>()?;

        Ok(Amf0Value::Date {
            unix_time_ms,
            time_zone,
        })
    }

    fn parse_reference(&mut self) -> Result<Amf0Value, Amf0DeserializationError> {
        let index = self.bytes.read_u16::<BigEndian>()?;
        let id = ComplexId(index);
        if !self.references.contains(id) {
            return Err(Amf0DeserializationError::InvalidReference {
                index,
                table_size: self.references.len(),
            });
        }

        Ok(Amf0Value::Reference(id))
    }

    fn parse_object(&mut self) -> Result<Amf0Value, Amf0DeserializationError> {
        let id = self.open_complex(Amf0Complex::Object(Vec::new()))?;
        let properties = self.parse_properties()?;
        self.close_complex(id, Amf0Complex::Object(properties));

        Ok(Amf0Value::Complex(id))
    }

    fn parse_ecma_array(&mut self) -> Result<Amf0Value, Amf0DeserializationError> {
        // The count is not reliable in real world usage, and the array still ends with the
        // same 0x000009 sequence objects do, so it is read like an object
        let _associative_count = self.bytes.read_u32::<BigEndian>()?;

        let id = self.open_complex(Amf0Complex::EcmaArray(Vec::new()))?;
        let properties = self.parse_properties()?;
        self.close_complex(id, Amf0Complex::EcmaArray(properties));

        Ok(Amf0Value::Complex(id))
    }

    fn parse_typed_object(&mut self) -> Result<Amf0Value, Amf0DeserializationError> {
        let class_name = self.read_short_string()?;
        let id = self.open_complex(Amf0Complex::TypedObject {
            class_name: class_name.clone(),
            properties: Vec::new(),
        })?;

        let properties = self.parse_properties()?;
        self.close_complex(
            id,
            Amf0Complex::TypedObject {
                class_name,
                properties,
            },
        );

        Ok(Amf0Value::Complex(id))
    }

    fn parse_strict_array(&mut self) -> Result<Amf0Value, Amf0DeserializationError> {
        let array_count = self.bytes.read_u32::<BigEndian>()?;
        let id = self.open_complex(Amf0Complex::StrictArray(Vec::new()))?;

        // The count comes off the wire, so don't trust it for the allocation
        let mut values = Vec::with_capacity(array_count.min(1024) as usize);
        for _ in 0..array_count {
            let marker = self.bytes.read_u8()?;
            if marker == markers::OBJECT_END_MARKER {
                return Err(Amf0DeserializationError::UnexpectedObjectEnd);
            }

            if let Some(value) = self.read_value(marker)? {
                values.push(value);
            }
        }

        self.close_complex(id, Amf0Complex::StrictArray(values));
        Ok(Amf0Value::Complex(id))
    }

    /// Reads key/value pairs until the object end marker is found in a value's position
    fn parse_properties(&mut self) -> Result<Amf0Properties, Amf0DeserializationError> {
        let mut properties = Vec::new();

        loop {
            let label = self.read_short_string()?;
            let marker = self.bytes.read_u8()?;
            if marker == markers::OBJECT_END_MARKER {
                break;
            }

            if label.is_empty() {
                return Err(Amf0DeserializationError::UnexpectedEmptyObjectPropertyName);
            }

            if let Some(value) = self.read_value(marker)? {
                properties.push((label, value));
            }
        }

        Ok(properties)
    }

    fn open_complex(
        &mut self,
        placeholder: Amf0Complex,
    ) -> Result<ComplexId, Amf0DeserializationError> {
        if self.depth >= self.options.max_nesting_depth {
            return Err(Amf0DeserializationError::NestingTooDeep {
                max_depth: self.options.max_nesting_depth,
            });
        }

        let id = self
            .references
            .register(placeholder)
            .ok_or(Amf0DeserializationError::ReferenceTableFull)?;

        self.depth += 1;
        Ok(id)
    }

    fn close_complex(&mut self, id: ComplexId, value: Amf0Complex) {
        self.references.fill(id, value);
        self.depth -= 1;
    }

    fn read_short_string(&mut self) -> Result<String, Amf0DeserializationError> {
        let length = self.bytes.read_u16::<BigEndian>()?;
        self.read_utf8(length as u64)
    }

    fn read_long_string(&mut self) -> Result<String, Amf0DeserializationError> {
        let length = self.bytes.read_u32::<BigEndian>()?;
        self.read_utf8(length as u64)
    }

    fn read_utf8(&mut self, length: u64) -> Result<String, Amf0DeserializationError> {
        // Reading through `take()` keeps a bogus length prefix from allocating up front
        let mut buffer = Vec::new();
        let bytes_read = self.bytes.by_ref().take(length).read_to_end(&mut buffer)?;
        if (bytes_read as u64) < length {
            return Err(Amf0DeserializationError::UnexpectedEof);
        }

        Ok(String::from_utf8(buffer)?)
    }
}

impl<R: Read> Iterator for Amf0Deserializer<R> {
    type Item = Result<Amf0Value, Amf0DeserializationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.next_value() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => None,
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}
