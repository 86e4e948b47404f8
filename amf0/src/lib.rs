//! This crate provides functionality for deserializing data encoded with the
//! Adobe AMF0 specification located at
//! <https://wwwimages2.adobe.com/content/dam/acom/en/devnet/pdf/amf0-file-format-specification.pdf>
//!
//! Complex values (objects, ECMA arrays, strict arrays and typed objects) are
//! not stored inline.  Each one is placed in a [`ReferenceTable`] the moment its
//! container is opened, and the value tree only holds its [`ComplexId`].  An
//! AMF0 reference marker therefore decodes into the *same* id as the value it
//! points to, which keeps shared and self-referential structures representable
//! without copying.
//!
//! # Examples
//! ```
//! use ingest_amf0::{deserialize, Amf0Complex, Amf0Value};
//!
//! // A strict array of two numbers followed by a reference back to it
//! let bytes = vec![
//!     0x0a, 0x00, 0x00, 0x00, 0x02,
//!     0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//!     0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//!     0x07, 0x00, 0x00,
//! ];
//!
//! let document = deserialize(&mut &bytes[..]).unwrap();
//! assert_eq!(document.values.len(), 2);
//! assert_eq!(document.values[0].complex_id(), document.values[1].complex_id());
//!
//! match document.resolve(&document.values[1]) {
//!     Some(Amf0Complex::StrictArray(items)) => {
//!         assert_eq!(items, &vec![Amf0Value::Number(1.0), Amf0Value::Number(2.0)])
//!     }
//!     x => panic!("Unexpected resolved value: {:?}", x),
//! }
//! ```

mod deserialization;
mod errors;
mod reference_table;

pub use deserialization::{deserialize, deserialize_with, Amf0Deserializer};
pub use errors::Amf0DeserializationError;
pub use reference_table::{ComplexId, ReferenceTable};

/// An ordered list of named properties, as found in objects, ECMA arrays and typed objects
pub type Amf0Properties = Vec<(String, Amf0Value)>;

/// An Enum representing the different supported types of Amf0 values
#[derive(PartialEq, Debug, Clone)]
pub enum Amf0Value {
    Number(f64),
    Boolean(bool),
    Utf8String(String),
    LongUtf8String(String),
    XmlDocument(String),
    Date {
        /// Milliseconds since the unix epoch
        unix_time_ms: f64,

        /// Reserved by the format and never applied to `unix_time_ms`
        time_zone: i16,
    },
    Null,
    Undefined,

    /// A complex value that was first defined at this position.  Its contents live in the
    /// reference table.
    Complex(ComplexId),

    /// An alias to a complex value that was defined earlier (or is still being defined)
    Reference(ComplexId),
}

impl Amf0Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amf0Value::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Amf0Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text of any of the string-like variants
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Amf0Value::Utf8String(value)
            | Amf0Value::LongUtf8String(value)
            | Amf0Value::XmlDocument(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// The arena index of the complex value this value defines or refers to
    pub fn complex_id(&self) -> Option<ComplexId> {
        match self {
            Amf0Value::Complex(id) | Amf0Value::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

/// The contents of a complex AMF0 value, stored in a [`ReferenceTable`]
#[derive(PartialEq, Debug, Clone)]
pub enum Amf0Complex {
    Object(Amf0Properties),

    /// Same shape as an object.  The count that prefixes it on the wire is only a hint.
    EcmaArray(Amf0Properties),

    StrictArray(Vec<Amf0Value>),

    TypedObject {
        class_name: String,
        properties: Amf0Properties,
    },
}

impl Amf0Complex {
    /// Looks up a named property on objects, ECMA arrays and typed objects.  If a name
    /// appears more than once the last occurrence wins, matching how AMF0 encoders
    /// overwrite keys.
    pub fn property(&self, name: &str) -> Option<&Amf0Value> {
        let properties = match self {
            Amf0Complex::Object(properties) => properties,
            Amf0Complex::EcmaArray(properties) => properties,
            Amf0Complex::TypedObject { properties, .. } => properties,
            Amf0Complex::StrictArray(_) => return None,
        };

        properties
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// The result of deserializing a complete AMF0 buffer
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Amf0Document {
    /// Top level values in the order they appeared
    pub values: Vec<Amf0Value>,

    /// Every complex value that was decoded, indexed by `ComplexId`
    pub references: ReferenceTable,
}

impl Amf0Document {
    /// Resolves a `Complex` or `Reference` value to the complex value it identifies
    pub fn resolve(&self, value: &Amf0Value) -> Option<&Amf0Complex> {
        self.references.resolve(value)
    }
}

/// How reserved markers (movie clip, record set and unsupported) are treated
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum UnsupportedMarkerPolicy {
    /// Decoding fails with `Amf0DeserializationError::UnsupportedMarker`
    Fail,

    /// The marker is consumed and nothing is produced for it
    Skip,
}

/// Options that govern how an `Amf0Deserializer` behaves
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Amf0DeserializerOptions {
    pub unsupported_markers: UnsupportedMarkerPolicy,

    /// How many complex values may be nested inside each other before decoding is aborted
    pub max_nesting_depth: usize,
}

impl Amf0DeserializerOptions {
    /// Creates options that fail on reserved markers and allow 64 levels of nesting
    pub fn new() -> Amf0DeserializerOptions {
        Amf0DeserializerOptions {
            unsupported_markers: UnsupportedMarkerPolicy::Fail,
            max_nesting_depth: 64,
        }
    }
}

impl Default for Amf0DeserializerOptions {
    fn default() -> Self {
        Amf0DeserializerOptions::new()
    }
}

pub mod markers {
    pub const NUMBER_MARKER: u8 = 0x00;
    pub const BOOLEAN_MARKER: u8 = 0x01;
    pub const STRING_MARKER: u8 = 0x02;
    pub const OBJECT_MARKER: u8 = 0x03;
    pub const MOVIECLIP_MARKER: u8 = 0x04;
    pub const NULL_MARKER: u8 = 0x05;
    pub const UNDEFINED_MARKER: u8 = 0x06;
    pub const REFERENCE_MARKER: u8 = 0x07;
    pub const ECMA_ARRAY_MARKER: u8 = 0x08;
    pub const OBJECT_END_MARKER: u8 = 0x09;
    pub const STRICT_ARRAY_MARKER: u8 = 0x0a;
    pub const DATE_MARKER: u8 = 0x0b;
    pub const LONG_STRING_MARKER: u8 = 0x0c;
    pub const UNSUPPORTED_MARKER: u8 = 0x0d;
    pub const RECORDSET_MARKER: u8 = 0x0e;
    pub const XML_DOCUMENT_MARKER: u8 = 0x0f;
    pub const TYPED_OBJECT_MARKER: u8 = 0x10;
    pub const AVMPLUS_OBJECT_MARKER: u8 = 0x11;
    pub const UTF_8_EMPTY_MARKER: u16 = 0;
}
