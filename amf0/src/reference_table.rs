use crate::{Amf0Complex, Amf0Value};

/// Identifies a complex value inside a `ReferenceTable`.  The wrapped number is the AMF0
/// reference index an encoder would use to point back at the value.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct ComplexId(pub u16);

/// Append-only arena holding every complex value produced by a single deserialization run.
///
/// Values are registered when their container is opened, so an entry may still be empty
/// while its own properties are being read.  This is what allows a property to reference
/// the object that contains it.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<Amf0Complex>,
}

impl ReferenceTable {
    pub fn new() -> ReferenceTable {
        ReferenceTable {
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ComplexId) -> Option<&Amf0Complex> {
        self.entries.get(id.0 as usize)
    }

    /// Resolves a `Complex` or `Reference` value.  Any other value resolves to `None`.
    pub fn resolve(&self, value: &Amf0Value) -> Option<&Amf0Complex> {
        value.complex_id().and_then(|id| self.get(id))
    }

    /// Returns `None` once the table holds as many entries as a 16 bit reference can address
    pub(crate) fn register(&mut self, placeholder: Amf0Complex) -> Option<ComplexId> {
        if self.entries.len() > u16::MAX as usize {
            return None;
        }

        let id = ComplexId(self.entries.len() as u16);
        self.entries.push(placeholder);
        Some(id)
    }

    pub(crate) fn fill(&mut self, id: ComplexId, value: Amf0Complex) {
        self.entries[id.0 as usize] = value;
    }

    pub(crate) fn contains(&self, id: ComplexId) -> bool {
        (id.0 as usize) < self.entries.len()
    }
}
