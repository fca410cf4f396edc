//! Constant-buffer layouts as reported by shader reflection.

use crate::bind_name::BindName;
use crate::error::{EffectError, EffectResult};

use super::field::{ConstantField, ConstantFieldType};

/// Size of one shader constant register.
pub const REGISTER_SIZE: u32 = 16;

/// A named field of a constant buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstantBufferEntry {
    pub name: BindName,
    pub field: ConstantField,
}

/// The ordered fields of a constant buffer and its total size.
///
/// Layouts compare structurally, so two stages reflecting the same cbuffer
/// produce equal layouts and can share one GPU buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ConstantBufferLayout {
    entries: Vec<ConstantBufferEntry>,
    byte_size: u32,
}

impl ConstantBufferLayout {
    /// Start building a layout with register packing rules.
    pub fn builder() -> ConstantBufferLayoutBuilder {
        ConstantBufferLayoutBuilder::default()
    }

    /// Pack every field in order, all marked in use.
    pub fn packed<'a, I>(fields: I) -> EffectResult<Self>
    where
        I: IntoIterator<Item = (&'a str, ConstantFieldType)>,
    {
        fields
            .into_iter()
            .fold(Self::builder(), |builder, (name, ty)| builder.field(name, ty))
            .build()
    }

    /// Build from explicit entries, as reflection data provides them.
    ///
    /// The byte size is the end of the last field rounded up to a register.
    pub fn from_entries(entries: Vec<ConstantBufferEntry>) -> Self {
        let end = entries
            .iter()
            .map(|entry| entry.field.byte_range().end as u32)
            .max()
            .unwrap_or(0);
        Self {
            entries,
            byte_size: align_up(end, REGISTER_SIZE),
        }
    }

    /// Number of fields.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size in bytes, a multiple of [`REGISTER_SIZE`].
    pub fn byte_size(&self) -> u32 {
        self.byte_size
    }

    pub fn entries(&self) -> &[ConstantBufferEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&ConstantBufferEntry> {
        self.entries.get(index)
    }

    /// Look up a field by name.
    pub fn find(&self, name: &BindName) -> Option<&ConstantBufferEntry> {
        self.entries.iter().find(|entry| &entry.name == name)
    }
}

/// Incrementally packs fields the way shader compilers lay out cbuffers.
///
/// Matrices start on a register boundary, and a field that would straddle
/// a register moves to the next one.
#[derive(Debug, Default)]
pub struct ConstantBufferLayoutBuilder {
    fields: Vec<(BindName, ConstantFieldType, bool)>,
}

impl ConstantBufferLayoutBuilder {
    /// Append a field the shader reads.
    pub fn field(mut self, name: impl Into<BindName>, field_type: ConstantFieldType) -> Self {
        self.fields.push((name.into(), field_type, true));
        self
    }

    /// Append a field that occupies space but is never read.
    pub fn unused(mut self, name: impl Into<BindName>, field_type: ConstantFieldType) -> Self {
        self.fields.push((name.into(), field_type, false));
        self
    }

    pub fn build(self) -> EffectResult<ConstantBufferLayout> {
        let mut offset = 0u32;
        let mut entries = Vec::with_capacity(self.fields.len());

        for (name, field_type, in_use) in self.fields {
            let size = field_type.size_in_bytes();
            let within = offset % REGISTER_SIZE;
            if field_type.is_matrix() || (within != 0 && within + size > REGISTER_SIZE) {
                offset = align_up(offset, REGISTER_SIZE);
            }

            let field = ConstantField::new(offset, field_type, in_use).ok_or_else(|| {
                EffectError::LayoutOverflow {
                    name: name.clone(),
                    offset,
                }
            })?;
            entries.push(ConstantBufferEntry { name, field });
            offset += size;
        }

        Ok(ConstantBufferLayout {
            entries,
            byte_size: align_up(offset, REGISTER_SIZE),
        })
    }
}

fn align_up(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_vectors_without_straddling() {
        let layout = ConstantBufferLayout::packed([
            ("a", ConstantFieldType::Float),
            ("b", ConstantFieldType::Float3),
            ("c", ConstantFieldType::Float2),
            ("d", ConstantFieldType::Float2),
            ("e", ConstantFieldType::Float),
        ])
        .unwrap();

        let offsets: Vec<u32> = layout.entries().iter().map(|e| e.field.offset()).collect();
        assert_eq!(offsets, vec![0, 4, 16, 24, 32]);
        assert_eq!(layout.byte_size(), 48);
    }

    #[test]
    fn matrices_start_on_register() {
        let layout = ConstantBufferLayout::packed([
            ("t", ConstantFieldType::Float),
            ("m", ConstantFieldType::Float4x4),
            ("n", ConstantFieldType::Float3x3),
        ])
        .unwrap();
        assert_eq!(layout.entry(1).unwrap().field.offset(), 16);
        assert_eq!(layout.entry(2).unwrap().field.offset(), 80);
        assert_eq!(layout.byte_size(), 128);
    }

    #[test]
    fn unused_fields_keep_space() {
        let layout = ConstantBufferLayout::builder()
            .unused("pad", ConstantFieldType::Float4)
            .field("color", ConstantFieldType::Float4)
            .build()
            .unwrap();
        assert!(!layout.entry(0).unwrap().field.in_use());
        assert_eq!(layout.find(&"color".into()).unwrap().field.offset(), 16);
    }

    #[test]
    fn overflow_is_reported() {
        let fields: Vec<(String, ConstantFieldType)> = (0..70)
            .map(|i| (format!("m{i}"), ConstantFieldType::Float4x4))
            .collect();
        let err = ConstantBufferLayout::packed(fields.iter().map(|(n, t)| (n.as_str(), *t)))
            .unwrap_err();
        assert!(matches!(err, EffectError::LayoutOverflow { .. }));
    }

    #[test]
    fn equal_layouts_compare_equal() {
        let a = ConstantBufferLayout::packed([("x", ConstantFieldType::Float4)]).unwrap();
        let b = ConstantBufferLayout::packed([("x", ConstantFieldType::Float4)]).unwrap();
        let c = ConstantBufferLayout::packed([("x", ConstantFieldType::Float3)]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn from_entries_rounds_size() {
        let entries = vec![ConstantBufferEntry {
            name: "v".into(),
            field: ConstantField::new(4, ConstantFieldType::Float2, true).unwrap(),
        }];
        assert_eq!(ConstantBufferLayout::from_entries(entries).byte_size(), 16);
    }
}
