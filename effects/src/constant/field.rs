//! Packed constant-buffer field descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type of a single constant-buffer field.
///
/// Matrices are stored row-major with every row padded to a 16-byte register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConstantFieldType {
    Bool = 0,
    Int = 1,
    Int2 = 2,
    Int3 = 3,
    Int4 = 4,
    UInt = 5,
    UInt2 = 6,
    UInt3 = 7,
    UInt4 = 8,
    Float = 9,
    Float2 = 10,
    Float3 = 11,
    Float4 = 12,
    Float3x3 = 13,
    Float3x4 = 14,
    Float4x3 = 15,
    Float4x4 = 16,
}

impl ConstantFieldType {
    /// Number of field types.
    pub const COUNT: usize = 17;

    /// Every field type in discriminant order.
    pub const ALL: [ConstantFieldType; Self::COUNT] = [
        Self::Bool,
        Self::Int,
        Self::Int2,
        Self::Int3,
        Self::Int4,
        Self::UInt,
        Self::UInt2,
        Self::UInt3,
        Self::UInt4,
        Self::Float,
        Self::Float2,
        Self::Float3,
        Self::Float4,
        Self::Float3x3,
        Self::Float3x4,
        Self::Float4x3,
        Self::Float4x4,
    ];

    /// Decode a discriminant.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// The discriminant.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Size in bytes inside a constant buffer.
    pub const fn size_in_bytes(self) -> u32 {
        match self {
            Self::Bool | Self::Int | Self::UInt | Self::Float => 4,
            Self::Int2 | Self::UInt2 | Self::Float2 => 8,
            Self::Int3 | Self::UInt3 | Self::Float3 => 12,
            Self::Int4 | Self::UInt4 | Self::Float4 => 16,
            Self::Float3x3 | Self::Float3x4 => 48,
            Self::Float4x3 | Self::Float4x4 => 64,
        }
    }

    pub const fn is_matrix(self) -> bool {
        matches!(
            self,
            Self::Float3x3 | Self::Float3x4 | Self::Float4x3 | Self::Float4x4
        )
    }

    /// Float scalar or vector.
    pub const fn is_float_vector(self) -> bool {
        matches!(self, Self::Float | Self::Float2 | Self::Float3 | Self::Float4)
    }

    /// Bool, signed or unsigned integer scalar or vector.
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::Int
                | Self::Int2
                | Self::Int3
                | Self::Int4
                | Self::UInt
                | Self::UInt2
                | Self::UInt3
                | Self::UInt4
        )
    }

    /// The shader-language spelling.
    pub const fn hlsl_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Int2 => "int2",
            Self::Int3 => "int3",
            Self::Int4 => "int4",
            Self::UInt => "uint",
            Self::UInt2 => "uint2",
            Self::UInt3 => "uint3",
            Self::UInt4 => "uint4",
            Self::Float => "float",
            Self::Float2 => "float2",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
            Self::Float3x3 => "float3x3",
            Self::Float3x4 => "float3x4",
            Self::Float4x3 => "float4x3",
            Self::Float4x4 => "float4x4",
        }
    }
}

impl fmt::Display for ConstantFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hlsl_name())
    }
}

const OFFSET_BITS: u16 = 10;
const OFFSET_MASK: u16 = (1 << OFFSET_BITS) - 1;
const TYPE_SHIFT: u16 = OFFSET_BITS;
const TYPE_MASK: u16 = 0x1f;
const IN_USE_BIT: u16 = 1 << 15;

/// A field's byte offset, type and usage packed into 16 bits.
///
/// Bits 0..=9 hold the offset in 4-byte words, bits 10..=14 the
/// [`ConstantFieldType`] and bit 15 whether the shader reads the field.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantField(u16);

static_assertions::const_assert_eq!(std::mem::size_of::<ConstantField>(), 2);
static_assertions::const_assert!(ConstantFieldType::COUNT <= TYPE_MASK as usize + 1);

impl ConstantField {
    /// Largest representable byte offset.
    pub const MAX_BYTE_OFFSET: u32 = (OFFSET_MASK as u32) * 4;

    /// Pack a field. Returns `None` when the offset is unaligned or too large.
    pub fn new(byte_offset: u32, field_type: ConstantFieldType, in_use: bool) -> Option<Self> {
        if byte_offset % 4 != 0 || byte_offset > Self::MAX_BYTE_OFFSET {
            return None;
        }
        let mut bits = (byte_offset / 4) as u16 | ((field_type as u16) << TYPE_SHIFT);
        if in_use {
            bits |= IN_USE_BIT;
        }
        Some(Self(bits))
    }

    /// Rebuild from a raw packed value.
    pub fn from_bits(bits: u16) -> Option<Self> {
        ConstantFieldType::from_index(((bits >> TYPE_SHIFT) & TYPE_MASK) as u32)?;
        Some(Self(bits))
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    /// Byte offset from the start of the buffer.
    pub fn offset(self) -> u32 {
        (self.0 & OFFSET_MASK) as u32 * 4
    }

    pub fn field_type(self) -> ConstantFieldType {
        // Constructors only admit valid discriminants.
        ConstantFieldType::from_index(((self.0 >> TYPE_SHIFT) & TYPE_MASK) as u32)
            .unwrap_or(ConstantFieldType::Bool)
    }

    /// Whether the shader actually reads this field.
    pub fn in_use(self) -> bool {
        self.0 & IN_USE_BIT != 0
    }

    pub fn size_in_bytes(self) -> u32 {
        self.field_type().size_in_bytes()
    }

    /// Byte range inside the buffer.
    pub fn byte_range(self) -> std::ops::Range<usize> {
        let start = self.offset() as usize;
        start..start + self.size_in_bytes() as usize
    }
}

impl fmt::Debug for ConstantField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantField")
            .field("offset", &self.offset())
            .field("type", &self.field_type())
            .field("in_use", &self.in_use())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_sizes_pad_rows() {
        assert_eq!(ConstantFieldType::Float3x3.size_in_bytes(), 48);
        assert_eq!(ConstantFieldType::Float3x4.size_in_bytes(), 48);
        assert_eq!(ConstantFieldType::Float4x3.size_in_bytes(), 64);
        assert_eq!(ConstantFieldType::Float4x4.size_in_bytes(), 64);
    }

    #[test]
    fn scalar_and_vector_sizes() {
        assert_eq!(ConstantFieldType::Bool.size_in_bytes(), 4);
        assert_eq!(ConstantFieldType::Int3.size_in_bytes(), 12);
        assert_eq!(ConstantFieldType::Float4.size_in_bytes(), 16);
    }

    #[test]
    fn index_roundtrip() {
        for ty in ConstantFieldType::ALL {
            assert_eq!(ConstantFieldType::from_index(ty.index()), Some(ty));
        }
        assert_eq!(ConstantFieldType::from_index(17), None);
    }

    #[test]
    fn pack_fields() {
        let field = ConstantField::new(4092, ConstantFieldType::Float4x4, true).unwrap();
        assert_eq!(field.offset(), 4092);
        assert_eq!(field.field_type(), ConstantFieldType::Float4x4);
        assert!(field.in_use());

        let unused = ConstantField::new(16, ConstantFieldType::Int2, false).unwrap();
        assert_eq!(unused.offset(), 16);
        assert!(!unused.in_use());
        assert_eq!(unused.byte_range(), 16..24);
    }

    #[test]
    fn bit_layout_is_stable() {
        let field = ConstantField::new(8, ConstantFieldType::Float, true).unwrap();
        assert_eq!(field.bits(), 2 | (9 << 10) | (1 << 15));
        assert_eq!(ConstantField::from_bits(field.bits()), Some(field));
    }

    #[test]
    fn rejects_bad_offsets() {
        assert!(ConstantField::new(4096, ConstantFieldType::Float, true).is_none());
        assert!(ConstantField::new(6, ConstantFieldType::Float, true).is_none());
        assert!(ConstantField::from_bits(31 << 10).is_none());
    }

    #[test]
    fn display_uses_shader_names() {
        assert_eq!(ConstantFieldType::Float3x4.to_string(), "float3x4");
    }
}
