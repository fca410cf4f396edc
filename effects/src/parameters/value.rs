//! Typed parameter values and their constant-buffer encoding.

use lilium_core::math::{Mat3, Mat3x4, Mat4, Mat4x3, Vec2, Vec3, Vec4, row_register};
use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use crate::constant::{ConstantFieldType, REGISTER_SIZE};

/// A value held by a material parameter, one variant per field type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Bool(bool),
    Int(i32),
    Int2([i32; 2]),
    Int3([i32; 3]),
    Int4([i32; 4]),
    UInt(u32),
    UInt2([u32; 2]),
    UInt3([u32; 3]),
    UInt4([u32; 4]),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Float3x3(Mat3),
    Float3x4(Mat3x4),
    Float4x3(Mat4x3),
    Float4x4(Mat4),
}

impl ParameterValue {
    pub fn field_type(&self) -> ConstantFieldType {
        match self {
            Self::Bool(_) => ConstantFieldType::Bool,
            Self::Int(_) => ConstantFieldType::Int,
            Self::Int2(_) => ConstantFieldType::Int2,
            Self::Int3(_) => ConstantFieldType::Int3,
            Self::Int4(_) => ConstantFieldType::Int4,
            Self::UInt(_) => ConstantFieldType::UInt,
            Self::UInt2(_) => ConstantFieldType::UInt2,
            Self::UInt3(_) => ConstantFieldType::UInt3,
            Self::UInt4(_) => ConstantFieldType::UInt4,
            Self::Float(_) => ConstantFieldType::Float,
            Self::Float2(_) => ConstantFieldType::Float2,
            Self::Float3(_) => ConstantFieldType::Float3,
            Self::Float4(_) => ConstantFieldType::Float4,
            Self::Float3x3(_) => ConstantFieldType::Float3x3,
            Self::Float3x4(_) => ConstantFieldType::Float3x4,
            Self::Float4x3(_) => ConstantFieldType::Float4x3,
            Self::Float4x4(_) => ConstantFieldType::Float4x4,
        }
    }

    /// Placeholder value for a field type: zero, `false`, or identity for matrices.
    pub fn default_for(field_type: ConstantFieldType) -> Self {
        match field_type {
            ConstantFieldType::Bool => Self::Bool(false),
            ConstantFieldType::Int => Self::Int(0),
            ConstantFieldType::Int2 => Self::Int2([0; 2]),
            ConstantFieldType::Int3 => Self::Int3([0; 3]),
            ConstantFieldType::Int4 => Self::Int4([0; 4]),
            ConstantFieldType::UInt => Self::UInt(0),
            ConstantFieldType::UInt2 => Self::UInt2([0; 2]),
            ConstantFieldType::UInt3 => Self::UInt3([0; 3]),
            ConstantFieldType::UInt4 => Self::UInt4([0; 4]),
            ConstantFieldType::Float => Self::Float(0.0),
            ConstantFieldType::Float2 => Self::Float2(Vec2::zeros()),
            ConstantFieldType::Float3 => Self::Float3(Vec3::zeros()),
            ConstantFieldType::Float4 => Self::Float4(Vec4::zeros()),
            ConstantFieldType::Float3x3 => Self::Float3x3(Mat3::identity()),
            ConstantFieldType::Float3x4 => Self::Float3x4(Mat3x4::identity()),
            ConstantFieldType::Float4x3 => Self::Float4x3(Mat4x3::identity()),
            ConstantFieldType::Float4x4 => Self::Float4x4(Mat4::identity()),
        }
    }

    /// Encode into `out`, which must hold at least the field's size.
    ///
    /// Matrices are written row by row, each row padded to one register.
    pub fn write_to(&self, out: &mut [u8]) {
        let size = self.field_type().size_in_bytes() as usize;
        debug_assert!(out.len() >= size, "{} needs {size} bytes", self.field_type());
        let out = &mut out[..size];

        match self {
            Self::Bool(v) => out.copy_from_slice(&u32::from(*v).to_ne_bytes()),
            Self::Int(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Int2(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::Int3(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::Int4(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::UInt(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::UInt2(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::UInt3(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::UInt4(v) => out.copy_from_slice(bytemuck::cast_slice(v)),
            Self::Float(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Float2(v) => out.copy_from_slice(bytemuck::cast_slice(v.as_slice())),
            Self::Float3(v) => out.copy_from_slice(bytemuck::cast_slice(v.as_slice())),
            Self::Float4(v) => out.copy_from_slice(bytemuck::cast_slice(v.as_slice())),
            Self::Float3x3(m) => write_rows(m, out),
            Self::Float3x4(m) => write_rows(m, out),
            Self::Float4x3(m) => write_rows(m, out),
            Self::Float4x4(m) => write_rows(m, out),
        }
    }

    /// Decode a value previously written by [`write_to`](Self::write_to).
    pub fn from_bytes(field_type: ConstantFieldType, bytes: &[u8]) -> Option<Self> {
        if bytes.len() < field_type.size_in_bytes() as usize {
            return None;
        }
        let value = match field_type {
            ConstantFieldType::Bool => Self::Bool(read::<u32>(bytes, 0) != 0),
            ConstantFieldType::Int => Self::Int(read(bytes, 0)),
            ConstantFieldType::Int2 => Self::Int2(read_array(bytes)),
            ConstantFieldType::Int3 => Self::Int3(read_array(bytes)),
            ConstantFieldType::Int4 => Self::Int4(read_array(bytes)),
            ConstantFieldType::UInt => Self::UInt(read(bytes, 0)),
            ConstantFieldType::UInt2 => Self::UInt2(read_array(bytes)),
            ConstantFieldType::UInt3 => Self::UInt3(read_array(bytes)),
            ConstantFieldType::UInt4 => Self::UInt4(read_array(bytes)),
            ConstantFieldType::Float => Self::Float(read(bytes, 0)),
            ConstantFieldType::Float2 => Self::Float2(Vec2::from(read_array::<f32, 2>(bytes))),
            ConstantFieldType::Float3 => Self::Float3(Vec3::from(read_array::<f32, 3>(bytes))),
            ConstantFieldType::Float4 => Self::Float4(Vec4::from(read_array::<f32, 4>(bytes))),
            ConstantFieldType::Float3x3 => Self::Float3x3(read_rows(bytes)),
            ConstantFieldType::Float3x4 => Self::Float3x4(read_rows(bytes)),
            ConstantFieldType::Float4x3 => Self::Float4x3(read_rows(bytes)),
            ConstantFieldType::Float4x4 => Self::Float4x4(read_rows(bytes)),
        };
        Some(value)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float2(&self) -> Option<Vec2> {
        match self {
            Self::Float2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float3(&self) -> Option<Vec3> {
        match self {
            Self::Float3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float4(&self) -> Option<Vec4> {
        match self {
            Self::Float4(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_mat3(&self) -> Option<Mat3> {
        match self {
            Self::Float3x3(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            Self::Float4x4(m) => Some(*m),
            _ => None,
        }
    }
}

fn write_rows<const R: usize, const C: usize>(m: &SMatrix<f32, R, C>, out: &mut [u8]) {
    let register = REGISTER_SIZE as usize;
    for r in 0..R {
        let row: [f32; C] = std::array::from_fn(|c| m[(r, c)]);
        let padded = row_register(row);
        out[r * register..(r + 1) * register].copy_from_slice(bytemuck::cast_slice(&padded));
    }
}

fn read<T: bytemuck::Pod>(bytes: &[u8], offset: usize) -> T {
    bytemuck::pod_read_unaligned(&bytes[offset..offset + std::mem::size_of::<T>()])
}

fn read_array<T: bytemuck::Pod, const N: usize>(bytes: &[u8]) -> [T; N] {
    std::array::from_fn(|i| read(bytes, i * std::mem::size_of::<T>()))
}

fn read_rows<const R: usize, const C: usize>(bytes: &[u8]) -> SMatrix<f32, R, C> {
    let register = REGISTER_SIZE as usize;
    SMatrix::from_fn(|r, c| read(bytes, r * register + c * 4))
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    bool => Bool,
    i32 => Int,
    [i32; 2] => Int2,
    [i32; 3] => Int3,
    [i32; 4] => Int4,
    u32 => UInt,
    [u32; 2] => UInt2,
    [u32; 3] => UInt3,
    [u32; 4] => UInt4,
    f32 => Float,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
    Mat3 => Float3x3,
    Mat3x4 => Float3x4,
    Mat4x3 => Float4x3,
    Mat4 => Float4x4,
}
