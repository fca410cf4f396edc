//! Constant-buffer fields and layouts.

mod field;
mod layout;

pub use field::{ConstantField, ConstantFieldType};
pub use layout::{
    ConstantBufferEntry, ConstantBufferLayout, ConstantBufferLayoutBuilder, REGISTER_SIZE,
};
