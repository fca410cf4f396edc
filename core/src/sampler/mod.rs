//! Sampler state types.
//!
//! Provides [`SamplerState`] together with the [`FilterMode`] and
//! [`AddressMode`] enums shared between material code and backends.

mod types;

pub use types::{AddressMode, FilterMode, SamplerState};
