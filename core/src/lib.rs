//! # Lilium Core
//!
//! Small utilities shared by the Lilium material and effect crates:
//! shader-facing math aliases, color conversions, sampler state, thread
//! affinity checks and optional Tracy profiling.

pub mod color;
pub mod math;
pub mod profiling;
pub mod sampler;
pub mod thread;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the crate version once at startup.
pub fn init() {
    log::info!("Lilium Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
