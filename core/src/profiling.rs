//! Profiling support via Tracy.
//!
//! Optional instrumentation using the [Tracy profiler](https://github.com/wolfpld/tracy),
//! enabled through the `profiling` Cargo feature. When the feature is off,
//! every macro expands to nothing.
//!
//! ```ignore
//! use lilium_core::{profile_function, profile_scope};
//!
//! fn prepare_materials() {
//!     profile_function!();
//!
//!     {
//!         profile_scope!("eval_constant_buffers");
//!         // ...
//!     }
//! }
//! ```

#[cfg(feature = "profiling")]
pub use tracy_client::{self, Client, frame_mark as tracy_frame_mark, plot as tracy_plot, span};

/// Mark the end of a frame.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! frame_mark {
    () => {
        $crate::profiling::tracy_frame_mark()
    };
}

/// Mark the end of a frame.
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! frame_mark {
    () => {};
}

/// Profile the enclosing scope under a name.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Profile the enclosing scope under a name.
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Profile the enclosing function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Profile the enclosing function.
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Plot a value over time.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

/// Plot a value over time.
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        let _ = $value;
    };
}

pub use crate::{frame_mark, profile_function, profile_plot, profile_scope};
