//! Shared test utilities for the hrrr-overlay workspace.
//!
//! - [`Grib2Builder`] writes small simple-packed GRIB2 messages shaped like
//!   HRRR output, so decoding can be tested without real model files
//! - [`generators`] fills grids with patterns whose values are easy to check
//! - [`TempDirs`] gives each test its own cache and image directories
//!
//! Used as a dev-dependency only:
//!
//! ```ignore
//! use test_utils::{build_file, Grib2Builder, TempDirs};
//! ```

pub mod fixtures;
pub mod generators;
pub mod grib2;

pub use fixtures::*;
pub use generators::*;
pub use grib2::*;

/// Assert two numbers differ by at most `epsilon`, comparing as `f64`.
///
/// Decoded GRIB2 values carry packing error, so exact equality is rarely
/// the right check.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
