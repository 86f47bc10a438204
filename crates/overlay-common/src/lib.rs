//! Common types shared across the HRRR overlay crates.

pub mod cycle;
pub mod error;
pub mod grid;

pub use cycle::CycleId;
pub use error::{CycleError, CycleResult};
pub use grid::{finite_range, FieldSlice};
