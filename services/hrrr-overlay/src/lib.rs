//! HRRR overlay service: fetch a forecast cycle, pick a field, paint it.
//!
//! - [`download`]: cache-first acquisition of the cycle's GRIB2 file
//! - [`pipeline`]: acquire, resolve and render for one field or the
//!   default overlay set
//! - [`config`]: directory roots and tunables

pub mod config;
pub mod download;
pub mod pipeline;

pub use config::{bootstrap, OverlayConfig};
pub use download::{AcquireError, Acquirer, Acquisition, DEFAULT_URL_TEMPLATE};
pub use pipeline::{
    default_output_name, OverlayOutcome, OverlayPipeline, PipelineError, SkipReason,
    DEFAULT_OVERLAYS,
};
