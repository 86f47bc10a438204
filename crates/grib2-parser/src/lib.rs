//! GRIB2 decoding for HRRR overlay rendering (WMO FM 92 GRIB Edition 2).
//!
//! The crate has three layers:
//! - [`Grib2Reader`] walks the raw bytes and yields one [`Grib2Message`] per
//!   GRIB2 message, with its sections parsed and parameter names looked up
//!   in [`Grib2Tables`].
//! - [`Grib2Dataset`] groups messages into named variables, each with a
//!   time/step dimension in file order.
//! - [`FieldResolver`] maps a human-readable field name onto one variable
//!   and extracts a single 2D slice.

pub mod dataset;
pub mod resolve;
pub mod sections;
pub mod tables;
pub mod unpacking;

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

pub use dataset::{Grib2Dataset, GridDataset, VariableSummary};
pub use resolve::{find_variable, resolve_in, FieldResolver, ResolveError};
pub use sections::{
    Bitmap, DataRepresentation, DataSection, GridDefinition, Identification, Indicator,
    ProductDefinition,
};
pub use tables::{Grib2Tables, LevelDescription, ParameterInfo, TablesError};
pub use unpacking::unpack_simple;

/// Errors raised while decoding GRIB2 data.
#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Unpacking failed: {0}")]
    UnpackingError(String),

    #[error("Unsupported template {section}.{template}")]
    UnsupportedTemplate { section: u8, template: u16 },

    #[error("Variable '{variable}' has {available} step(s), index {index} is out of range")]
    StepOutOfRange {
        variable: String,
        index: usize,
        available: usize,
    },

    #[error("Unknown variable: {0}")]
    UnknownVariable(String),

    #[error("Failed to read grid file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for GRIB2 operations.
pub type Grib2Result<T> = Result<T, Grib2Error>;

/// Template number for simple packing in Section 5.
const SIMPLE_PACKING: u16 = 0;

/// A single parsed GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    /// Byte offset of the message within the source buffer
    pub offset: usize,
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    pub bitmap: Option<Bitmap>,
    pub data_section: DataSection,
    /// The complete message bytes ("GRIB" through "7777")
    pub raw: Bytes,
}

impl Grib2Message {
    /// Parameter short name (e.g. "CAPE", "REFC").
    pub fn parameter(&self) -> &str {
        &self.product_definition.parameter_short_name
    }

    /// Grid dimensions as (rows, columns).
    pub fn grid_dims(&self) -> (u32, u32) {
        (
            self.grid_definition.num_points_latitude,
            self.grid_definition.num_points_longitude,
        )
    }

    /// Decode the data values of this message into row-major `f32`s.
    ///
    /// Simple packing is unpacked here; any other packing is handed to the
    /// `grib` crate decoder. Points masked out by the bitmap are `NaN`.
    pub fn unpack_data(&self) -> Grib2Result<Vec<f32>> {
        let drs = &self.data_representation;
        if drs.template_number == SIMPLE_PACKING {
            let bitmap = match &self.bitmap {
                None => None,
                Some(bitmap) if bitmap.indicator == 0 => Some(bitmap.data.as_ref()),
                Some(bitmap) => {
                    return Err(Grib2Error::UnpackingError(format!(
                        "Bitmap indicator {} is not supported",
                        bitmap.indicator
                    )))
                }
            };
            return unpack_simple(
                &self.data_section.data,
                self.grid_definition.num_data_points,
                drs.bits_per_value,
                drs.reference_value,
                drs.binary_scale_factor,
                drs.decimal_scale_factor,
                bitmap,
            );
        }

        debug!(
            template = drs.template_number,
            parameter = %self.parameter(),
            "Delegating unpacking to grib crate"
        );
        unpacking::decode_with_grib_crate(&self.raw, drs.template_number)
    }
}

/// Sequential reader over the GRIB2 messages in a byte buffer.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
    tables: Arc<Grib2Tables>,
}

impl Grib2Reader {
    pub fn new(data: Bytes, tables: Arc<Grib2Tables>) -> Self {
        Self {
            data,
            offset: 0,
            tables,
        }
    }

    /// Read the next message, or `None` once no further "GRIB" marker exists.
    pub fn next_message(&mut self) -> Grib2Result<Option<Grib2Message>> {
        let start = match find_marker(&self.data[self.offset..]) {
            Some(pos) => self.offset + pos,
            None => {
                self.offset = self.data.len();
                return Ok(None);
            }
        };

        if start > self.offset {
            debug!(
                skipped = start - self.offset,
                "Skipping bytes before GRIB marker"
            );
        }

        let indicator = sections::parse_indicator(&self.data[start..])?;
        let length = usize::try_from(indicator.message_length).map_err(|_| {
            Grib2Error::InvalidFormat(format!(
                "Message length {} does not fit in memory",
                indicator.message_length
            ))
        })?;

        if length < 16 + 4 || start + length > self.data.len() {
            return Err(Grib2Error::InvalidFormat(format!(
                "Truncated message at offset {}: declared {} bytes, {} available",
                start,
                length,
                self.data.len() - start
            )));
        }

        let raw = self.data.slice(start..start + length);
        if &raw[length - 4..] != b"7777" {
            return Err(Grib2Error::InvalidFormat(format!(
                "Message at offset {} is missing its end marker",
                start
            )));
        }

        self.offset = start + length;

        let identification = sections::parse_identification(&raw)?;
        let grid_definition = sections::parse_grid_definition(&raw)?;
        let product_definition =
            sections::parse_product_definition(&raw, indicator.discipline, &self.tables)?;
        let data_representation = sections::parse_data_representation(&raw)?;
        let bitmap = sections::parse_bitmap(&raw)?;
        let data_section = sections::parse_data_section(&raw)?;

        Ok(Some(Grib2Message {
            offset: start,
            indicator,
            identification,
            grid_definition,
            product_definition,
            data_representation,
            bitmap,
            data_section,
            raw,
        }))
    }
}

fn find_marker(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"GRIB")
}
