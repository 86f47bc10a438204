//! Raster rendering of HRRR field slices into PNG overlays.
//!
//! A slice is colored with the table chosen for its field name (see
//! [`select_color_table`]), laid out with grid row 0 at the bottom of the
//! image, and written as a PNG with no axes or margins.

pub mod colormap;
pub mod png;
pub mod raster;

use std::path::PathBuf;

use overlay_common::FieldSlice;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub use colormap::{select_color_table, Color, ColorTableId, FieldCategory};

/// Errors raised while rendering a slice.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Cannot render an empty grid ({width}x{height})")]
    EmptyGrid { width: usize, height: usize },

    #[error("Grid shape {width}x{height} does not match {values} values")]
    ShapeMismatch {
        width: usize,
        height: usize,
        values: usize,
    },

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders slices into image files under one output directory.
#[derive(Debug, Clone)]
pub struct Renderer {
    output_dir: PathBuf,
    scale: usize,
}

impl Renderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            scale: 1,
        }
    }

    /// Pixels per grid cell along each axis; 0 is treated as 1.
    pub fn with_scale(mut self, scale: usize) -> Self {
        self.scale = scale.max(1);
        self
    }

    /// Encode `slice` as PNG bytes using the color table for `field_name`.
    pub fn encode(&self, slice: &FieldSlice, field_name: &str) -> Result<Vec<u8>, RenderError> {
        if slice.width == 0 || slice.height == 0 {
            return Err(RenderError::EmptyGrid {
                width: slice.width,
                height: slice.height,
            });
        }
        if slice.values.len() != slice.width * slice.height {
            return Err(RenderError::ShapeMismatch {
                width: slice.width,
                height: slice.height,
                values: slice.values.len(),
            });
        }

        let table = select_color_table(field_name);
        debug!(field = %field_name, table = table.name(), "Selected color table");

        let cells = table.colorize(&slice.values);
        let (pixels, width, height) =
            raster::layout_pixels(&cells, slice.width, slice.height, self.scale);

        png::create_png_auto(&pixels, width, height).map_err(|e| RenderError::Encode(e.to_string()))
    }

    /// Render `slice` to `<output_dir>/<output_name>`, replacing any
    /// existing file, and return the written path.
    #[instrument(skip(self, slice), fields(variable = %slice.variable))]
    pub fn render(
        &self,
        slice: &FieldSlice,
        field_name: &str,
        output_name: &str,
    ) -> Result<PathBuf, RenderError> {
        let png = self.encode(slice, field_name)?;
        let path = self.output_dir.join(output_name);
        std::fs::write(&path, &png)?;

        info!(
            path = %path.display(),
            width = slice.width * self.scale,
            height = slice.height * self.scale,
            bytes = png.len(),
            "Rendered overlay"
        );
        Ok(path)
    }
}
