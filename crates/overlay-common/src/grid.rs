//! Two-dimensional field slices handed from the decoder to the renderer.

/// A single 2D slice of one field at one time step.
///
/// Values are stored row-major with row 0 first, in the order the grid
/// product stores them. Missing points are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlice {
    /// Dataset key of the variable the slice came from
    pub variable: String,
    /// Number of columns (points along a row)
    pub width: usize,
    /// Number of rows
    pub height: usize,
    pub values: Vec<f32>,
}

impl FieldSlice {
    /// Create a slice, returning `None` if `values` does not hold exactly
    /// `width * height` points.
    pub fn new(variable: impl Into<String>, width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        if width.checked_mul(height)? != values.len() {
            return None;
        }
        Some(Self {
            variable: variable.into(),
            width,
            height,
            values,
        })
    }
}

/// Minimum and maximum of the finite values, ignoring NaN and infinities.
///
/// Returns `None` when no value is finite.
pub fn finite_range(values: &[f32]) -> Option<(f32, f32)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
