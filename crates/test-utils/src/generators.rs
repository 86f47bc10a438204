//! Test data generators for creating synthetic HRRR-like fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite. All grids are row-major with
//! row 0 first; for HRRR that is the southernmost row.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a grid that is `background` everywhere except row 0, which is
/// `marker`. Used to check that row 0 ends up at the bottom of an image.
pub fn create_marker_row_grid(width: usize, height: usize, background: f32, marker: f32) -> Vec<f32> {
    let mut data = vec![background; width * height];
    for value in data.iter_mut().take(width) {
        *value = marker;
    }
    data
}

/// Creates a reflectivity-like grid in dBZ.
///
/// A storm cell peaks at `peak` in the middle and falls off linearly to
/// clear air (0 dBZ) at the edges.
pub fn create_reflectivity_grid(width: usize, height: usize, peak: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    let center_x = (width as f32 - 1.0) / 2.0;
    let center_y = (height as f32 - 1.0) / 2.0;
    let max_dist = (center_x * center_x + center_y * center_y).sqrt().max(1.0);

    for row in 0..height {
        for col in 0..width {
            let dx = col as f32 - center_x;
            let dy = row as f32 - center_y;
            let dist = (dx * dx + dy * dy).sqrt();
            data.push((peak * (1.0 - dist / max_dist)).max(0.0));
        }
    }
    data
}

/// Creates a CAPE-like grid in J/kg increasing west to east from 0 to
/// `max`.
pub fn create_cape_grid(width: usize, height: usize, max: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / (width.max(2) - 1) as f32;
            data.push(x_factor * max);
        }
    }
    data
}

/// Creates a grid filled with a constant value.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}
