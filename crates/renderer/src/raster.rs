//! Grid-to-image pixel layout.
//!
//! Grid row 0 is the bottom of the image (origin lower-left). Each grid
//! cell becomes a `scale` x `scale` block of pixels.

/// Lay out per-cell RGBA colors as image scanlines, top row first.
///
/// Returns the pixel buffer with its width and height.
pub fn layout_pixels(
    cells: &[u8],
    width: usize,
    height: usize,
    scale: usize,
) -> (Vec<u8>, usize, usize) {
    let scale = scale.max(1);
    let out_width = width * scale;
    let out_height = height * scale;
    let mut pixels = Vec::with_capacity(out_width * out_height * 4);

    for grid_row in (0..height).rev() {
        let row = &cells[grid_row * width * 4..(grid_row + 1) * width * 4];

        let mut scanline = Vec::with_capacity(out_width * 4);
        for cell in row.chunks_exact(4) {
            for _ in 0..scale {
                scanline.extend_from_slice(cell);
            }
        }

        for _ in 0..scale {
            pixels.extend_from_slice(&scanline);
        }
    }

    (pixels, out_width, out_height)
}
