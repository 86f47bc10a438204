//! GRIB2 data unpacking.
//!
//! Simple packing (template 5.0) is decoded here. Complex packing,
//! JPEG2000 and PNG packed messages go through the `grib` crate.

use std::io::Cursor;

use crate::{Grib2Error, Grib2Result};

/// Unpack simple packed GRIB2 data.
///
/// Formula: value = (R + X * 2^E) / 10^D. When a bitmap is given, packed
/// values exist only for points whose bit is set; masked points are `NaN`.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: u32,
    bits_per_value: u8,
    reference_value: f32,
    binary_scale_factor: i16,
    decimal_scale_factor: i16,
    bitmap: Option<&[u8]>,
) -> Grib2Result<Vec<f32>> {
    let num_points = num_points as usize;
    let binary_scale = 2.0_f64.powi(binary_scale_factor as i32);
    let decimal_scale = 10.0_f64.powi(-(decimal_scale_factor as i32));
    let reference = reference_value as f64;

    let mut reader = BitReader::new(packed_data);
    let mut values = Vec::with_capacity(num_points);

    for i in 0..num_points {
        if let Some(bm) = bitmap {
            if !bitmap_bit(bm, i) {
                values.push(f32::NAN);
                continue;
            }
        }

        let packed = if bits_per_value == 0 {
            0
        } else {
            reader.read(bits_per_value).ok_or_else(|| {
                Grib2Error::UnpackingError(format!(
                    "Packed data exhausted at point {} of {}",
                    i, num_points
                ))
            })?
        };

        let value = (reference + packed as f64 * binary_scale) * decimal_scale;
        values.push(value as f32);
    }

    Ok(values)
}

/// Decode a whole message with the `grib` crate.
///
/// `template` is the Section 5 template number, reported when the crate
/// has no decoder for it.
pub fn decode_with_grib_crate(message: &[u8], template: u16) -> Grib2Result<Vec<f32>> {
    let grib2 = grib::from_reader(Cursor::new(message))
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate could not read message: {}", e)))?;

    let (_, submessage) = grib2
        .iter()
        .next()
        .ok_or_else(|| Grib2Error::UnpackingError("Message has no submessages".to_string()))?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage).map_err(|_| {
        Grib2Error::UnsupportedTemplate {
            section: 5,
            template,
        }
    })?;
    let values = decoder
        .dispatch()
        .map_err(|e| Grib2Error::UnpackingError(format!("Decoding failed: {}", e)))?;

    Ok(values.collect())
}

fn bitmap_bit(bitmap: &[u8], index: usize) -> bool {
    match bitmap.get(index / 8) {
        Some(byte) => (byte >> (7 - (index % 8))) & 1 == 1,
        None => true,
    }
}

/// MSB-first bit reader over packed data.
struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Read `bits` (1-32) bits as an unsigned integer.
    fn read(&mut self, bits: u8) -> Option<u32> {
        let bits = bits as usize;
        if bits == 0 || bits > 32 || self.position + bits > self.data.len() * 8 {
            return None;
        }

        let mut result = 0u32;
        for _ in 0..bits {
            let byte = self.data[self.position / 8];
            let bit = (byte >> (7 - (self.position % 8))) & 1;
            result = (result << 1) | bit as u32;
            self.position += 1;
        }
        Some(result)
    }
}
