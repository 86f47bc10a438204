//! GRIB2 section parsing.
//!
//! Each GRIB2 message consists of a fixed 16-byte indicator followed by
//! length-prefixed sections (1, optional 2, 3, 4, 5, 6, 7) and the "7777"
//! end marker. Only the fields needed to name a variable and unpack its
//! values are decoded here.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};

use crate::tables::Grib2Tables;
use crate::Grib2Error;

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub reference_time: DateTime<Utc>,
}

/// Section 3: Grid Definition Section
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub template_number: u16,
    pub num_data_points: u32,
    /// Ni / Nx: points along a row
    pub num_points_longitude: u32,
    /// Nj / Ny: number of rows
    pub num_points_latitude: u32,
    pub scanning_mode: u8,
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template_number: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub parameter_short_name: String,
    pub parameter_long_name: String,
    pub level_type: u8,
    pub level_value: u32,
    pub level_description: String,
    pub forecast_time: u32,
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    pub num_data_points: u32,
    pub template_number: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
}

/// Section 6: Bitmap Section
#[derive(Debug, Clone)]
pub struct Bitmap {
    /// 0 when the bitmap follows in `data`; other values reference
    /// predefined or previously defined bitmaps
    pub indicator: u8,
    pub data: Bytes,
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from start of message
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 5-6 reserved, 7 discipline, 8 edition, 9-16 total length
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    let mut length = [0u8; 8];
    length.copy_from_slice(&data[8..16]);

    Ok(Indicator {
        discipline,
        edition,
        message_length: u64::from_be_bytes(length),
    })
}

/// Parse Section 1 (Identification), located right after Section 0.
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    let offset = find_section(data, 1)?;
    let sec = &data[offset..];

    if sec.len() < 19 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: "Not enough data".to_string(),
        });
    }

    let center = u16::from_be_bytes([sec[5], sec[6]]);
    let sub_center = u16::from_be_bytes([sec[7], sec[8]]);

    let year = u16::from_be_bytes([sec[12], sec[13]]);
    let (month, day, hour, minute, second) = (sec[14], sec[15], sec[16], sec[17], sec[18]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "Invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    Ok(Identification {
        center,
        sub_center,
        reference_time: DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc),
    })
}

/// Parse Section 3 (Grid Definition).
///
/// Ni/Nj sit at the same template offsets for the lat/lon (3.0) and
/// Lambert conformal (3.30) templates; the scanning mode octet differs.
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, Grib2Error> {
    let offset = find_section(data, 3)?;
    let sec = &data[offset..];

    if sec.len() < 38 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "Not enough data".to_string(),
        });
    }

    let num_data_points = u32::from_be_bytes([sec[6], sec[7], sec[8], sec[9]]);
    let template_number = u16::from_be_bytes([sec[12], sec[13]]);

    let gd = &sec[14..];
    let ni = u32::from_be_bytes([gd[16], gd[17], gd[18], gd[19]]);
    let nj = u32::from_be_bytes([gd[20], gd[21], gd[22], gd[23]]);

    let scanning_mode = match template_number {
        0 => gd.get(57).copied(),
        30 => gd.get(50).copied(),
        _ => None,
    }
    .unwrap_or(0);

    Ok(GridDefinition {
        template_number,
        num_data_points,
        num_points_longitude: ni,
        num_points_latitude: nj,
        scanning_mode,
    })
}

/// Parse Section 4 (Product Definition) and name the parameter and level.
pub fn parse_product_definition(
    data: &[u8],
    discipline: u8,
    tables: &Grib2Tables,
) -> Result<ProductDefinition, Grib2Error> {
    let offset = find_section(data, 4)?;
    let sec = &data[offset..];

    if sec.len() < 28 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 8-9 template number, 10 category, 11 number; for templates
    // 4.0 and its derivatives: 19-22 forecast time, 23 first surface type,
    // 24 scale factor, 25-28 scaled value.
    let template_number = u16::from_be_bytes([sec[7], sec[8]]);
    let parameter_category = sec[9];
    let parameter_number = sec[10];
    let forecast_time = u32::from_be_bytes([sec[18], sec[19], sec[20], sec[21]]);
    let level_type = sec[22];
    let level_value = u32::from_be_bytes([sec[24], sec[25], sec[26], sec[27]]);

    let info = tables.get_parameter(discipline, parameter_category, parameter_number);
    let level_description = tables.get_level_description(level_type, level_value);

    Ok(ProductDefinition {
        template_number,
        parameter_category,
        parameter_number,
        parameter_short_name: info.short_name,
        parameter_long_name: info.long_name,
        level_type,
        level_value,
        level_description,
        forecast_time,
    })
}

/// Parse Section 5 (Data Representation)
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let offset = find_section(data, 5)?;
    let sec = &data[offset..];

    if sec.len() < 20 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "Not enough data".to_string(),
        });
    }

    // Octets 6-9 number of points, 10-11 template number. Templates 5.0,
    // 5.2, 5.3, 5.40 and 5.41 share the leading simple-packing fields:
    // 12-15 reference value (IEEE float), 16-17 E, 18-19 D, 20 bits.
    let num_data_points = u32::from_be_bytes([sec[5], sec[6], sec[7], sec[8]]);
    let template_number = u16::from_be_bytes([sec[9], sec[10]]);
    let reference_value = f32::from_be_bytes([sec[11], sec[12], sec[13], sec[14]]);
    let binary_scale_factor = decode_grib2_signed_i16(&[sec[15], sec[16]]);
    let decimal_scale_factor = decode_grib2_signed_i16(&[sec[17], sec[18]]);
    let bits_per_value = sec[19];

    Ok(DataRepresentation {
        num_data_points,
        template_number,
        reference_value,
        binary_scale_factor,
        decimal_scale_factor,
        bits_per_value,
    })
}

/// Parse Section 6 (Bitmap). Returns `None` when no bitmap applies.
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Bitmap>, Grib2Error> {
    let offset = match find_section(data, 6) {
        Ok(offset) => offset,
        Err(_) => return Ok(None),
    };
    let sec = &data[offset..];

    if sec.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "Not enough data".to_string(),
        });
    }

    let length = section_length(sec);
    let indicator = sec[5];

    if indicator == 255 {
        return Ok(None);
    }

    let bitmap = if indicator == 0 && length > 6 {
        Bytes::copy_from_slice(&sec[6..length])
    } else {
        Bytes::new()
    };

    Ok(Some(Bitmap {
        indicator,
        data: bitmap,
    }))
}

/// Parse Section 7 (Data)
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let offset = find_section(data, 7)?;
    let sec = &data[offset..];
    let length = section_length(sec);

    let packed = if length > 5 {
        Bytes::copy_from_slice(&sec[5..length])
    } else {
        Bytes::new()
    };

    Ok(DataSection { data: packed })
}

// ===== Helper Functions =====

/// Decode a 16-bit GRIB2 sign-magnitude integer (scale factors).
pub fn decode_grib2_signed_i16(bytes: &[u8; 2]) -> i16 {
    let raw = u16::from_be_bytes(*bytes);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

fn section_length(sec: &[u8]) -> usize {
    u32::from_be_bytes([sec[0], sec[1], sec[2], sec[3]]) as usize
}

/// Find a section by number within a message, returning its byte offset.
///
/// Only the first occurrence is returned; repeated submessages within one
/// message are not split out.
fn find_section(data: &[u8], section_num: u8) -> Result<usize, Grib2Error> {
    let mut offset = 16;

    loop {
        if offset + 5 > data.len() || &data[offset..offset + 4] == b"7777" {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Section not found".to_string(),
            });
        }

        let length = section_length(&data[offset..]);
        if length < 5 || offset + length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "Invalid section length".to_string(),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(offset);
        }

        offset += length;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_signed_i16() {
        assert_eq!(decode_grib2_signed_i16(&[0x00, 0x09]), 9);
        assert_eq!(decode_grib2_signed_i16(&[0x80, 0x09]), -9);
        assert_eq!(decode_grib2_signed_i16(&[0x7F, 0xFF]), i16::MAX);
    }

    #[test]
    fn test_parse_indicator() {
        let mut data = b"GRIB".to_vec();
        data.extend_from_slice(&[0, 0, 0, 2]);
        data.extend_from_slice(&1234u64.to_be_bytes());

        let indicator = parse_indicator(&data).unwrap();
        assert_eq!(indicator.discipline, 0);
        assert_eq!(indicator.edition, 2);
        assert_eq!(indicator.message_length, 1234);
    }

    #[test]
    fn test_parse_indicator_rejects_edition_1() {
        let mut data = b"GRIB".to_vec();
        data.extend_from_slice(&[0, 0, 0, 1]);
        data.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            parse_indicator(&data),
            Err(Grib2Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_find_section_walks_lengths() {
        let mut data = vec![0u8; 16];
        // Section 1 (6 bytes), Section 3 (5 bytes), end marker
        data.extend_from_slice(&[0, 0, 0, 6, 1, 0xAA]);
        data.extend_from_slice(&[0, 0, 0, 5, 3]);
        data.extend_from_slice(b"7777");

        assert_eq!(find_section(&data, 1).unwrap(), 16);
        assert_eq!(find_section(&data, 3).unwrap(), 22);
        assert!(find_section(&data, 4).is_err());
    }
}
