//! Color tables and their selection by field category.

use overlay_common::finite_range;
use serde::{Deserialize, Serialize};

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Coarse field category used to pick a color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldCategory {
    Reflectivity,
    Generic,
}

impl FieldCategory {
    /// Reflectivity when the name mentions "reflectivity" (any case),
    /// otherwise generic.
    pub fn classify(field_name: &str) -> Self {
        if field_name.to_lowercase().contains("reflectivity") {
            FieldCategory::Reflectivity
        } else {
            FieldCategory::Generic
        }
    }
}

/// Identifier of a color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorTableId {
    /// Stepped NWS radar palette anchored to fixed dBZ bins, below 5 dBZ
    /// transparent. Unlike a palette stretched over the slice's own
    /// min..max, the same dBZ always gets the same color.
    NwsReflectivity,
    /// Perceptually uniform continuous colormap, autoscaled
    Viridis,
}

impl ColorTableId {
    pub fn for_category(category: FieldCategory) -> Self {
        match category {
            FieldCategory::Reflectivity => ColorTableId::NwsReflectivity,
            FieldCategory::Generic => ColorTableId::Viridis,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorTableId::NwsReflectivity => "nws_reflectivity",
            ColorTableId::Viridis => "viridis",
        }
    }

    /// Map values to RGBA bytes, 4 per value, in input order.
    ///
    /// NaN is transparent in every table.
    pub fn colorize(&self, values: &[f32]) -> Vec<u8> {
        match self {
            ColorTableId::NwsReflectivity => values
                .iter()
                .flat_map(|&v| reflectivity_color(v).to_array())
                .collect(),
            ColorTableId::Viridis => {
                let (min, max) = finite_range(values).unwrap_or((0.0, 0.0));
                // f64 so spans wider than f32::MAX stay finite
                let min = min as f64;
                let range = max as f64 - min;
                values
                    .iter()
                    .flat_map(|&v| {
                        if v.is_nan() {
                            return Color::transparent().to_array();
                        }
                        let t = if range > 0.0 {
                            ((v as f64 - min) / range) as f32
                        } else {
                            0.0
                        };
                        viridis_color(t).to_array()
                    })
                    .collect()
            }
        }
    }
}

/// Color table for a human-readable field name.
pub fn select_color_table(field_name: &str) -> ColorTableId {
    ColorTableId::for_category(FieldCategory::classify(field_name))
}

/// Lower bin edge (dBZ) and color, 5 dBZ per bin.
const REFLECTIVITY_BINS: [(f32, Color); 14] = [
    (5.0, Color::rgb(0, 236, 236)),
    (10.0, Color::rgb(1, 160, 246)),
    (15.0, Color::rgb(0, 0, 246)),
    (20.0, Color::rgb(0, 255, 0)),
    (25.0, Color::rgb(0, 200, 0)),
    (30.0, Color::rgb(0, 144, 0)),
    (35.0, Color::rgb(255, 255, 0)),
    (40.0, Color::rgb(231, 192, 0)),
    (45.0, Color::rgb(255, 144, 0)),
    (50.0, Color::rgb(255, 0, 0)),
    (55.0, Color::rgb(214, 0, 0)),
    (60.0, Color::rgb(192, 0, 0)),
    (65.0, Color::rgb(255, 0, 255)),
    (70.0, Color::rgb(153, 85, 201)),
];

/// NWS reflectivity color for a dBZ value.
///
/// Below 5 dBZ (and NaN) is transparent; 70 dBZ and above share the top
/// bin.
pub fn reflectivity_color(dbz: f32) -> Color {
    REFLECTIVITY_BINS
        .iter()
        .rev()
        .find(|(edge, _)| dbz >= *edge)
        .map(|&(_, color)| color)
        .unwrap_or(Color::transparent())
}

const VIRIDIS: [Color; 11] = [
    Color::rgb(0x44, 0x01, 0x54),
    Color::rgb(0x48, 0x24, 0x75),
    Color::rgb(0x41, 0x44, 0x87),
    Color::rgb(0x35, 0x5f, 0x8d),
    Color::rgb(0x2a, 0x78, 0x8e),
    Color::rgb(0x21, 0x91, 0x8c),
    Color::rgb(0x22, 0xa8, 0x84),
    Color::rgb(0x44, 0xbf, 0x70),
    Color::rgb(0x7a, 0xd1, 0x51),
    Color::rgb(0xbd, 0xdf, 0x26),
    Color::rgb(0xfd, 0xe7, 0x25),
];

/// Viridis color for a normalized value; `t` is clamped to 0..=1.
pub fn viridis_color(t: f32) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let segments = (VIRIDIS.len() - 1) as f32;
    let pos = t * segments;
    let i = (pos.floor() as usize).min(VIRIDIS.len() - 2);
    interpolate_color(VIRIDIS[i], VIRIDIS[i + 1], pos - i as f32)
}

/// Linear color interpolation
fn interpolate_color(color1: Color, color2: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflectivity_bins() {
        assert_eq!(reflectivity_color(-10.0), Color::transparent());
        assert_eq!(reflectivity_color(4.99), Color::transparent());
        assert_eq!(reflectivity_color(5.0), Color::rgb(0, 236, 236));
        assert_eq!(reflectivity_color(37.5), Color::rgb(255, 255, 0));
        assert_eq!(reflectivity_color(70.0), Color::rgb(153, 85, 201));
        assert_eq!(reflectivity_color(95.0), Color::rgb(153, 85, 201));
        assert_eq!(reflectivity_color(f32::NAN), Color::transparent());
    }

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis_color(0.0), Color::rgb(0x44, 0x01, 0x54));
        assert_eq!(viridis_color(1.0), Color::rgb(0xfd, 0xe7, 0x25));
        assert_eq!(viridis_color(-3.0), viridis_color(0.0));
        assert_eq!(viridis_color(0.5), Color::rgb(0x21, 0x91, 0x8c));
    }

    #[test]
    fn test_interpolate_midpoint() {
        let c = interpolate_color(Color::rgb(0, 0, 0), Color::rgb(200, 100, 50), 0.5);
        assert_eq!(c, Color::rgb(100, 50, 25));
    }

    #[test]
    fn test_viridis_autoscale_and_nan() {
        let rgba = ColorTableId::Viridis.colorize(&[10.0, f32::NAN, 30.0]);
        assert_eq!(&rgba[0..4], &viridis_color(0.0).to_array());
        assert_eq!(&rgba[4..8], &[0, 0, 0, 0]);
        assert_eq!(&rgba[8..12], &viridis_color(1.0).to_array());
    }

    #[test]
    fn test_viridis_range_wider_than_f32() {
        let rgba = ColorTableId::Viridis.colorize(&[-3.0e38, 0.0, 3.0e38]);
        assert_eq!(&rgba[0..4], &viridis_color(0.0).to_array());
        assert_eq!(&rgba[4..8], &viridis_color(0.5).to_array());
        assert_eq!(&rgba[8..12], &viridis_color(1.0).to_array());
    }

    #[test]
    fn test_constant_field_maps_to_low_end() {
        let rgba = ColorTableId::Viridis.colorize(&[7.0, 7.0]);
        assert_eq!(&rgba[0..4], &viridis_color(0.0).to_array());
        assert_eq!(&rgba[4..8], &viridis_color(0.0).to_array());
    }
}
