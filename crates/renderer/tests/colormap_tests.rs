//! Color-table selection by field name.

use renderer::colormap::{reflectivity_color, viridis_color};
use renderer::{select_color_table, Color, ColorTableId, FieldCategory};

#[test]
fn test_radar_field_uses_reflectivity_table() {
    assert_eq!(
        select_color_table("Simulated radar reflectivity"),
        ColorTableId::NwsReflectivity
    );
    assert_eq!(
        select_color_table("Composite REFLECTIVITY"),
        ColorTableId::NwsReflectivity
    );
}

#[test]
fn test_other_fields_use_viridis() {
    for name in [
        "Convective Available Potential Energy",
        "Significant Tornado Parameter",
        "",
        "refl",
    ] {
        assert_eq!(select_color_table(name), ColorTableId::Viridis, "{name}");
    }
}

#[test]
fn test_category_mapping_is_explicit() {
    assert_eq!(
        FieldCategory::classify("simulated radar reflectivity"),
        FieldCategory::Reflectivity
    );
    assert_eq!(FieldCategory::classify("CAPE"), FieldCategory::Generic);
    assert_eq!(
        ColorTableId::for_category(FieldCategory::Reflectivity),
        ColorTableId::NwsReflectivity
    );
    assert_eq!(
        ColorTableId::for_category(FieldCategory::Generic),
        ColorTableId::Viridis
    );
    assert_eq!(ColorTableId::Viridis.name(), "viridis");
}

#[test]
fn test_reflectivity_is_stepped() {
    // Same color within a 5 dBZ bin, different across bins
    assert_eq!(reflectivity_color(20.0), reflectivity_color(24.9));
    assert_ne!(reflectivity_color(24.9), reflectivity_color(25.0));

    let rgba = ColorTableId::NwsReflectivity.colorize(&[0.0, 22.0, f32::NAN]);
    assert_eq!(&rgba[0..4], &[0, 0, 0, 0]);
    assert_eq!(&rgba[4..8], &Color::rgb(0, 255, 0).to_array());
    assert_eq!(&rgba[8..12], &[0, 0, 0, 0]);
}

#[test]
fn test_viridis_is_monotonic_in_green() {
    let mut last = viridis_color(0.0).g;
    for i in 1..=20 {
        let g = viridis_color(i as f32 / 20.0).g;
        assert!(g >= last, "green channel decreased at step {i}");
        last = g;
    }
}
