//! Benchmarks for overlay rendering: colorizing, pixel layout and PNG encoding.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use overlay_common::FieldSlice;
use renderer::{png, raster, ColorTableId, Renderer};
use test_utils::{create_cape_grid, create_reflectivity_grid};

/// HRRR CONUS grid dimensions
const HRRR_WIDTH: usize = 1799;
const HRRR_HEIGHT: usize = 1059;

fn bench_colorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("colorize");

    let refl = create_reflectivity_grid(HRRR_WIDTH, HRRR_HEIGHT, 70.0);
    let cape = create_cape_grid(HRRR_WIDTH, HRRR_HEIGHT, 4000.0);
    group.throughput(Throughput::Elements((HRRR_WIDTH * HRRR_HEIGHT) as u64));

    group.bench_function("nws_reflectivity", |b| {
        b.iter(|| ColorTableId::NwsReflectivity.colorize(black_box(&refl)))
    });
    group.bench_function("viridis", |b| {
        b.iter(|| ColorTableId::Viridis.colorize(black_box(&cape)))
    });

    group.finish();
}

fn bench_png(c: &mut Criterion) {
    let mut group = c.benchmark_group("png_encode");

    for (name, table, values) in [
        (
            "indexed",
            ColorTableId::NwsReflectivity,
            create_reflectivity_grid(HRRR_WIDTH, HRRR_HEIGHT, 70.0),
        ),
        (
            "rgba",
            ColorTableId::Viridis,
            create_cape_grid(HRRR_WIDTH, HRRR_HEIGHT, 4000.0),
        ),
    ] {
        let cells = table.colorize(&values);
        let (pixels, w, h) = raster::layout_pixels(&cells, HRRR_WIDTH, HRRR_HEIGHT, 1);
        group.bench_with_input(BenchmarkId::new("auto", name), &pixels, |b, pixels| {
            b.iter(|| png::create_png_auto(black_box(pixels), w, h))
        });
    }

    group.finish();
}

fn bench_full_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_slice");

    for scale in [1usize, 2] {
        let slice = FieldSlice::new(
            "REFD - Simulated radar reflectivity @ 1000 m above ground",
            HRRR_WIDTH,
            HRRR_HEIGHT,
            create_reflectivity_grid(HRRR_WIDTH, HRRR_HEIGHT, 70.0),
        )
        .unwrap();
        let renderer = Renderer::new(std::env::temp_dir()).with_scale(scale);

        group.bench_with_input(BenchmarkId::new("radar", scale), &slice, |b, slice| {
            b.iter(|| renderer.encode(black_box(slice), "Simulated radar reflectivity"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_colorize, bench_png, bench_full_render);
criterion_main!(benches);
