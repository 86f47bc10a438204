//! End-to-end overlay runs: source -> cache -> decode -> PNG.

mod common;

use common::{test_cycle, MockSource};
use hrrr_overlay::{
    bootstrap, default_output_name, Acquirer, OverlayConfig, OverlayOutcome, OverlayPipeline,
    PipelineError, SkipReason,
};
use test_utils::{
    build_file, create_cape_grid, create_reflectivity_grid, list_file_names, Grib2Builder,
    TempDirs,
};

const WIDTH: usize = 8;
const HEIGHT: usize = 6;

fn radar_message() -> Grib2Builder {
    Grib2Builder::new_hrrr()
        .with_parameter(16, 195)
        .with_level(103, 1000)
        .with_data(create_reflectivity_grid(WIDTH, HEIGHT, 60.0))
}

fn cape_message() -> Grib2Builder {
    Grib2Builder::new_hrrr().with_data(create_cape_grid(WIDTH, HEIGHT, 3000.0))
}

fn stp_message() -> Grib2Builder {
    Grib2Builder::new_hrrr()
        .with_parameter(7, 250)
        .with_gradient(0.0, 4.0)
}

/// Pipeline over `config`, with its directories created.
async fn pipeline(config: &OverlayConfig) -> OverlayPipeline {
    bootstrap(config).await.unwrap();
    OverlayPipeline::from_config(config).unwrap()
}

#[tokio::test]
async fn test_renders_from_prepopulated_cache() {
    let dirs = TempDirs::created();
    let cycle = test_cycle();
    let source = MockSource::empty().await;

    let config = OverlayConfig {
        tables_path: Some(dirs.write_stp_table()),
        ..source.config(&dirs)
    };
    let file = build_file(&[radar_message(), cape_message(), stp_message()]);
    let cached = Acquirer::from_config(&config).unwrap().cache_path(&cycle);
    std::fs::write(&cached, file).unwrap();

    let pipeline = pipeline(&config).await;
    let outcome = pipeline
        .run(&cycle, "Significant Tornado Parameter", "sigtor_20240615_12_f00.png")
        .await
        .unwrap();

    let expected = dirs.output_dir().join("sigtor_20240615_12_f00.png");
    assert_eq!(outcome, OverlayOutcome::Rendered(expected.clone()));
    assert_eq!(source.hits(), 0);

    let image = image::open(&expected).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (WIDTH as u32, HEIGHT as u32));
}

#[tokio::test]
async fn test_downloads_then_renders() {
    let dirs = TempDirs::new();
    let cycle = test_cycle();
    let source = MockSource::with_cycle(&cycle, build_file(&[radar_message()])).await;
    let pipeline = pipeline(&source.config(&dirs)).await;

    let outcome = pipeline
        .run(&cycle, "simulated RADAR reflectivity", "radar.png")
        .await
        .unwrap();
    assert!(matches!(outcome, OverlayOutcome::Rendered(_)));
    assert_eq!(source.hits(), 1);

    // Peak at the grid center renders opaque; the 0 dBZ corners stay clear
    let image = image::open(dirs.output_dir().join("radar.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert!(image.pixels().any(|p| p[3] == 255));

    // A second run is served from the cache
    pipeline.run(&cycle, "reflectivity", "radar2.png").await.unwrap();
    assert_eq!(source.hits(), 1);
}

#[tokio::test]
async fn test_unknown_field_is_skipped() {
    let dirs = TempDirs::new();
    let cycle = test_cycle();
    let source = MockSource::with_cycle(&cycle, build_file(&[cape_message()])).await;
    let pipeline = pipeline(&source.config(&dirs)).await;

    let outcome = pipeline
        .run(&cycle, "Significant Tornado Parameter", "sigtor.png")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        OverlayOutcome::Skipped(SkipReason::FieldNotFound {
            field: "Significant Tornado Parameter".to_string()
        })
    );
    assert!(list_file_names(dirs.output_dir()).is_empty());
}

#[tokio::test]
async fn test_missing_source_is_skipped() {
    let dirs = TempDirs::new();
    let cycle = test_cycle();
    let source = MockSource::empty().await;
    let pipeline = pipeline(&source.config(&dirs)).await;

    let outcome = pipeline.run(&cycle, "reflectivity", "radar.png").await.unwrap();
    match outcome {
        OverlayOutcome::Skipped(SkipReason::SourceNotFound { status, .. }) => {
            assert_eq!(status, 404)
        }
        other => panic!("expected a skipped source, got {other:?}"),
    }
    assert!(list_file_names(dirs.cache_dir()).is_empty());
    assert!(list_file_names(dirs.output_dir()).is_empty());
}

#[tokio::test]
async fn test_non_grib_cache_file_is_a_decode_error() {
    let dirs = TempDirs::created();
    let cycle = test_cycle();
    let source = MockSource::empty().await;
    let config = source.config(&dirs);

    let cached = Acquirer::from_config(&config).unwrap().cache_path(&cycle);
    std::fs::write(&cached, b"<html><body>Service Unavailable</body></html>").unwrap();

    let err = pipeline(&config)
        .await
        .run(&cycle, "reflectivity", "radar.png")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
    assert!(list_file_names(dirs.output_dir()).is_empty());
}

#[tokio::test]
async fn test_default_overlays_continue_past_skips() {
    let dirs = TempDirs::new();
    let cycle = test_cycle();
    let source =
        MockSource::with_cycle(&cycle, build_file(&[radar_message(), cape_message()])).await;
    let pipeline = pipeline(&source.config(&dirs)).await;

    let outcomes = pipeline.run_defaults(&cycle).await.unwrap();
    let names: Vec<&str> = outcomes.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "radar_20240615_12_f00.png",
            "sigtor_20240615_12_f00.png",
            "cape_20240615_12_f00.png",
        ]
    );

    assert!(matches!(outcomes[0].1, OverlayOutcome::Rendered(_)));
    assert!(matches!(
        outcomes[1].1,
        OverlayOutcome::Skipped(SkipReason::FieldNotFound { .. })
    ));
    assert!(matches!(outcomes[2].1, OverlayOutcome::Rendered(_)));

    assert_eq!(
        list_file_names(dirs.output_dir()),
        vec![
            default_output_name("cape", &cycle),
            default_output_name("radar", &cycle),
        ]
    );
    assert_eq!(source.hits(), 1);
}

#[tokio::test]
async fn test_default_overlays_request_missing_source_once() {
    let dirs = TempDirs::new();
    let cycle = test_cycle();
    let source = MockSource::empty().await;
    let pipeline = pipeline(&source.config(&dirs)).await;

    let outcomes = pipeline.run_defaults(&cycle).await.unwrap();
    assert_eq!(source.hits(), 1);
    assert_eq!(outcomes.len(), 3);
    for (_, outcome) in &outcomes {
        assert!(matches!(
            outcome,
            OverlayOutcome::Skipped(SkipReason::SourceNotFound { status: 404, .. })
        ));
    }
    assert!(list_file_names(dirs.cache_dir()).is_empty());
    assert!(list_file_names(dirs.output_dir()).is_empty());
}

#[tokio::test]
async fn test_default_overlays_decode_error_stops_run() {
    let dirs = TempDirs::created();
    let cycle = test_cycle();
    let source = MockSource::empty().await;
    let config = source.config(&dirs);

    let cached = Acquirer::from_config(&config).unwrap().cache_path(&cycle);
    std::fs::write(&cached, b"<html>proxy error</html>").unwrap();

    let err = pipeline(&config).await.run_defaults(&cycle).await.unwrap_err();
    assert!(matches!(err, PipelineError::Decode(_)));
    assert_eq!(source.hits(), 0);
    assert!(list_file_names(dirs.output_dir()).is_empty());
}

#[tokio::test]
async fn test_list_variables() {
    let dirs = TempDirs::new();
    let cycle = test_cycle();
    let source =
        MockSource::with_cycle(&cycle, build_file(&[radar_message(), cape_message()])).await;
    let pipeline = pipeline(&source.config(&dirs)).await;

    let variables = pipeline.list(&cycle).await.unwrap().unwrap();
    let keys: Vec<&str> = variables.iter().map(|v| v.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "REFD - Simulated radar reflectivity @ 1000 m above ground",
            "CAPE - Convective Available Potential Energy @ surface",
        ]
    );
    assert!(variables.iter().all(|v| v.width == WIDTH && v.height == HEIGHT));

    let empty = MockSource::empty().await;
    let other = TempDirs::new();
    let reason = OverlayPipeline::from_config(&empty.config(&other))
        .unwrap()
        .list(&cycle)
        .await;
    // Cache directory was never created, so the 404 is reported before any write
    assert!(matches!(reason, Ok(Err(SkipReason::SourceNotFound { .. }))));
}
