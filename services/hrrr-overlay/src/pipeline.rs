//! Acquire, resolve and render overlays for one cycle.
//!
//! Missing source files and missing fields are expected in practice (cycles
//! are published late, not every file carries every field), so both become
//! [`OverlayOutcome::Skipped`] instead of errors. Everything else aborts the
//! run. A cycle file is acquired and decoded once per call, however many
//! overlays are drawn from it.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use grib2_parser::{
    resolve_in, FieldResolver, Grib2Error, ResolveError, TablesError, VariableSummary,
};
use overlay_common::{CycleId, FieldSlice};
use renderer::{RenderError, Renderer};
use thiserror::Error;
use tracing::{debug, info, instrument, warn, Span};

use crate::config::OverlayConfig;
use crate::download::{AcquireError, Acquirer};

/// The overlays produced for a cycle when no field is named:
/// (field name, output file prefix).
pub const DEFAULT_OVERLAYS: [(&str, &str); 3] = [
    ("Simulated radar reflectivity", "radar"),
    ("Significant Tornado Parameter", "sigtor"),
    ("Convective Available Potential Energy", "cape"),
];

/// Output file name for a default overlay: `<prefix>_<date>_<hour>_f00.png`.
pub fn default_output_name(prefix: &str, cycle: &CycleId) -> String {
    format!("{}_{}_{}_f00.png", prefix, cycle.date_str(), cycle.hour_str())
}

/// Errors that abort an overlay run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Acquisition failed: {0}")]
    Acquire(#[source] AcquireError),

    #[error("Failed to decode grid file: {0}")]
    Decode(#[from] Grib2Error),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Failed to load parameter tables: {0}")]
    Tables(#[from] TablesError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why an overlay produced no image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SourceNotFound { url: String, status: u16 },
    FieldNotFound { field: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SourceNotFound { url, status } => {
                write!(f, "source file {} returned HTTP {}", url, status)
            }
            SkipReason::FieldNotFound { field } => write!(f, "field '{}' not found", field),
        }
    }
}

/// Result of one overlay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayOutcome {
    Rendered(PathBuf),
    Skipped(SkipReason),
}

/// Acquirer, field resolver and renderer wired together.
#[derive(Debug, Clone)]
pub struct OverlayPipeline {
    acquirer: Acquirer,
    resolver: FieldResolver,
    renderer: Renderer,
}

impl OverlayPipeline {
    pub fn new(acquirer: Acquirer, resolver: FieldResolver, renderer: Renderer) -> Self {
        Self {
            acquirer,
            resolver,
            renderer,
        }
    }

    /// Build every stage from configuration. Directories are not created
    /// here; see [`crate::config::bootstrap`].
    pub fn from_config(config: &OverlayConfig) -> Result<Self, PipelineError> {
        let tables = config.load_tables()?;
        let acquirer = Acquirer::from_config(config).map_err(PipelineError::Acquire)?;
        let resolver = FieldResolver::new(Arc::new(tables));
        let renderer = Renderer::new(&config.output_dir).with_scale(config.scale);
        Ok(Self::new(acquirer, resolver, renderer))
    }

    /// Render `field_name` from the cycle's file into `output_name`.
    #[instrument(skip(self, cycle), fields(cycle = %cycle))]
    pub async fn run(
        &self,
        cycle: &CycleId,
        field_name: &str,
        output_name: &str,
    ) -> Result<OverlayOutcome, PipelineError> {
        let path = match self.acquire(cycle).await? {
            Ok(path) => path,
            Err(reason) => return Ok(OverlayOutcome::Skipped(reason)),
        };

        let resolver = self.resolver.clone();
        let renderer = self.renderer.clone();
        let field = field_name.to_string();
        let output = output_name.to_string();
        let span = Span::current();

        // Decoding and PNG encoding are CPU-bound
        let outcome = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            render_resolved(resolver.resolve(&path, &field, 0), &renderer, &field, &output)
        })
        .await??;

        Ok(outcome)
    }

    /// Render [`DEFAULT_OVERLAYS`] in order, continuing past skipped ones.
    ///
    /// The cycle file is fetched at most once. When the source has no file
    /// every overlay is skipped with the same reason.
    #[instrument(skip(self, cycle), fields(cycle = %cycle))]
    pub async fn run_defaults(
        &self,
        cycle: &CycleId,
    ) -> Result<Vec<(String, OverlayOutcome)>, PipelineError> {
        let jobs: Vec<(&'static str, String)> = DEFAULT_OVERLAYS
            .iter()
            .map(|&(field, prefix)| (field, default_output_name(prefix, cycle)))
            .collect();

        let path = match self.acquire(cycle).await? {
            Ok(path) => path,
            Err(reason) => {
                return Ok(jobs
                    .into_iter()
                    .map(|(_, output)| (output, OverlayOutcome::Skipped(reason.clone())))
                    .collect());
            }
        };

        let resolver = self.resolver.clone();
        let renderer = self.renderer.clone();
        let span = Span::current();

        let outcomes = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let dataset = resolver.open(&path)?;

            jobs.into_iter()
                .map(|(field, output)| {
                    let outcome =
                        render_resolved(resolve_in(&dataset, field, 0), &renderer, field, &output)?;
                    Ok((output, outcome))
                })
                .collect::<Result<Vec<_>, PipelineError>>()
        })
        .await??;

        for (output, outcome) in &outcomes {
            match outcome {
                OverlayOutcome::Rendered(path) => {
                    info!(output = %output, path = %path.display(), "Overlay rendered")
                }
                OverlayOutcome::Skipped(reason) => {
                    info!(output = %output, reason = %reason, "Overlay skipped")
                }
            }
        }

        Ok(outcomes)
    }

    /// Variables in the cycle's file, or the reason none could be listed.
    #[instrument(skip(self, cycle), fields(cycle = %cycle))]
    pub async fn list(
        &self,
        cycle: &CycleId,
    ) -> Result<Result<Vec<VariableSummary>, SkipReason>, PipelineError> {
        let path = match self.acquire(cycle).await? {
            Ok(path) => path,
            Err(reason) => return Ok(Err(reason)),
        };

        let resolver = self.resolver.clone();
        let variables = tokio::task::spawn_blocking(move || resolver.list_variables(&path)).await??;
        Ok(Ok(variables))
    }

    /// Acquire the cycle file, turning "not found" into a skip reason.
    async fn acquire(&self, cycle: &CycleId) -> Result<Result<PathBuf, SkipReason>, PipelineError> {
        match self.acquirer.acquire(cycle).await {
            Ok(acquisition) => {
                debug!(
                    path = %acquisition.path().display(),
                    downloaded = acquisition.was_downloaded(),
                    "Cycle file ready"
                );
                Ok(Ok(acquisition.into_path()))
            }
            Err(AcquireError::NotFound { url, status }) => {
                Ok(Err(SkipReason::SourceNotFound { url, status }))
            }
            Err(e) => Err(PipelineError::Acquire(e)),
        }
    }
}

/// Render a resolved slice, turning a missing field into a skip.
fn render_resolved(
    resolved: Result<FieldSlice, ResolveError>,
    renderer: &Renderer,
    field: &str,
    output: &str,
) -> Result<OverlayOutcome, PipelineError> {
    match resolved {
        Ok(slice) => Ok(OverlayOutcome::Rendered(renderer.render(&slice, field, output)?)),
        Err(ResolveError::FieldNotFound { field, available }) => {
            warn!(
                field = %field,
                available = available.len(),
                "Field not found, skipping overlay"
            );
            Ok(OverlayOutcome::Skipped(SkipReason::FieldNotFound { field }))
        }
        Err(ResolveError::Decode(e)) => Err(PipelineError::Decode(e)),
    }
}
