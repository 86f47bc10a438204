//! Runtime configuration for the overlay pipeline.

use std::path::PathBuf;
use std::time::Duration;

use grib2_parser::{Grib2Tables, TablesError};
use tracing::info;

use crate::download::DEFAULT_URL_TEMPLATE;

/// Directory roots and tunables shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Where downloaded cycle files are kept
    pub cache_dir: PathBuf,
    /// Where rendered images are written
    pub output_dir: PathBuf,
    /// Source URL with `{date}` and `{hour}` placeholders
    pub url_template: String,
    /// Optional YAML file extending the built-in parameter tables
    pub tables_path: Option<PathBuf>,
    /// Pixels per grid cell along each axis
    pub scale: usize,
    /// Whole-request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("hrrr_cache"),
            output_dir: PathBuf::from("hrrr_images"),
            url_template: DEFAULT_URL_TEMPLATE.to_string(),
            tables_path: None,
            scale: 1,
            request_timeout: None,
        }
    }
}

impl OverlayConfig {
    /// Built-in HRRR tables merged with `tables_path`, if set.
    pub fn load_tables(&self) -> Result<Grib2Tables, TablesError> {
        Grib2Tables::load(self.tables_path.as_deref())
    }
}

/// Create the cache and output directories. Existing directories are fine.
pub async fn bootstrap(config: &OverlayConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.cache_dir).await?;
    tokio::fs::create_dir_all(&config.output_dir).await?;
    info!(
        cache_dir = %config.cache_dir.display(),
        output_dir = %config.output_dir.display(),
        "Directories ready"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OverlayConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("hrrr_cache"));
        assert_eq!(config.output_dir, PathBuf::from("hrrr_images"));
        assert_eq!(config.scale, 1);
        assert!(config.request_timeout.is_none());
        assert!(config.url_template.contains("{date}"));
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let config = OverlayConfig {
            cache_dir: root.path().join("a/cache"),
            output_dir: root.path().join("b/images"),
            ..OverlayConfig::default()
        };

        bootstrap(&config).await.unwrap();
        bootstrap(&config).await.unwrap();
        assert!(config.cache_dir.is_dir());
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn test_missing_tables_file() {
        let config = OverlayConfig {
            tables_path: Some(PathBuf::from("/nonexistent/tables.yaml")),
            ..OverlayConfig::default()
        };
        assert!(matches!(config.load_tables(), Err(TablesError::Io { .. })));
    }
}
