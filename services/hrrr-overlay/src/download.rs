//! Cache-first acquisition of HRRR cycle files.
//!
//! A cycle's file is fetched at most once: if `<cache_dir>/hrrr_<date>_<hour>.grib2`
//! exists it is returned without touching the network. Otherwise the body
//! is streamed to a `.partial` file that is renamed into place only after
//! the transfer completes, so an interrupted download never leaves a file
//! at the cache path.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use overlay_common::CycleId;
use reqwest::{Client, Response, StatusCode};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::config::OverlayConfig;

/// NOAA open-data bucket, pressure-level file, analysis hour.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://noaa-hrrr-bdp-pds.s3.amazonaws.com/hrrr.{date}/conus/hrrr.t{hour}z.wrfprsf00.grib2";

/// Bytes between progress log lines.
const PROGRESS_INTERVAL: u64 = 1_000_000;

/// Errors from acquiring a cycle file.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// The source answered with something other than 200.
    #[error("Source file not available: {url} returned HTTP {status}")]
    NotFound { url: String, status: u16 },

    #[error("HTTP transfer failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A local cycle file and how it got there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// Already in the cache; no network access happened
    Cached(PathBuf),
    /// Fetched by this call
    Downloaded(PathBuf),
}

impl Acquisition {
    pub fn path(&self) -> &Path {
        match self {
            Acquisition::Cached(path) | Acquisition::Downloaded(path) => path,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Acquisition::Cached(path) | Acquisition::Downloaded(path) => path,
        }
    }

    pub fn was_downloaded(&self) -> bool {
        matches!(self, Acquisition::Downloaded(_))
    }
}

/// Fetches cycle files into a local cache directory.
#[derive(Debug, Clone)]
pub struct Acquirer {
    client: Client,
    cache_dir: PathBuf,
    url_template: String,
}

impl Acquirer {
    /// Create an acquirer. `timeout` bounds each whole request; `None`
    /// leaves requests unbounded.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        url_template: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, AcquireError> {
        let mut builder = Client::builder().tcp_nodelay(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            cache_dir: cache_dir.into(),
            url_template: url_template.into(),
        })
    }

    pub fn from_config(config: &OverlayConfig) -> Result<Self, AcquireError> {
        Self::new(
            &config.cache_dir,
            &config.url_template,
            config.request_timeout,
        )
    }

    /// Local path for a cycle: `<cache_dir>/hrrr_<YYYYMMDD>_<HH>.grib2`.
    pub fn cache_path(&self, cycle: &CycleId) -> PathBuf {
        self.cache_dir.join(format!(
            "hrrr_{}_{}.grib2",
            cycle.date_str(),
            cycle.hour_str()
        ))
    }

    /// Remote URL for a cycle, by placeholder substitution only.
    pub fn source_url(&self, cycle: &CycleId) -> String {
        self.url_template
            .replace("{date}", &cycle.date_str())
            .replace("{hour}", &cycle.hour_str())
    }

    /// Return the cached file for `cycle`, downloading it first on a miss.
    ///
    /// A cached file is trusted as-is. A non-200 answer yields
    /// [`AcquireError::NotFound`].
    #[instrument(skip(self, cycle), fields(cycle = %cycle))]
    pub async fn acquire(&self, cycle: &CycleId) -> Result<Acquisition, AcquireError> {
        let path = self.cache_path(cycle);

        if path.exists() {
            info!(path = %path.display(), "Using cached file");
            return Ok(Acquisition::Cached(path));
        }

        let url = self.source_url(cycle);
        info!(url = %url, path = %path.display(), "Starting download");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(url = %url, status = status.as_u16(), "Source file not available");
            return Err(AcquireError::NotFound {
                url,
                status: status.as_u16(),
            });
        }

        let partial = partial_path(&path);
        let bytes = match stream_to_file(response, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                fs::remove_file(&partial).await.ok();
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&partial, &path).await {
            fs::remove_file(&partial).await.ok();
            return Err(e.into());
        }

        info!(path = %path.display(), bytes, "Download completed");
        Ok(Acquisition::Downloaded(path))
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Stream the response body to `path` chunk by chunk, returning the byte count.
async fn stream_to_file(response: Response, path: &Path) -> Result<u64, AcquireError> {
    let total = response.content_length();
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();

    let mut downloaded = 0u64;
    let mut since_update = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;

        downloaded += chunk.len() as u64;
        since_update += chunk.len() as u64;

        if since_update >= PROGRESS_INTERVAL {
            since_update = 0;
            debug!(downloaded, total = ?total, "Download progress");
        }
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(downloaded)
}
