//! In-process HTTP source standing in for the NOAA bucket.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use hrrr_overlay::{Acquirer, OverlayConfig};
use overlay_common::CycleId;
use test_utils::{TempDirs, TEST_DATE, TEST_HOUR};
use tokio::net::TcpListener;

/// S3-style error body returned for unknown keys.
const NOT_FOUND_BODY: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>";

#[derive(Default)]
struct ServerState {
    files: HashMap<String, Vec<u8>>,
    hits: AtomicUsize,
}

/// A running source server and the request count it has seen.
pub struct MockSource {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl MockSource {
    /// Serve `files` (URL path -> body) on an ephemeral port.
    pub async fn start(files: HashMap<String, Vec<u8>>) -> Self {
        let state = Arc::new(ServerState {
            files,
            hits: AtomicUsize::new(0),
        });

        let app = Router::new().fallback(serve_file).with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Serve nothing; every request is a 404.
    pub async fn empty() -> Self {
        Self::start(HashMap::new()).await
    }

    /// Serve one file at the path the URL template yields for `cycle`.
    pub async fn with_cycle(cycle: &CycleId, body: Vec<u8>) -> Self {
        let mut files = HashMap::new();
        files.insert(cycle_path(cycle), body);
        Self::start(files).await
    }

    pub fn url_template(&self) -> String {
        format!(
            "http://{}/hrrr.{{date}}/conus/hrrr.t{{hour}}z.wrfprsf00.grib2",
            self.addr
        )
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn acquirer(&self, dirs: &TempDirs) -> Acquirer {
        Acquirer::new(dirs.cache_dir(), self.url_template(), None).unwrap()
    }

    pub fn config(&self, dirs: &TempDirs) -> OverlayConfig {
        OverlayConfig {
            cache_dir: dirs.cache_dir().to_path_buf(),
            output_dir: dirs.output_dir().to_path_buf(),
            url_template: self.url_template(),
            ..OverlayConfig::default()
        }
    }
}

async fn serve_file(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    match state.files.get(uri.path()) {
        Some(body) => (StatusCode::OK, body.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response(),
    }
}

/// URL path of a cycle file on the mock source.
pub fn cycle_path(cycle: &CycleId) -> String {
    format!(
        "/hrrr.{}/conus/hrrr.t{}z.wrfprsf00.grib2",
        cycle.date_str(),
        cycle.hour_str()
    )
}

pub fn test_cycle() -> CycleId {
    CycleId::parse(TEST_DATE, TEST_HOUR).unwrap()
}
