//! Web endpoint harness
//!
//! Three plain-text routes meant to be driven by an external load generator:
//! `GET /cpu` and `GET /io` each run one unit of the matching workload on the
//! blocking pool, `GET /` reports how many threads the process is running.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, error, info, instrument, warn};

use crate::bench::{io_cycle, primes};
use crate::config::{HarnessConfig, HttpConfig};
use crate::probe::{ExecutionGate, LockProbe};
use crate::{LockBenchError, Result};

pub const CPU_ACK: &str = "cpu task done";
pub const IO_ACK: &str = "io task done";

/// Shared state behind every route
#[derive(Clone)]
pub struct HttpState {
    http: Arc<HttpConfig>,
    scratch_dir: Arc<PathBuf>,
    gate: Arc<ExecutionGate>,
}

impl HttpState {
    pub fn new(config: &HarnessConfig, gate: Arc<ExecutionGate>) -> Self {
        Self {
            http: Arc::new(config.http.clone()),
            scratch_dir: Arc::new(config.scratch_dir.clone()),
            gate,
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(live_threads))
        .route("/cpu", get(cpu_task))
        .route("/io", get(io_task))
        .with_state(state)
}

/// Bind `config.http.bind` and serve until `shutdown` resolves
pub async fn serve<F>(config: &HarnessConfig, gate: Arc<ExecutionGate>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(&config.http.bind).await.map_err(|e| {
        LockBenchError::Server(format!("failed to bind {}: {}", config.http.bind, e))
    })?;
    info!(
        addr = %listener.local_addr()?,
        mode = %gate.mode(),
        "web harness listening"
    );

    let router = build_router(HttpState::new(config, gate));
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LockBenchError::Server(format!("server error: {}", e)))
}

/// Resolve once `signal` fires. If the signal cannot be awaited the
/// returned future never resolves, so the server keeps running.
pub async fn shutdown_on<S>(signal: S)
where
    S: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(err) => {
            warn!(error = %err, "failed to listen for shutdown signal, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[instrument(skip(state))]
async fn cpu_task(
    State(state): State<HttpState>,
) -> std::result::Result<&'static str, HttpFault> {
    let upper = state.http.cpu_upper;
    let gate = Arc::clone(&state.gate);
    let count = offload(move || Ok(primes::count_sequential(upper, &gate))).await?;
    debug!(upper, count, "cpu unit finished");
    Ok(CPU_ACK)
}

#[instrument(skip(state))]
async fn io_task(
    State(state): State<HttpState>,
) -> std::result::Result<&'static str, HttpFault> {
    let io = state.http.io_config();
    let scratch_dir = Arc::clone(&state.scratch_dir);
    let gate = Arc::clone(&state.gate);
    let summary = offload(move || io_cycle::run_sequential(&scratch_dir, &io, &gate)).await?;
    debug!(cycles = summary.operations, bytes = summary.bytes_written, "io unit finished");
    Ok(IO_ACK)
}

async fn live_threads() -> String {
    format!("live threads: {}", live_thread_count())
}

/// Threads currently alive in this process
pub fn live_thread_count() -> usize {
    #[cfg(target_os = "linux")]
    {
        if let Ok(tasks) = std::fs::read_dir("/proc/self/task") {
            return tasks.count();
        }
    }

    tokio::runtime::Handle::try_current()
        .map(|handle| handle.metrics().num_workers() + 1)
        .unwrap_or(1)
}

async fn offload<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LockBenchError::Worker(format!("blocking unit failed: {}", e)))?
}

/// Unhandled fault surfaced as a bare 500
pub struct HttpFault(LockBenchError);

impl From<LockBenchError> for HttpFault {
    fn from(err: LockBenchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpFault {
    fn into_response(self) -> Response {
        error!(error = %self.0, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}
