//! `FileServer`: router assembly, binding and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::routing::get;
use ptms_core::{Clock, SystemClock};
use ptms_storage::FileStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::errors::ServerError;
use crate::files;
use crate::health::{self, HealthResponse};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Collection files.
    pub files: FileStore,
    /// Time source for export and import stamps.
    pub clock: Arc<dyn Clock>,
    /// When the server started.
    pub start_time: Instant,
}

/// The Project-TMS file server.
pub struct FileServer {
    config: ServerConfig,
    state: AppState,
}

impl FileServer {
    /// Create a server using the system clock.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a server with an explicit time source.
    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let state = AppState {
            files: FileStore::new(config.storage_dir.clone()),
            clock,
            start_time: Instant::now(),
        };
        Self { config, state }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes and layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/files", get(files::list_files))
            .route(
                "/api/files/{filename}",
                get(files::read_file)
                    .post(files::write_file)
                    .delete(files::delete_file),
            )
            .route("/api/export", get(files::export))
            .route("/api/import", axum::routing::post(files::import))
            .layer(DefaultBodyLimit::max(self.config.body_limit_bytes))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and start serving in the background.
    ///
    /// The storage directory is created before the listener opens.
    pub async fn listen(&self) -> Result<ServerHandle, ServerError> {
        self.state
            .files
            .ensure_dir()
            .await
            .map_err(ServerError::storage("Failed to create storage directory"))?;

        let addr = self.config.bind_addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
        info!(
            addr = %local_addr,
            storage_dir = %self.config.storage_dir.display(),
            "file server listening"
        );

        let token = CancellationToken::new();
        let stop = token.clone();
        let router = self.router();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await;
            if let Err(e) = served {
                error!(error = %e, "file server stopped with error");
            }
        });

        Ok(ServerHandle {
            addr: local_addr,
            token,
            task,
            grace: self.config.shutdown_timeout,
        })
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time))
}

/// A running server.
pub struct ServerHandle {
    addr: SocketAddr,
    token: CancellationToken,
    task: JoinHandle<()>,
    grace: Duration,
}

impl ServerHandle {
    /// Address actually bound.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Token that stops the server when cancelled.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// Returns `false` if the grace period ran out and the server task was
    /// aborted.
    pub async fn shutdown(self) -> bool {
        self.token.cancel();
        let abort = self.task.abort_handle();
        if tokio::time::timeout(self.grace, self.task).await.is_ok() {
            info!("file server stopped");
            true
        } else {
            warn!(grace_secs = self.grace.as_secs(), "shutdown grace period elapsed, aborting");
            abort.abort();
            false
        }
    }

    /// Wait until the server stops on its own (its token is cancelled
    /// elsewhere).
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "file server task failed");
        }
    }
}
