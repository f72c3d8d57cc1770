//! HTTP API server for moonspell

mod error;
pub mod health;
pub mod moon;
pub mod reading;
pub mod sigil;
pub mod speech;

pub use error::ApiError;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::genai::{ReadingGenerator, SigilGenerator, SpeechSynthesizer};
use crate::prompt::PromptAssembler;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub generator: Arc<dyn ReadingGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sigils: Arc<dyn SigilGenerator>,
    pub assembler: PromptAssembler,
}

impl ApiState {
    /// State backed by one client implementing all three generators
    pub fn from_client<C>(client: Arc<C>, assembler: PromptAssembler) -> Self
    where
        C: ReadingGenerator + SpeechSynthesizer + SigilGenerator + 'static,
    {
        Self {
            generator: client.clone(),
            synthesizer: client.clone(),
            sigils: client,
            assembler,
        }
    }
}

/// Build the router with all routes
///
/// With a static directory, unknown paths fall back to its `index.html`.
pub fn router(state: Arc<ApiState>, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new()
        .nest("/api/moon", moon::router())
        .route("/api/zodiac", axum::routing::get(moon::zodiac_signs))
        .nest("/api/reading", reading::router(state.clone()))
        .nest("/api/speech", speech::router(state.clone()))
        .nest("/api/sigil", sigil::router(state))
        .merge(health::router());

    // Serve static files if configured
    if let Some(static_dir) = static_dir {
        let index_file = static_dir.join("index.html");
        let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

        router = router.fallback_service(serve_dir);
        tracing::info!(path = %static_dir.display(), "serving static files");
    }

    // CORS layer for cross-origin requests from frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// API server builder
pub struct ApiServerBuilder {
    state: ApiState,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(state: ApiState, port: u16) -> Self {
        Self {
            state,
            port,
            static_dir: None,
        }
    }

    /// Set the static files directory for serving a web front-end
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(self.state),
            port: self.port,
            static_dir: self.static_dir,
        }
    }
}

/// HTTP API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state, self.static_dir.as_deref()))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
