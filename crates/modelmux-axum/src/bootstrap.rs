//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the web adapter: the JSON document store, the HTTP completion
//! backend and the shared emulator services.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use modelmux_backend::HttpCompletionClient;
use modelmux_core::adapter::ChatAdapter;
use modelmux_core::health::ActivityLog;
use modelmux_core::ports::{CompletionPort, DocumentStore};
use modelmux_core::registry::ProviderRegistry;
use modelmux_core::state::ConfigState;
use modelmux_store::JsonDocumentStore;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (the config UI may be opened from anywhere).
    #[default]
    AllowAll,
    /// Allow specific origins.
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory holding the JSON documents.
    pub config_dir: PathBuf,
    /// Explicit port, overriding both the `PORT` variable and the stored
    /// configuration.
    pub port: Option<u16>,
    /// Optional path to the config UI assets.
    pub static_dir: Option<PathBuf>,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            port: None,
            static_dir: None,
            cors: CorsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }
}

/// Application context for the Axum adapter.
///
/// Holds all initialized services the handlers need.
pub struct AppContext {
    /// Cached view of the persisted documents.
    pub state: Arc<ConfigState>,
    /// Provider catalog views and connectivity tracking.
    pub registry: Arc<ProviderRegistry>,
    /// Request/success/error telemetry.
    pub activity: Arc<ActivityLog>,
    /// The chat completion pipeline.
    pub adapter: ChatAdapter,
    /// Explicit port override from the launcher, if any.
    pub port_override: Option<u16>,
}

impl AppContext {
    /// Wire the context from a document store and a completion backend.
    ///
    /// Separated from [`bootstrap`] so tests can plug in in-memory fakes.
    pub async fn assemble(
        store: Arc<dyn DocumentStore>,
        completion: Arc<dyn CompletionPort>,
        port_override: Option<u16>,
    ) -> Self {
        let state = Arc::new(ConfigState::initialize(store).await);
        let registry = Arc::new(ProviderRegistry::new(completion.clone()));
        let activity = Arc::new(ActivityLog::new());
        let adapter = ChatAdapter::new(
            state.clone(),
            registry.clone(),
            completion,
            activity.clone(),
        );
        Self {
            state,
            registry,
            activity,
            adapter,
            port_override,
        }
    }

    /// Port the emulator should serve on: launcher override, then the
    /// `PORT` variable, then the stored configuration (which defaults to
    /// 11434).
    pub async fn resolve_port(&self) -> u16 {
        if let Some(port) = self.port_override {
            return port;
        }
        if let Some(port) = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
        {
            return port;
        }
        self.state.get_config().await.port
    }

    /// The advertised OpenAI-compatible endpoint URL.
    pub async fn endpoint(&self) -> String {
        let port = self.resolve_port().await;
        format!("http://localhost:{port}/v1/chat/completions")
    }
}

/// Bootstrap the emulator services against the real store and backend.
pub async fn bootstrap(config: &ServerConfig) -> Result<AppContext> {
    tracing::info!(
        target: "modelmux::bootstrap",
        config_dir = %config.config_dir.display(),
        "bootstrapping emulator"
    );

    let store: Arc<dyn DocumentStore> = Arc::new(JsonDocumentStore::new(&config.config_dir));
    let completion: Arc<dyn CompletionPort> = Arc::new(HttpCompletionClient::new());
    Ok(AppContext::assemble(store, completion, config.port).await)
}

/// Start the web server.
///
/// If `config.static_dir` is set, the config UI is served alongside the
/// API. The model cache is refreshed once before the listener starts.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config).await?;
    let port = ctx.resolve_port().await;
    let endpoint = ctx.endpoint().await;

    tracing::info!("Virtual Model Emulator started on http://localhost:{port}");
    tracing::info!("OpenAI endpoint: {endpoint}");
    tracing::info!("Emulator active: {}", ctx.state.is_emulator_active());

    // Warm the model cache so the first UI load is complete.
    match crate::handlers::models::models_payload(&ctx, None, true).await {
        payload if payload.error.is_none() => {
            tracing::info!("Models cache: {} models", payload.models.len());
        }
        _ => tracing::info!("Models cache refresh failed - using cached data"),
    }

    let app = if let Some(ref static_dir) = config.static_dir {
        tracing::info!("Config UI: http://localhost:{port}/config.html");
        crate::routes::create_spa_router(ctx, static_dir, &config.cors)
    } else {
        crate::routes::create_router(ctx, &config.cors)
    };

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
