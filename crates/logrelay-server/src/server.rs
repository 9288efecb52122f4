use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, DefaultBodyLimit};
use axum::http::{Extensions, HeaderMap};
use axum::routing::{get, post};
use axum::Router;
use logrelay_channel::{ChannelRegistry, SweepTask};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;
use crate::download::download_client;
use crate::error::ServerError;
use crate::read::read_channel;
use crate::write::write_channel;

/// Shared state for handlers.
#[derive(Debug)]
pub struct RelayState {
    pub registry: Arc<ChannelRegistry>,
    pub config: ServerConfig,
    /// Cancelled when the server begins shutting down; ends open streams.
    pub shutdown: CancellationToken,
}

/// The relay HTTP server: one registry, its sweep, and the endpoints over it.
pub struct RelayServer {
    state: Arc<RelayState>,
}

impl RelayServer {
    /// Create a server with a fresh registry.
    pub fn new(config: ServerConfig) -> Self {
        let registry = ChannelRegistry::new(config.registry_config()).with_eviction_hook(|name| {
            info!(channel = name, "channel evicted");
        });
        Self::with_registry(config, Arc::new(registry))
    }

    /// Create a server over an existing registry.
    pub fn with_registry(config: ServerConfig, registry: Arc<ChannelRegistry>) -> Self {
        Self {
            state: Arc::new(RelayState {
                registry,
                config,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.state.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Router over this server's state.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Bind the configured listen address and serve until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let address = self.state.config.listen;
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        self.serve(listener, cancel).await
    }

    /// Serve on an already bound listener until `cancel` fires.
    ///
    /// The sweep task runs for exactly as long as the server does.
    pub async fn serve(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), ServerError> {
        let address = listener.local_addr()?;
        info!(address = %address, "relay server listening");

        let sweep = SweepTask::spawn(
            Arc::clone(&self.state.registry),
            self.state.config.sweep_interval,
            cancel.child_token(),
        );

        let shutdown = self.state.shutdown.clone();
        let app = build_router(Arc::clone(&self.state))
            .into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                shutdown.cancel();
            })
            .await
            .map_err(|err| ServerError::Serve(err.to_string()));

        sweep.shutdown().await;
        info!(address = %address, "relay server stopped");
        result
    }
}

/// Build the axum router.
pub fn build_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/log/{channel}", post(write_channel).get(read_channel))
        .route("/dl/client", get(download_client))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Peer socket address followed by any `X-Forwarded-For` values, comma-joined.
pub(crate) fn client_address(extensions: &Extensions, headers: &HeaderMap) -> String {
    let mut parts = vec![extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()];
    parts.extend(
        headers
            .get_all("x-forwarded-for")
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string),
    );
    parts.join(",")
}
