//! HTTP server hosting the pairing and relay routes.
//!
//! The pairing API and the websocket relay each contribute a route
//! fragment; a single `start()` call merges them, binds the listener,
//! and spawns the server task.

use std::net::SocketAddr;

use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;

/// Configuration for the server.
pub struct ServerConfig {
    /// Address to bind the server to.
    pub addr: SocketAddr,
}

/// A single HTTP server hosting all route fragments.
///
/// Fragments are contributed via `add_routes()`, then one `start()`
/// call binds the listener and spawns the server task.
pub struct PairingServer {
    config: ServerConfig,
    routes: Vec<Router>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PairingServer {
    /// Create a new server with the given bind address.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            routes: Vec::new(),
            shutdown_tx: None,
            handle: None,
        }
    }

    /// Accumulate a route fragment. Each fragment should already have
    /// its state applied via `.with_state()`.
    pub fn add_routes(&mut self, router: Router) {
        self.routes.push(router);
    }

    /// Bind the listener, merge all route fragments, and spawn the
    /// server. Returns the bound address, useful when binding port 0.
    pub async fn start(&mut self) -> Result<SocketAddr, ServerError> {
        let mut app = Router::new();
        for fragment in self.routes.drain(..) {
            app = app.merge(fragment);
        }

        // Clients are browsers and phone apps on arbitrary origins.
        let app = app
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive());

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| ServerError::StartupFailed {
                reason: format!("Failed to bind to {}: {}", self.config.addr, e),
            })?;

        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::StartupFailed {
                reason: format!("Failed to read bound address: {}", e),
            })?;

        tracing::info!("Pairing relay listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    tracing::info!("Pairing relay shutting down");
                })
                .await
            {
                tracing::error!("Server error: {}", e);
            }
        });

        self.handle = Some(handle);
        Ok(addr)
    }

    /// Signal graceful shutdown and wait for the server task to finish.
    pub async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
