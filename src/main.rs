//! pairlink: pairing-code rendezvous and room relay server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pairlink::config::{Args, Config, StoreBackend};
use pairlink::http;
use pairlink::pairing::PairingService;
use pairlink::relay::{self, RelayEngine};
use pairlink::rooms::RoomRegistry;
use pairlink::server::{PairingServer, ServerConfig};
use pairlink::store::{MemoryStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pairlink=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = args.resolve()?;

    let store = build_store(&config).await?;
    let code_ttl = chrono::Duration::seconds(config.code_ttl_secs as i64);

    let pairing = Arc::new(PairingService::new(store.clone()).with_code_ttl(code_ttl));
    let engine = Arc::new(RelayEngine::new(
        Arc::new(RoomRegistry::new()),
        store.clone(),
    ));

    let sweeper = spawn_expiry_sweeper(
        store,
        code_ttl,
        Duration::from_secs(config.sweep_interval_secs),
    );

    let mut server = PairingServer::new(ServerConfig { addr: config.addr });
    server.add_routes(http::routes(pairing));
    server.add_routes(relay::routes(engine));
    server.start().await?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    server.shutdown().await;
    sweeper.abort();

    Ok(())
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.store {
        StoreBackend::Memory => {
            info!("Using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres(url) => {
            pairlink::store::migrate(url).await?;
            let store = pairlink::store::PostgresStore::connect(url).await?;
            info!("Connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres(_) => {
            anyhow::bail!("Built without the postgres feature; run with --memory")
        }
    }
}

/// Periodically delete expired codes so the table does not grow
/// unbounded between verifications.
fn spawn_expiry_sweeper(
    store: Arc<dyn Store>,
    ttl: chrono::Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;
            let cutoff = chrono::Utc::now() - ttl;
            match store.purge_expired_codes(cutoff).await {
                Ok(0) => {}
                Ok(purged) => debug!(purged, "Expired pairing codes removed"),
                Err(e) => warn!(error = %e, "Expired code sweep failed"),
            }
        }
    })
}
