use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use libum::config::{AppConfig, CREDENTIAL_ENV};
use libum::engine::cache::SessionCache;
use libum::engine::reader::SessionReader;
use libum::server::handler::{AppServer, AppState};
use libum::source::http_source::HttpSource;
use libum::source::traits::ConferenceSource;
use libum::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    init_tracing();
    if !dotenv_loaded {
        warn!(".env file not loaded; using process environment only");
    }

    let config = AppConfig::from_env();
    if config.credential.is_none() {
        warn!("{} is missing or empty; upstream reads will fail", CREDENTIAL_ENV);
    }

    let upstream = Arc::new(HttpSource::new(
        config.upstream_url.clone(),
        config.credential.clone(),
    ));
    let source: Arc<dyn ConferenceSource> = upstream.clone();
    let cache = Arc::new(SessionCache::new(Arc::clone(&source)));
    let reader = Arc::new(SessionReader::new(cache, source));

    let bind_addr = config.bind_addr.clone();
    let state = AppState {
        reader,
        config: Arc::new(config),
        upstream,
    };
    let server = AppServer::start(state, &bind_addr).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown().await;
    Ok(())
}
