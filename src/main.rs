//! Coursedeck — Binary Entrypoint
//! Boots the Axum HTTP server, the reporting-period scheduler, and the
//! change-feed stats aggregator.

use std::{sync::Arc, time::Duration};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coursedeck::config::Config;
use coursedeck::metrics::Metrics;
use coursedeck::notify::Mailer;
use coursedeck::payments::{HttpGateway, PaymentGateway, SandboxGateway};
use coursedeck::scheduler::spawn_bucket_scheduler;
use coursedeck::stats::StatsAggregator;
use coursedeck::store::{MemoryStore, StatsLedger, StatsSource};
use coursedeck::{api, AppState};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coursedeck=info,tower_http=warn,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Arc::new(Config::from_env());
    let metrics = Metrics::init();
    let store = Arc::new(MemoryStore::new());

    let gateway: Arc<dyn PaymentGateway> = if config.gateway_configured() {
        Arc::new(HttpGateway::new(
            config.gateway_base_url.clone(),
            config.gateway_key.clone(),
            config.gateway_secret.clone(),
        ))
    } else {
        info!("no gateway credentials, using sandbox payment gateway");
        Arc::new(SandboxGateway)
    };

    let mailer = Arc::new(Mailer::from_env()?);

    // Reporting periods: the scheduler opens buckets, the aggregator keeps
    // the newest one consistent with the collections.
    let ledger: Arc<dyn StatsLedger> = store.clone();
    let source: Arc<dyn StatsSource> = store.clone();
    let _scheduler = spawn_bucket_scheduler(ledger.clone(), Duration::from_secs(config.stats_period_secs));
    let _aggregator = StatsAggregator::new(source, ledger).spawn(store.subscribe());

    let state = AppState::new(config.clone(), store, gateway, mailer);
    let app = api::router(state).merge(metrics.router());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "coursedeck listening");
    axum::serve(listener, app).await?;
    Ok(())
}
