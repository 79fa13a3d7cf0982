//! Pharma Supply Chain Dashboard Service
//!
//! Main entry point: wires the access gate, wallet and ledger together and
//! serves the dashboard API.

use access_gate::{
    CredentialStore, DeviceProfile, IpifyClient, MemoryCredentialStore, RedisCredentialStore,
    SessionManager,
};
use anyhow::{Context, Result};
use dashboard::{create_router, Config, SessionWatcher, SupplyChainService};
use pharma_common::{address::shorten, SharedClock, SystemClock};
use std::sync::Arc;
use supply_ledger::ProductLedger;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wallet::MockWallet;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dashboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pharma Supply Chain Dashboard");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded");
    info!("  API address: {}", config.api_address());
    info!("  Contract: {}", shorten(&config.contract_address));
    info!("  Wallet provider: {}", config.wallet_provider);
    info!(
        "  Authorized wallet: {}",
        shorten(&config.gate.authorized_address)
    );
    info!(
        "  Session timeout: {}s (checked every {:?})",
        config.gate.session_timeout.num_seconds(),
        config.gate.session_check_interval
    );

    let clock: SharedClock = Arc::new(SystemClock);

    // Persisted session record
    let store: Arc<dyn CredentialStore> = match &config.redis_url {
        Some(url) => {
            let ttl = config.gate.persisted_session_ttl.num_seconds().max(1) as u64;
            Arc::new(
                RedisCredentialStore::new(url, ttl)
                    .await
                    .context("Failed to connect to Redis")?,
            )
        }
        None => {
            info!("REDIS_URL not set, sessions are kept in memory");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let sessions = Arc::new(SessionManager::new(
        Arc::new(config.gate.clone()),
        clock.clone(),
        store,
        Arc::new(IpifyClient::new(config.gate.ip_lookup_url.clone())),
        DeviceProfile::detect(),
    ));

    // No browser extension in a server process; the mock wallet signs
    info!(
        "Mock wallet mode: connecting as {}",
        shorten(&config.mock_wallet_address)
    );
    let wallet = Arc::new(MockWallet::new(config.mock_wallet_address.clone()));

    let ledger = ProductLedger::new(clock);
    let service = Arc::new(SupplyChainService::new(&config, wallet, sessions, ledger));

    match service.restore().await {
        Ok(Some(session)) => info!("Resumed session for {}", shorten(&session.address)),
        Ok(None) => info!("No previous session to resume"),
        Err(e) => warn!("Failed to restore previous session: {}", e),
    }

    // Idle session watcher
    let watcher = SessionWatcher::spawn(service.clone(), config.gate.session_check_interval);

    // Create router
    let app = create_router(service);

    // Start server
    let listener = TcpListener::bind(&config.api_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.api_address()))?;

    info!("Dashboard API listening on {}", config.api_address());
    info!("Health check: http://{}/health", config.api_address());

    let api_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {:#}", e);
        }
    });

    tokio::select! {
        _ = api_task => {
            error!("API task terminated unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    watcher.stop();
    info!("Shutting down Pharma Supply Chain Dashboard");

    Ok(())
}
