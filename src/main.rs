use std::net::SocketAddr;
use std::time::Duration;

use tracing::{info, warn};

use beacon_api::app::{app, AppState};
use beacon_api::{config, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = config::config();
    info!("Starting Beacon API in {:?} mode", config.environment);

    // Explicit store lifecycle: connect here, close on shutdown.
    let (state, pool) = match std::env::var("BEACON_STORE").as_deref() {
        Ok("memory") => {
            warn!("Running on the in-memory store; all state is process-local");
            (AppState::memory(), None)
        }
        _ => {
            let pool = database::connect(&config.database).await?;
            database::ensure_schema(&pool).await?;
            (AppState::postgres(pool.clone()), Some(pool))
        }
    };

    spawn_expiry_sweeper(state.clone(), config.api.sweep_interval_secs);

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("BEACON_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Beacon API listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(pool) = pool {
        database::close(pool).await;
    }

    Ok(())
}

/// Periodically remove expired sessions and elapsed rate-limit windows.
/// Correctness never depends on this; rows are filtered at read time.
fn spawn_expiry_sweeper(state: AppState, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match state.sessions.purge_expired().await {
                Ok(purged) if purged > 0 => info!("Purged {} expired sessions", purged),
                Ok(_) => {}
                Err(e) => warn!("Session sweep failed: {}", e),
            }
            match state.limiter.purge_expired().await {
                Ok(purged) if purged > 0 => info!("Purged {} elapsed rate-limit windows", purged),
                Ok(_) => {}
                Err(e) => warn!("Rate-limit sweep failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install shutdown handler: {}", e);
    }
}
