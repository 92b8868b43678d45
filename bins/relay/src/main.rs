//! Ledgerline outbox relay.
//!
//! Delivers `transaction_logs` rows through the logging publisher on a fixed
//! interval until interrupted. A failed round is logged and the loop keeps
//! going; undelivered events are picked up again by the next round. Expired
//! idempotency records are purged on a slower interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerline_db::{AccountingCore, LogPublisher, connect_with};
use ledgerline_shared::{AppConfig, SystemClock};

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with(&config.database).await?;
    info!("Connected to database");

    let core = AccountingCore::new(db, Arc::new(SystemClock), &config);
    let dispatcher = core.dispatcher(Arc::new(LogPublisher));

    let mut ticker = interval(config.outbox.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut housekeeping = interval(PURGE_INTERVAL);
    housekeeping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        batch_size = config.outbox.batch_size,
        poll_interval_ms = config.outbox.poll_interval_ms,
        max_attempts = config.outbox.max_attempts,
        "Outbox relay started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = dispatcher.run_once().await {
                    error!(error = %e, "Dispatcher round failed");
                }
            }
            _ = housekeeping.tick() => {
                if let Err(e) = core.guard().records().purge_expired().await {
                    warn!(error = %e, "Idempotency purge failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping relay");
                break;
            }
        }
    }

    Ok(())
}
