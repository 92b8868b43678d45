//! Database migration runner for Ledgerline.
//!
//! Usage:
//!   migrator [up]    - Apply all pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-apply every migration
//!
//! The target database comes from the layered configuration
//! (`config/default.toml`, then `LEDGERLINE__DATABASE__URL`).

use anyhow::bail;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledgerline_db::{connect_with, migration::Migrator};
use ledgerline_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerline=info,sea_orm_migration=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let config = AppConfig::load()?;
    let db = connect_with(&config.database).await?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("Unknown command '{other}' (expected up, down, status or fresh)"),
    }

    info!(command = %command, "Migration command finished");
    Ok(())
}
