//! Shared setup for the integration tests: a migrated SQLite database in the
//! temp directory, a fixed clock and a seeded rule tree.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use uuid::Uuid;

use ledgerline_core::coa::{StepDefinition, StepKind};
use ledgerline_core::ledger::{EntryInput, PostJournalInput};
use ledgerline_core::workflow::RequestType;
use ledgerline_db::AccountingCore;
use ledgerline_db::entities::coa_accounts;
use ledgerline_db::migration::Migrator;
use ledgerline_shared::config::{DatabaseConfig, IdempotencyConfig, OutboxConfig};
use ledgerline_shared::{AppConfig, FixedClock, Holder};

/// Maker used by every seeded request.
pub const MAKER: Uuid = Uuid::from_u128(0x0001);
/// Checker used by every seeded approval.
pub const CHECKER: Uuid = Uuid::from_u128(0x0002);

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub fn test_config(url: &str) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: url.to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        outbox: OutboxConfig {
            max_attempts: 3,
            base_backoff_secs: 5,
            max_backoff_secs: 60,
            batch_size: 10,
            poll_interval_ms: 10,
        },
        idempotency: IdempotencyConfig {
            ttl_secs: 3600,
            stale_after_secs: 60,
        },
    }
}

pub struct TestContext {
    pub db: DatabaseConnection,
    pub clock: Arc<FixedClock>,
    pub core: AccountingCore,
    path: PathBuf,
}

impl TestContext {
    pub async fn new() -> Self {
        let path = std::env::temp_dir().join(format!("ledgerline-{}.db", Uuid::new_v4()));
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let db = Database::connect(&url)
            .await
            .expect("Failed to open SQLite database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        let clock = Arc::new(FixedClock::new(start()));
        let core = AccountingCore::new(db.clone(), clock.clone(), &test_config(&url));

        Self {
            db,
            clock,
            core,
            path,
        }
    }

    /// Creates a context with the ASSET/BANK and LIAB trees seeded.
    pub async fn seeded() -> Self {
        let ctx = Self::new().await;
        ctx.seed_rules().await;
        ctx
    }

    /// Seeds two categories and two trees:
    /// - `ASSET` (group dimension) / `BANK`: CURRENCY, BANK_NAME, DETAILS
    /// - `LIAB` (no group): CURRENCY, DETAILS
    pub async fn seed_rules(&self) {
        let catalog = self.core.catalog();
        catalog.create_category("CURRENCY", "Currency").await.unwrap();
        catalog.add_value("CURRENCY", "USD", "US Dollar", 1).await.unwrap();
        catalog.add_value("CURRENCY", "EUR", "Euro", 2).await.unwrap();
        catalog.create_category("BANK_NAME", "Bank").await.unwrap();
        catalog.add_value("BANK_NAME", "HSBC", "HSBC", 1).await.unwrap();
        catalog.add_value("BANK_NAME", "CITI", "Citibank", 2).await.unwrap();

        let tree = self.core.rule_tree();
        tree.create_type("ASSET", "Assets", ":", true).await.unwrap();
        tree.create_group("ASSET", "BANK", "Bank accounts", ":")
            .await
            .unwrap();
        tree.replace_steps(
            "ASSET",
            Some("BANK"),
            &[
                select_step(1, "CURRENCY"),
                select_step(2, "BANK_NAME"),
                text_step(3, "DETAILS", true),
            ],
        )
        .await
        .unwrap();

        tree.create_type("LIAB", "Liabilities", ":", false)
            .await
            .unwrap();
        tree.replace_steps(
            "LIAB",
            None,
            &[select_step(1, "CURRENCY"), text_step(2, "DETAILS", true)],
        )
        .await
        .unwrap();
    }

    /// Opens an account through submit + approve.
    pub async fn open_account(&self, payload: serde_json::Value) -> coa_accounts::Model {
        let request = self
            .core
            .submit_account_request(RequestType::Create, &payload, MAKER, None)
            .await
            .expect("Failed to submit account request");
        self.core
            .approve_account_request(request.id, CHECKER, None)
            .await
            .expect("Failed to approve account request")
    }

    /// Opens `ASSET:BANK:USD.HSBC.<details>`.
    pub async fn bank_account(&self, details: &str) -> coa_accounts::Model {
        self.open_account(bank_payload(details)).await
    }

    /// Opens `LIAB:USD.<details>`.
    pub async fn liability_account(&self, details: &str) -> coa_accounts::Model {
        self.open_account(json!({
            "type_code": "LIAB",
            "selections": [
                {"category": "CURRENCY", "value": "USD"},
                {"text": "DETAILS", "value": details},
            ],
            "currency": "USD",
            "name": format!("Liability {details}"),
        }))
        .await
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub fn select_step(order: i32, category: &str) -> StepDefinition {
    StepDefinition {
        step_order: order,
        kind: StepKind::Select {
            category: category.to_string(),
        },
        separator: ".".to_string(),
    }
}

pub fn text_step(order: i32, label: &str, required: bool) -> StepDefinition {
    StepDefinition {
        step_order: order,
        kind: StepKind::Text {
            label: Some(label.to_string()),
            required,
        },
        separator: ".".to_string(),
    }
}

pub fn bank_payload(details: &str) -> serde_json::Value {
    json!({
        "type_code": "ASSET",
        "group_code": "BANK",
        "selections": [
            {"category": "CURRENCY", "value": "USD"},
            {"category": "BANK_NAME", "value": "HSBC"},
            {"text": "DETAILS", "value": details},
        ],
        "currency": "USD",
        "name": format!("HSBC {details}"),
    })
}

pub fn operator() -> Holder {
    Holder::User(Uuid::from_u128(0x0042))
}

/// A two-line USD journal: debit `debit`, credit `credit`.
pub fn transfer(
    key: &str,
    debit: (Uuid, Decimal),
    credit: (Uuid, Decimal),
) -> PostJournalInput {
    PostJournalInput {
        idempotency_key: key.to_string(),
        currency: "USD".to_string(),
        source: "API".to_string(),
        entries: vec![
            EntryInput::debit(debit.0, debit.1),
            EntryInput::credit(credit.0, credit.1),
        ],
        posted_by: operator(),
    }
}
