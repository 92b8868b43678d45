//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod catalog;
pub mod idempotency;
pub mod journal;
pub mod outbox;
pub mod rule_tree;
pub mod snapshot;

pub use account::{ACCOUNT_APPROVED_EVENT, AccountRepository};
pub use catalog::RuleCatalogRepository;
pub use idempotency::IdempotencyRepository;
pub use journal::{
    JOURNAL_POSTED_EVENT, JOURNAL_REVERSED_EVENT, JournalRepository, JournalWithEntries,
};
pub use outbox::{NewOutboxEvent, OutboxRepository};
pub use rule_tree::RuleTreeRepository;
pub use snapshot::SnapshotRepository;
