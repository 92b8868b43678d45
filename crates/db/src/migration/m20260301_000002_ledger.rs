//! Ledger migration.
//!
//! Creates journals and their entries, dated account snapshots, the outbox
//! (`transaction_logs`) and the idempotency records.

use sea_orm_migration::prelude::*;

use super::m20260301_000001_chart_of_accounts::CoaAccounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: JOURNALS & ENTRIES
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Journals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Journals::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Journals::IdempotencyKey)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Journals::RequestHash).string_len(64).not_null())
                    .col(ColumnDef::new(Journals::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Journals::Currency).string_len(8).not_null())
                    .col(ColumnDef::new(Journals::Source).string_len(64).not_null())
                    .col(ColumnDef::new(Journals::Ts).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Journals::PostedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Journals::PostedBy).string_len(64))
                    .col(ColumnDef::new(Journals::ReversalOfId).uuid())
                    .col(
                        ColumnDef::new(Journals::LockVersion)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Journals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Journals::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_journals_reversal_of")
                            .from(Journals::Table, Journals::ReversalOfId)
                            .to(Journals::Table, Journals::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Entries::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Entries::JournalId).uuid().not_null())
                    .col(ColumnDef::new(Entries::LineNo).integer().not_null())
                    .col(ColumnDef::new(Entries::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Entries::Dc).string_len(1).not_null())
                    .col(ColumnDef::new(Entries::Amount).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Entries::Currency).string_len(8).not_null())
                    .col(ColumnDef::new(Entries::Memo).text())
                    .col(
                        ColumnDef::new(Entries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entries_journal")
                            .from(Entries::Table, Entries::JournalId)
                            .to(Journals::Table, Journals::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entries_account")
                            .from(Entries::Table, Entries::AccountId)
                            .to(CoaAccounts::Table, CoaAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_entries_journal_line")
                    .table(Entries::Table)
                    .col(Entries::JournalId)
                    .col(Entries::LineNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entries_account")
                    .table(Entries::Table)
                    .col(Entries::AccountId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: SNAPSHOTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Snapshots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Snapshots::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Snapshots::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Snapshots::AsOfDate).date().not_null())
                    .col(
                        ColumnDef::new(Snapshots::OpeningBalance)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Snapshots::DebitTotal).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Snapshots::CreditTotal).decimal_len(16, 4).not_null())
                    .col(ColumnDef::new(Snapshots::Movement).decimal_len(16, 4).not_null())
                    .col(
                        ColumnDef::new(Snapshots::ClosingBalance)
                            .decimal_len(16, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Snapshots::EntryCount).big_integer().not_null())
                    .col(ColumnDef::new(Snapshots::Hash).string_len(64).not_null())
                    .col(ColumnDef::new(Snapshots::Status).string_len(8).not_null())
                    .col(
                        ColumnDef::new(Snapshots::ComputedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Snapshots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Snapshots::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_snapshots_account")
                            .from(Snapshots::Table, Snapshots::AccountId)
                            .to(CoaAccounts::Table, CoaAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_snapshots_account_date")
                    .table(Snapshots::Table)
                    .col(Snapshots::AccountId)
                    .col(Snapshots::AsOfDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: OUTBOX
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(TransactionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::AggregateType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::AggregateId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionLogs::EventType).string_len(64).not_null())
                    .col(
                        ColumnDef::new(TransactionLogs::EventKey)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TransactionLogs::Payload).text().not_null())
                    .col(ColumnDef::new(TransactionLogs::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(TransactionLogs::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::NextAttemptAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::PartitionKey)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionLogs::Sequence).big_integer().not_null())
                    .col(ColumnDef::new(TransactionLogs::LastError).text())
                    .col(ColumnDef::new(TransactionLogs::PublishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(TransactionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransactionLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_transaction_logs_partition_sequence")
                    .table(TransactionLogs::Table)
                    .col(TransactionLogs::PartitionKey)
                    .col(TransactionLogs::Sequence)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_logs_due")
                    .table(TransactionLogs::Table)
                    .col(TransactionLogs::Status)
                    .col(TransactionLogs::NextAttemptAt)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 4: IDEMPOTENCY
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(IdempotencyRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IdempotencyRecords::IdempotencyKey)
                            .string_len(255)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::RequestHash)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(IdempotencyRecords::Status).string_len(16).not_null())
                    .col(ColumnDef::new(IdempotencyRecords::ResponseStatus).integer())
                    .col(ColumnDef::new(IdempotencyRecords::ResponseBody).text())
                    .col(
                        ColumnDef::new(IdempotencyRecords::LockedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_idempotency_records_expires")
                    .table(IdempotencyRecords::Table)
                    .col(IdempotencyRecords::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IdempotencyRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Snapshots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Journals::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Journals {
    Table,
    Id,
    IdempotencyKey,
    RequestHash,
    Status,
    Currency,
    Source,
    Ts,
    PostedAt,
    PostedBy,
    ReversalOfId,
    LockVersion,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Entries {
    Table,
    Id,
    JournalId,
    LineNo,
    AccountId,
    Dc,
    Amount,
    Currency,
    Memo,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Snapshots {
    Table,
    Id,
    AccountId,
    AsOfDate,
    OpeningBalance,
    DebitTotal,
    CreditTotal,
    Movement,
    ClosingBalance,
    EntryCount,
    Hash,
    Status,
    ComputedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TransactionLogs {
    Table,
    Id,
    AggregateType,
    AggregateId,
    EventType,
    EventKey,
    Payload,
    Status,
    Attempts,
    NextAttemptAt,
    PartitionKey,
    Sequence,
    LastError,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum IdempotencyRecords {
    Table,
    IdempotencyKey,
    RequestHash,
    Status,
    ResponseStatus,
    ResponseBody,
    LockedAt,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}
