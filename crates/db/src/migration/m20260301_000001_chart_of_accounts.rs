//! Chart-of-accounts migration.
//!
//! Creates the rule catalog (categories and values), the rule tree (types,
//! groups and steps), the account registry and its maker-checker requests.
//!
//! The schema builder is used instead of raw SQL so the same migration runs
//! against PostgreSQL and the SQLite databases of the test-suite.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: RULE CATALOG
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(RuleCategories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RuleCategories::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(RuleCategories::Code)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(RuleCategories::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(RuleCategories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RuleCategories::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RuleValues::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RuleValues::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RuleValues::CategoryId).uuid().not_null())
                    .col(ColumnDef::new(RuleValues::Value).string_len(64).not_null())
                    .col(ColumnDef::new(RuleValues::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(RuleValues::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(RuleValues::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(RuleValues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RuleValues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rule_values_category")
                            .from(RuleValues::Table, RuleValues::CategoryId)
                            .to(RuleCategories::Table, RuleCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Soft-deleted values keep their slot, so a value is never reused.
        manager
            .create_index(
                Index::create()
                    .name("uq_rule_values_category_value")
                    .table(RuleValues::Table)
                    .col(RuleValues::CategoryId)
                    .col(RuleValues::Value)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: RULE TREE
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(RuleTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RuleTypes::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(RuleTypes::Code)
                            .string_len(32)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(RuleTypes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(RuleTypes::Separator).string_len(8).not_null())
                    .col(ColumnDef::new(RuleTypes::HasGroup).boolean().not_null())
                    .col(
                        ColumnDef::new(RuleTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RuleGroups::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RuleGroups::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RuleGroups::TypeId).uuid().not_null())
                    .col(ColumnDef::new(RuleGroups::Code).string_len(32).not_null())
                    .col(ColumnDef::new(RuleGroups::Name).string_len(255).not_null())
                    .col(ColumnDef::new(RuleGroups::Separator).string_len(8).not_null())
                    .col(
                        ColumnDef::new(RuleGroups::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rule_groups_type")
                            .from(RuleGroups::Table, RuleGroups::TypeId)
                            .to(RuleTypes::Table, RuleTypes::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_rule_groups_type_code")
                    .table(RuleGroups::Table)
                    .col(RuleGroups::TypeId)
                    .col(RuleGroups::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RuleSteps::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RuleSteps::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(RuleSteps::TypeId).uuid().not_null())
                    .col(ColumnDef::new(RuleSteps::GroupId).uuid())
                    .col(ColumnDef::new(RuleSteps::StepOrder).integer().not_null())
                    .col(ColumnDef::new(RuleSteps::Kind).string_len(8).not_null())
                    .col(ColumnDef::new(RuleSteps::CategoryId).uuid())
                    .col(ColumnDef::new(RuleSteps::Label).string_len(64))
                    .col(
                        ColumnDef::new(RuleSteps::Required)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(RuleSteps::Separator).string_len(8).not_null())
                    .col(
                        ColumnDef::new(RuleSteps::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rule_steps_type")
                            .from(RuleSteps::Table, RuleSteps::TypeId)
                            .to(RuleTypes::Table, RuleTypes::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rule_steps_group")
                            .from(RuleSteps::Table, RuleSteps::GroupId)
                            .to(RuleGroups::Table, RuleGroups::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rule_steps_category")
                            .from(RuleSteps::Table, RuleSteps::CategoryId)
                            .to(RuleCategories::Table, RuleCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rule_steps_tree")
                    .table(RuleSteps::Table)
                    .col(RuleSteps::TypeId)
                    .col(RuleSteps::GroupId)
                    .col(RuleSteps::StepOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // NULL group ids compare distinct, so ungrouped trees need their own index.
        manager
            .create_index(
                Index::create()
                    .name("idx_rule_steps_ungrouped")
                    .table(RuleSteps::Table)
                    .col(RuleSteps::TypeId)
                    .col(RuleSteps::StepOrder)
                    .unique()
                    .and_where(Expr::col(RuleSteps::GroupId).is_null())
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: ACCOUNT REGISTRY
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(CoaAccounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CoaAccounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CoaAccounts::Code).string_len(255).not_null())
                    .col(ColumnDef::new(CoaAccounts::Currency).string_len(8).not_null())
                    .col(ColumnDef::new(CoaAccounts::Name).string_len(255))
                    .col(ColumnDef::new(CoaAccounts::AccountType).string_len(8).not_null())
                    .col(ColumnDef::new(CoaAccounts::ParentId).uuid())
                    .col(ColumnDef::new(CoaAccounts::Status).string_len(8).not_null())
                    .col(ColumnDef::new(CoaAccounts::AccountNo).string_len(64))
                    .col(ColumnDef::new(CoaAccounts::Description).text())
                    .col(
                        ColumnDef::new(CoaAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CoaAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coa_accounts_parent")
                            .from(CoaAccounts::Table, CoaAccounts::ParentId)
                            .to(CoaAccounts::Table, CoaAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_coa_accounts_code_currency")
                    .table(CoaAccounts::Table)
                    .col(CoaAccounts::Code)
                    .col(CoaAccounts::Currency)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RequestCoaAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RequestCoaAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RequestCoaAccounts::RequestType)
                            .string_len(8)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RequestCoaAccounts::RequestStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RequestCoaAccounts::CoaAccountId).uuid())
                    .col(ColumnDef::new(RequestCoaAccounts::Payload).text().not_null())
                    .col(ColumnDef::new(RequestCoaAccounts::MakerId).uuid().not_null())
                    .col(ColumnDef::new(RequestCoaAccounts::CheckerId).uuid())
                    .col(ColumnDef::new(RequestCoaAccounts::CheckerComment).text())
                    .col(ColumnDef::new(RequestCoaAccounts::RejectReason).text())
                    .col(ColumnDef::new(RequestCoaAccounts::CheckedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(RequestCoaAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RequestCoaAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_request_coa_accounts_account")
                            .from(RequestCoaAccounts::Table, RequestCoaAccounts::CoaAccountId)
                            .to(CoaAccounts::Table, CoaAccounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_request_coa_accounts_status")
                    .table(RequestCoaAccounts::Table)
                    .col(RequestCoaAccounts::RequestStatus)
                    .col(RequestCoaAccounts::CoaAccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RequestCoaAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CoaAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RuleSteps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RuleGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RuleTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RuleValues::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RuleCategories::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum RuleCategories {
    Table,
    Id,
    Code,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RuleValues {
    Table,
    Id,
    CategoryId,
    Value,
    Name,
    SortOrder,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RuleTypes {
    Table,
    Id,
    Code,
    Name,
    Separator,
    HasGroup,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RuleGroups {
    Table,
    Id,
    TypeId,
    Code,
    Name,
    Separator,
    CreatedAt,
}

#[derive(DeriveIden)]
enum RuleSteps {
    Table,
    Id,
    TypeId,
    GroupId,
    StepOrder,
    Kind,
    CategoryId,
    Label,
    Required,
    Separator,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum CoaAccounts {
    Table,
    Id,
    Code,
    Currency,
    Name,
    AccountType,
    ParentId,
    Status,
    AccountNo,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RequestCoaAccounts {
    Table,
    Id,
    RequestType,
    RequestStatus,
    CoaAccountId,
    Payload,
    MakerId,
    CheckerId,
    CheckerComment,
    RejectReason,
    CheckedAt,
    CreatedAt,
    UpdatedAt,
}
