//! Account registry repository.
//!
//! Accounts are never written directly: a maker submits a CREATE or EDIT
//! request, and a different checker approves or rejects it. Approval applies
//! the change, marks the request and enqueues a `coa_account.approved` event
//! in one transaction.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use ledgerline_core::workflow::{
    AccountFields, CreateAccountPayload, EditAccountPayload, RequestStatus as CoreRequestStatus,
    RequestType as CoreRequestType, WorkflowAction, WorkflowError, WorkflowService,
    decode_stored,
};
use ledgerline_shared::Clock;

use crate::entities::{
    coa_accounts, request_coa_accounts,
    sea_orm_active_enums::{AccountStatus, RequestStatus, RequestType},
};
use crate::error::{db_err, is_unique_violation};
use crate::repositories::outbox::{NewOutboxEvent, append};
use crate::repositories::rule_tree::RuleTreeRepository;

/// Event emitted when a request is approved.
pub const ACCOUNT_APPROVED_EVENT: &str = "coa_account.approved";

/// Repository for accounts and their maker-checker requests.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    tree: RuleTreeRepository,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        let tree = RuleTreeRepository::new(db.clone(), Arc::clone(&clock));
        Self { db, clock, tree }
    }

    /// Submits a request for a checker's decision.
    ///
    /// CREATE payloads are run through the code builder and the resulting
    /// code is stored in the payload. EDIT payloads must reference an
    /// existing account without another pending EDIT.
    ///
    /// # Errors
    ///
    /// - `DecodeError` / `EmptyEdit` / `UnknownAccountType` for a bad payload
    /// - `Coa` if the rule selection does not build a code
    /// - `DuplicateAccount` if `(code, currency)` already exists
    /// - `MissingReference` / `AccountNotFound` / `PendingRequestExists` for EDIT
    pub async fn submit_request(
        &self,
        request_type: CoreRequestType,
        payload: &serde_json::Value,
        maker_id: Uuid,
        coa_account_id: Option<Uuid>,
    ) -> Result<request_coa_accounts::Model, WorkflowError> {
        let (account_id, stored) = match request_type {
            CoreRequestType::Create => {
                let mut create = CreateAccountPayload::decode(payload)?;
                create.resolved_account_type()?;

                let code = self
                    .tree
                    .build_code(
                        &create.type_code,
                        create.group_code.as_deref(),
                        &create.selections,
                    )
                    .await?;

                if find_account(&self.db, &code, &create.currency).await?.is_some() {
                    return Err(WorkflowError::DuplicateAccount {
                        code,
                        currency: create.currency,
                    });
                }

                create.code = Some(code);
                (None, encode(&create)?)
            }
            CoreRequestType::Edit => {
                let account_id = coa_account_id.ok_or(WorkflowError::MissingReference)?;
                let edit = EditAccountPayload::decode(payload)?;

                self.get_account(account_id).await?;

                let pending = request_coa_accounts::Entity::find()
                    .filter(request_coa_accounts::Column::CoaAccountId.eq(account_id))
                    .filter(request_coa_accounts::Column::RequestType.eq(RequestType::Edit))
                    .filter(request_coa_accounts::Column::RequestStatus.eq(RequestStatus::Pending))
                    .one(&self.db)
                    .await
                    .map_err(storage_err)?;
                if pending.is_some() {
                    return Err(WorkflowError::PendingRequestExists(account_id));
                }

                (Some(account_id), encode(&edit)?)
            }
        };

        let now = self.clock.now();
        let request = request_coa_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            request_type: Set(request_type.into()),
            request_status: Set(RequestStatus::Pending),
            coa_account_id: Set(account_id),
            payload: Set(stored),
            maker_id: Set(maker_id),
            checker_id: Set(None),
            checker_comment: Set(None),
            reject_reason: Set(None),
            checked_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let request = request.insert(&self.db).await.map_err(storage_err)?;

        info!(
            request_id = %request.id,
            request_type = %request_type,
            maker_id = %maker_id,
            "Account request submitted"
        );
        Ok(request)
    }

    /// Approves a pending request and applies it.
    ///
    /// # Errors
    ///
    /// - `RequestNotFound` if the request does not exist
    /// - `InvalidState` unless the request is PENDING
    /// - `SelfApproval` if the checker is the maker
    /// - `DuplicateAccount` if a CREATE collides with an existing account
    /// - `CorruptPayload` if the stored payload no longer decodes
    pub async fn approve_request(
        &self,
        request_id: Uuid,
        checker_id: Uuid,
        comment: Option<String>,
    ) -> Result<coa_accounts::Model, WorkflowError> {
        let now = self.clock.now();
        let txn = self.db.begin().await.map_err(storage_err)?;

        let request = lock_request(&txn, request_id).await?;
        let action = WorkflowService::approve(
            request_id,
            request.request_status.into(),
            request.maker_id,
            checker_id,
            comment,
            now,
        )?;

        let account = match request.request_type {
            RequestType::Create => {
                let create: CreateAccountPayload = decode_stored(&request.payload)?;
                let code = create.code.clone().ok_or_else(|| {
                    WorkflowError::CorruptPayload("CREATE payload has no code".to_string())
                })?;
                let account_type = create.resolved_account_type()?;

                let duplicate = || WorkflowError::DuplicateAccount {
                    code: code.clone(),
                    currency: create.currency.clone(),
                };
                if find_account(&txn, &code, &create.currency).await?.is_some() {
                    return Err(duplicate());
                }

                let account = coa_accounts::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    code: Set(code.clone()),
                    currency: Set(create.currency.clone()),
                    name: Set(create.name.clone()),
                    account_type: Set(account_type.into()),
                    parent_id: Set(create.parent_id),
                    status: Set(AccountStatus::Active),
                    account_no: Set(create.account_no.clone()),
                    description: Set(create.description.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                };

                account.insert(&txn).await.map_err(|e| {
                    if is_unique_violation(&e) {
                        duplicate()
                    } else {
                        storage_err(e)
                    }
                })?
            }
            RequestType::Edit => {
                let account_id = request.coa_account_id.ok_or_else(|| {
                    WorkflowError::CorruptPayload("EDIT request has no account".to_string())
                })?;
                let edit: EditAccountPayload = decode_stored(&request.payload)?;

                let account = coa_accounts::Entity::find_by_id(account_id)
                    .lock_exclusive()
                    .one(&txn)
                    .await
                    .map_err(storage_err)?
                    .ok_or(WorkflowError::AccountNotFound(account_id))?;

                let fields = edit.apply(AccountFields {
                    account_no: account.account_no.clone(),
                    status: account.status.into(),
                    description: account.description.clone(),
                });

                let mut active: coa_accounts::ActiveModel = account.into();
                active.account_no = Set(fields.account_no);
                active.status = Set(fields.status.into());
                active.description = Set(fields.description);
                active.updated_at = Set(now);

                active.update(&txn).await.map_err(storage_err)?
            }
        };

        decide(&txn, &request, &action, Some(account.id)).await?;

        let event = NewOutboxEvent::new(
            "request_coa_account",
            request.id,
            ACCOUNT_APPROVED_EVENT,
            &json!({
                "request_id": request.id,
                "request_type": CoreRequestType::from(request.request_type),
                "coa_account_id": account.id,
                "code": account.code,
                "currency": account.currency,
                "checker_id": checker_id,
            }),
            format!("coa_account:{}", account.id),
        );
        append(&txn, &event, now).await.map_err(storage_err)?;

        txn.commit().await.map_err(storage_err)?;

        info!(
            request_id = %request_id,
            account_id = %account.id,
            checker_id = %checker_id,
            "Account request approved"
        );
        Ok(account)
    }

    /// Rejects a pending request. The account is not touched.
    ///
    /// # Errors
    ///
    /// - `RequestNotFound` if the request does not exist
    /// - `InvalidState` unless the request is PENDING
    /// - `RejectionReasonRequired` if the reason is blank
    pub async fn reject_request(
        &self,
        request_id: Uuid,
        checker_id: Uuid,
        reason: &str,
    ) -> Result<request_coa_accounts::Model, WorkflowError> {
        let now = self.clock.now();
        let txn = self.db.begin().await.map_err(storage_err)?;

        let request = lock_request(&txn, request_id).await?;
        let action = WorkflowService::reject(
            request_id,
            request.request_status.into(),
            checker_id,
            reason,
            now,
        )?;

        decide(&txn, &request, &action, request.coa_account_id).await?;

        let request = request_coa_accounts::Entity::find_by_id(request_id)
            .one(&txn)
            .await
            .map_err(storage_err)?
            .ok_or(WorkflowError::RequestNotFound(request_id))?;

        txn.commit().await.map_err(storage_err)?;

        info!(request_id = %request_id, checker_id = %checker_id, "Account request rejected");
        Ok(request)
    }

    /// Gets a request by id.
    ///
    /// # Errors
    ///
    /// `RequestNotFound` if the request does not exist.
    pub async fn get_request(
        &self,
        request_id: Uuid,
    ) -> Result<request_coa_accounts::Model, WorkflowError> {
        request_coa_accounts::Entity::find_by_id(request_id)
            .one(&self.db)
            .await
            .map_err(storage_err)?
            .ok_or(WorkflowError::RequestNotFound(request_id))
    }

    /// Lists pending requests, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_pending_requests(
        &self,
    ) -> Result<Vec<request_coa_accounts::Model>, WorkflowError> {
        request_coa_accounts::Entity::find()
            .filter(request_coa_accounts::Column::RequestStatus.eq(RequestStatus::Pending))
            .order_by_asc(request_coa_accounts::Column::CreatedAt)
            .order_by_asc(request_coa_accounts::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_err)
    }

    /// Gets an account by id.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account does not exist.
    pub async fn get_account(&self, account_id: Uuid) -> Result<coa_accounts::Model, WorkflowError> {
        coa_accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await
            .map_err(storage_err)?
            .ok_or(WorkflowError::AccountNotFound(account_id))
    }

    /// Finds an account by code and currency.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_account(
        &self,
        code: &str,
        currency: &str,
    ) -> Result<Option<coa_accounts::Model>, WorkflowError> {
        find_account(&self.db, code, &currency.trim().to_uppercase()).await
    }
}

// `WorkflowError` also converts from `CoaError`, so `?` needs the target named.
fn storage_err(err: DbErr) -> WorkflowError {
    db_err(err)
}

fn encode<T: serde::Serialize>(payload: &T) -> Result<String, WorkflowError> {
    serde_json::to_string(payload).map_err(|e| WorkflowError::DecodeError(e.to_string()))
}

async fn find_account<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    currency: &str,
) -> Result<Option<coa_accounts::Model>, WorkflowError> {
    coa_accounts::Entity::find()
        .filter(coa_accounts::Column::Code.eq(code))
        .filter(coa_accounts::Column::Currency.eq(currency))
        .one(conn)
        .await
        .map_err(storage_err)
}

async fn lock_request<C: ConnectionTrait>(
    conn: &C,
    request_id: Uuid,
) -> Result<request_coa_accounts::Model, WorkflowError> {
    request_coa_accounts::Entity::find_by_id(request_id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(storage_err)?
        .ok_or(WorkflowError::RequestNotFound(request_id))
}

/// Moves the request out of PENDING.
///
/// The update only matches a row that is still PENDING, so two deciders
/// racing past the row lock cannot both win.
async fn decide<C: ConnectionTrait>(
    conn: &C,
    request: &request_coa_accounts::Model,
    action: &WorkflowAction,
    coa_account_id: Option<Uuid>,
) -> Result<(), WorkflowError> {
    let mut active = request_coa_accounts::ActiveModel {
        request_status: Set(action.new_status().into()),
        coa_account_id: Set(coa_account_id),
        ..Default::default()
    };

    match action {
        WorkflowAction::Approve {
            checker_id,
            checked_at,
            comment,
            ..
        } => {
            active.checker_id = Set(Some(*checker_id));
            active.checked_at = Set(Some(*checked_at));
            active.checker_comment = Set(comment.clone());
            active.updated_at = Set(*checked_at);
        }
        WorkflowAction::Reject {
            checker_id,
            checked_at,
            reason,
            ..
        } => {
            active.checker_id = Set(Some(*checker_id));
            active.checked_at = Set(Some(*checked_at));
            active.reject_reason = Set(Some(reason.clone()));
            active.updated_at = Set(*checked_at);
        }
    }

    let result = request_coa_accounts::Entity::update_many()
        .set(active)
        .filter(request_coa_accounts::Column::Id.eq(request.id))
        .filter(request_coa_accounts::Column::RequestStatus.eq(RequestStatus::Pending))
        .exec(conn)
        .await
        .map_err(storage_err)?;

    if result.rows_affected == 0 {
        let current = request_coa_accounts::Entity::find_by_id(request.id)
            .one(conn)
            .await
            .map_err(storage_err)?
            .map_or(CoreRequestStatus::Pending, |r| r.request_status.into());
        warn!(request_id = %request.id, status = %current, "Account request decided concurrently");
        return Err(WorkflowError::InvalidState {
            id: request.id,
            status: current,
        });
    }

    Ok(())
}
