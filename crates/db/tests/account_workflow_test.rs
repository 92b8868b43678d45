//! Integration tests for the maker-checker account workflow.

mod common;

use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use uuid::Uuid;

use ledgerline_core::coa::CoaError;
use ledgerline_core::workflow::{RequestStatus as CoreRequestStatus, RequestType, WorkflowError};
use ledgerline_db::entities::{
    coa_accounts,
    sea_orm_active_enums::{AccountStatus, AccountType, RequestStatus},
};
use ledgerline_db::repositories::ACCOUNT_APPROVED_EVENT;

use common::{CHECKER, MAKER, TestContext, bank_payload};

#[tokio::test]
async fn test_submit_create_stores_built_code() {
    let ctx = TestContext::seeded().await;

    let request = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("main"), MAKER, None)
        .await
        .unwrap();

    assert_eq!(request.request_status, RequestStatus::Pending);
    assert_eq!(request.maker_id, MAKER);
    assert!(request.coa_account_id.is_none());

    let stored: serde_json::Value = serde_json::from_str(&request.payload).unwrap();
    assert_eq!(stored["code"], "ASSET:BANK:USD.HSBC.MAIN");

    let pending = ctx.core.accounts().list_pending_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn test_approve_creates_account_and_event() {
    let ctx = TestContext::seeded().await;

    let request = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("main"), MAKER, None)
        .await
        .unwrap();
    let account = ctx
        .core
        .approve_account_request(request.id, CHECKER, Some(" looks good ".to_string()))
        .await
        .unwrap();

    assert_eq!(account.code, "ASSET:BANK:USD.HSBC.MAIN");
    assert_eq!(account.currency, "USD");
    assert_eq!(account.account_type, AccountType::Asset);
    assert_eq!(account.status, AccountStatus::Active);

    let request = ctx.core.accounts().get_request(request.id).await.unwrap();
    assert_eq!(request.request_status, RequestStatus::Approved);
    assert_eq!(request.coa_account_id, Some(account.id));
    assert_eq!(request.checker_id, Some(CHECKER));
    assert_eq!(request.checker_comment.as_deref(), Some("looks good"));
    assert_eq!(request.checked_at, Some(common::start()));

    let events = ctx
        .core
        .outbox()
        .list_partition(&format!("coa_account:{}", account.id))
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ACCOUNT_APPROVED_EVENT);
    assert_eq!(events[0].aggregate_id, request.id.to_string());

    let found = ctx
        .core
        .accounts()
        .find_account("ASSET:BANK:USD.HSBC.MAIN", "usd")
        .await
        .unwrap();
    assert_eq!(found.map(|a| a.id), Some(account.id));
}

#[tokio::test]
async fn test_reject_then_approve_fails() {
    let ctx = TestContext::seeded().await;

    let request = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("main"), MAKER, None)
        .await
        .unwrap();
    assert_eq!(request.request_status, RequestStatus::Pending);

    ctx.core
        .reject_account_request(request.id, CHECKER, "duplicate")
        .await
        .unwrap();

    let rejected = ctx.core.accounts().get_request(request.id).await.unwrap();
    assert_eq!(rejected.request_status, RequestStatus::Rejected);
    assert_eq!(rejected.reject_reason.as_deref(), Some("duplicate"));
    assert_eq!(rejected.checker_id, Some(CHECKER));

    let result = ctx
        .core
        .approve_account_request(request.id, CHECKER, None)
        .await;
    match result {
        Err(WorkflowError::InvalidState { id, status }) => {
            assert_eq!(id, request.id);
            assert_eq!(status, CoreRequestStatus::Rejected);
        }
        other => panic!("Expected InvalidState, got {other:?}"),
    }

    let accounts = coa_accounts::Entity::find().count(&ctx.db).await.unwrap();
    assert_eq!(accounts, 0, "Rejected request must not create an account");
}

#[tokio::test]
async fn test_second_approve_does_not_double_create() {
    let ctx = TestContext::seeded().await;

    let request = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("main"), MAKER, None)
        .await
        .unwrap();
    ctx.core
        .approve_account_request(request.id, CHECKER, None)
        .await
        .unwrap();

    let result = ctx
        .core
        .approve_account_request(request.id, CHECKER, None)
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::InvalidState {
            status: CoreRequestStatus::Approved,
            ..
        })
    ));

    let result = ctx
        .core
        .reject_account_request(request.id, CHECKER, "too late")
        .await;
    assert!(matches!(result, Err(WorkflowError::InvalidState { .. })));

    let accounts = coa_accounts::Entity::find().count(&ctx.db).await.unwrap();
    assert_eq!(accounts, 1);
}

#[tokio::test]
async fn test_maker_cannot_approve_own_request() {
    let ctx = TestContext::seeded().await;

    let request = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("main"), MAKER, None)
        .await
        .unwrap();

    let result = ctx
        .core
        .approve_account_request(request.id, MAKER, None)
        .await;
    assert!(matches!(result, Err(WorkflowError::SelfApproval)));

    let request = ctx.core.accounts().get_request(request.id).await.unwrap();
    assert_eq!(request.request_status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let ctx = TestContext::seeded().await;

    let request = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("main"), MAKER, None)
        .await
        .unwrap();

    let result = ctx
        .core
        .reject_account_request(request.id, CHECKER, "   ")
        .await;
    assert!(matches!(result, Err(WorkflowError::RejectionReasonRequired)));

    let result = ctx
        .core
        .reject_account_request(Uuid::new_v4(), CHECKER, "nope")
        .await;
    assert!(matches!(result, Err(WorkflowError::RequestNotFound(_))));

    // A decided request reports its state even when the reason is blank.
    ctx.core
        .reject_account_request(request.id, CHECKER, "duplicate")
        .await
        .unwrap();
    let result = ctx
        .core
        .reject_account_request(request.id, CHECKER, "")
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::InvalidState {
            status: CoreRequestStatus::Rejected,
            ..
        })
    ));
}

#[tokio::test]
async fn test_submit_rejects_bad_payloads() {
    let ctx = TestContext::seeded().await;

    let result = ctx
        .core
        .submit_account_request(RequestType::Create, &json!({"currency": 7}), MAKER, None)
        .await;
    assert!(matches!(result, Err(WorkflowError::DecodeError(_))));

    let mut payload = bank_payload("main");
    payload["selections"][1]["value"] = json!("BARCLAYS");
    let result = ctx
        .core
        .submit_account_request(RequestType::Create, &payload, MAKER, None)
        .await;
    assert!(matches!(
        result,
        Err(WorkflowError::Coa(CoaError::UnknownValue { .. }))
    ));

    let result = ctx
        .core
        .submit_account_request(RequestType::Edit, &json!({"description": "x"}), MAKER, None)
        .await;
    assert!(matches!(result, Err(WorkflowError::MissingReference)));

    let result = ctx
        .core
        .submit_account_request(
            RequestType::Edit,
            &json!({"description": "x"}),
            MAKER,
            Some(Uuid::new_v4()),
        )
        .await;
    assert!(matches!(result, Err(WorkflowError::AccountNotFound(_))));
}

#[tokio::test]
async fn test_duplicate_account_is_rejected_at_submit() {
    let ctx = TestContext::seeded().await;
    ctx.bank_account("main").await;

    let result = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("MAIN"), MAKER, None)
        .await;
    match result {
        Err(WorkflowError::DuplicateAccount { code, currency }) => {
            assert_eq!(code, "ASSET:BANK:USD.HSBC.MAIN");
            assert_eq!(currency, "USD");
        }
        other => panic!("Expected DuplicateAccount, got {other:?}"),
    }
}

#[tokio::test]
async fn test_edit_applies_only_editable_fields() {
    let ctx = TestContext::seeded().await;
    let account = ctx.bank_account("main").await;

    let request = ctx
        .core
        .submit_account_request(
            RequestType::Edit,
            &json!({
                "status": "INACTIVE",
                "description": "Closed for audit",
                "code": "ASSET:BANK:HACKED",
            }),
            MAKER,
            Some(account.id),
        )
        .await
        .unwrap();

    let result = ctx
        .core
        .submit_account_request(
            RequestType::Edit,
            &json!({"account_no": "001"}),
            MAKER,
            Some(account.id),
        )
        .await;
    assert!(matches!(result, Err(WorkflowError::PendingRequestExists(id)) if id == account.id));

    let edited = ctx
        .core
        .approve_account_request(request.id, CHECKER, None)
        .await
        .unwrap();

    assert_eq!(edited.id, account.id);
    assert_eq!(edited.code, account.code);
    assert_eq!(edited.status, AccountStatus::Inactive);
    assert_eq!(edited.description.as_deref(), Some("Closed for audit"));
    assert_eq!(edited.account_no, account.account_no);

    let result = ctx
        .core
        .submit_account_request(RequestType::Edit, &json!({"name": "only"}), MAKER, Some(account.id))
        .await;
    assert!(matches!(result, Err(WorkflowError::EmptyEdit)));
}

#[tokio::test]
async fn test_edit_null_clears_description() {
    let ctx = TestContext::seeded().await;
    let account = ctx.bank_account("main").await;

    let request = ctx
        .core
        .submit_account_request(
            RequestType::Edit,
            &json!({"description": "Payroll"}),
            MAKER,
            Some(account.id),
        )
        .await
        .unwrap();
    ctx.core
        .approve_account_request(request.id, CHECKER, None)
        .await
        .unwrap();

    let request = ctx
        .core
        .submit_account_request(
            RequestType::Edit,
            &json!({"description": null}),
            MAKER,
            Some(account.id),
        )
        .await
        .unwrap();
    let edited = ctx
        .core
        .approve_account_request(request.id, CHECKER, None)
        .await
        .unwrap();

    assert_eq!(edited.description, None);
    assert_eq!(edited.status, AccountStatus::Active);
}
