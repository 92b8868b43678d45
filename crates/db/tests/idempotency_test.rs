//! Integration tests for idempotency records and the guard.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Duration;
use rust_decimal_macros::dec;
use serde_json::json;

use ledgerline_core::idempotency::{
    BeginOutcome, FinishOutcome, IdempotencyError, IdempotencyStatus as CoreIdempotencyStatus,
    StoredResponse,
};
use ledgerline_core::ledger::LedgerError;
use ledgerline_core::workflow::RequestType;
use ledgerline_db::entities::sea_orm_active_enums::IdempotencyStatus;

use common::{CHECKER, MAKER, TestContext, bank_payload, transfer};

#[tokio::test]
async fn test_begin_finish_then_replay() {
    let ctx = TestContext::new().await;

    let outcome = ctx.core.begin_idempotent("key-1", "hash-a").await.unwrap();
    assert_eq!(outcome, BeginOutcome::Proceed);

    let record = ctx.core.guard().records().find("key-1").await.unwrap().unwrap();
    assert_eq!(record.status, IdempotencyStatus::InProgress);
    assert_eq!(record.expires_at, common::start() + Duration::hours(1));

    ctx.core
        .finish_idempotent("key-1", 200, r#"{"id":1}"#)
        .await
        .unwrap();

    let outcome = ctx.core.begin_idempotent("key-1", "hash-a").await.unwrap();
    assert_eq!(
        outcome,
        BeginOutcome::Replay(StoredResponse::new(200, r#"{"id":1}"#))
    );
}

#[tokio::test]
async fn test_key_reuse_and_concurrent_attempts() {
    let ctx = TestContext::new().await;

    ctx.core.begin_idempotent("key-2", "hash-a").await.unwrap();

    let result = ctx.core.begin_idempotent("key-2", "hash-b").await;
    assert!(matches!(result, Err(IdempotencyError::KeyReuseConflict(k)) if k == "key-2"));

    let result = ctx.core.begin_idempotent("key-2", "hash-a").await;
    assert!(matches!(result, Err(IdempotencyError::AlreadyInProgress(_))));

    let result = ctx.core.begin_idempotent("   ", "hash-a").await;
    assert!(matches!(result, Err(IdempotencyError::MissingKey)));
}

#[tokio::test]
async fn test_stale_attempt_is_taken_over() {
    let ctx = TestContext::new().await;

    ctx.core.begin_idempotent("key-3", "hash-a").await.unwrap();
    ctx.clock.advance(Duration::seconds(60));

    let outcome = ctx.core.begin_idempotent("key-3", "hash-a").await.unwrap();
    assert_eq!(outcome, BeginOutcome::Proceed);

    let record = ctx.core.guard().records().find("key-3").await.unwrap().unwrap();
    assert_eq!(record.locked_at, common::start() + Duration::seconds(60));
    assert_eq!(record.expires_at, common::start() + Duration::hours(1));
}

#[tokio::test]
async fn test_server_error_releases_key() {
    let ctx = TestContext::new().await;
    let records = ctx.core.guard().records();

    records.begin("key-4", "hash-a").await.unwrap();
    let outcome = records.finish("key-4", 503, "unavailable").await.unwrap();
    assert_eq!(outcome, FinishOutcome::Release);
    assert!(records.find("key-4").await.unwrap().is_none());

    let outcome = records.begin("key-4", "hash-a").await.unwrap();
    assert_eq!(outcome, BeginOutcome::Proceed);
}

#[tokio::test]
async fn test_client_error_is_replayed() {
    let ctx = TestContext::new().await;
    let records = ctx.core.guard().records();

    records.begin("key-5", "hash-a").await.unwrap();
    let outcome = records.finish("key-5", 422, "unbalanced").await.unwrap();
    assert_eq!(outcome, FinishOutcome::Fail);

    let record = records.find("key-5").await.unwrap().unwrap();
    assert_eq!(record.status, IdempotencyStatus::Failed);
    assert_eq!(record.response_status, Some(422));

    let outcome = records.begin("key-5", "hash-a").await.unwrap();
    assert_eq!(
        outcome,
        BeginOutcome::Replay(StoredResponse::new(422, "unbalanced"))
    );
}

#[tokio::test]
async fn test_finish_requires_in_progress_record() {
    let ctx = TestContext::new().await;

    let result = ctx.core.finish_idempotent("ghost", 200, "{}").await;
    assert!(matches!(result, Err(IdempotencyError::RecordNotFound(k)) if k == "ghost"));

    ctx.core.begin_idempotent("key-6", "hash-a").await.unwrap();
    ctx.core.finish_idempotent("key-6", 201, "{}").await.unwrap();

    let result = ctx.core.finish_idempotent("key-6", 201, "{}").await;
    assert!(matches!(
        result,
        Err(IdempotencyError::InvalidState {
            status: CoreIdempotencyStatus::Completed,
            ..
        })
    ));
}

#[tokio::test]
async fn test_expired_record_is_reset_and_purged() {
    let ctx = TestContext::new().await;
    let records = ctx.core.guard().records();

    records.begin("old", "hash-a").await.unwrap();
    records.finish("old", 200, "first").await.unwrap();
    records.begin("open", "hash-a").await.unwrap();

    ctx.clock.advance(Duration::hours(1));

    // Expired: a new payload may reuse the key.
    let outcome = records.begin("old", "hash-b").await.unwrap();
    assert_eq!(outcome, BeginOutcome::Proceed);
    let record = records.find("old").await.unwrap().unwrap();
    assert_eq!(record.request_hash, "hash-b");
    assert_eq!(record.status, IdempotencyStatus::InProgress);
    assert!(record.response_body.is_none());

    records.finish("old", 200, "second").await.unwrap();
    ctx.clock.advance(Duration::hours(2));

    // Only terminal records are purged.
    assert_eq!(records.purge_expired().await.unwrap(), 1);
    assert!(records.find("old").await.unwrap().is_none());
    assert!(records.find("open").await.unwrap().is_some());
}

#[tokio::test]
async fn test_guard_runs_handler_once() {
    let ctx = TestContext::new().await;
    let guard = ctx.core.guard();
    let counter = AtomicUsize::new(0);
    let calls = &counter;

    let run = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, LedgerError>(json!({"journal": "J-1"}))
    };

    let first = guard.execute("g-1", "hash-a", 201, run).await.unwrap();
    assert_eq!(first.status_code, 201);
    assert_eq!(first.body, r#"{"journal":"J-1"}"#);

    let second = guard.execute("g-1", "hash-a", 201, run).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_guard_stores_client_errors_and_releases_server_errors() {
    let ctx = TestContext::new().await;
    let guard = ctx.core.guard();
    let counter = AtomicUsize::new(0);
    let calls = &counter;

    let unbalanced = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(LedgerError::Unbalanced {
            currency: "USD".to_string(),
            debit: dec!(100),
            credit: dec!(90),
        })
    };
    let first = guard.execute("g-2", "hash-a", 201, unbalanced).await.unwrap();
    assert_eq!(first.status_code, 422);
    let body: serde_json::Value = serde_json::from_str(&first.body).unwrap();
    assert_eq!(body["error"], "UNBALANCED");

    let replay = guard.execute("g-2", "hash-a", 201, unbalanced).await.unwrap();
    assert_eq!(replay, first);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let outage = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(LedgerError::Database("connection reset".to_string()))
    };
    let failed = guard.execute("g-3", "hash-a", 201, outage).await.unwrap();
    assert_eq!(failed.status_code, 503);
    assert!(guard.records().find("g-3").await.unwrap().is_none());

    guard.execute("g-3", "hash-a", 201, outage).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3, "5xx must not be replayed");
}

#[tokio::test]
async fn test_post_journal_idempotent_replays_response() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    let input = transfer("pj-1", (cash.id, dec!(100)), (loan.id, dec!(100)));
    let first = ctx.core.post_journal_idempotent(&input).await.unwrap();
    assert_eq!(first.status_code, 201);
    let body: serde_json::Value = serde_json::from_str(&first.body).unwrap();
    assert_eq!(body["journal"]["idempotency_key"], "pj-1");

    let second = ctx.core.post_journal_idempotent(&input).await.unwrap();
    assert_eq!(second, first);

    let changed = transfer("pj-1", (cash.id, dec!(50)), (loan.id, dec!(50)));
    let result = ctx.core.post_journal_idempotent(&changed).await;
    assert!(matches!(result, Err(IdempotencyError::KeyReuseConflict(_))));
}

#[tokio::test]
async fn test_approve_idempotent_replays_instead_of_failing() {
    let ctx = TestContext::seeded().await;

    let request = ctx
        .core
        .submit_account_request(RequestType::Create, &bank_payload("main"), MAKER, None)
        .await
        .unwrap();

    let first = ctx
        .core
        .approve_account_request_idempotent("ap-1", request.id, CHECKER, None)
        .await
        .unwrap();
    assert_eq!(first.status_code, 200);

    let second = ctx
        .core
        .approve_account_request_idempotent("ap-1", request.id, CHECKER, None)
        .await
        .unwrap();
    assert_eq!(second, first);

    // A fresh key runs the approval again, which the workflow refuses.
    let third = ctx
        .core
        .approve_account_request_idempotent("ap-2", request.id, CHECKER, None)
        .await
        .unwrap();
    assert_eq!(third.status_code, 409);
}
