//! Integration tests for account snapshots.

mod common;

use chrono::{Duration, NaiveDate};
use rust_decimal_macros::dec;

use ledgerline_core::snapshot::SnapshotError;
use ledgerline_db::entities::sea_orm_active_enums::SnapshotStatus;

use common::{TestContext, operator, transfer};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

#[tokio::test]
async fn test_snapshot_rolls_forward() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    ctx.core
        .post_journal(&transfer("snap-1", (cash.id, dec!(100)), (loan.id, dec!(100))))
        .await
        .unwrap();

    let first = ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();
    assert_eq!(first.opening_balance, dec!(0));
    assert_eq!(first.debit_total, dec!(100));
    assert_eq!(first.credit_total, dec!(0));
    assert_eq!(first.movement, dec!(100));
    assert_eq!(first.closing_balance, dec!(100));
    assert_eq!(first.entry_count, 1);
    assert_eq!(first.status, SnapshotStatus::Draft);

    let next = ctx.core.compute_snapshot(cash.id, day(3)).await.unwrap();
    assert_eq!(next.opening_balance, dec!(100));
    assert_eq!(next.movement, dec!(0));
    assert_eq!(next.closing_balance, dec!(100));
    assert_eq!(next.entry_count, 0);
}

#[tokio::test]
async fn test_movement_follows_normal_side() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    ctx.core
        .post_journal(&transfer("snap-2", (cash.id, dec!(40)), (loan.id, dec!(40))))
        .await
        .unwrap();

    let liability = ctx.core.compute_snapshot(loan.id, day(2)).await.unwrap();
    assert_eq!(liability.credit_total, dec!(40));
    assert_eq!(liability.movement, dec!(40));
    assert_eq!(liability.closing_balance, dec!(40));
    assert_eq!(
        liability.opening_balance + liability.movement,
        liability.closing_balance
    );
}

#[tokio::test]
async fn test_entries_outside_window_are_excluded() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    ctx.core
        .post_journal(&transfer("w-1", (cash.id, dec!(10)), (loan.id, dec!(10))))
        .await
        .unwrap();
    ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();

    ctx.clock.advance(Duration::days(2));
    ctx.core
        .post_journal(&transfer("w-2", (cash.id, dec!(5)), (loan.id, dec!(5))))
        .await
        .unwrap();

    // Day 3 sees nothing new: the second journal is dated day 4.
    let third = ctx.core.compute_snapshot(cash.id, day(3)).await.unwrap();
    assert_eq!(third.opening_balance, dec!(10));
    assert_eq!(third.entry_count, 0);

    let fourth = ctx.core.compute_snapshot(cash.id, day(4)).await.unwrap();
    assert_eq!(fourth.opening_balance, dec!(10));
    assert_eq!(fourth.movement, dec!(5));
    assert_eq!(fourth.closing_balance, dec!(15));
}

#[tokio::test]
async fn test_late_posting_rolls_into_next_snapshot() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    ctx.core
        .post_journal(&transfer("late-1", (cash.id, dec!(100)), (loan.id, dec!(100))))
        .await
        .unwrap();
    let closed = ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();
    ctx.core.snapshots().lock_snapshot(closed.id).await.unwrap();

    // Still day 2, but after the snapshot was taken.
    ctx.clock.advance(Duration::hours(3));
    ctx.core
        .post_journal(&transfer("late-2", (cash.id, dec!(50)), (loan.id, dec!(50))))
        .await
        .unwrap();

    let next = ctx.core.compute_snapshot(cash.id, day(3)).await.unwrap();
    assert_eq!(next.opening_balance, dec!(100));
    assert_eq!(next.movement, dec!(50));
    assert_eq!(next.entry_count, 1);
    assert_eq!(next.closing_balance, dec!(150));

    // The locked snapshot keeps its own figures.
    let closed = ctx.core.snapshots().get_snapshot(closed.id).await.unwrap();
    assert_eq!(closed.closing_balance, dec!(100));
    assert_eq!(closed.computed_at, common::start());
}

#[tokio::test]
async fn test_draft_recompute_reproduces_hash() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    ctx.core
        .post_journal(&transfer("h-1", (cash.id, dec!(100)), (loan.id, dec!(100))))
        .await
        .unwrap();

    let first = ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();
    ctx.clock.advance(Duration::hours(1));
    let again = ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();

    assert_eq!(again.id, first.id, "DRAFT is recomputed in place");
    assert_eq!(again.hash, first.hash);
    assert_eq!(again.status, SnapshotStatus::Draft);

    let all = ctx.core.snapshots().list_snapshots(cash.id).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn test_locked_snapshot_is_final() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    ctx.core
        .post_journal(&transfer("l-1", (cash.id, dec!(100)), (loan.id, dec!(100))))
        .await
        .unwrap();

    let snapshot = ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();
    let locked = ctx
        .core
        .snapshots()
        .lock_snapshot(snapshot.id)
        .await
        .unwrap();
    assert_eq!(locked.status, SnapshotStatus::Locked);
    assert_eq!(locked.hash, snapshot.hash);

    let result = ctx.core.compute_snapshot(cash.id, day(2)).await;
    assert!(matches!(result, Err(SnapshotError::SnapshotLocked { .. })));

    let result = ctx.core.snapshots().lock_snapshot(snapshot.id).await;
    assert!(matches!(result, Err(SnapshotError::InvalidState { .. })));
}

#[tokio::test]
async fn test_verify_detects_divergence() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    ctx.core
        .post_journal(&transfer("v-1", (cash.id, dec!(100)), (loan.id, dec!(100))))
        .await
        .unwrap();
    let snapshot = ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();

    let check = ctx
        .core
        .snapshots()
        .verify_snapshot(snapshot.id)
        .await
        .unwrap();
    assert!(check.matches);
    assert_eq!(check.stored_hash, snapshot.hash);

    // A late posting into the same day changes the figures.
    ctx.core
        .post_journal(&transfer("v-2", (cash.id, dec!(1)), (loan.id, dec!(1))))
        .await
        .unwrap();

    let check = ctx
        .core
        .snapshots()
        .verify_snapshot(snapshot.id)
        .await
        .unwrap();
    assert!(!check.matches);
    assert_eq!(check.recomputed.closing_balance, dec!(101));
}

#[tokio::test]
async fn test_reversal_offsets_original() {
    let ctx = TestContext::seeded().await;
    let cash = ctx.bank_account("main").await;
    let loan = ctx.liability_account("loan").await;

    let posted = ctx
        .core
        .post_journal(&transfer("r-1", (cash.id, dec!(70)), (loan.id, dec!(70))))
        .await
        .unwrap();
    ctx.core
        .reverse_journal(posted.journal.id, &operator())
        .await
        .unwrap();

    let snapshot = ctx.core.compute_snapshot(cash.id, day(2)).await.unwrap();
    assert_eq!(snapshot.entry_count, 2);
    assert_eq!(snapshot.debit_total, dec!(70));
    assert_eq!(snapshot.credit_total, dec!(70));
    assert_eq!(snapshot.closing_balance, dec!(0));
}

#[tokio::test]
async fn test_snapshot_of_unknown_account() {
    let ctx = TestContext::seeded().await;
    let id = uuid::Uuid::new_v4();

    let result = ctx.core.compute_snapshot(id, day(2)).await;
    assert!(matches!(result, Err(SnapshotError::AccountNotFound(a)) if a == id));
}
