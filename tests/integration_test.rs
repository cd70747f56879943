mod common;

use anyhow::Result;
use common::{date, test_service};
use saldo::application::AppError;
use saldo::domain::{Account, Movement};
use saldo::Repository;
use tempfile::TempDir;

#[tokio::test]
async fn test_create_account_starts_at_opening_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("478758".into(), "savings".into(), 200000, true, 1)
        .await?;

    assert_eq!(account.opening_balance_cents, 200000);
    assert_eq!(account.current_balance_cents, 200000);
    assert!(account.active);

    // Reads are idempotent
    let first = service.get_account(account.id).await?;
    let second = service.get_account(account.id).await?;
    assert_eq!(first.id, second.id);
    assert_eq!(first.current_balance_cents, second.current_balance_cents);
    assert_eq!(first.account_number, second.account_number);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_account_number_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_account("478758".into(), "savings".into(), 0, true, 1)
        .await?;
    let err = service
        .create_account("478758".into(), "checking".into(), 0, true, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountAlreadyExists(_)));
    Ok(())
}

#[tokio::test]
async fn test_apply_movement_updates_balance_and_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_account("478758".into(), "savings".into(), 100000, true, 1)
        .await?;

    let result = service
        .apply_movement("478758", date("2024-01-05"), "deposit".into(), 50000)
        .await?;
    assert_eq!(result.movement.value_cents, 50000);
    assert_eq!(result.movement.balance_cents, 150000);
    assert_eq!(result.account.current_balance_cents, 150000);

    let result = service
        .apply_movement("478758", date("2024-01-10"), "withdrawal".into(), -20000)
        .await?;
    assert_eq!(result.movement.balance_cents, 130000);
    assert_eq!(result.account.current_balance_cents, 130000);

    Ok(())
}

#[tokio::test]
async fn test_apply_to_unknown_account_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service
        .apply_movement("000000", date("2024-01-05"), "deposit".into(), 1000)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_deposit_then_insufficient_withdrawal() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // Account opens at 100; a deposit of 50 brings it to 150
    let account = service
        .create_account("225487".into(), "checking".into(), 10000, true, 1)
        .await?;
    service
        .apply_movement("225487", date("2024-02-01"), "deposit".into(), 5000)
        .await?;

    // A withdrawal of 300 would drive the balance below zero
    let err = service
        .apply_movement("225487", date("2024-02-02"), "withdrawal".into(), -30000)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { .. }));

    // Neither the account nor the movement history changed
    let account = service.get_account(account.id).await?;
    assert_eq!(account.current_balance_cents, 15000);
    let movements = service
        .list_movements_for_owner(1, date("2024-01-01"), date("2024-12-31"))
        .await?;
    assert_eq!(movements.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_balance_invariant_after_mixed_operations() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("495878".into(), "savings".into(), 50000, true, 1)
        .await?;

    let first = service
        .apply_movement("495878", date("2024-03-01"), "deposit".into(), 20000)
        .await?;
    let second = service
        .apply_movement("495878", date("2024-03-05"), "withdrawal".into(), -15000)
        .await?;
    service
        .apply_movement("495878", date("2024-03-10"), "deposit".into(), 7500)
        .await?;

    service
        .revise_movement(first.movement.id, date("2024-03-01"), "deposit".into(), 25000)
        .await?;
    service.remove_movement(second.movement.id).await?;

    // currentBalance == openingBalance + sum of surviving movement values
    let movements = service
        .list_movements_for_owner(1, date("2024-01-01"), date("2024-12-31"))
        .await?;
    let sum: i64 = movements.iter().map(|m| m.movement.value_cents).sum();
    let account = service.get_account(account.id).await?;

    assert_eq!(sum, 25000 + 7500);
    assert_eq!(
        account.current_balance_cents,
        account.opening_balance_cents + sum
    );

    Ok(())
}

#[tokio::test]
async fn test_revise_movement_guards_balance_floor() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("478758".into(), "savings".into(), 10000, true, 1)
        .await?;
    let movement = service
        .apply_movement("478758", date("2024-01-05"), "deposit".into(), 5000)
        .await?;

    // Revising the deposit into a large withdrawal would overdraw
    let err = service
        .revise_movement(
            movement.movement.id,
            date("2024-01-05"),
            "withdrawal".into(),
            -20000,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientFunds { .. }));

    // Nothing changed
    let account = service.get_account(account.id).await?;
    assert_eq!(account.current_balance_cents, 15000);
    let unchanged = service.get_movement(movement.movement.id).await?;
    assert_eq!(unchanged.movement.value_cents, 5000);
    assert_eq!(unchanged.movement.balance_cents, 15000);

    Ok(())
}

#[tokio::test]
async fn test_revise_leaves_later_snapshots_stale() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_account("225487".into(), "checking".into(), 100000, true, 1)
        .await?;

    let a = service
        .apply_movement("225487", date("2024-01-05"), "deposit".into(), 10000)
        .await?;
    let b = service
        .apply_movement("225487", date("2024-01-06"), "deposit".into(), 5000)
        .await?;
    assert_eq!(a.movement.balance_cents, 110000);
    assert_eq!(b.movement.balance_cents, 115000);

    // Revising A corrects the aggregate by (new - old) against the current
    // balance, not by replaying history
    let revised = service
        .revise_movement(a.movement.id, date("2024-01-05"), "deposit".into(), 20000)
        .await?;
    assert_eq!(revised.account.current_balance_cents, 115000 - 10000 + 20000);
    assert_eq!(revised.movement.balance_cents, 125000);

    // B's stored snapshot is now stale; that is the documented contract,
    // not a bug to fix here
    let b = service.get_movement(b.movement.id).await?;
    assert_eq!(b.movement.balance_cents, 115000);

    Ok(())
}

#[tokio::test]
async fn test_remove_movement_has_no_balance_floor() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("478758".into(), "savings".into(), 0, true, 1)
        .await?;
    let deposit = service
        .apply_movement("478758", date("2024-01-05"), "deposit".into(), 10000)
        .await?;
    service
        .apply_movement("478758", date("2024-01-06"), "withdrawal".into(), -8000)
        .await?;

    // Removing the deposit drops the balance to -8000; removal applies no
    // floor check
    service.remove_movement(deposit.movement.id).await?;

    let account = service.get_account(account.id).await?;
    assert_eq!(account.current_balance_cents, -8000);

    let err = service.get_movement(deposit.movement.id).await.unwrap_err();
    assert!(matches!(err, AppError::MovementNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_revise_and_remove_unknown_movement_fail() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let missing = uuid::Uuid::new_v4();
    let err = service
        .revise_movement(missing, date("2024-01-05"), "deposit".into(), 1000)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MovementNotFound(_)));

    let err = service.remove_movement(missing).await.unwrap_err();
    assert!(matches!(err, AppError::MovementNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_movement_reads_are_idempotent() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_account("478758".into(), "savings".into(), 10000, true, 1)
        .await?;
    let created = service
        .apply_movement("478758", date("2024-01-05"), "deposit".into(), 2500)
        .await?;

    let first = service.get_movement(created.movement.id).await?;
    let second = service.get_movement(created.movement.id).await?;
    assert_eq!(first.movement, second.movement);

    Ok(())
}

#[tokio::test]
async fn test_update_account_touches_only_descriptive_fields() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("478758".into(), "savings".into(), 10000, true, 1)
        .await?;
    let updated = service
        .update_account(account.id, "checking".into(), false)
        .await?;

    assert_eq!(updated.account_type, "checking");
    assert!(!updated.active);
    assert_eq!(updated.account_number, "478758");
    assert_eq!(updated.opening_balance_cents, 10000);
    assert_eq!(updated.current_balance_cents, 10000);

    Ok(())
}

#[tokio::test]
async fn test_delete_account_cascades_to_movements() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let account = service
        .create_account("478758".into(), "savings".into(), 10000, true, 1)
        .await?;
    let movement = service
        .apply_movement("478758", date("2024-01-05"), "deposit".into(), 5000)
        .await?;

    service.delete_account(account.id).await?;

    let err = service.get_account(account.id).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));
    let err = service.get_movement(movement.movement.id).await.unwrap_err();
    assert!(matches!(err, AppError::MovementNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_account_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let err = service.delete_account(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::AccountNotFound(_)));
    Ok(())
}

/// A failed movement insert must roll the balance update back with it:
/// no state may show exactly one of the two writes applied.
#[tokio::test]
async fn test_movement_and_balance_write_as_one_unit() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let repo = Repository::init(&db_url).await?;

    let account = Account::new("478758".into(), "savings".into(), 10000, 1);
    repo.save_account(&account).await?;

    let mut first = Movement::new(date("2024-01-05"), "deposit".into(), 5000, account.id);
    assert!(repo.record_movement(&mut first).await?);

    // A second movement reusing the same primary key fails the insert after
    // the balance update has already run inside the transaction
    let mut clashing = Movement::new(date("2024-01-06"), "deposit".into(), 2000, account.id);
    clashing.id = first.id;
    assert!(repo.record_movement(&mut clashing).await.is_err());

    // The balance update was rolled back along with the failed insert
    let account = repo.get_account(account.id).await?.unwrap();
    assert_eq!(account.current_balance_cents, 15000);
    let movements = repo
        .list_movements_in_range(account.id, date("2024-01-01"), date("2024-12-31"))
        .await?;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].value_cents, 5000);

    Ok(())
}
