use chrono::NaiveDate;
use tracing::info;

use crate::directory::OwnerDirectory;
use crate::domain::{parse_cents, Account, AccountId, Cents, Movement, MovementId};
use crate::storage::Repository;

use super::{AccountStatement, AppError, StatementLine, StatementReport};

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// Generic over the owner directory so callers inject the lookup capability
/// they want: the HTTP client in production, a deterministic stub in tests.
pub struct LedgerService<D: OwnerDirectory> {
    repo: Repository,
    directory: D,
}

/// Result of applying or revising a movement: the movement itself plus a
/// snapshot of its account as the operation left it.
#[derive(Debug)]
pub struct MovementResult {
    pub movement: Movement,
    pub account: Account,
}

/// A movement decorated with its account owner's display name.
#[derive(Debug)]
pub struct MovementWithOwner {
    pub movement: Movement,
    pub owner_name: String,
}

/// Parse a `YYYY-MM-DD` date string, failing fast before any store access.
pub fn parse_date(input: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| AppError::InvalidDate(input.to_string()))
}

/// Parse a signed decimal amount string into cents.
pub fn parse_amount(input: &str) -> Result<Cents, AppError> {
    parse_cents(input).map_err(|e| AppError::InvalidAmount(format!("{input}: {e}")))
}

impl<D: OwnerDirectory> LedgerService<D> {
    /// Create a new ledger service with the given repository and directory.
    pub fn new(repo: Repository, directory: D) -> Self {
        Self { repo, directory }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, directory: D) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, directory))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, directory: D) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, directory))
    }

    // ========================
    // Account operations
    // ========================

    /// Create a new account. The current balance starts at the opening
    /// balance.
    pub async fn create_account(
        &self,
        account_number: String,
        account_type: String,
        opening_balance_cents: Cents,
        active: bool,
        owner_id: i64,
    ) -> Result<Account, AppError> {
        if self
            .repo
            .get_account_by_number(&account_number)
            .await?
            .is_some()
        {
            return Err(AppError::AccountAlreadyExists(account_number));
        }

        let account = Account::new(account_number, account_type, opening_balance_cents, owner_id)
            .with_active(active);
        self.repo.save_account(&account).await?;
        info!(account_number = %account.account_number, "account created");
        Ok(account)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// List all accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    /// Update an account's descriptive fields. The account number and the
    /// balances are not updatable: the number is the posting key, and the
    /// balances belong to the movement operations.
    pub async fn update_account(
        &self,
        id: AccountId,
        account_type: String,
        active: bool,
    ) -> Result<Account, AppError> {
        let account = self.get_account(id).await?;
        self.repo
            .update_account_fields(id, &account_type, active)
            .await?;
        Ok(Account {
            account_type,
            active,
            ..account
        })
    }

    /// Delete an account and all of its movements.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AppError> {
        let account = self.get_account(id).await?;
        self.repo.delete_account(account.id).await?;
        info!(account_number = %account.account_number, "account deleted");
        Ok(())
    }

    // ========================
    // Movement operations
    // ========================

    /// Apply a movement to the account with the given number. The value is
    /// signed: positive credits, negative debits. Fails with
    /// [`AppError::InsufficientFunds`] and persists nothing when the new
    /// balance would drop below zero.
    pub async fn apply_movement(
        &self,
        account_number: &str,
        date: NaiveDate,
        kind: String,
        value_cents: Cents,
    ) -> Result<MovementResult, AppError> {
        let account = self
            .repo
            .get_account_by_number(account_number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))?;

        let mut movement = Movement::new(date, kind, value_cents, account.id);
        if !self.repo.record_movement(&mut movement).await? {
            return Err(AppError::InsufficientFunds {
                account_number: account.account_number,
                balance: account.current_balance_cents,
                requested: value_cents,
            });
        }

        let account = self.get_account(movement.account_id).await?;
        Ok(MovementResult { movement, account })
    }

    /// Get a movement by ID, with a snapshot of its account.
    pub async fn get_movement(&self, id: MovementId) -> Result<MovementResult, AppError> {
        let movement = self
            .repo
            .get_movement(id)
            .await?
            .ok_or_else(|| AppError::MovementNotFound(id.to_string()))?;
        let account = self.get_account(movement.account_id).await?;
        Ok(MovementResult { movement, account })
    }

    /// Replace a movement's date, kind, and value. The account balance is
    /// corrected by `new_value - old_value`; this movement's snapshot is
    /// rewritten to the corrected balance. Snapshots of movements recorded
    /// after this one are left untouched, so they go stale.
    pub async fn revise_movement(
        &self,
        id: MovementId,
        date: NaiveDate,
        kind: String,
        new_value_cents: Cents,
    ) -> Result<MovementResult, AppError> {
        let mut movement = self
            .repo
            .get_movement(id)
            .await?
            .ok_or_else(|| AppError::MovementNotFound(id.to_string()))?;
        let account = self.get_account(movement.account_id).await?;

        if !self
            .repo
            .update_movement(&mut movement, date, &kind, new_value_cents)
            .await?
        {
            return Err(AppError::InsufficientFunds {
                account_number: account.account_number,
                balance: account.current_balance_cents,
                requested: new_value_cents,
            });
        }

        let account = self.get_account(movement.account_id).await?;
        Ok(MovementResult { movement, account })
    }

    /// Remove a movement, rolling its value back out of the account
    /// balance. No floor guard applies here.
    pub async fn remove_movement(&self, id: MovementId) -> Result<(), AppError> {
        let movement = self
            .repo
            .get_movement(id)
            .await?
            .ok_or_else(|| AppError::MovementNotFound(id.to_string()))?;
        self.repo.delete_movement(&movement).await?;
        Ok(())
    }

    /// List the movements of an owner's account with date in [from, to]
    /// inclusive, each decorated with the owner's display name. The name
    /// is resolved once; a directory failure aborts the whole listing.
    pub async fn list_movements_for_owner(
        &self,
        owner_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MovementWithOwner>, AppError> {
        let account = self
            .repo
            .get_account_by_owner(owner_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(format!("no account for owner {owner_id}")))?;

        let movements = self
            .repo
            .list_movements_in_range(account.id, from, to)
            .await?;
        let owner_name = self.directory.owner_name(owner_id).await?;

        Ok(movements
            .into_iter()
            .map(|movement| MovementWithOwner {
                movement,
                owner_name: owner_name.clone(),
            })
            .collect())
    }

    // ========================
    // Statements
    // ========================

    /// Build a statement over the given accounts and date range.
    ///
    /// Account ids that don't resolve are skipped without error. For each
    /// account the movements in range are replayed from the opening
    /// balance, in store order; the running balance is recomputed from the
    /// movement values alone, independent of the stored snapshots. A
    /// directory failure aborts the whole build; no partial report is
    /// returned.
    pub async fn build_statement(
        &self,
        account_ids: &[AccountId],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<StatementReport, AppError> {
        let mut report = StatementReport {
            owner: String::new(),
            accounts: Vec::new(),
        };

        for &account_id in account_ids {
            let Some(account) = self.repo.get_account(account_id).await? else {
                continue;
            };

            report.owner = self.directory.owner_name(account.owner_id).await?;

            let movements = self
                .repo
                .list_movements_in_range(account.id, from, to)
                .await?;

            let mut running = account.opening_balance_cents;
            let lines = movements
                .into_iter()
                .map(|movement| {
                    running += movement.value_cents;
                    StatementLine {
                        date: movement.date,
                        kind: movement.kind,
                        value_cents: movement.value_cents,
                        balance_cents: running,
                    }
                })
                .collect();

            report.accounts.push(AccountStatement {
                account_number: account.account_number,
                account_type: account.account_type,
                opening_balance_cents: account.opening_balance_cents,
                active: account.active,
                movements: lines,
            });
        }

        Ok(report)
    }
}
