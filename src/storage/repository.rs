use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{Account, AccountId, Cents, Movement, MovementId};

use super::MIGRATION_001_INITIAL;

/// Repository for persisting and querying accounts and movements.
///
/// Every mutation that touches an account balance runs the movement write
/// and the balance update inside a single transaction, and the balance
/// change is expressed relative to the stored value so that concurrent
/// posts against the same account serialize on the database write lock.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account to the database.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, account_number, account_type, opening_balance_cents, current_balance_cents, active, owner_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.account_number)
        .bind(&account.account_type)
        .bind(account.opening_balance_cents)
        .bind(account.current_balance_cents)
        .bind(account.active)
        .bind(account.owner_id)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_number, account_type, opening_balance_cents, current_balance_cents, active, owner_id, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Get an account by its account number.
    pub async fn get_account_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_number, account_type, opening_balance_cents, current_balance_cents, active, owner_id, created_at
            FROM accounts
            WHERE account_number = ?
            "#,
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by number")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Get the account associated with an owner.
    pub async fn get_account_by_owner(&self, owner_id: i64) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_number, account_type, opening_balance_cents, current_balance_cents, active, owner_id, created_at
            FROM accounts
            WHERE owner_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by owner")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List all accounts, ordered by account number.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_number, account_type, opening_balance_cents, current_balance_cents, active, owner_id, created_at
            FROM accounts
            ORDER BY account_number
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Update the mutable descriptive fields of an account. Balances are
    /// only ever touched by the movement operations below.
    pub async fn update_account_fields(
        &self,
        id: AccountId,
        account_type: &str,
        active: bool,
    ) -> Result<()> {
        sqlx::query("UPDATE accounts SET account_type = ?, active = ? WHERE id = ?")
            .bind(account_type)
            .bind(active)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update account")?;
        Ok(())
    }

    /// Delete an account and all of its movements in one transaction.
    pub async fn delete_account(&self, id: AccountId) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM movements WHERE account_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete account movements")?;

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete account")?;

        tx.commit().await.context("Failed to commit delete")?;
        Ok(())
    }

    // ========================
    // Movement operations
    // ========================

    /// Get a movement by ID.
    pub async fn get_movement(&self, id: MovementId) -> Result<Option<Movement>> {
        let row = sqlx::query(
            r#"
            SELECT id, account_id, date, kind, value_cents, balance_cents
            FROM movements
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch movement")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_movement(&row)?)),
            None => Ok(None),
        }
    }

    /// List an account's movements with date in [from, to] inclusive, in
    /// insertion order.
    pub async fn list_movements_in_range(
        &self,
        account_id: AccountId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Movement>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, date, kind, value_cents, balance_cents
            FROM movements
            WHERE account_id = ? AND date >= ? AND date <= ?
            ORDER BY rowid
            "#,
        )
        .bind(account_id.to_string())
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list movements")?;

        rows.iter().map(Self::row_to_movement).collect()
    }

    /// Record a movement against its account. Applies the movement's value
    /// to the account balance and inserts the movement row in a single
    /// transaction. The balance update carries a non-negative floor guard;
    /// returns false (and persists nothing) when the guard rejects it.
    ///
    /// The movement's balance snapshot is assigned here, from the balance
    /// the update actually produced.
    pub async fn record_movement(&self, movement: &mut Movement) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET current_balance_cents = current_balance_cents + ?
            WHERE id = ? AND current_balance_cents + ? >= 0
            "#,
        )
        .bind(movement.value_cents)
        .bind(movement.account_id.to_string())
        .bind(movement.value_cents)
        .execute(&mut *tx)
        .await
        .context("Failed to apply movement to account balance")?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(false);
        }

        movement.balance_cents = Self::fetch_balance(&mut tx, movement.account_id).await?;

        sqlx::query(
            r#"
            INSERT INTO movements (id, account_id, date, kind, value_cents, balance_cents)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(movement.id.to_string())
        .bind(movement.account_id.to_string())
        .bind(movement.date.to_string())
        .bind(&movement.kind)
        .bind(movement.value_cents)
        .bind(movement.balance_cents)
        .execute(&mut *tx)
        .await
        .context("Failed to save movement")?;

        tx.commit().await.context("Failed to commit movement")?;
        debug!(movement_id = %movement.id, balance = movement.balance_cents, "movement recorded");
        Ok(true)
    }

    /// Replace a movement's date, kind, and value, correcting the account
    /// balance by the difference between the new and old value. Same
    /// single-transaction, floor-guarded contract as [`record_movement`].
    /// Only this movement's snapshot is rewritten; snapshots of movements
    /// recorded later are left as they were.
    ///
    /// On success the passed movement is updated in place.
    pub async fn update_movement(
        &self,
        movement: &mut Movement,
        date: NaiveDate,
        kind: &str,
        new_value: Cents,
    ) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        // Read the authoritative old value inside the transaction; the one
        // on the passed struct may be stale.
        let row = sqlx::query("SELECT value_cents FROM movements WHERE id = ?")
            .bind(movement.id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch movement for update")?;

        let old_value: Cents = match row {
            Some(row) => row.get("value_cents"),
            None => anyhow::bail!("Movement {} disappeared during update", movement.id),
        };
        let delta = new_value - old_value;

        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET current_balance_cents = current_balance_cents + ?
            WHERE id = ? AND current_balance_cents + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(movement.account_id.to_string())
        .bind(delta)
        .execute(&mut *tx)
        .await
        .context("Failed to correct account balance")?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await.context("Failed to roll back")?;
            return Ok(false);
        }

        let new_balance = Self::fetch_balance(&mut tx, movement.account_id).await?;

        sqlx::query(
            "UPDATE movements SET date = ?, kind = ?, value_cents = ?, balance_cents = ? WHERE id = ?",
        )
        .bind(date.to_string())
        .bind(kind)
        .bind(new_value)
        .bind(new_balance)
        .bind(movement.id.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to update movement")?;

        tx.commit().await.context("Failed to commit movement update")?;

        movement.date = date;
        movement.kind = kind.to_string();
        movement.value_cents = new_value;
        movement.balance_cents = new_balance;
        debug!(movement_id = %movement.id, balance = new_balance, "movement revised");
        Ok(true)
    }

    /// Delete a movement, rolling its value back out of the account
    /// balance in the same transaction. No floor guard applies: reversing
    /// a movement is always allowed.
    pub async fn delete_movement(&self, movement: &Movement) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let row = sqlx::query("DELETE FROM movements WHERE id = ? RETURNING value_cents")
            .bind(movement.id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to delete movement")?;

        let value: Cents = match row {
            Some(row) => row.get("value_cents"),
            None => anyhow::bail!("Movement {} disappeared during delete", movement.id),
        };

        sqlx::query("UPDATE accounts SET current_balance_cents = current_balance_cents - ? WHERE id = ?")
            .bind(value)
            .bind(movement.account_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to roll back account balance")?;

        tx.commit().await.context("Failed to commit movement delete")?;
        debug!(movement_id = %movement.id, "movement deleted");
        Ok(())
    }

    async fn fetch_balance(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        account_id: AccountId,
    ) -> Result<Cents> {
        let row = sqlx::query("SELECT current_balance_cents FROM accounts WHERE id = ?")
            .bind(account_id.to_string())
            .fetch_one(&mut **tx)
            .await
            .context("Failed to read account balance")?;
        Ok(row.get("current_balance_cents"))
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            account_number: row.get("account_number"),
            account_type: row.get("account_type"),
            opening_balance_cents: row.get("opening_balance_cents"),
            current_balance_cents: row.get("current_balance_cents"),
            active: row.get::<i32, _>("active") != 0,
            owner_id: row.get("owner_id"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_movement(row: &sqlx::sqlite::SqliteRow) -> Result<Movement> {
        let id_str: String = row.get("id");
        let account_id_str: String = row.get("account_id");
        let date_str: String = row.get("date");

        Ok(Movement {
            id: Uuid::parse_str(&id_str).context("Invalid movement ID")?,
            account_id: Uuid::parse_str(&account_id_str).context("Invalid account ID")?,
            date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").context("Invalid date")?,
            kind: row.get("kind"),
            value_cents: row.get("value_cents"),
            balance_cents: row.get("balance_cents"),
        })
    }
}
