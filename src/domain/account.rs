use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type AccountId = Uuid;

/// An account is the subject of the ledger: it carries an opening balance
/// fixed at creation and a current balance the engine keeps in lock-step
/// with the account's movement history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Globally unique account number, the natural key for posting movements
    pub account_number: String,
    /// Free-form classification, e.g. "savings" or "checking"
    pub account_type: String,
    /// Balance baseline before any movement; never changes after creation
    pub opening_balance_cents: Cents,
    /// Cached aggregate: opening balance plus the sum of all persisted
    /// movement values. Only the ledger engine writes this field.
    pub current_balance_cents: Cents,
    /// Informational flag; an inactive account still accepts movements
    pub active: bool,
    /// Owner in the external directory; never validated beyond name lookup
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account. The current balance starts at the opening
    /// balance, which may be negative.
    pub fn new(
        account_number: String,
        account_type: String,
        opening_balance_cents: Cents,
        owner_id: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_number,
            account_type,
            opening_balance_cents,
            current_balance_cents: opening_balance_cents,
            active: true,
            owner_id,
            created_at: Utc::now(),
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }
}
