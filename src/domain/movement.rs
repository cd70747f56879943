use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents};

pub type MovementId = Uuid;

/// A movement is a single signed entry recorded against one account.
/// Positive values are credits, negative values are debits; the `kind`
/// label is purely descriptive and never changes sign handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    /// Calendar date of the movement, no time component
    pub date: NaiveDate,
    /// Descriptive label, e.g. "deposit" or "withdrawal"
    pub kind: String,
    /// Signed delta applied to the account balance
    pub value_cents: Cents,
    /// Snapshot of the account's current balance immediately after this
    /// movement was applied. The account aggregate stays authoritative;
    /// this field is a materialized view of history.
    pub balance_cents: Cents,
    /// Owning account, set at creation and never reassigned
    pub account_id: AccountId,
}

impl Movement {
    /// Create a new movement. The balance snapshot is assigned by the
    /// repository when the movement is recorded, since only the store knows
    /// the balance the update actually produced.
    pub fn new(date: NaiveDate, kind: String, value_cents: Cents, account_id: AccountId) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            kind,
            value_cents,
            balance_cents: 0,
            account_id,
        }
    }
}
