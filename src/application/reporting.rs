use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Cents;

/// A statement groups per-account sections under one report. The `owner`
/// field holds the display name of the last owner resolved while building;
/// when the request spans accounts of different owners, earlier names are
/// overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementReport {
    pub owner: String,
    pub accounts: Vec<AccountStatement>,
}

/// One account's slice of a statement: its descriptive fields plus the
/// movements that fell inside the requested date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatement {
    pub account_number: String,
    pub account_type: String,
    pub opening_balance_cents: Cents,
    pub active: bool,
    pub movements: Vec<StatementLine>,
}

/// A replayed movement line. `balance_cents` is the running balance after
/// applying this line's value, reconstructed from the opening balance; it
/// is independent of the snapshot stored on the movement row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLine {
    pub date: NaiveDate,
    pub kind: String,
    pub value_cents: Cents,
    pub balance_cents: Cents,
}
