use thiserror::Error;

use crate::directory::DirectoryError;
use crate::domain::Cents;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Movement not found: {0}")]
    MovementNotFound(String),

    #[error(
        "Insufficient funds in account {account_number}: balance {balance}, requested {requested}"
    )]
    InsufficientFunds {
        account_number: String,
        balance: Cents,
        requested: Cents,
    },

    #[error("Owner not found: {0}")]
    OwnerNotFound(i64),

    #[error("Owner directory unavailable: {0}")]
    DirectoryUnavailable(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::OwnerNotFound(id) => AppError::OwnerNotFound(id),
            DirectoryError::Unavailable(reason) => AppError::DirectoryUnavailable(reason),
        }
    }
}
