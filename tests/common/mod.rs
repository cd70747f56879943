// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use saldo::application::LedgerService;
use saldo::directory::{DirectoryError, OwnerDirectory};
use tempfile::TempDir;

/// Deterministic in-memory owner directory for tests.
pub struct StubDirectory {
    owners: HashMap<i64, String>,
    unavailable: bool,
}

impl StubDirectory {
    pub fn new() -> Self {
        Self {
            owners: HashMap::new(),
            unavailable: false,
        }
    }

    /// A directory that fails every lookup as if the remote were down.
    pub fn down() -> Self {
        Self {
            owners: HashMap::new(),
            unavailable: true,
        }
    }

    pub fn with_owner(mut self, owner_id: i64, name: &str) -> Self {
        self.owners.insert(owner_id, name.to_string());
        self
    }
}

#[async_trait]
impl OwnerDirectory for StubDirectory {
    async fn owner_name(&self, owner_id: i64) -> Result<String, DirectoryError> {
        if self.unavailable {
            return Err(DirectoryError::Unavailable("connection refused".into()));
        }
        self.owners
            .get(&owner_id)
            .cloned()
            .ok_or(DirectoryError::OwnerNotFound(owner_id))
    }
}

/// Helper to create a test service with a temporary database and the
/// given directory stub.
pub async fn test_service_with(
    directory: StubDirectory,
) -> Result<(LedgerService<StubDirectory>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap(), directory).await?;
    Ok((service, temp_dir))
}

/// Helper to create a test service with two known owners.
pub async fn test_service() -> Result<(LedgerService<StubDirectory>, TempDir)> {
    test_service_with(
        StubDirectory::new()
            .with_owner(1, "Alice Carter")
            .with_owner(2, "Bruno Silva"),
    )
    .await
}

/// Helper to parse a date string into NaiveDate
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}
