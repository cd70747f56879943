use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

/// Lookup of an owner's display name in the external owner directory.
/// The ledger only decorates reports and movement views with the name; it
/// never mutates or validates owner records beyond this call.
#[async_trait]
pub trait OwnerDirectory: Send + Sync {
    async fn owner_name(&self, owner_id: i64) -> Result<String, DirectoryError>;
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Owner not found: {0}")]
    OwnerNotFound(i64),

    #[error("Owner directory unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Deserialize)]
struct OwnerRecord {
    name: String,
}

/// HTTP-backed owner directory. The base URL and the per-request timeout
/// are supplied at construction; there is no default endpoint.
pub struct HttpOwnerDirectory {
    client: Client,
    base_url: String,
}

impl HttpOwnerDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build owner directory HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OwnerDirectory for HttpOwnerDirectory {
    async fn owner_name(&self, owner_id: i64) -> Result<String, DirectoryError> {
        let url = format!("{}/owners/{}", self.base_url, owner_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(DirectoryError::OwnerNotFound(owner_id)),
            status if !status.is_success() => Err(DirectoryError::Unavailable(format!(
                "directory returned {status} for owner {owner_id}"
            ))),
            _ => {
                let record: OwnerRecord = response
                    .json()
                    .await
                    .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
                Ok(record.name)
            }
        }
    }
}
