//! Record store interface
//!
//! The store is the only shared durable state. Every operation works on a
//! single record or is a read-only scan, so the core needs no locking of its
//! own; atomicity of individual writes is the backend's job.
//!
//! Records returned by a store are detached copies.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::record::{CaseStatus, IntakeRecord};

pub mod memory;
#[cfg(feature = "sqlx")]
pub mod sqlite;

pub use memory::MemoryRecordStore;
#[cfg(feature = "sqlx")]
pub use sqlite::SqliteRecordStore;

/// Persistence collaborator failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or backend failure
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Conditional update targeted an id that does not exist
    #[error("record not found: {0}")]
    NotFound(String),

    /// Stored data could not be decoded into a record
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// One page of a full scan
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub records: Vec<IntakeRecord>,
    /// Cursor for the next page; `None` once the scan is exhausted
    pub next_cursor: Option<String>,
}

/// Persistence operations the intake core relies on
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create or overwrite a record by id
    async fn put(&self, record: &IntakeRecord) -> Result<(), StoreError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<IntakeRecord>, StoreError>;

    /// Find the single record carrying this access token
    async fn get_by_token(&self, token: &str) -> Result<Option<IntakeRecord>, StoreError>;

    /// Fetch one page, starting after `cursor` (or from the beginning)
    async fn scan_page(&self, cursor: Option<&str>) -> Result<ScanPage, StoreError>;

    /// Set status, note and updated_at on an existing record
    ///
    /// Must fail with [`StoreError::NotFound`] from within the store itself if
    /// the id does not exist; never creates a record.
    async fn update_status(
        &self,
        id: &str,
        status: CaseStatus,
        note: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Follow pagination cursors until exhausted
    ///
    /// Any failed page fails the whole scan; a partial set is never returned.
    async fn scan_all(&self) -> Result<Vec<IntakeRecord>, StoreError> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.scan_page(cursor.as_deref()).await?;
            pages += 1;
            records.extend(page.records);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(records = records.len(), pages, "Store scan complete");
        Ok(records)
    }
}
