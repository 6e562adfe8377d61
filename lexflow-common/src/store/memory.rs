//! In-process record store
//!
//! Ordered map behind an async lock. Used by tests and local runs without a
//! database; pages and cursors behave like the SQLite adapter's.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{RecordStore, ScanPage, StoreError};
use crate::record::{CaseStatus, IntakeRecord};

/// Default number of records per scan page
pub const DEFAULT_PAGE_SIZE: usize = 100;

pub struct MemoryRecordStore {
    records: RwLock<BTreeMap<String, IntakeRecord>>,
    page_size: usize,
    unavailable: AtomicBool,
    fail_at_page: Option<usize>,
    pages_served: AtomicUsize,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
            unavailable: AtomicBool::new(false),
            fail_at_page: None,
            pages_served: AtomicUsize::new(0),
        }
    }

    /// Make the `n`th scan page request (0-based, counted across scans) fail
    pub fn failing_at_page(mut self, n: usize) -> Self {
        self.fail_at_page = Some(n);
        self
    }

    /// Simulate a backend outage for every operation
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn put(&self, record: &IntakeRecord) -> Result<(), StoreError> {
        self.check_available()?;
        self.records
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<IntakeRecord>, StoreError> {
        self.check_available()?;
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<IntakeRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|record| record.access_token == token)
            .cloned())
    }

    async fn scan_page(&self, cursor: Option<&str>) -> Result<ScanPage, StoreError> {
        self.check_available()?;
        let page_index = self.pages_served.fetch_add(1, Ordering::SeqCst);
        if self.fail_at_page == Some(page_index) {
            return Err(StoreError::Unavailable(format!(
                "scan page {} failed",
                page_index
            )));
        }

        let records = self.records.read().await;
        let lower = match cursor {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        // One extra record tells us whether another page exists
        let mut page: Vec<IntakeRecord> = records
            .range((lower, Bound::Unbounded))
            .take(self.page_size + 1)
            .map(|(_, record)| record.clone())
            .collect();

        let next_cursor = if page.len() > self.page_size {
            page.truncate(self.page_size);
            page.last().map(|record| record.id.clone())
        } else {
            None
        };

        Ok(ScanPage {
            records: page,
            next_cursor,
        })
    }

    async fn update_status(
        &self,
        id: &str,
        status: CaseStatus,
        note: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.status = status;
        record.note = note.to_string();
        record.updated_at = updated_at;
        Ok(())
    }
}
