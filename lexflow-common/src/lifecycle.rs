//! Case status lifecycle
//!
//! Any of the six statuses may follow any other (including a return to
//! `new`); only set membership is enforced. The existence check lives in the
//! store's conditional update, so a transition can never create a record.
//! Concurrent transitions on one record are last-write-wins.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::record::CaseStatus;
use crate::store::{RecordStore, StoreError};
use crate::time::{Clock, SystemClock};

/// Status change failures
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Invalid status '{given}'. Must be one of: {}", valid_statuses())]
    InvalidStatus { given: String },

    #[error("Case {0} not found")]
    CaseNotFound(String),

    #[error("Store error for case {id}: {source}")]
    Store { id: String, source: StoreError },
}

fn valid_statuses() -> String {
    CaseStatus::ALL
        .iter()
        .map(|status| status.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Applies staff status changes to stored records
#[derive(Clone)]
pub struct StatusLifecycle {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
}

impl StatusLifecycle {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Move a case to `new_status`, attaching `note`
    ///
    /// The status is checked before storage is touched. Returns the parsed
    /// status on success.
    pub async fn transition(
        &self,
        id: &str,
        new_status: &str,
        note: &str,
    ) -> Result<CaseStatus, LifecycleError> {
        let status: CaseStatus = new_status.parse().map_err(|_| LifecycleError::InvalidStatus {
            given: new_status.trim().to_string(),
        })?;
        let note = note.trim();

        match self
            .store
            .update_status(id, status, note, self.clock.now())
            .await
        {
            Ok(()) => {
                info!(intake_id = %id, status = %status, "Case status changed");
                Ok(status)
            }
            Err(StoreError::NotFound(_)) => {
                warn!(intake_id = %id, "Status change for unknown case");
                Err(LifecycleError::CaseNotFound(id.to_string()))
            }
            Err(e) => {
                error!(intake_id = %id, error = %e, "Status change store failure");
                Err(LifecycleError::Store {
                    id: id.to_string(),
                    source: e,
                })
            }
        }
    }
}
