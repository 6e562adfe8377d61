//! Intake flow
//!
//! Submission order: check client fields, classify, validate, build, persist,
//! notify. Nothing is persisted unless classification validated, and a
//! notification failure never fails a submission that was already stored.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::classification::validate;
use crate::classifier::{ClassificationRequest, Classifier};
use crate::lifecycle::StatusLifecycle;
use crate::notify::Notifier;
use crate::record::{CaseStatus, ClientInput, IntakeRecord, PortalView, RecordBuilder};
use crate::store::RecordStore;
use crate::summary::{aggregate, Summary};
use crate::{Error, Result};

/// Entry point for every intake operation
#[derive(Clone)]
pub struct IntakeService {
    classifier: Arc<dyn Classifier>,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    builder: RecordBuilder,
    lifecycle: StatusLifecycle,
}

impl IntakeService {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let lifecycle = StatusLifecycle::new(store.clone());
        Self {
            classifier,
            store,
            notifier,
            builder: RecordBuilder::new(),
            lifecycle,
        }
    }

    /// Replace the record builder (fixed clock or ids in tests)
    pub fn with_builder(mut self, builder: RecordBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: StatusLifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Classify and store a new client submission
    pub async fn submit(&self, input: ClientInput) -> Result<IntakeRecord> {
        // Reject blank fields before paying for a classifier call
        input.check()?;

        let request = ClassificationRequest::from(&input);
        let raw = self.classifier.classify(&request).await.map_err(|e| {
            error!("Classifier call failed: {}", e);
            e
        })?;
        debug!(model = %raw.model, "Raw classifier response: {}", raw.text);

        self.create_from_payload(input, &raw.text, &raw.model).await
    }

    /// Create a case from an already obtained classifier payload
    pub async fn create_from_payload(
        &self,
        input: ClientInput,
        raw_payload: &str,
        model_identifier: &str,
    ) -> Result<IntakeRecord> {
        let result = validate(raw_payload).map_err(|e| {
            error!(reason = e.reason(), "Classifier output rejected: {}", e);
            e
        })?;
        info!(
            case_type = %result.case_type,
            viability = result.viability_score,
            urgency = %result.urgency,
            "Classification accepted"
        );

        let record = self.builder.build(&input, result, model_identifier)?;

        if let Err(e) = self.store.put(&record).await {
            error!(intake_id = %record.id, "Failed to store intake: {}", e);
            return Err(e.into());
        }
        info!(intake_id = %record.id, case_type = %record.case_type, "Intake stored");

        if let Err(e) = self.notifier.notify_intake(&record).await {
            warn!(intake_id = %record.id, "Notification failed: {}", e);
        }

        Ok(record)
    }

    /// Staff status change
    pub async fn transition(&self, id: &str, status: &str, note: &str) -> Result<CaseStatus> {
        Ok(self.lifecycle.transition(id, status, note).await?)
    }

    pub async fn case_detail(&self, id: &str) -> Result<IntakeRecord> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("case {}", id)))
    }

    /// Client-safe view of the case holding this access token
    pub async fn portal_view(&self, token: &str) -> Result<PortalView> {
        if token.trim().is_empty() {
            return Err(Error::NotFound("case for token".to_string()));
        }
        self.store
            .get_by_token(token)
            .await?
            .map(|record| record.portal_view())
            .ok_or_else(|| Error::NotFound("case for token".to_string()))
    }

    /// Aggregate every stored record; fails if any scan page fails
    pub async fn dashboard(&self) -> Result<Summary> {
        let records = self.store.scan_all().await.map_err(|e| {
            error!("Dashboard scan failed: {}", e);
            e
        })?;
        Ok(aggregate(&records))
    }
}
