//! Intake records
//!
//! An [`IntakeRecord`] is created exactly once by [`RecordBuilder::build`] from
//! the client's submitted fields plus a [`ValidatedResult`]. After that only
//! `status`, `note` and `updated_at` ever change, and only through the status
//! lifecycle.
//!
//! Serialized field names are the storage contract.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classification::{CaseType, Urgency, ValidatedResult};
use crate::ids::{IdSource, RandomIds};
use crate::time::{Clock, SystemClock};

/// Case status as tracked by staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    New,
    Claimed,
    Active,
    NeedsReview,
    Declined,
    Closed,
    /// Stored value outside the closed set; only produced when reading rows
    #[serde(skip_deserializing)]
    Unknown,
}

impl CaseStatus {
    pub const ALL: [CaseStatus; 6] = [
        CaseStatus::New,
        CaseStatus::Claimed,
        CaseStatus::Active,
        CaseStatus::NeedsReview,
        CaseStatus::Declined,
        CaseStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::New => "new",
            CaseStatus::Claimed => "claimed",
            CaseStatus::Active => "active",
            CaseStatus::NeedsReview => "needs_review",
            CaseStatus::Declined => "declined",
            CaseStatus::Closed => "closed",
            CaseStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = String;

    /// Staff input is trimmed and matched case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        CaseStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid status: {}", s))
    }
}

/// Fields submitted by the client through the intake form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInput {
    #[serde(default, alias = "client_name")]
    pub name: String,
    #[serde(default, alias = "client_email")]
    pub email: String,
    #[serde(default, alias = "client_phone")]
    pub phone: String,
    #[serde(default)]
    pub incident_date: String,
    #[serde(default, alias = "raw_description")]
    pub description: String,
    #[serde(default)]
    pub prior_attorney: bool,
}

impl ClientInput {
    /// Names of required fields that are empty after trimming
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("incident_date", &self.incident_date),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Reject the submission if any required field is blank
    pub fn check(&self) -> Result<(), InputError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(InputError::MissingClientFields(missing))
        }
    }
}

/// Client submission problems
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingClientFields(Vec<&'static str>),
}

/// Persisted intake record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,

    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub incident_date: String,
    pub raw_description: String,
    #[serde(default)]
    pub prior_attorney: bool,

    pub case_type: CaseType,
    pub viability_score: u8,
    pub urgency: Urgency,
    pub statute_of_limitations_flag: bool,
    pub key_facts: Vec<String>,
    pub recommended_specialty: String,
    pub recommended_action: String,
    pub client_acknowledgment: String,
    pub model_identifier: String,

    pub status: CaseStatus,
    #[serde(default)]
    pub note: String,
    pub updated_at: DateTime<Utc>,
    pub access_token: String,
}

impl IntakeRecord {
    /// Client-safe projection for token lookups
    pub fn portal_view(&self) -> PortalView {
        PortalView::from(self)
    }
}

/// What a client may see about their own case
///
/// Never carries notes, scores, contact details or internal fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalView {
    pub client_name: String,
    pub case_type: CaseType,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    pub incident_date: String,
}

impl From<&IntakeRecord> for PortalView {
    fn from(record: &IntakeRecord) -> Self {
        Self {
            client_name: record.client_name.clone(),
            case_type: record.case_type,
            status: record.status,
            created_at: record.created_at,
            incident_date: record.incident_date.clone(),
        }
    }
}

/// Assembles new intake records
#[derive(Clone)]
pub struct RecordBuilder {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
}

impl Default for RecordBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordBuilder {
    /// Builder using the wall clock and random identifiers
    pub fn new() -> Self {
        Self::with_sources(Arc::new(SystemClock), Arc::new(RandomIds))
    }

    pub fn with_sources(clock: Arc<dyn Clock>, ids: Arc<dyn IdSource>) -> Self {
        Self { clock, ids }
    }

    /// Combine client input and a validated classification into a new record
    ///
    /// The record starts in [`CaseStatus::New`] with an empty note.
    pub fn build(
        &self,
        input: &ClientInput,
        result: ValidatedResult,
        model_identifier: &str,
    ) -> Result<IntakeRecord, InputError> {
        input.check()?;

        let created_at = self.clock.now();
        let ValidatedResult {
            case_type,
            viability_score,
            urgency,
            statute_of_limitations_flag,
            key_facts,
            recommended_specialty,
            recommended_action,
            client_acknowledgment,
        } = result;

        Ok(IntakeRecord {
            id: self.ids.intake_id(),
            created_at,
            client_name: input.name.trim().to_string(),
            client_email: input.email.trim().to_string(),
            client_phone: input.phone.trim().to_string(),
            incident_date: input.incident_date.trim().to_string(),
            raw_description: input.description.trim().to_string(),
            prior_attorney: input.prior_attorney,
            case_type,
            viability_score,
            urgency,
            statute_of_limitations_flag,
            key_facts,
            recommended_specialty,
            recommended_action,
            client_acknowledgment,
            model_identifier: model_identifier.to_string(),
            status: CaseStatus::New,
            note: String::new(),
            updated_at: created_at,
            access_token: self.ids.access_token(),
        })
    }
}
