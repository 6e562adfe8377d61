//! # LexFlow Common Library
//!
//! Shared code for the LexFlow intake services including:
//! - Classification result validation (closed case-type schema)
//! - Intake record construction and status lifecycle
//! - Record store interface and adapters
//! - Dashboard aggregation
//! - Classifier and notification collaborator interfaces
//! - Configuration loading

pub mod classification;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ids;
pub mod intake;
pub mod lifecycle;
pub mod notify;
pub mod record;
pub mod store;
pub mod summary;
pub mod time;

pub use classification::{validate, CaseType, Urgency, ValidatedResult, ValidationError};
pub use error::{Error, Result};
pub use intake::IntakeService;
pub use lifecycle::{LifecycleError, StatusLifecycle};
pub use record::{CaseStatus, ClientInput, InputError, IntakeRecord, PortalView, RecordBuilder};
pub use store::{RecordStore, StoreError};
pub use summary::{aggregate, RecentIntake, Summary};
