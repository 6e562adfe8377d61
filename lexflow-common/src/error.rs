//! Common error types for LexFlow

use thiserror::Error;

use crate::classification::ValidationError;
use crate::classifier::ClassifierError;
use crate::lifecycle::LifecycleError;
use crate::record::InputError;
use crate::store::StoreError;

/// Common result type for LexFlow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across LexFlow services
#[derive(Error, Debug)]
pub enum Error {
    /// Classifier output did not conform to the intake schema
    #[error("Classification rejected: {0}")]
    Validation(#[from] ValidationError),

    /// Missing or empty client-submitted fields
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    /// Status change rejected
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Persistence collaborator failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Classification collaborator failure
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Requested case not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
