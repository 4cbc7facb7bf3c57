//! Onboarding error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::RecordStoreError;

/// A step's required fields are missing or malformed.
///
/// Recovered locally by the screen; never reaches persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("field `{field}` {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationFailure,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: ValidationFailure) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

/// Which constraint a field failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("is required")]
    Missing,
    #[error("must be at least {min} characters")]
    TooShort { min: usize },
    #[error("must be at most {max} characters")]
    TooLong { max: usize },
    #[error("is not one of the allowed options")]
    NotAllowed,
    #[error("needs at least {min} selections")]
    TooFewItems { min: usize },
    #[error("allows at most {max} selections")]
    TooManyItems { max: usize },
    #[error("has the wrong type (expected {expected})")]
    WrongType { expected: String },
    #[error("does not meet the minimum age of {min_age}")]
    Underage { min_age: u32 },
    #[error("{message}")]
    Custom { message: String },
}

/// Programmer error: a step pointer move the step sequence does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvalidStepError {
    #[error("cannot jump from step {current} to step {requested}; only one step forward is allowed")]
    SkipsAhead { current: u32, requested: u32 },
    #[error("step {requested} is past the end of a {total_steps}-step wizard")]
    BeyondTotal { requested: u32, total_steps: u32 },
}

/// Step definitions must be numbered contiguously from 0.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepSequenceError {
    #[error("step sequence is empty")]
    Empty,
    #[error("step at position {position} is numbered {found}")]
    NotContiguous { position: u32, found: u32 },
}

/// Classification of a failed remote save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceErrorKind {
    Timeout,
    Network,
    Unavailable,
    Rejected,
    Unauthorized,
    Storage,
}

impl std::fmt::Display for PersistenceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Unavailable => "unavailable",
            Self::Rejected => "rejected",
            Self::Unauthorized => "unauthorized",
            Self::Storage => "storage",
        };
        write!(f, "{s}")
    }
}

/// Remote save or load failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error while persisting onboarding progress: {message}")]
pub struct PersistenceError {
    pub kind: PersistenceErrorKind,
    pub retryable: bool,
    pub message: String,
}

impl PersistenceError {
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl From<RecordStoreError> for PersistenceError {
    fn from(err: RecordStoreError) -> Self {
        let retryable = err.is_retryable();
        let kind = match &err {
            RecordStoreError::Timeout => PersistenceErrorKind::Timeout,
            RecordStoreError::Network(_) => PersistenceErrorKind::Network,
            RecordStoreError::Unavailable { .. } | RecordStoreError::RateLimited => {
                PersistenceErrorKind::Unavailable
            }
            RecordStoreError::Rejected(_) => PersistenceErrorKind::Rejected,
            RecordStoreError::Unauthorized(_) => PersistenceErrorKind::Unauthorized,
            RecordStoreError::Storage(_) | RecordStoreError::Corrupt(_) => {
                PersistenceErrorKind::Storage
            }
        };
        Self {
            kind,
            retryable,
            message: err.to_string(),
        }
    }
}
