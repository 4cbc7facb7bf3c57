//! Onboarding domain models.
//!
//! The onboarding wizard collects a dating profile across several screens. This
//! module defines the pieces that do not depend on any runtime: the draft being
//! accumulated, the immutable step definitions with their validation rules, the
//! persisted record shape, and the error taxonomy.

pub mod draft;
pub mod error;
pub mod field;
pub mod record;
pub mod step;
pub mod validation;

pub use draft::Draft;
pub use error::{
    InvalidStepError, PersistenceError, PersistenceErrorKind, StepSequenceError,
    ValidationError, ValidationFailure,
};
pub use field::{field_map, FieldMap, FieldValue};
pub use record::{ProfileRecord, ProfileRecordPatch, RESERVED_COLUMNS};
pub use step::{StepDefinition, StepSequence};
pub use validation::{FieldRule, FieldRules, NoValidation, StepValidator};
