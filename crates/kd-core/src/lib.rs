//! # kd-core
//!
//! Core domain models and business rules for the Kindred onboarding engine.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! the profile draft, step definitions and their validation rules, the wizard
//! state machine, and the ports implemented by the infrastructure layer.

pub mod config;
pub mod ids;
pub mod onboarding;
pub mod ports;
pub mod wizard;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use ids::UserId;
pub use onboarding::{Draft, FieldMap, FieldValue, StepDefinition, StepSequence};
pub use wizard::{WizardAction, WizardEvent, WizardFailure, WizardState, WizardStateMachine};
