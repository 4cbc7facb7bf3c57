//! Wizard domain module.
//!
//! This module defines the onboarding wizard state machine types.

pub mod state_machine;

pub use state_machine::{WizardAction, WizardEvent, WizardFailure, WizardState, WizardStateMachine};
