//! Onboarding use cases.
//!
//! This module exposes the draft store, the persistence synchronizer and the
//! step controller, plus the default dating-profile step catalog.

mod context;
pub mod controller;
pub mod draft_store;
pub mod profile_steps;
pub mod synchronizer;

pub use controller::{
    ContinueOutcome, SaveRetryPolicy, StepController, StepControllerDeps, StepError,
};
pub use draft_store::DraftStore;
pub use profile_steps::default_profile_steps;
pub use synchronizer::{ProfileSynchronizer, SaveOutcome};
