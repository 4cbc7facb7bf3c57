//! Kindred application orchestration layer
//!
//! This crate contains the onboarding use cases: the draft store screens bind to,
//! the persistence synchronizer, the step controller that drives the wizard, the
//! session/identity provider, and the startup coordinator.

pub mod usecases;

pub use usecases::onboarding::{
    default_profile_steps, ContinueOutcome, DraftStore, ProfileSynchronizer, SaveOutcome,
    SaveRetryPolicy, StepController, StepControllerDeps, StepError,
};
pub use usecases::session::{IdentityProvider, SessionError, SessionService};
pub use usecases::startup::{AppStartup, Initialize, StartupError};
