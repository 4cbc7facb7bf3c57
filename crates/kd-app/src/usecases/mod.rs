//! Business logic use cases
//!
//! A screen reads and writes the [`DraftStore`](onboarding::DraftStore) directly.
//! On "continue" the [`StepController`](onboarding::StepController) validates,
//! merges, asks the [`ProfileSynchronizer`](onboarding::ProfileSynchronizer) to
//! flush the draft for the current identity, and advances only on a confirmed save.

pub mod onboarding;
pub mod session;
pub mod startup;
