//! Step controller.
//!
//! Drives one wizard instance: runs the pure [`WizardStateMachine`] and executes
//! the actions it returns against the draft store and the synchronizer.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use kd_core::onboarding::{
    Draft, FieldMap, InvalidStepError, PersistenceError, StepDefinition, StepSequence,
    ValidationError,
};
use kd_core::ports::WizardEventPort;
use kd_core::{UserId, WizardAction, WizardEvent, WizardFailure, WizardState, WizardStateMachine};

use super::context::WizardContext;
use super::draft_store::DraftStore;
use super::synchronizer::{ProfileSynchronizer, SaveOutcome};
use crate::usecases::session::IdentityProvider;

/// Errors produced by the step controller.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("invalid step transition: {0}")]
    InvalidStep(#[from] InvalidStepError),
    #[error("a save is already in flight")]
    SaveInFlight,
    #[error("onboarding is already completed")]
    Completed,
    #[error("onboarding is not completed")]
    NotCompleted,
    #[error("no step definition for step {0}")]
    UnknownStep(u32),
}

impl StepError {
    /// Pressing continue again may succeed without changing any input.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(err) => err.is_retryable(),
            _ => false,
        }
    }
}

/// Result of a continue press.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ContinueOutcome {
    /// Step saved and the pointer moved to `step`.
    Advanced {
        step: u32,
        next_route: String,
        saved: SaveOutcome,
    },
    /// Terminal step saved; onboarding is done.
    Completed {
        next_route: String,
        saved: SaveOutcome,
    },
    /// Another continue was still running. Nothing happened.
    Ignored,
}

/// Automatic retries for transient save failures.
///
/// Attempt `n` (1-based) waits `backoff * n` before resending the same upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveRetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl SaveRetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }
}

pub struct StepControllerDeps {
    pub steps: StepSequence,
    pub draft_store: Arc<DraftStore>,
    pub synchronizer: Arc<ProfileSynchronizer>,
    pub identity: Arc<dyn IdentityProvider>,
    pub events: Arc<dyn WizardEventPort>,
    pub retry: SaveRetryPolicy,
}

/// Per-dispatch scratch data the actions read and fill in.
struct Transaction {
    step: u32,
    fields: FieldMap,
    saved: Option<SaveOutcome>,
    error: Option<StepError>,
}

impl Transaction {
    fn at(step: u32) -> Self {
        Self {
            step,
            fields: FieldMap::new(),
            saved: None,
            error: None,
        }
    }
}

pub struct StepController {
    context: Arc<WizardContext>,
    steps: StepSequence,
    draft_store: Arc<DraftStore>,
    synchronizer: Arc<ProfileSynchronizer>,
    identity: Arc<dyn IdentityProvider>,
    events: Arc<dyn WizardEventPort>,
    retry: SaveRetryPolicy,
}

impl StepController {
    pub fn from_deps(deps: StepControllerDeps) -> Self {
        let StepControllerDeps {
            steps,
            draft_store,
            synchronizer,
            identity,
            events,
            retry,
        } = deps;
        Self {
            context: WizardContext::default().arc(),
            steps,
            draft_store,
            synchronizer,
            identity,
            events,
            retry,
        }
    }

    pub fn draft_store(&self) -> &Arc<DraftStore> {
        &self.draft_store
    }

    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    pub async fn state(&self) -> WizardState {
        self.context.get_state().await
    }

    /// True while the remote upsert of a continue is pending.
    pub fn is_saving(&self) -> bool {
        self.context.is_saving()
    }

    /// Definition of the screen the user is on, `None` once past the last step.
    pub async fn active_step(&self) -> Option<StepDefinition> {
        let step = self.draft_store.current_step().await;
        self.steps.get(step).cloned()
    }

    /// Load saved progress once, at wizard entry.
    ///
    /// Hydrates the draft store for the current identity (or from the local
    /// cache for guests) and seeds `Completed` for finished records. Later
    /// calls return the current state without touching persistence.
    pub async fn start(&self) -> Result<WizardState, StepError> {
        let Some(_guard) = self.context.try_begin_transaction() else {
            return Err(StepError::SaveInFlight);
        };
        if !self.context.mark_seeded() {
            return Ok(self.context.get_state().await);
        }

        let identity = self.identity.current_identity().await;
        let draft = match self
            .synchronizer
            .load_progress(identity.as_ref(), self.steps.total_steps())
            .await
        {
            Ok(draft) => draft,
            Err(err) => {
                self.context.clear_seeded();
                return Err(err.into());
            }
        };
        let completed = draft.is_complete();
        let step = draft.current_step();
        self.draft_store.hydrate(draft).await;
        info!(step, completed, "onboarding wizard resumed");

        let mut txn = Transaction::at(step);
        Ok(self.dispatch(WizardEvent::Resumed { completed }, &mut txn).await)
    }

    /// Validate, merge, save and advance the active step.
    ///
    /// Returns [`ContinueOutcome::Ignored`] without waiting when another
    /// continue is still running. On a failed save the submitted fields stay
    /// merged in the draft store and the step does not move.
    pub async fn continue_step(&self, fields: FieldMap) -> Result<ContinueOutcome, StepError> {
        let Some(_guard) = self.context.try_begin_transaction() else {
            debug!("continue ignored, transaction already in flight");
            return Ok(ContinueOutcome::Ignored);
        };
        if self.context.get_state().await.is_completed() {
            return Err(StepError::Completed);
        }

        let step = self.draft_store.current_step().await;
        let definition = self
            .steps
            .get(step)
            .ok_or(StepError::UnknownStep(step))?;

        let mut txn = Transaction {
            fields: definition.extract(&fields),
            ..Transaction::at(step)
        };
        let span = info_span!("usecase.step_controller.continue", step, screen = %definition.name);
        let final_state = self
            .dispatch(WizardEvent::ContinuePressed, &mut txn)
            .instrument(span)
            .await;

        if let Some(err) = txn.error {
            return Err(err);
        }
        let saved = txn.saved.unwrap_or(SaveOutcome::LocalOnly);
        let next_route = definition.next_route.clone();
        if final_state.is_completed() {
            Ok(ContinueOutcome::Completed { next_route, saved })
        } else {
            Ok(ContinueOutcome::Advanced {
                step: step + 1,
                next_route,
                saved,
            })
        }
    }

    /// Go back one screen. Refused while a save is in flight.
    pub async fn back(&self) -> Result<u32, StepError> {
        let Some(_guard) = self.context.try_begin_transaction() else {
            return Err(StepError::SaveInFlight);
        };
        if self.context.get_state().await.is_completed() {
            return Err(StepError::Completed);
        }

        let step = self.draft_store.current_step().await;
        let mut txn = Transaction::at(step);
        self.dispatch(WizardEvent::BackPressed, &mut txn).await;
        if let Some(err) = txn.error {
            return Err(err);
        }
        Ok(self.draft_store.current_step().await)
    }

    /// Throw the draft away and start over at step 0.
    pub async fn abandon(&self) -> Result<(), StepError> {
        let Some(_guard) = self.context.try_begin_transaction() else {
            return Err(StepError::SaveInFlight);
        };
        if self.context.get_state().await.is_completed() {
            return Err(StepError::Completed);
        }

        let step = self.draft_store.current_step().await;
        let mut txn = Transaction::at(step);
        self.dispatch(WizardEvent::Abandoned, &mut txn).await;
        info!(from_step = step, "onboarding draft abandoned");
        Ok(())
    }

    /// Dispose of a completed wizard: clears the draft store and local cache.
    pub async fn finish(&self) -> Result<(), StepError> {
        let Some(_guard) = self.context.try_begin_transaction() else {
            return Err(StepError::SaveInFlight);
        };
        if !self.context.get_state().await.is_completed() {
            return Err(StepError::NotCompleted);
        }

        self.draft_store.reset().await;
        self.synchronizer.discard_local().await;
        self.context.clear_seeded();
        self.set_state_and_emit(WizardState::idle()).await;
        info!("onboarding wizard finished");
        Ok(())
    }

    async fn dispatch(&self, event: WizardEvent, txn: &mut Transaction) -> WizardState {
        let span = info_span!("usecase.step_controller.dispatch", event = ?event);
        async {
            let mut current = self.context.get_state().await;
            let mut pending_events = vec![event];

            while let Some(event) = pending_events.pop() {
                let from = current.clone();
                let event_name = format!("{:?}", event);
                let (next, actions) = WizardStateMachine::transition(current, event);
                info!(from = ?from, to = ?next, event = %event_name, "wizard state transition");
                self.set_state_and_emit(next.clone()).await;
                let follow_up_events = self.execute_actions(actions, txn).await;
                current = next;
                pending_events.extend(follow_up_events);
            }

            current
        }
        .instrument(span)
        .await
    }

    async fn execute_actions(
        &self,
        actions: Vec<WizardAction>,
        txn: &mut Transaction,
    ) -> Vec<WizardEvent> {
        let mut follow_up_events = Vec::new();
        for action in actions {
            debug!(?action, "wizard executing action");
            match action {
                WizardAction::ValidateStep => {
                    follow_up_events.push(self.validate_step(txn).await);
                }
                WizardAction::MergeFields => {
                    self.draft_store.update(txn.fields.clone()).await;
                }
                WizardAction::SaveProgress => {
                    follow_up_events.push(self.save_progress(txn).await);
                }
                WizardAction::AdvanceStep => {
                    let next = txn.step + 1;
                    match self.draft_store.set_current_step(next).await {
                        Ok(()) => follow_up_events.push(WizardEvent::StepAdvanced {
                            is_final: self.steps.is_final(txn.step),
                        }),
                        Err(err) => {
                            warn!(error = %err, step = next, "step pointer rejected after save");
                            txn.error = Some(err.into());
                            follow_up_events.push(WizardEvent::AdvanceFailed);
                        }
                    }
                }
                WizardAction::StepBack => {
                    let previous = txn.step.saturating_sub(1);
                    if let Err(err) = self.draft_store.set_current_step(previous).await {
                        txn.error = Some(err.into());
                    }
                }
                WizardAction::ResetDraft => {
                    self.draft_store.reset().await;
                    self.synchronizer.discard_local().await;
                }
            }
        }
        follow_up_events
    }

    async fn validate_step(&self, txn: &mut Transaction) -> WizardEvent {
        let Some(definition) = self.steps.get(txn.step) else {
            txn.error = Some(StepError::UnknownStep(txn.step));
            return WizardEvent::ValidationFailed {
                failure: WizardFailure::Validation {
                    field: String::new(),
                    reason: "unknown step".to_string(),
                },
            };
        };

        let prospective = self.draft_store.snapshot().await.merged_with(&txn.fields);
        match definition.validate(&prospective) {
            Ok(()) => WizardEvent::ValidationPassed,
            Err(err) => {
                debug!(field = %err.field, reason = %err.reason, "step validation failed");
                let failure = WizardFailure::Validation {
                    field: err.field.clone(),
                    reason: err.reason.to_string(),
                };
                txn.error = Some(err.into());
                WizardEvent::ValidationFailed { failure }
            }
        }
    }

    async fn save_progress(&self, txn: &mut Transaction) -> WizardEvent {
        let identity = self.identity.current_identity().await;
        let prospective = self.draft_store.snapshot().await.at_step(txn.step + 1);

        self.context.set_saving(true);
        let result = self.save_with_retry(identity.as_ref(), &prospective).await;
        self.context.set_saving(false);

        match result {
            Ok(outcome) => {
                txn.saved = Some(outcome);
                WizardEvent::SaveSucceeded
            }
            Err(err) => {
                let failure = WizardFailure::Save {
                    retryable: err.is_retryable(),
                    message: err.to_string(),
                };
                txn.error = Some(err.into());
                WizardEvent::SaveFailed { failure }
            }
        }
    }

    async fn save_with_retry(
        &self,
        identity: Option<&UserId>,
        draft: &Draft,
    ) -> Result<SaveOutcome, PersistenceError> {
        let mut attempt = 0u32;
        loop {
            match self.synchronizer.save_progress(identity, draft).await {
                Ok(outcome) => return Ok(outcome),
                Err(err) if err.is_retryable() && attempt < self.retry.attempts => {
                    let delay = self.retry.backoff * (attempt + 1);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.retry.attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "retrying onboarding save"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn set_state_and_emit(&self, state: WizardState) {
        self.context.set_state(state.clone()).await;
        let step = self.draft_store.current_step().await;
        self.events.emit_state_changed(state, step).await;
    }
}
