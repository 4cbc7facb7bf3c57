//! Wizard state machine.
//!
//! Defines a pure state transition function for one "continue" transaction of
//! the onboarding wizard: validate, save, advance. Side effects are returned as
//! actions for the orchestrator to execute.

use serde::{Deserialize, Serialize};

/// Wizard state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    /// Waiting for the user. Carries the failure of the last attempt, if any.
    Idle { error: Option<WizardFailure> },
    /// Running the active step's validator.
    Validating,
    /// Remote save in flight.
    Saving,
    /// Save confirmed, moving the step pointer.
    Advancing,
    /// Terminal step saved; onboarding is done.
    Completed,
}

impl WizardState {
    pub fn idle() -> Self {
        Self::Idle { error: None }
    }

    /// A continue transaction is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating | Self::Saving | Self::Advancing)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, Self::Saving)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn last_error(&self) -> Option<&WizardFailure> {
        match self {
            Self::Idle { error } => error.as_ref(),
            _ => None,
        }
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::idle()
    }
}

/// User-facing summary of why the last continue did not advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WizardFailure {
    /// Re-prompt the screen; nothing was saved.
    Validation { field: String, reason: String },
    /// Remote save failed. `retryable` decides between a retry banner and a
    /// blocking error.
    Save { retryable: bool, message: String },
}

/// Events that drive the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardEvent {
    /// User pressed continue on the active screen.
    ContinuePressed,
    ValidationPassed,
    ValidationFailed { failure: WizardFailure },
    SaveSucceeded,
    SaveFailed { failure: WizardFailure },
    /// Step pointer moved; `is_final` when the terminal step was just passed.
    StepAdvanced { is_final: bool },
    /// Save landed but the step pointer could not move.
    AdvanceFailed,
    /// User navigated back.
    BackPressed,
    /// Progress loaded at wizard entry.
    Resumed { completed: bool },
    /// User explicitly restarts onboarding.
    Abandoned,
}

/// Side-effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardAction {
    /// Validate the active step against the draft with the submitted fields merged.
    ValidateStep,
    /// Merge the submitted fields into the draft store.
    MergeFields,
    /// Upsert the merged draft, positioned at the next step.
    SaveProgress,
    /// Move the draft store's step pointer forward by one.
    AdvanceStep,
    /// Move the draft store's step pointer back by one.
    StepBack,
    /// Clear the draft store and the local cache.
    ResetDraft,
}

/// Pure wizard state machine.
pub struct WizardStateMachine;

impl WizardStateMachine {
    pub fn transition(state: WizardState, event: WizardEvent) -> (WizardState, Vec<WizardAction>) {
        match (state, event) {
            (WizardState::Idle { .. }, WizardEvent::ContinuePressed) => {
                (WizardState::Validating, vec![WizardAction::ValidateStep])
            }
            (WizardState::Validating, WizardEvent::ValidationPassed) => (
                WizardState::Saving,
                vec![WizardAction::MergeFields, WizardAction::SaveProgress],
            ),
            (WizardState::Validating, WizardEvent::ValidationFailed { failure }) => (
                WizardState::Idle {
                    error: Some(failure),
                },
                Vec::new(),
            ),
            (WizardState::Saving, WizardEvent::SaveSucceeded) => {
                (WizardState::Advancing, vec![WizardAction::AdvanceStep])
            }
            (WizardState::Saving, WizardEvent::SaveFailed { failure }) => (
                WizardState::Idle {
                    error: Some(failure),
                },
                Vec::new(),
            ),
            (WizardState::Advancing, WizardEvent::StepAdvanced { is_final: false }) => {
                (WizardState::idle(), Vec::new())
            }
            (WizardState::Advancing, WizardEvent::StepAdvanced { is_final: true }) => {
                (WizardState::Completed, Vec::new())
            }
            (WizardState::Advancing, WizardEvent::AdvanceFailed) => {
                (WizardState::idle(), Vec::new())
            }
            (WizardState::Idle { .. }, WizardEvent::BackPressed) => {
                (WizardState::idle(), vec![WizardAction::StepBack])
            }
            (WizardState::Idle { .. }, WizardEvent::Resumed { completed: true }) => {
                (WizardState::Completed, Vec::new())
            }
            (WizardState::Idle { .. }, WizardEvent::Resumed { completed: false }) => {
                (WizardState::idle(), Vec::new())
            }
            (WizardState::Idle { .. }, WizardEvent::Abandoned) => {
                (WizardState::idle(), vec![WizardAction::ResetDraft])
            }
            (state, _event) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(?state, event = ?_event, "wizard event ignored in current state");
                (state, Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{WizardAction, WizardEvent, WizardFailure, WizardState, WizardStateMachine};

    fn save_failure() -> WizardFailure {
        WizardFailure::Save {
            retryable: true,
            message: "timeout".into(),
        }
    }

    #[test]
    fn wizard_state_machine_happy_path_returns_to_idle() {
        let (state, actions) =
            WizardStateMachine::transition(WizardState::idle(), WizardEvent::ContinuePressed);
        assert_eq!(state, WizardState::Validating);
        assert_eq!(actions, vec![WizardAction::ValidateStep]);

        let (state, actions) = WizardStateMachine::transition(state, WizardEvent::ValidationPassed);
        assert_eq!(state, WizardState::Saving);
        assert_eq!(
            actions,
            vec![WizardAction::MergeFields, WizardAction::SaveProgress]
        );

        let (state, actions) = WizardStateMachine::transition(state, WizardEvent::SaveSucceeded);
        assert_eq!(state, WizardState::Advancing);
        assert_eq!(actions, vec![WizardAction::AdvanceStep]);

        let (state, actions) =
            WizardStateMachine::transition(state, WizardEvent::StepAdvanced { is_final: false });
        assert_eq!(state, WizardState::idle());
        assert!(actions.is_empty());
    }

    #[test]
    fn wizard_state_machine_final_step_completes() {
        let (state, _) = WizardStateMachine::transition(
            WizardState::Advancing,
            WizardEvent::StepAdvanced { is_final: true },
        );
        assert_eq!(state, WizardState::Completed);
    }

    #[test]
    fn wizard_state_machine_advance_failure_returns_to_idle() {
        let (state, actions) =
            WizardStateMachine::transition(WizardState::Advancing, WizardEvent::AdvanceFailed);
        assert_eq!(state, WizardState::idle());
        assert!(actions.is_empty());
    }

    #[test]
    fn wizard_state_machine_validation_failure_returns_to_idle_without_actions() {
        let failure = WizardFailure::Validation {
            field: "name".into(),
            reason: "is required".into(),
        };
        let (state, actions) = WizardStateMachine::transition(
            WizardState::Validating,
            WizardEvent::ValidationFailed {
                failure: failure.clone(),
            },
        );
        assert_eq!(
            state,
            WizardState::Idle {
                error: Some(failure)
            }
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn wizard_state_machine_save_failure_keeps_error() {
        let (state, actions) = WizardStateMachine::transition(
            WizardState::Saving,
            WizardEvent::SaveFailed {
                failure: save_failure(),
            },
        );
        assert_eq!(state.last_error(), Some(&save_failure()));
        assert!(actions.is_empty());
    }

    #[test]
    fn wizard_state_machine_continue_while_saving_is_noop() {
        let (state, actions) =
            WizardStateMachine::transition(WizardState::Saving, WizardEvent::ContinuePressed);
        assert_eq!(state, WizardState::Saving);
        assert!(actions.is_empty());
    }

    #[test]
    fn wizard_state_machine_back_only_from_idle() {
        let (state, actions) =
            WizardStateMachine::transition(WizardState::Saving, WizardEvent::BackPressed);
        assert_eq!(state, WizardState::Saving);
        assert!(actions.is_empty());

        let (state, actions) = WizardStateMachine::transition(
            WizardState::Idle {
                error: Some(save_failure()),
            },
            WizardEvent::BackPressed,
        );
        assert_eq!(state, WizardState::idle());
        assert_eq!(actions, vec![WizardAction::StepBack]);
    }

    #[test]
    fn wizard_state_machine_completed_is_terminal() {
        for event in [
            WizardEvent::ContinuePressed,
            WizardEvent::BackPressed,
            WizardEvent::Abandoned,
            WizardEvent::Resumed { completed: false },
        ] {
            let (state, actions) = WizardStateMachine::transition(WizardState::Completed, event);
            assert_eq!(state, WizardState::Completed);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn wizard_state_machine_resume_seeds_completed() {
        let (state, _) = WizardStateMachine::transition(
            WizardState::idle(),
            WizardEvent::Resumed { completed: true },
        );
        assert!(state.is_completed());
    }

    #[test]
    fn wizard_state_serializes_with_tag() {
        let json = serde_json::to_value(WizardState::Saving).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "saving" }));
    }
}
