use async_trait::async_trait;
use tracing::{info, warn};

use kd_core::ports::WizardEventPort;
use kd_core::{WizardFailure, WizardState};

/// Wizard event sink for headless runs: every state change becomes a log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingWizardEventPort;

#[async_trait]
impl WizardEventPort for TracingWizardEventPort {
    async fn emit_state_changed(&self, state: WizardState, current_step: u32) {
        match state.last_error() {
            Some(WizardFailure::Validation { field, reason }) => {
                warn!(
                    step = current_step,
                    field = %field,
                    reason = %reason,
                    "wizard input rejected"
                );
            }
            Some(WizardFailure::Save { retryable, message }) => {
                warn!(step = current_step, retryable, message = %message, "wizard save failed");
            }
            None => {
                info!(step = current_step, state = ?state, "wizard state changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_never_panics_without_subscriber() {
        let port = TracingWizardEventPort;
        port.emit_state_changed(WizardState::Saving, 2).await;
        port.emit_state_changed(
            WizardState::Idle {
                error: Some(WizardFailure::Save {
                    retryable: true,
                    message: "timeout".into(),
                }),
            },
            2,
        )
        .await;
    }
}
