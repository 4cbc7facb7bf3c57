use async_trait::async_trait;

use crate::wizard::WizardState;

/// Sink for wizard state changes, bound by screens (saving spinner, error banner).
#[async_trait]
pub trait WizardEventPort: Send + Sync {
    async fn emit_state_changed(&self, state: WizardState, current_step: u32);
}
