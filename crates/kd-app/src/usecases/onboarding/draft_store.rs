use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use kd_core::onboarding::{Draft, FieldMap, FieldValue, InvalidStepError, StepSequence};

/// In-memory accumulator of onboarding answers.
///
/// One instance per wizard, injected into the screens and the step controller.
/// It is the single owner of the draft and never performs I/O.
pub struct DraftStore {
    draft: RwLock<Draft>,
    total_steps: u32,
}

impl DraftStore {
    pub fn new(total_steps: u32) -> Self {
        Self {
            draft: RwLock::new(Draft::new(total_steps)),
            total_steps,
        }
    }

    pub fn for_sequence(steps: &StepSequence) -> Self {
        Self::new(steps.total_steps())
    }

    /// Returns the store wrapped in Arc for shared ownership.
    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Merge `partial` into the draft. Last writer wins per field; no validation.
    pub async fn update(&self, partial: FieldMap) {
        if partial.is_empty() {
            return;
        }
        let mut draft = self.draft.write().await;
        debug!(fields = ?partial.keys().collect::<Vec<_>>(), "draft fields merged");
        draft.merge(partial);
    }

    /// Move the step pointer. At most one step forward, never past the end.
    pub async fn set_current_step(&self, step: u32) -> Result<(), InvalidStepError> {
        self.draft.write().await.set_current_step(step)
    }

    pub async fn current_step(&self) -> u32 {
        self.draft.read().await.current_step()
    }

    pub async fn field(&self, name: &str) -> Option<FieldValue> {
        self.draft.read().await.get(name).cloned()
    }

    /// Immutable copy of the whole draft.
    pub async fn snapshot(&self) -> Draft {
        self.draft.read().await.clone()
    }

    /// Replace the draft with one loaded from persistence.
    pub async fn hydrate(&self, loaded: Draft) {
        let draft = Draft::from_parts(
            loaded.fields().clone(),
            loaded.current_step(),
            self.total_steps,
        );
        debug!(step = draft.current_step(), fields = draft.fields().len(), "draft hydrated");
        *self.draft.write().await = draft;
    }

    /// Clear all answers and return to step 0.
    pub async fn reset(&self) {
        self.draft.write().await.clear();
    }
}
