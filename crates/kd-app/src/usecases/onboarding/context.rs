use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kd_core::WizardState;
use tokio::sync::Mutex;

/// Shared wizard context: current state plus the reentrancy guard.
///
/// ## Lock Ordering
/// The `in_flight` flag is taken first and without waiting. `state` is only
/// locked for short reads and writes, never across an await on a port.
pub struct WizardContext {
    state: Mutex<WizardState>,
    /// Set while a continue transaction runs. Checked with compare-exchange so a
    /// second continue never queues behind the first.
    in_flight: AtomicBool,
    /// Set while the remote upsert itself is pending.
    saving: AtomicBool,
    /// Progress has been loaded once for this wizard.
    seeded: AtomicBool,
}

impl WizardContext {
    pub fn new(initial_state: WizardState) -> Self {
        Self {
            state: Mutex::new(initial_state),
            in_flight: AtomicBool::new(false),
            saving: AtomicBool::new(false),
            seeded: AtomicBool::new(false),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub async fn get_state(&self) -> WizardState {
        self.state.lock().await.clone()
    }

    pub async fn set_state(&self, state: WizardState) {
        *self.state.lock().await = state;
    }

    /// Claim the transaction slot. `None` if another transaction holds it.
    pub fn try_begin_transaction(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { context: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn set_saving(&self, saving: bool) {
        self.saving.store(saving, Ordering::Release);
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    /// Returns true the first time only.
    pub fn mark_seeded(&self) -> bool {
        !self.seeded.swap(true, Ordering::SeqCst)
    }

    pub fn clear_seeded(&self) {
        self.seeded.store(false, Ordering::SeqCst);
    }
}

impl Default for WizardContext {
    fn default() -> Self {
        Self::new(WizardState::idle())
    }
}

/// Releases the transaction slot on drop.
///
/// If the owning future was dropped mid-transaction the state is still busy;
/// it is put back to idle so the wizard accepts input again.
pub struct InFlightGuard<'a> {
    context: &'a WizardContext,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.context.saving.store(false, Ordering::Release);
        if let Ok(mut state) = self.context.state.try_lock() {
            if state.is_busy() {
                *state = WizardState::idle();
            }
        }
        self.context.in_flight.store(false, Ordering::Release);
    }
}
