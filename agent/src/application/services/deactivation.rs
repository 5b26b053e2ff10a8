//! Deactivation worker: the controller's only recovery primitive.
//!
//! Runs detached from the step that spawned it: cancelling or timing out
//! that step does not stop an in-flight deactivation.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::application::ports::ToolExecutor;
use crate::application::services::controller::{ControllerState, lock};
use crate::application::services::poll::wait_for_ras;
use crate::domain::{ActionPassword, Backoff, RasRemoteStatus};

/// A single deactivation attempt.
///
/// Must only be spawned after [`ControllerState::try_begin_deactivation`]
/// returned `true`; the worker owns clearing that flag.
pub struct DeactivationWorker<T> {
    pub(crate) tools: Arc<T>,
    pub(crate) state: Arc<Mutex<ControllerState>>,
    pub(crate) rps_url: String,
    pub(crate) password: ActionPassword,
    pub(crate) schedule: Backoff,
}

impl<T: ToolExecutor> DeactivationWorker<T> {
    /// Spawn onto the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let _flag = InProgressFlag(Arc::clone(&self.state));
        tracing::info!(rps_url = %self.rps_url, "deactivating AMT");

        let failure = match self.tools.deactivate(&self.rps_url, &self.password).await {
            Ok(out) if out.is_success() => None,
            Ok(out) => Some(format!("exit code {:?}", out.exit_code)),
            Err(e) => Some(format!("{e:#}")),
        };
        if let Some(reason) = failure {
            // Leave previous_ras untouched so a later step retries.
            tracing::warn!(%reason, "AMT deactivation failed");
            return;
        }

        let observed = wait_for_ras(&*self.tools, self.schedule, None, |ras| {
            ras == RasRemoteStatus::NotConnected
        })
        .await;
        if observed.is_none() {
            tracing::warn!(
                budget_secs = self.schedule.budget.as_secs(),
                "AMT still not reporting 'not connected' after deactivation; resetting anyway"
            );
        }

        let mut state = lock(&self.state);
        state.previous_ras = Some(RasRemoteStatus::NotConnected);
        state.connecting_since = None;
        state.generation += 1;
        tracing::info!("AMT deactivation finished");
    }
}

/// Clears `deactivation_in_progress` when the worker ends, even by panic.
struct InProgressFlag(Arc<Mutex<ControllerState>>);

impl Drop for InProgressFlag {
    fn drop(&mut self) {
        lock(&self.0).deactivation_in_progress = false;
    }
}
