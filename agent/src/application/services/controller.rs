//! Activation state controller.
//!
//! Reconciles the Device-Manager's activation intent with the AMT link state
//! observed through `rpc amtinfo`, runs activation, and falls back to a
//! detached deactivation worker whenever the link gets stuck.
//!
//! Locking follows a read / act / commit pattern: state is copied out under
//! the mutex, external work runs without it, and the resulting transition is
//! committed under the mutex again. A commit is dropped if a deactivation
//! worker finished in between (see [`ControllerState::generation`]).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::application::ports::{Clock, DeviceManager, ToolExecutor};
use crate::application::services::deactivation::DeactivationWorker;
use crate::application::services::poll::wait_for_ras;
use crate::domain::{
    ActivationError, ActivationIntent, ActivationOutcome, ActivationStatus, AmtSnapshot,
    AmtStatus, Backoff, DeviceManagerError, Operation, RasRemoteStatus, rps_url,
};

/// How long the link may sit in `connecting` before it is considered stuck.
pub const STUCK_CONNECTING_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Step time kept back from post-activation polling for the final report.
const REPORT_RESERVE: Duration = Duration::from_secs(2);

/// Controller state shared between steps and the deactivation worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// Last committed `RAS Remote Status`; `None` on cold start and after a
    /// deactivation was scheduled.
    pub previous_ras: Option<RasRemoteStatus>,
    /// Start of the current `connecting` episode. Set iff
    /// `previous_ras == Some(Connecting)`.
    pub connecting_since: Option<DateTime<Utc>>,
    /// Guard for the single deactivation worker.
    pub deactivation_in_progress: bool,
    /// Bumped by every completed deactivation.
    pub generation: u64,
}

impl ControllerState {
    /// Atomically claim the deactivation slot.
    pub fn try_begin_deactivation(&mut self) -> bool {
        if self.deactivation_in_progress {
            return false;
        }
        self.deactivation_in_progress = true;
        true
    }

    fn record(&mut self, ras: RasRemoteStatus, now: DateTime<Utc>) {
        self.connecting_since = match ras {
            RasRemoteStatus::Connecting => Some(self.connecting_since.unwrap_or(now)),
            _ => None,
        };
        self.previous_ras = Some(ras);
    }
}

/// Lock the shared state. The state is plain data whose invariant is
/// re-established by every commit, so a poisoned lock is still usable.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Step inputs taken from agent configuration.
#[derive(Debug, Clone)]
pub struct ActivationSettings {
    /// `host[:port]` of the RPS.
    pub rps_address: String,
}

/// Result of trying to schedule a deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deactivation {
    Spawned,
    AlreadyRunning,
    /// A worker finished after this step read the state; its reset wins.
    Superseded,
}

/// A spawned worker means this attempt failed; an in-flight one will clear
/// state on completion, so the host is still activating.
fn failed_unless_running(outcome: Deactivation) -> ActivationStatus {
    match outcome {
        Deactivation::Spawned => ActivationStatus::ActivationFailed,
        Deactivation::AlreadyRunning | Deactivation::Superseded => ActivationStatus::Activating,
    }
}

/// Drives a host through AMT activation, one [`step`](Self::step) at a time.
///
/// `step` is not re-entrant; the periodic driver serialises calls.
pub struct ActivationController<T, D, C> {
    tools: Arc<T>,
    dm: Arc<D>,
    clock: C,
    state: Arc<Mutex<ControllerState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    deactivation_schedule: Backoff,
}

impl<T, D, C> ActivationController<T, D, C>
where
    T: ToolExecutor,
    D: DeviceManager,
    C: Clock,
{
    pub fn new(tools: Arc<T>, dm: Arc<D>, clock: C) -> Self {
        Self {
            tools,
            dm,
            clock,
            state: Arc::new(Mutex::new(ControllerState::default())),
            worker: Mutex::new(None),
            deactivation_schedule: Backoff::DEACTIVATION_POLL,
        }
    }

    /// Override the worker's post-deactivate polling schedule.
    #[must_use]
    pub fn with_deactivation_schedule(mut self, schedule: Backoff) -> Self {
        self.deactivation_schedule = schedule;
        self
    }

    /// Copy of the current controller state.
    pub fn snapshot(&self) -> ControllerState {
        lock(&self.state).clone()
    }

    /// Wait for the most recently spawned deactivation worker, if any.
    pub async fn wait_for_deactivation(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "deactivation worker aborted");
            }
        }
    }

    /// Run one reconciliation step.
    ///
    /// # Errors
    ///
    /// - [`ActivationError::AmtInfo`] when `amtinfo` fails with the driver present.
    /// - [`ActivationError::NotRequested`] when the intent is not `ACTIVATE`.
    /// - [`DeviceManagerError`] when fetching the intent or reporting the
    ///   result fails (`Skipped` is not an error).
    pub async fn step(
        &self,
        host_id: &str,
        settings: &ActivationSettings,
        deadline: Instant,
    ) -> Result<()> {
        let Some(snapshot) = self.observe_and_report(host_id).await? else {
            return Ok(());
        };

        let intent = match self.dm.retrieve_activation_details(host_id).await {
            Ok(intent) => intent,
            Err(DeviceManagerError::Skipped(reason)) => {
                tracing::debug!(host_id, %reason, "activation skipped this cycle");
                return Ok(());
            }
            Err(e) => return Err(e).context("retrieving activation details"),
        };
        if intent.operation != Operation::Activate {
            return Err(ActivationError::NotRequested {
                operation: intent.operation,
            }
            .into());
        }

        let status = self
            .reconcile(settings, &intent, snapshot.ras_remote_status, deadline)
            .await;
        tracing::info!(host_id, ras = %snapshot.ras_remote_status, %status, "activation step");

        self.dm
            .report_activation_results(host_id, status)
            .await
            .context("reporting activation results")?;
        Ok(())
    }

    /// Run `amtinfo` and report AMT enablement. `Ok(None)` means the AMT
    /// driver is missing and the step has nothing more to do.
    async fn observe_and_report(&self, host_id: &str) -> Result<Option<AmtSnapshot>> {
        let output = match self.tools.amtinfo().await {
            Ok(output) => output,
            Err(e) => {
                self.report_amt_status(host_id, AmtStatus::Disabled, "").await;
                return Err(ActivationError::AmtInfo {
                    reason: format!("{e:#}"),
                }
                .into());
            }
        };

        let snapshot = AmtSnapshot::parse(&output.output);
        if !snapshot.driver_present {
            tracing::info!(host_id, "AMT driver not detected");
            self.report_amt_status(host_id, AmtStatus::Disabled, "").await;
            return Ok(None);
        }
        if !output.is_success() {
            self.report_amt_status(host_id, AmtStatus::Disabled, "").await;
            return Err(ActivationError::AmtInfo {
                reason: format!("exit code {:?}", output.exit_code),
            }
            .into());
        }

        self.report_amt_status(host_id, AmtStatus::Enabled, snapshot.features.report_label())
            .await;
        Ok(Some(snapshot))
    }

    async fn report_amt_status(&self, host_id: &str, status: AmtStatus, feature: &str) {
        match self.dm.report_amt_status(host_id, status, feature).await {
            Ok(()) | Err(DeviceManagerError::Skipped(_)) => {}
            Err(e) => tracing::warn!(host_id, error = %e, "failed to report AMT status"),
        }
    }

    /// Decide and commit the transition for `observed`; returns the status
    /// to report.
    async fn reconcile(
        &self,
        settings: &ActivationSettings,
        intent: &ActivationIntent,
        observed: RasRemoteStatus,
        deadline: Instant,
    ) -> ActivationStatus {
        let before = self.snapshot();
        let now = self.clock.now();

        match observed {
            RasRemoteStatus::Unknown => ActivationStatus::Unspecified,
            RasRemoteStatus::Connected => {
                self.commit(before.generation, |s| s.record(RasRemoteStatus::Connected, now));
                ActivationStatus::Activated
            }
            RasRemoteStatus::Connecting => self.on_connecting(&before, now, settings, intent),
            RasRemoteStatus::NotConnected => {
                self.on_not_connected(&before, settings, intent, deadline)
                    .await
            }
        }
    }

    fn on_connecting(
        &self,
        before: &ControllerState,
        now: DateTime<Utc>,
        settings: &ActivationSettings,
        intent: &ActivationIntent,
    ) -> ActivationStatus {
        let in_progress = matches!(
            before.previous_ras,
            Some(RasRemoteStatus::NotConnected | RasRemoteStatus::Connecting)
        );
        if !in_progress {
            // A healthy activation passes through "not connected" first.
            tracing::warn!(
                previous = ?before.previous_ras,
                "AMT is connecting without a preceding activation; deactivating"
            );
            return failed_unless_running(self.deactivate(before.generation, settings, intent));
        }

        let since = before.connecting_since.unwrap_or(now);
        let elapsed = (now - since).to_std().unwrap_or_default();
        if elapsed > STUCK_CONNECTING_TIMEOUT {
            tracing::warn!(
                elapsed_secs = elapsed.as_secs(),
                "AMT stuck in connecting; deactivating"
            );
            return failed_unless_running(self.deactivate(before.generation, settings, intent));
        }

        self.commit(before.generation, |s| s.record(RasRemoteStatus::Connecting, since));
        ActivationStatus::Activating
    }

    async fn on_not_connected(
        &self,
        before: &ControllerState,
        settings: &ActivationSettings,
        intent: &ActivationIntent,
        deadline: Instant,
    ) -> ActivationStatus {
        if before.deactivation_in_progress {
            tracing::info!("deactivation in progress; activation deferred");
            return ActivationStatus::Activating;
        }

        // Committed before the tool runs: a step cancelled mid-activation must
        // not leave cold-start state for the next `connecting` observation.
        self.commit_not_connected(before.generation);

        let url = rps_url(&settings.rps_address);
        let output = match self
            .tools
            .activate(&url, &intent.profile_name, &intent.action_password)
            .await
        {
            Ok(out) => out.output,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "activation tool did not run");
                return ActivationStatus::ActivationFailed;
            }
        };

        match ActivationOutcome::classify(&output) {
            ActivationOutcome::AuthenticationFailed => {
                tracing::warn!("RPS could not authenticate with AMT; deactivating");
                self.deactivate(before.generation, settings, intent);
                ActivationStatus::ActivationFailed
            }
            ActivationOutcome::Interrupted => {
                tracing::warn!("activation interrupted; retrying next cycle");
                ActivationStatus::ActivationFailed
            }
            ActivationOutcome::CiraConfigured => {
                let budget = deadline
                    .saturating_duration_since(Instant::now())
                    .saturating_sub(REPORT_RESERVE);
                let reached = wait_for_ras(
                    &*self.tools,
                    Backoff::ACTIVATION_POLL.clipped(budget),
                    Some(deadline),
                    |ras| matches!(ras, RasRemoteStatus::Connecting | RasRemoteStatus::Connected),
                )
                .await;
                if let Some(ras) = reached {
                    let now = self.clock.now();
                    self.commit(before.generation, |s| s.record(ras, now));
                    ActivationStatus::Activating
                } else {
                    tracing::warn!("CIRA configured but AMT never started connecting");
                    ActivationStatus::ActivationFailed
                }
            }
            ActivationOutcome::Failed => {
                tracing::warn!("activation failed");
                tracing::debug!(%output, "activation tool output");
                ActivationStatus::ActivationFailed
            }
        }
    }

    /// Claim the worker slot, reset state for a retry, and spawn the worker.
    fn deactivate(
        &self,
        generation: u64,
        settings: &ActivationSettings,
        intent: &ActivationIntent,
    ) -> Deactivation {
        {
            let mut state = lock(&self.state);
            if state.generation != generation {
                return Deactivation::Superseded;
            }
            if !state.try_begin_deactivation() {
                tracing::info!("deactivation already in progress");
                return Deactivation::AlreadyRunning;
            }
            state.previous_ras = None;
            state.connecting_since = None;
        }

        let handle = DeactivationWorker {
            tools: Arc::clone(&self.tools),
            state: Arc::clone(&self.state),
            rps_url: rps_url(&settings.rps_address),
            password: intent.action_password.clone(),
            schedule: self.deactivation_schedule,
        }
        .spawn();
        *lock(&self.worker) = Some(handle);
        Deactivation::Spawned
    }

    fn commit_not_connected(&self, generation: u64) {
        let now = self.clock.now();
        self.commit(generation, |s| s.record(RasRemoteStatus::NotConnected, now));
    }

    fn commit(&self, generation: u64, apply: impl FnOnce(&mut ControllerState)) {
        let mut state = lock(&self.state);
        if state.generation == generation {
            apply(&mut state);
        } else {
            tracing::debug!("deactivation finished mid-step; keeping its reset");
        }
    }
}
