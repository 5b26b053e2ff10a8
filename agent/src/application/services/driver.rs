//! Periodic driver: one reconciliation step per heartbeat.
//!
//! Each tick gets a fresh deadline one heartbeat away. A step that overruns
//! is cancelled by dropping its future; any deactivation worker it spawned
//! keeps running. Step errors are logged and never stop the loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::{Instant, MissedTickBehavior};

use crate::application::ports::{Clock, DeviceManager, Reconcile, ToolExecutor};
use crate::application::services::controller::{ActivationController, ActivationSettings};
use crate::domain::ActivationError;

/// How a single tick ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    /// The Device-Manager does not want activation right now.
    NotRequested,
    Failed,
    TimedOut,
}

/// Calls a [`Reconcile`] implementation on a fixed interval.
pub struct PeriodicDriver<R> {
    reconciler: R,
    interval: Duration,
}

impl<R: Reconcile> PeriodicDriver<R> {
    pub fn new(reconciler: R, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
        }
    }

    /// Tick until `shutdown` resolves. An in-flight step is cancelled on
    /// shutdown.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        tracing::info!(interval_secs = self.interval.as_secs(), "periodic driver started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                () = &mut shutdown => break,
                _ = self.tick() => {}
            }
        }
        tracing::info!("periodic driver stopped");
    }

    /// Run one step with a deadline one interval from now.
    pub async fn tick(&self) -> TickOutcome {
        let deadline = Instant::now() + self.interval;
        match tokio::time::timeout_at(deadline, self.reconciler.reconcile(deadline)).await {
            Ok(Ok(())) => {
                tracing::debug!("reconciliation step completed");
                TickOutcome::Completed
            }
            Ok(Err(e)) if e.downcast_ref::<ActivationError>().is_some_and(|e| {
                matches!(e, ActivationError::NotRequested { .. })
            }) =>
            {
                tracing::info!("{e}");
                TickOutcome::NotRequested
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %format!("{e:#}"), "reconciliation step failed");
                TickOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(
                    deadline_secs = self.interval.as_secs(),
                    "reconciliation step timed out"
                );
                TickOutcome::TimedOut
            }
        }
    }
}

/// Binds a controller to this host's identity and settings.
pub struct ActivationTick<T, D, C> {
    pub controller: Arc<ActivationController<T, D, C>>,
    pub host_id: String,
    pub settings: ActivationSettings,
}

#[async_trait]
impl<T, D, C> Reconcile for ActivationTick<T, D, C>
where
    T: ToolExecutor,
    D: DeviceManager,
    C: Clock,
{
    async fn reconcile(&self, deadline: Instant) -> Result<()> {
        self.controller
            .step(&self.host_id, &self.settings, deadline)
            .await
    }
}
