//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`
//! or `crate::cli`.
//!
//! Ports are `async_trait` so their futures are `Send`: the deactivation
//! worker runs them on a spawned tokio task.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    ActionPassword, ActivationIntent, ActivationStatus, AmtStatus, DeviceManagerError,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of one `rpc` invocation that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Process exit code; `None` when killed by a signal.
    pub exit_code: Option<i32>,
    /// stdout followed by stderr, lossily decoded.
    pub output: String,
}

impl ToolOutput {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// ── Tool Executor Port ────────────────────────────────────────────────────────

/// The AMT provisioning tool. Stateless; no retries inside.
///
/// A tool that ran and exited non-zero is `Ok` with `is_success() == false`,
/// so callers can still scan its output. `Err` means the tool could not be
/// run at all (spawn failure, timeout).
#[async_trait]
pub trait ToolExecutor: Send + Sync + 'static {
    /// Query AMT state (`rpc amtinfo`).
    async fn amtinfo(&self) -> Result<ToolOutput>;
    /// Activate AMT against the RPS at `rps_url` using `profile`.
    async fn activate(
        &self,
        rps_url: &str,
        profile: &str,
        password: &ActionPassword,
    ) -> Result<ToolOutput>;
    /// Deactivate AMT via the RPS at `rps_url`.
    async fn deactivate(&self, rps_url: &str, password: &ActionPassword) -> Result<ToolOutput>;
}

// ── Device-Manager Port ───────────────────────────────────────────────────────

/// The remote Device-Manager service.
#[async_trait]
pub trait DeviceManager: Send + Sync + 'static {
    /// Best-effort AMT enablement report. Implementations swallow
    /// `FailedPrecondition`.
    async fn report_amt_status(
        &self,
        host_id: &str,
        status: AmtStatus,
        feature: &str,
    ) -> Result<(), DeviceManagerError>;

    /// Fetch the activation intent. `FailedPrecondition` maps to
    /// [`DeviceManagerError::Skipped`].
    async fn retrieve_activation_details(
        &self,
        host_id: &str,
    ) -> Result<ActivationIntent, DeviceManagerError>;

    /// Report the outcome of a step.
    async fn report_activation_results(
        &self,
        host_id: &str,
        status: ActivationStatus,
    ) -> Result<(), DeviceManagerError>;
}

// ── Clock Port ────────────────────────────────────────────────────────────────

/// Wall-clock source for the stuck-connecting timeout.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    /// Run a program and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Reconcile Port ────────────────────────────────────────────────────────────

/// One reconciliation step, as seen by the periodic driver.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Reconcile: Send + Sync {
    /// Run one step that must finish by `deadline`.
    async fn reconcile(&self, deadline: tokio::time::Instant) -> Result<()>;
}
