//! Activation domain types: Device-Manager intent, reported statuses, and
//! classification of activation tool output.
//!
//! The substrings matched here are emitted by the `rpc` tool and behave as
//! wire-protocol constants.

use std::fmt;

use serde::Serialize;

/// Tool output when the RPS could not authenticate against AMT.
pub const AUTH_FAILURE_MARKER: &str = "Unable to authenticate with AMT";
/// Tool output when activation was interrupted mid-flight.
pub const INTERRUPTED_MARKER: &str = "interrupted system call";
/// Tool exit code 10 (activation failed on the RPS side).
pub const EXIT_CODE_10_MARKER: &str = "exit code: 10";
/// Tool output once CIRA has been configured.
pub const CIRA_CONFIGURED_MARKER: &str = r#"msg="CIRA: Configured""#;

/// Operation the Device-Manager wants this host to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Unspecified,
    Activate,
    Deactivate,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Activate => "ACTIVATE",
            Self::Deactivate => "DEACTIVATE",
        })
    }
}

/// Secret handed to the activation tool. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ActionPassword(String);

impl ActionPassword {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ActionPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionPassword(***)")
    }
}

/// Activation intent received from the Device-Manager for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationIntent {
    pub host_id: String,
    pub operation: Operation,
    pub profile_name: String,
    pub action_password: ActionPassword,
}

/// Activation status reported back to the Device-Manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivationStatus {
    Unspecified,
    Activating,
    Activated,
    ActivationFailed,
}

impl fmt::Display for ActivationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::Activating => "ACTIVATING",
            Self::Activated => "ACTIVATED",
            Self::ActivationFailed => "ACTIVATION_FAILED",
        })
    }
}

/// AMT enablement reported independently of activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmtStatus {
    Enabled,
    Disabled,
}

/// What the activation tool's output says happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// RPS could not authenticate with AMT; only deactivation recovers.
    AuthenticationFailed,
    /// Interrupted or rejected run; retry on a later tick.
    Interrupted,
    /// CIRA configured; wait for the link to come up.
    CiraConfigured,
    /// Anything else.
    Failed,
}

impl ActivationOutcome {
    /// Classify combined tool output. Signals are checked in priority order.
    #[must_use]
    pub fn classify(output: &str) -> Self {
        if output.contains(AUTH_FAILURE_MARKER) {
            Self::AuthenticationFailed
        } else if output.contains(INTERRUPTED_MARKER) || output.contains(EXIT_CODE_10_MARKER) {
            Self::Interrupted
        } else if output.contains(CIRA_CONFIGURED_MARKER) {
            Self::CiraConfigured
        } else {
            Self::Failed
        }
    }
}

/// Build the RPS websocket URL the tool connects to.
#[must_use]
pub fn rps_url(rps_address: &str) -> String {
    format!("wss://{rps_address}/activate")
}
