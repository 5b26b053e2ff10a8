//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Callers that branch on the kind use `downcast_ref`.

use thiserror::Error;

use crate::domain::activation::Operation;

// ── Activation errors ─────────────────────────────────────────────────────────

/// Errors surfaced by a reconciliation step.
#[derive(Debug, Error)]
pub enum ActivationError {
    /// The Device-Manager does not currently ask for activation.
    #[error("activation not requested (operation: {operation})")]
    NotRequested { operation: Operation },

    /// `amtinfo` failed for a reason other than a missing driver.
    #[error("amtinfo failed: {reason}")]
    AmtInfo { reason: String },
}

// ── Device-Manager errors ─────────────────────────────────────────────────────

/// Errors returned by the Device-Manager port.
#[derive(Debug, Error)]
pub enum DeviceManagerError {
    /// `FailedPrecondition`: the Device-Manager has nothing for this host yet.
    #[error("activation skipped by device manager: {0}")]
    Skipped(String),

    /// Any other RPC status.
    #[error("device manager returned {code}: {message}")]
    Rpc { code: String, message: String },

    /// Local failure before a request reached the wire (token, channel).
    #[error("device manager unreachable: {0}")]
    Transport(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error(
        "tool.activation_timeout_secs ({activation_secs}s) plus {reserve_secs}s must stay below heartbeat_interval_secs ({heartbeat_secs}s)"
    )]
    ActivationOutlastsStep {
        activation_secs: u64,
        reserve_secs: u64,
        heartbeat_secs: u64,
    },

    #[error("invalid rps_address '{0}': expected host[:port] without scheme or path")]
    InvalidRpsAddress(String),

    #[error("invalid device_manager.url '{0}': expected http:// or https://")]
    InvalidUrl(String),

    #[error("device_manager.url '{url}' does not match tls.enabled = {tls_enabled}")]
    SchemeMismatch { url: String, tls_enabled: bool },

    #[error("device_manager.tls needs both client_cert and client_key for mTLS")]
    IncompleteClientIdentity,
}
