//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod activation;
pub mod amt;
pub mod backoff;
pub mod config;
pub mod error;

pub use activation::{
    ActionPassword, ActivationIntent, ActivationOutcome, ActivationStatus, AmtStatus, Operation,
    rps_url,
};
pub use amt::{AmtFeatures, AmtSnapshot, RasRemoteStatus};
pub use backoff::Backoff;
pub use config::AgentConfig;
pub use error::{ActivationError, ConfigError, DeviceManagerError};
