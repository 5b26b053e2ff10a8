//! Application layer: use-case orchestration via port traits.
//!
//! This module imports only from `crate::domain`, never from `crate::infra`
//! or `crate::cli`.

pub mod ports;
pub mod services;
