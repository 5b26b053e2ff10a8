//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! Device-Manager gRPC channel, TLS and token files, and config loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::cli` are forbidden.

pub mod clock;
pub mod command_runner;
pub mod config;
pub mod dm_client;
pub mod rpc_tool;
pub mod tls;
pub mod token;
