//! Device-Manager wire contract shared by the platform manageability agent.
//!
//! The messages mirror `device_management.proto` field-for-field and are kept
//! by hand so the agent builds without `protoc`. Tags and enum values are
//! part of the wire contract; never renumber them.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod messages;

pub use client::DeviceManagementClient;
pub use messages::*;

/// Fully-qualified gRPC service name.
pub const SERVICE_NAME: &str = "device_management.DeviceManagement";
