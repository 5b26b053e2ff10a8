//! Integration tests for the pma binary
//!
//! These tests spawn the actual binary and test end-to-end behavior.

mod config_command;
