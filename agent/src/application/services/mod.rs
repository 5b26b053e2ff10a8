//! Application services: orchestrate domain logic through port traits.
//!
//! Each service depends only on `crate::domain` and `crate::application::ports`.

pub mod controller;
pub mod deactivation;
pub mod driver;
pub mod poll;

pub use controller::{
    ActivationController, ActivationSettings, ControllerState, STUCK_CONNECTING_TIMEOUT,
};
pub use driver::{ActivationTick, PeriodicDriver, TickOutcome};
