//! Command implementations

pub mod amtinfo;
pub mod check_config;
pub mod run;
