//! dpconf: data-plane daemon configuration validator
//!
//! A library for assembling a data-plane daemon's configuration, sizing its
//! kernel lookup tables from a memory budget, validating the result, and
//! detecting drift against the configuration of the previous run.

pub mod config;
pub mod host;
pub mod network;
pub mod planner;
pub mod policy;
pub mod state;
pub mod validate;
