//! Common library for the account service workspace
//!
//! This crate provides shared infrastructure used by the service crates:
//! database connectivity, error handling, and tracing setup.

pub mod database;
pub mod error;
pub mod telemetry;
