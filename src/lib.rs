//! jobledger: payments between clients and contractors over contracts and jobs.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;
