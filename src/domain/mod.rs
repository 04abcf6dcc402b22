//! Domain layer: the records the service manages and the ports its stores implement.

pub mod contract;
pub mod dataset;
pub mod job;
pub mod money;
pub mod ports;
pub mod profile;
pub mod report;
