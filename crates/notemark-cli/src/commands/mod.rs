//! CLI command implementations

pub mod bias;
pub mod config;
pub mod detect;
pub mod json_output;
pub mod partition;
pub mod simulate;

mod reporting;
