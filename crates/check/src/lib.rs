//! `dbhealth-check` library crate.
//!
//! One health-check pass: collect the diagnostic catalog, persist every
//! table, evaluate thresholds and write the run summary. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod error;
pub mod run;

pub use config::CheckConfig;
pub use error::CheckError;
pub use run::{run_health_check, run_with_executor, RunOutcome};
