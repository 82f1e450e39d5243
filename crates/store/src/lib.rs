//! Filesystem artifacts exchanged between the check run, the notifier and
//! the consolidator.
//!
//! - [`ReportDir`] locates artifacts by kind and run stamp.
//! - [`RunWriter`] persists one run's tables and summary.
//! - [`csv_io`] and [`xlsx`] hold the format-level readers and writers.

pub mod csv_io;
pub mod error;
pub mod report_dir;
pub mod run_writer;
pub mod xlsx;

pub use error::StoreError;
pub use report_dir::ReportDir;
pub use run_writer::RunWriter;
