//! Domain logic for the database health check.
//!
//! Everything in this crate is pure: no database driver, no filesystem.
//! The collection pipeline talks to the database through the
//! [`collection::QueryExecutor`] seam, and the artifact naming contract
//! shared by the check run, the notifier and the consolidator lives in
//! [`artifact`].

pub mod alert;
pub mod artifact;
pub mod collection;
pub mod error;
pub mod metric_names;
pub mod summary;
pub mod table;
pub mod thresholds;
