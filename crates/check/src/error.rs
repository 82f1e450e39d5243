use dbhealth_db::DbError;
use dbhealth_store::StoreError;

use crate::config::ConfigError;

/// Fatal failures of a check run. Per-metric query failures never reach
/// this type; they are recorded in the collection result instead.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Could not open the database session.
    #[error(transparent)]
    Connect(#[from] DbError),

    /// The session opened but could not run a trivial query.
    #[error("Database health probe failed: {0}")]
    Probe(#[source] sqlx::Error),

    /// Artifacts could not be written; downstream phases depend on them.
    #[error(transparent)]
    Store(#[from] StoreError),
}
