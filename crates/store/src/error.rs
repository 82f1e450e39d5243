use std::path::PathBuf;

use dbhealth_core::error::CoreError;

/// Error type for artifact reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Spreadsheet error on {}: {source}", path.display())]
    Xlsx {
        path: PathBuf,
        source: rust_xlsxwriter::XlsxError,
    },

    /// A file matched an artifact pattern but its name breaks the
    /// `<stamp>_<kind>` contract, so it cannot be ordered safely.
    #[error("Malformed artifact name {}: {source}", path.display())]
    MalformedArtifact { path: PathBuf, source: CoreError },

    #[error("Invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Artifact listing failed: {0}")]
    Glob(#[from] glob::GlobError),
}
