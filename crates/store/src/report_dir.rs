//! The report directory: append-only across runs, never locked.

use std::path::{Path, PathBuf};

use dbhealth_core::artifact::{stamp_of_csv, RunStamp};

use crate::error::StoreError;

/// Environment variable naming the report directory.
pub const REPORT_DIR_ENV: &str = "HEALTH_REPORT_DIR";

/// Default location, relative to the working directory.
pub const DEFAULT_REPORT_DIR: &str = "reports/daily_health_checks";

#[derive(Debug, Clone)]
pub struct ReportDir {
    root: PathBuf,
}

impl ReportDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve from `HEALTH_REPORT_DIR` via `lookup`, falling back to
    /// [`DEFAULT_REPORT_DIR`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::new(
            lookup(REPORT_DIR_ENV)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string()),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if it does not exist yet.
    pub fn ensure(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Every `<stamp>_<kind>.csv` artifact, oldest first.
    ///
    /// A file that matches the suffix but whose prefix is not a valid
    /// stamp is an error rather than being skipped or mis-ordered.
    pub fn list_csv(&self, kind: &str) -> Result<Vec<(RunStamp, PathBuf)>, StoreError> {
        let pattern = format!(
            "{}/*_{kind}.csv",
            glob::Pattern::escape(&self.root.to_string_lossy())
        );

        let mut found = Vec::new();
        for entry in glob::glob(&pattern)? {
            let path = entry?;
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match stamp_of_csv(name, kind) {
                Ok(Some(stamp)) => found.push((stamp, path)),
                Ok(None) => {}
                Err(source) => return Err(StoreError::MalformedArtifact { path, source }),
            }
        }

        found.sort();
        Ok(found)
    }

    /// Most recent `<stamp>_<kind>.csv`, if any run has produced one.
    pub fn latest_csv(&self, kind: &str) -> Result<Option<PathBuf>, StoreError> {
        Ok(self.list_csv(kind)?.pop().map(|(_, path)| path))
    }

    pub fn read_text(&self, path: &Path) -> Result<String, StoreError> {
        std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
