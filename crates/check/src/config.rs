//! Process configuration for the check run.
//!
//! Built once in `main` and passed by reference; nothing below `main`
//! reads the environment.
//!
//! | Variable                     | Required | Default                       |
//! |------------------------------|----------|-------------------------------|
//! | `DB_USER`                    | yes      | --                            |
//! | `DB_PASSWORD`                | yes      | --                            |
//! | `DB_DSN`                     | yes      | --  (`host[:port]/database`)  |
//! | `HEALTH_THRESHOLDS_FILE`     | no       | `config/thresholds.yaml`      |
//! | `HEALTH_REPORT_DIR`          | no       | `reports/daily_health_checks` |
//! | `HEALTH_QUERY_TIMEOUT_SECS`  | no       | `30`                          |
//! | `HEALTH_TABLESPACE_QUOTA_MB` | no       | `10240`                       |
//!
//! The query timeout and the quota must both be positive.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dbhealth_core::error::CoreError;
use dbhealth_core::thresholds::ThresholdConfig;
use dbhealth_db::catalog::DEFAULT_TABLESPACE_QUOTA_MB;
use dbhealth_db::{ConnectDescriptor, DbError};
use dbhealth_store::ReportDir;

pub const DB_USER: &str = "DB_USER";
pub const DB_PASSWORD: &str = "DB_PASSWORD";
pub const DB_DSN: &str = "DB_DSN";
pub const THRESHOLDS_FILE: &str = "HEALTH_THRESHOLDS_FILE";
pub const QUERY_TIMEOUT_SECS: &str = "HEALTH_QUERY_TIMEOUT_SECS";
pub const TABLESPACE_QUOTA_MB: &str = "HEALTH_TABLESPACE_QUOTA_MB";

const DEFAULT_THRESHOLDS_FILE: &str = "config/thresholds.yaml";
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<&'static str>),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Cannot read thresholds file {}: {source}", path.display())]
    ThresholdsFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Thresholds file {}: {source}", path.display())]
    Thresholds { path: PathBuf, source: CoreError },

    #[error(transparent)]
    Descriptor(#[from] DbError),
}

#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub database: ConnectDescriptor,
    pub thresholds: ThresholdConfig,
    pub report_dir: ReportDir,
    pub query_timeout: Duration,
    pub tablespace_quota_mb: f64,
}

impl CheckConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Every missing required key is
    /// reported at once, before the thresholds file is touched.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let (user, password, dsn) = (get(DB_USER), get(DB_PASSWORD), get(DB_DSN));
        let missing: Vec<&'static str> = [
            (DB_USER, user.is_none()),
            (DB_PASSWORD, password.is_none()),
            (DB_DSN, dsn.is_none()),
        ]
        .into_iter()
        .filter_map(|(key, absent)| absent.then_some(key))
        .collect();
        let (Some(user), Some(password), Some(dsn)) = (user, password, dsn) else {
            return Err(ConfigError::MissingEnv(missing));
        };
        let database = ConnectDescriptor::parse(&user, &password, &dsn)?;

        let query_timeout_secs: u64 =
            parse_or(&get, QUERY_TIMEOUT_SECS, DEFAULT_QUERY_TIMEOUT_SECS)?;
        if query_timeout_secs == 0 {
            return Err(ConfigError::InvalidEnv {
                key: QUERY_TIMEOUT_SECS,
                value: query_timeout_secs.to_string(),
            });
        }
        let query_timeout = Duration::from_secs(query_timeout_secs);
        let tablespace_quota_mb: f64 =
            parse_or(&get, TABLESPACE_QUOTA_MB, DEFAULT_TABLESPACE_QUOTA_MB)?;
        if !(tablespace_quota_mb.is_finite() && tablespace_quota_mb > 0.0) {
            return Err(ConfigError::InvalidEnv {
                key: TABLESPACE_QUOTA_MB,
                value: tablespace_quota_mb.to_string(),
            });
        }

        let thresholds_path =
            PathBuf::from(get(THRESHOLDS_FILE).unwrap_or_else(|| DEFAULT_THRESHOLDS_FILE.into()));
        let thresholds = load_thresholds(&thresholds_path)?;

        tracing::debug!(
            user = %database.user,
            host = %database.host,
            port = database.port,
            database = %database.database,
            "Database configuration loaded"
        );

        Ok(Self {
            database,
            thresholds,
            report_dir: ReportDir::from_lookup(&lookup),
            query_timeout,
            tablespace_quota_mb,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { key, value: raw }),
    }
}

/// Read and validate the YAML thresholds file. Every required key must be
/// present.
pub fn load_thresholds(path: &Path) -> Result<ThresholdConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ThresholdsFile {
        path: path.to_path_buf(),
        source,
    })?;
    let to_err = |source| ConfigError::Thresholds {
        path: path.to_path_buf(),
        source,
    };
    let thresholds = ThresholdConfig::from_yaml_str(&text).map_err(to_err)?;
    thresholds.validate().map_err(to_err)?;
    Ok(thresholds)
}
