#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Missing required threshold keys: {}", .0.join(", "))]
    MissingThresholds(Vec<String>),

    #[error("Invalid threshold configuration: {0}")]
    InvalidThresholds(String),

    #[error("Invalid run stamp '{0}': expected YYYYMMDD_HHMMSS")]
    InvalidRunStamp(String),
}
