//! Threshold evaluation engine.
//!
//! Pure logic: the caller collects the metrics and loads the thresholds,
//! [`evaluate`] only compares them. Checks run in a fixed order
//! (tablespace, sessions, top SQL) and each contributes at most one line.
//! A check is skipped without error when its table is missing or empty,
//! when it has no numeric values, or when its threshold pair is not
//! configured.

use std::collections::BTreeMap;

use crate::alert::{AlertLine, Severity};
use crate::collection::CollectionResult;
use crate::error::CoreError;
use crate::metric_names::{
    COL_ACTIVE_SESSIONS, COL_ELAPSED_MS, COL_PCT_USED, METRIC_SESSIONS, METRIC_TABLESPACE,
    METRIC_TOP_SQL,
};
use crate::table::MetricTable;

pub const TABLESPACE_PCT_USED_CRIT: &str = "tablespace_pct_used_crit";
pub const TABLESPACE_PCT_USED_WARN: &str = "tablespace_pct_used_warn";
pub const ACTIVE_SESSIONS_CRIT: &str = "active_sessions_crit";
pub const ACTIVE_SESSIONS_WARN: &str = "active_sessions_warn";
pub const AVG_SQL_ELAPSED_MS_CRIT: &str = "avg_sql_elapsed_ms_crit";
pub const AVG_SQL_ELAPSED_MS_WARN: &str = "avg_sql_elapsed_ms_warn";

/// Keys that must be present for a run to start.
pub const REQUIRED_KEYS: [&str; 6] = [
    TABLESPACE_PCT_USED_CRIT,
    TABLESPACE_PCT_USED_WARN,
    ACTIVE_SESSIONS_CRIT,
    ACTIVE_SESSIONS_WARN,
    AVG_SQL_ELAPSED_MS_CRIT,
    AVG_SQL_ELAPSED_MS_WARN,
];

/// Key to numeric threshold mapping, read-only for the life of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdConfig {
    values: BTreeMap<String, f64>,
}

impl ThresholdConfig {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self { values }
    }

    /// Parse a YAML mapping of key to number. Unknown keys are kept but
    /// never read.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CoreError> {
        let values: BTreeMap<String, f64> = serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::InvalidThresholds(e.to_string()))?;
        if let Some((key, _)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CoreError::InvalidThresholds(format!(
                "{key} must be a finite number"
            )));
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Required keys absent from this configuration, in declaration order.
    pub fn missing_keys(&self) -> Vec<String> {
        REQUIRED_KEYS
            .iter()
            .filter(|k| !self.values.contains_key(**k))
            .map(|k| (*k).to_string())
            .collect()
    }

    /// Fail fast with every missing key named.
    pub fn validate(&self) -> Result<(), CoreError> {
        let missing = self.missing_keys();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingThresholds(missing))
        }
    }
}

/// How a check reduces its table to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduction {
    /// Largest value of the column over all rows.
    Max,
    /// Value of the column in the first row. Falls back to the first
    /// column when the named column is absent.
    FirstRow,
    /// Arithmetic mean over all rows.
    Mean,
}

/// One configured comparison.
#[derive(Debug, Clone, Copy)]
struct Check {
    metric: &'static str,
    column: &'static str,
    reduction: Reduction,
    crit_key: &'static str,
    warn_key: &'static str,
}

const CHECKS: [Check; 3] = [
    Check {
        metric: METRIC_TABLESPACE,
        column: COL_PCT_USED,
        reduction: Reduction::Max,
        crit_key: TABLESPACE_PCT_USED_CRIT,
        warn_key: TABLESPACE_PCT_USED_WARN,
    },
    Check {
        metric: METRIC_SESSIONS,
        column: COL_ACTIVE_SESSIONS,
        reduction: Reduction::FirstRow,
        crit_key: ACTIVE_SESSIONS_CRIT,
        warn_key: ACTIVE_SESSIONS_WARN,
    },
    // The top-SQL table only holds the top N statements by elapsed time,
    // so this mean is biased upward relative to the workload average.
    Check {
        metric: METRIC_TOP_SQL,
        column: COL_ELAPSED_MS,
        reduction: Reduction::Mean,
        crit_key: AVG_SQL_ELAPSED_MS_CRIT,
        warn_key: AVG_SQL_ELAPSED_MS_WARN,
    },
];

impl Check {
    fn observe(&self, table: &MetricTable) -> Option<f64> {
        match self.reduction {
            Reduction::Max => self
                .values(table)?
                .into_iter()
                .reduce(f64::max),
            Reduction::Mean => {
                let values = self.values(table)?;
                if values.is_empty() {
                    return None;
                }
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
            Reduction::FirstRow => {
                let idx = table.column_index(self.column).unwrap_or(0);
                table.rows.first()?.get(idx)?.as_f64()
            }
        }
    }

    fn values(&self, table: &MetricTable) -> Option<Vec<f64>> {
        table.numeric_column(self.column)
    }

    fn message(&self, value: f64) -> String {
        match self.metric {
            METRIC_TABLESPACE => format!("Tablespace usage {value}%"),
            METRIC_SESSIONS => format!("Active sessions {value}"),
            _ => format!("Avg top SQL elapsed {value:.0} ms"),
        }
    }
}

/// Classify a value: CRIT wins over WARN, both boundaries inclusive.
fn classify(value: f64, crit: f64, warn: f64) -> Option<Severity> {
    if value >= crit {
        Some(Severity::Crit)
    } else if value >= warn {
        Some(Severity::Warn)
    } else {
        None
    }
}

/// Evaluate collected metrics against thresholds.
pub fn evaluate(result: &CollectionResult, config: &ThresholdConfig) -> Vec<AlertLine> {
    let mut alerts = Vec::new();

    for check in &CHECKS {
        let Some(table) = result.non_empty(check.metric) else {
            continue;
        };
        let (Some(crit), Some(warn)) = (config.get(check.crit_key), config.get(check.warn_key))
        else {
            tracing::debug!(metric = check.metric, "Threshold pair not configured; skipping");
            continue;
        };
        let Some(value) = check.observe(table) else {
            tracing::warn!(
                metric = check.metric,
                column = check.column,
                "No numeric values to evaluate"
            );
            continue;
        };

        if let Some(severity) = classify(value, crit, warn) {
            alerts.push(AlertLine::new(severity, check.message(value)));
        }
    }

    alerts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionError;
    use crate::table::Value;
    use assert_matches::assert_matches;

    fn thresholds() -> ThresholdConfig {
        ThresholdConfig::from_yaml_str(
            "tablespace_pct_used_crit: 95\n\
             tablespace_pct_used_warn: 85\n\
             active_sessions_crit: 100\n\
             active_sessions_warn: 50\n\
             avg_sql_elapsed_ms_crit: 5000\n\
             avg_sql_elapsed_ms_warn: 2000\n",
        )
        .expect("valid yaml")
    }

    fn tablespace(pcts: &[f64]) -> MetricTable {
        MetricTable::new(
            METRIC_TABLESPACE,
            vec!["TABLESPACE_NAME".into(), "PCT_USED".into()],
            pcts.iter()
                .enumerate()
                .map(|(i, p)| vec![Value::Text(format!("TS{i}")), Value::Float(*p)])
                .collect(),
        )
    }

    fn sessions(active: i64) -> MetricTable {
        MetricTable::new(
            METRIC_SESSIONS,
            vec!["active_sessions".into()],
            vec![vec![Value::Integer(active)]],
        )
    }

    fn top_sql(elapsed: &[i64]) -> MetricTable {
        MetricTable::new(
            METRIC_TOP_SQL,
            vec!["sql_id".into(), "elapsed_ms".into()],
            elapsed
                .iter()
                .map(|e| vec![Value::Text("abc".into()), Value::Integer(*e)])
                .collect(),
        )
    }

    fn result_with(tables: Vec<MetricTable>) -> CollectionResult {
        let mut result = CollectionResult::new();
        for t in tables {
            let name = t.name.clone();
            result.record(&name, Ok(t));
        }
        result
    }

    #[test]
    fn tablespace_max_over_crit_emits_single_crit() {
        let result = result_with(vec![tablespace(&[40.0, 96.0, 88.0])]);
        let alerts = evaluate(&result, &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Crit);
        assert_eq!(alerts[0].to_string(), "CRIT: Tablespace usage 96%");
    }

    #[test]
    fn sessions_below_warn_emit_nothing() {
        let result = result_with(vec![sessions(40)]);
        assert!(evaluate(&result, &thresholds()).is_empty());
    }

    #[test]
    fn sessions_between_warn_and_crit_emit_warn() {
        let result = result_with(vec![sessions(60)]);
        let alerts = evaluate(&result, &thresholds());
        assert_eq!(alerts, vec![AlertLine::new(Severity::Warn, "Active sessions 60")]);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let result = result_with(vec![tablespace(&[85.0]), sessions(100)]);
        let alerts = evaluate(&result, &thresholds());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].severity, Severity::Warn);
        assert_eq!(alerts[1].severity, Severity::Crit);
    }

    #[test]
    fn empty_top_sql_contributes_nothing() {
        let result = result_with(vec![top_sql(&[])]);
        assert!(evaluate(&result, &thresholds()).is_empty());
    }

    #[test]
    fn top_sql_uses_mean_of_elapsed() {
        // mean = 2500 -> warn
        let result = result_with(vec![top_sql(&[1000, 4000, 2500])]);
        let alerts = evaluate(&result, &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].to_string(), "WARN: Avg top SQL elapsed 2500 ms");
    }

    #[test]
    fn failed_metrics_are_skipped() {
        let mut result = result_with(vec![sessions(120)]);
        result.record(
            METRIC_TABLESPACE,
            Err(CollectionError::Query("permission denied".into())),
        );
        let alerts = evaluate(&result, &thresholds());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].to_string(), "CRIT: Active sessions 120");
    }

    #[test]
    fn alerts_follow_check_order_not_severity() {
        let result = result_with(vec![
            top_sql(&[9000]),
            sessions(55),
            tablespace(&[99.0]),
        ]);
        let alerts = evaluate(&result, &thresholds());
        let rendered: Vec<String> = alerts.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "CRIT: Tablespace usage 99%",
                "WARN: Active sessions 55",
                "CRIT: Avg top SQL elapsed 9000 ms",
            ]
        );
    }

    #[test]
    fn crit_never_paired_with_warn_for_same_metric() {
        for pct in [0.0, 50.0, 84.9, 85.0, 90.0, 94.99, 95.0, 100.0] {
            for active in [0, 49, 50, 99, 100, 500] {
                let result = result_with(vec![tablespace(&[pct]), sessions(active)]);
                let alerts = evaluate(&result, &thresholds());
                let ts = alerts
                    .iter()
                    .filter(|a| a.message.starts_with("Tablespace"))
                    .count();
                let ss = alerts
                    .iter()
                    .filter(|a| a.message.starts_with("Active sessions"))
                    .count();
                assert!(ts <= 1 && ss <= 1, "pct={pct} active={active}: {alerts:?}");
            }
        }
    }

    #[test]
    fn evaluation_is_repeatable() {
        let result = result_with(vec![tablespace(&[91.0]), sessions(77), top_sql(&[6000])]);
        let config = thresholds();
        assert_eq!(evaluate(&result, &config), evaluate(&result, &config));
    }

    #[test]
    fn missing_threshold_pair_skips_check() {
        let config = ThresholdConfig::from_yaml_str(
            "active_sessions_crit: 100\nactive_sessions_warn: 50\n",
        )
        .expect("valid yaml");
        let result = result_with(vec![tablespace(&[99.0]), sessions(70)]);
        let alerts = evaluate(&result, &config);
        assert_eq!(alerts, vec![AlertLine::new(Severity::Warn, "Active sessions 70")]);
    }

    #[test]
    fn sessions_fall_back_to_first_column() {
        let table = MetricTable::new(
            METRIC_SESSIONS,
            vec!["count".into()],
            vec![vec![Value::Integer(150)]],
        );
        let alerts = evaluate(&result_with(vec![table]), &thresholds());
        assert_eq!(alerts[0].severity, Severity::Crit);
    }

    #[test]
    fn missing_pct_column_is_skipped() {
        let table = MetricTable::new(
            METRIC_TABLESPACE,
            vec!["tablespace_name".into()],
            vec![vec![Value::Text("USERS".into())]],
        );
        assert!(evaluate(&result_with(vec![table]), &thresholds()).is_empty());
    }

    #[test]
    fn validate_names_every_missing_key() {
        let config = ThresholdConfig::from_yaml_str("tablespace_pct_used_crit: 95\n")
            .expect("valid yaml");
        assert_matches!(
            config.validate(),
            Err(CoreError::MissingThresholds(keys)) if keys.len() == 5
                && keys[0] == TABLESPACE_PCT_USED_WARN
        );
        assert!(thresholds().validate().is_ok());
    }

    #[test]
    fn non_numeric_threshold_rejected() {
        assert_matches!(
            ThresholdConfig::from_yaml_str("active_sessions_crit: lots\n"),
            Err(CoreError::InvalidThresholds(_))
        );
    }
}
