//! Static diagnostic query catalog.
//!
//! Queries take no bind parameters. NUMERIC expressions are cast to
//! `float8` so every column decodes into a plain [`Value`] variant.
//!
//! [`Value`]: dbhealth_core::table::Value

use dbhealth_core::collection::MetricSource;
use dbhealth_core::metric_names::{METRIC_OS, METRIC_SESSIONS, METRIC_TABLESPACE, METRIC_TOP_SQL};

/// Number of statements kept in the top-SQL sample.
pub const TOP_SQL_LIMIT: u32 = 10;

/// Quota used for tablespace percent-used when none is configured.
pub const DEFAULT_TABLESPACE_QUOTA_MB: f64 = 10_240.0;

/// PostgreSQL tracks tablespace size but not capacity, so percent used is
/// measured against a fixed quota baked into the query text.
fn tablespace_sql(quota_mb: f64) -> String {
    format!(
        "SELECT spcname AS tablespace_name, \
                ROUND((pg_tablespace_size(oid) / 1048576.0 / {quota_mb:.1} * 100)::numeric, 2)::float8 AS pct_used, \
                ROUND((pg_tablespace_size(oid) / 1048576.0)::numeric, 2)::float8 AS used_mb, \
                {quota_mb:.1}::float8 AS quota_mb \
         FROM pg_tablespace \
         ORDER BY pct_used DESC"
    )
}

const SESSIONS_SQL: &str = "\
    SELECT COUNT(*)::int8 AS active_sessions \
    FROM pg_stat_activity \
    WHERE state = 'active'";

/// Requires the `pg_stat_statements` extension.
fn top_sql_sql() -> String {
    format!(
        "SELECT queryid::text AS sql_id, \
                calls AS executions, \
                ROUND(total_exec_time)::int8 AS elapsed_ms, \
                ((shared_blks_hit + shared_blks_read) / GREATEST(calls, 1))::int8 AS gets_per_exec \
         FROM pg_stat_statements \
         WHERE calls > 0 \
         ORDER BY total_exec_time DESC \
         LIMIT {TOP_SQL_LIMIT}"
    )
}

const OS_SQL: &str = "\
    SELECT name AS stat_name, setting AS value \
    FROM pg_settings \
    WHERE name IN ('max_connections', 'shared_buffers', 'effective_cache_size', 'max_worker_processes') \
    ORDER BY name";

/// The catalog in evaluation order: tablespace, sessions, top SQL, OS.
pub fn default_catalog(tablespace_quota_mb: f64) -> Vec<MetricSource> {
    vec![
        MetricSource::new(METRIC_TABLESPACE, tablespace_sql(tablespace_quota_mb)),
        MetricSource::new(METRIC_SESSIONS, SESSIONS_SQL),
        MetricSource::new(METRIC_TOP_SQL, top_sql_sql()),
        MetricSource::new(METRIC_OS, OS_SQL),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_is_fixed() {
        let names: Vec<String> = default_catalog(DEFAULT_TABLESPACE_QUOTA_MB)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["tablespace", "sessions", "top_sql", "os"]);
    }

    #[test]
    fn quota_is_embedded_in_tablespace_query() {
        let catalog = default_catalog(2048.0);
        assert!(catalog[0].sql.contains("2048.0"));
        assert!(catalog[0].sql.contains("AS pct_used"));
    }

    #[test]
    fn top_sql_is_limited() {
        let catalog = default_catalog(DEFAULT_TABLESPACE_QUOTA_MB);
        assert!(catalog[2].sql.ends_with("LIMIT 10"));
        assert!(catalog[2].sql.contains("AS elapsed_ms"));
    }
}
