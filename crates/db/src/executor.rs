//! [`QueryExecutor`] over a live PostgreSQL connection.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column, Connection, Executor, Row, Statement, TypeInfo, ValueRef};

use dbhealth_core::collection::{CollectionError, QueryExecutor, RawResult};
use dbhealth_core::table::Value;

use crate::{ConnectDescriptor, DbError};

/// SQLSTATE `query_canceled`, raised when `statement_timeout` fires.
const QUERY_CANCELED: &str = "57014";

/// Owns the run's connection for the duration of the catalog pass.
pub struct PgExecutor {
    conn: PgConnection,
    options: PgConnectOptions,
    backend_pid: i32,
    statement_timeout: Duration,
}

impl PgExecutor {
    /// Open the run's session. The server cancels any statement that runs
    /// longer than `statement_timeout`.
    pub async fn connect(
        descriptor: &ConnectDescriptor,
        statement_timeout: Duration,
    ) -> Result<Self, DbError> {
        let options = descriptor.connect_options(statement_timeout);
        let (conn, backend_pid) = open_session(&options).await?;
        tracing::debug!(backend_pid, "Database session opened");

        Ok(Self {
            conn,
            options,
            backend_pid,
            statement_timeout,
        })
    }

    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }

    /// Close the session gracefully. Failure to say goodbye is logged, not
    /// propagated: the run's artifacts are already on disk by then.
    pub async fn close(self) {
        if let Err(e) = self.conn.close().await {
            tracing::warn!(error = %e, "Failed to close database connection cleanly");
        }
    }
}

async fn open_session(options: &PgConnectOptions) -> Result<(PgConnection, i32), sqlx::Error> {
    let mut conn = PgConnection::connect_with(options).await?;
    let pid: i32 = sqlx::query_scalar("SELECT pg_backend_pid()")
        .fetch_one(&mut conn)
        .await?;
    Ok((conn, pid))
}

fn query_error(e: sqlx::Error, statement_timeout: Duration) -> CollectionError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(QUERY_CANCELED) => {
            CollectionError::Timeout(statement_timeout)
        }
        _ => CollectionError::Query(e.to_string()),
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn query(&mut self, sql: &str) -> Result<RawResult, CollectionError> {
        let limit = self.statement_timeout;

        // Column names come from the prepared statement so that a result
        // with zero rows still carries its schema.
        let statement = (&mut self.conn)
            .prepare(sql)
            .await
            .map_err(|e| query_error(e, limit))?;
        let columns: Vec<String> = statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let rows = sqlx::query(sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| query_error(e, limit))?;

        let rows = rows
            .iter()
            .map(decode_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawResult { columns, rows })
    }

    /// Swap in a fresh session and terminate the old backend, which may
    /// still be executing the abandoned statement.
    async fn recover(&mut self) -> Result<(), CollectionError> {
        let (fresh, fresh_pid) = open_session(&self.options)
            .await
            .map_err(|e| CollectionError::Query(e.to_string()))?;
        let stale_pid = std::mem::replace(&mut self.backend_pid, fresh_pid);
        drop(std::mem::replace(&mut self.conn, fresh));

        if let Err(e) = sqlx::query("SELECT pg_terminate_backend($1)")
            .bind(stale_pid)
            .execute(&mut self.conn)
            .await
        {
            tracing::warn!(stale_pid, error = %e, "Could not terminate abandoned backend");
        }
        tracing::warn!(stale_pid, backend_pid = fresh_pid, "Database session replaced");
        Ok(())
    }
}

fn decode_row(row: &PgRow) -> Result<Vec<Value>, CollectionError> {
    (0..row.columns().len())
        .map(|idx| decode_cell(row, idx))
        .collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> Result<Value, CollectionError> {
    let raw = row
        .try_get_raw(idx)
        .map_err(|e| CollectionError::Decode(e.to_string()))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let decoded = match type_name.as_str() {
        "INT2" => row.try_get::<i16, _>(idx).map(|v| Value::Integer(v.into())),
        "INT4" => row.try_get::<i32, _>(idx).map(|v| Value::Integer(v.into())),
        "INT8" => row.try_get::<i64, _>(idx).map(Value::Integer),
        "FLOAT4" => row.try_get::<f32, _>(idx).map(|v| Value::Float(v.into())),
        "FLOAT8" => row.try_get::<f64, _>(idx).map(Value::Float),
        "BOOL" => row
            .try_get::<bool, _>(idx)
            .map(|v| Value::Integer(i64::from(v))),
        "TEXT" | "VARCHAR" | "NAME" | "BPCHAR" | "UNKNOWN" => {
            row.try_get::<String, _>(idx).map(Value::Text)
        }
        "TIMESTAMPTZ" => row
            .try_get::<DateTime<Utc>, _>(idx)
            .map(|v| Value::Text(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(idx)
            .map(|v| Value::Text(v.to_string())),
        other => {
            tracing::warn!(
                column = row.columns()[idx].name(),
                pg_type = other,
                "Unsupported column type; storing NULL"
            );
            return Ok(Value::Null);
        }
    };

    decoded.map_err(|e| CollectionError::Decode(e.to_string()))
}
