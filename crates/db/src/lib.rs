//! PostgreSQL access for the health check.
//!
//! One session per process invocation: the check run opens a
//! [`PgExecutor`] at start, runs the whole [`catalog`] through it, and
//! closes it at the end. Dropping the connection on an error path closes
//! the socket.
//!
//! Every session is opened with `statement_timeout` set, so the server
//! cancels a slow diagnostic query and the session stays usable for the
//! next one.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgConnection};

pub mod catalog;
pub mod executor;

pub use executor::PgExecutor;

/// Default PostgreSQL port when the descriptor omits one.
const DEFAULT_PORT: u16 = 5432;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Invalid DB_DSN '{0}': expected host[:port]/database")]
    InvalidDsn(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Credentials plus an easy-connect style descriptor (`host[:port]/database`).
#[derive(Clone)]
pub struct ConnectDescriptor {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl std::fmt::Debug for ConnectDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectDescriptor")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectDescriptor {
    /// Build from user, password and a `host[:port]/database` descriptor.
    pub fn parse(user: &str, password: &str, dsn: &str) -> Result<Self, DbError> {
        let invalid = || DbError::InvalidDsn(dsn.to_string());

        let (authority, database) = dsn.trim().split_once('/').ok_or_else(invalid)?;
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() || database.is_empty() || database.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            user: user.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            database: database.to_string(),
        })
    }

    /// Session options with the server-side per-statement limit applied.
    pub fn connect_options(&self, statement_timeout: Duration) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
            .application_name("dbhealth-check")
            .options([("statement_timeout", statement_timeout_setting(statement_timeout))])
    }
}

/// `statement_timeout` value in milliseconds. Postgres reads `0` as "no
/// limit", so anything shorter than a millisecond is rounded up.
pub fn statement_timeout_setting(timeout: Duration) -> String {
    format!("{}ms", timeout.as_millis().max(1))
}

/// Round-trip a trivial query to prove the session is usable.
pub async fn health_check(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}
