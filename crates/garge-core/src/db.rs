//! Database connection and error classification.
//!
//! The store talks to the broker's authentication database through
//! `sqlx::Any`, so the same statements run against PostgreSQL in production
//! and against an in-memory `SQLite` database in tests.

use std::time::Duration;

use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use sqlx::error::ErrorKind;
use tracing::debug;

/// Storage errors, split so operator tooling can report a precise cause.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Connection(e.to_string()),
            sqlx::Error::Database(db) if is_constraint_error(&**db) => {
                Self::ConstraintViolation(db.message().to_string())
            }
            _ => Self::Query(e.to_string()),
        }
    }
}

fn is_constraint_error(db: &dyn sqlx::error::DatabaseError) -> bool {
    if !matches!(db.kind(), ErrorKind::Other) {
        return true;
    }
    // SQLSTATE class 22 is data exception (bad enum literal, out of range),
    // class 23 is integrity constraint violation, 42804 is a column type
    // mismatch such as text written to an enum column.
    db.code().is_some_and(|code| {
        code.starts_with("22") || code.starts_with("23") || code == "42804"
    })
}

/// Open a single-connection pool for `url` (`postgres://…` or `sqlite:…`).
///
/// Provisioning runs one transaction per invocation, so one connection is
/// all a process ever needs.
pub async fn open_pool(url: &str) -> Result<AnyPool, StoreError> {
    sqlx::any::install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    debug!("Database pool opened");
    Ok(pool)
}

/// Open an in-memory `SQLite` pool (for testing).
pub async fn open_pool_in_memory() -> Result<AnyPool, StoreError> {
    open_pool("sqlite::memory:").await
}
