//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when a claim sheet or an expense is missing or not
//!   owned by the caller.
//! - [`InvalidArgument`] thrown when the input is malformed.
//! - [`Conflict`] thrown when a concurrent writer won the race, including
//!   another connection holding the SQLite write lock.
//! - [`StoreUnavailable`] thrown when the database cannot be reached.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`InvalidArgument`]: EngineError::InvalidArgument
//!  [`Conflict`]: EngineError::Conflict
//!  [`StoreUnavailable`]: EngineError::StoreUnavailable
use sea_orm::{DbErr, RuntimeErr, SqlErr, sqlx};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Database(DbErr),
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = value.sql_err() {
            return Self::Conflict(detail);
        }
        if is_store_busy(&value) {
            return Self::Conflict(format!("store is busy, retry: {value}"));
        }
        match value {
            DbErr::ConnectionAcquire(err) => Self::StoreUnavailable(err.to_string()),
            DbErr::Conn(err) => Self::StoreUnavailable(err.to_string()),
            other => Self::Database(other),
        }
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// `SQLITE_BUSY` or `SQLITE_LOCKED`, extended codes included.
fn is_store_busy(err: &DbErr) -> bool {
    let (DbErr::Exec(runtime) | DbErr::Query(runtime) | DbErr::Conn(runtime)) = err else {
        return false;
    };
    let RuntimeErr::SqlxError(sqlx::Error::Database(db_err)) = runtime else {
        return false;
    };
    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

impl From<csv::Error> for EngineError {
    fn from(value: csv::Error) -> Self {
        Self::Export(value.to_string())
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::StoreUnavailable(a), Self::StoreUnavailable(b)) => a == b,
            (Self::Export(a), Self::Export(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_store_unavailable() {
        let err = EngineError::from(DbErr::Conn(RuntimeErr::Internal("refused".to_string())));
        assert!(matches!(err, EngineError::StoreUnavailable(_)));
    }

    #[test]
    fn internal_errors_are_not_busy() {
        let err = DbErr::Exec(RuntimeErr::Internal("database is locked".to_string()));
        assert!(!is_store_busy(&err));
    }

    #[test]
    fn other_errors_stay_database() {
        let err = EngineError::from(DbErr::RecordNotFound("x".to_string()));
        assert_eq!(
            err,
            EngineError::Database(DbErr::RecordNotFound("x".to_string()))
        );
    }
}
