//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per record type.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Multi-row writes run in one immediate transaction.

use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod appointment_repo;
pub mod contact_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by contact and appointment storage.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// No row with this id in the named table.
    NotFound { table: &'static str, id: i64 },
    /// Connection was not migrated before repository construction.
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "no row {id} in `{table}`"),
            Self::MissingRequiredTable(table) => {
                write!(f, "agenda repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn ensure_table_exists(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(table));
    }
    Ok(())
}

/// Returns `max(id) + 1` for the given table, starting at 1.
pub(crate) fn next_id(conn: &Connection, table: &'static str) -> RepoResult<i64> {
    let next = conn.query_row(
        &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {table};"),
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(next)
}
