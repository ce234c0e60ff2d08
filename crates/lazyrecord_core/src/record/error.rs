//! Errors raised by the mapping engine.

use crate::db::DbError;
use crate::record::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type OrmResult<T> = Result<T, OrmError>;

/// Coarse classification of [`OrmError`] for callers handling failures at a
/// workflow boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable database handle or a mismatched one.
    Configuration,
    /// Statement execution failed; the transaction was rolled back.
    Database,
    /// Attribute, row or identifier could not be resolved.
    NotFound,
    /// The record or unit of work is no longer usable.
    State,
    /// Names or stored values that cannot be mapped.
    Data,
}

#[derive(Debug)]
pub enum OrmError {
    Configuration(String),
    Db(DbError),
    /// Reads are refused while unsaved changes are buffered.
    PendingChanges {
        table: String,
    },
    /// Qualified column is absent from the record's fields.
    UnknownColumn {
        column: String,
    },
    /// Operation requires a persisted record.
    MissingId {
        table: String,
    },
    RowNotFound {
        table: String,
        id: RecordId,
    },
    Deleted {
        table: String,
        id: RecordId,
    },
    UnitAborted(Uuid),
    InvalidIdentifier(String),
    InvalidData(String),
}

impl OrmError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Db(_) => ErrorKind::Database,
            Self::PendingChanges { .. }
            | Self::UnknownColumn { .. }
            | Self::MissingId { .. }
            | Self::RowNotFound { .. } => ErrorKind::NotFound,
            Self::Deleted { .. } | Self::UnitAborted(_) => ErrorKind::State,
            Self::InvalidIdentifier(_) | Self::InvalidData(_) => ErrorKind::Data,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl Display for OrmError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(message) => write!(f, "configuration error: {message}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::PendingChanges { table } => {
                write!(f, "`{table}` record has unsaved changes; save before reading")
            }
            Self::UnknownColumn { column } => write!(f, "column not found: {column}"),
            Self::MissingId { table } => write!(f, "`{table}` record has no identifier"),
            Self::RowNotFound { table, id } => write!(f, "{table} row not found: {id}"),
            Self::Deleted { table, id } => write!(f, "{table} row {id} was deleted"),
            Self::UnitAborted(id) => write!(f, "unit of work {id} was aborted by a failed statement"),
            Self::InvalidIdentifier(name) => write!(f, "invalid SQL identifier `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for OrmError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for OrmError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for OrmError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
