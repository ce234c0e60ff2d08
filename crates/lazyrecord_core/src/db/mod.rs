//! SQLite connection handle shared by every record of a workflow.
//!
//! # Responsibility
//! - Own the single `rusqlite::Connection` used by the mapping engine.
//! - Run statements either as standalone auto-committed transactions or
//!   inside an explicit [`UnitOfWork`].
//!
//! # Invariants
//! - A standalone write is wrapped in `BEGIN`/`COMMIT`; any driver failure
//!   rolls the transaction back before the error is returned.
//! - A handle is bound to one thread (`Rc`), matching the blocking,
//!   single-threaded execution model.

use crate::record::error::{OrmError, OrmResult};
use log::{debug, error};
use rusqlite::Connection;
use std::cell::Cell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::Instant;

pub mod default;
pub(crate) mod open;
pub mod unit;

pub use default::{clear_default, default_database, install_default};
pub use open::{open_db, open_db_in_memory, DEFAULT_BUSY_TIMEOUT_MS};
pub use unit::UnitOfWork;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Where a statement runs: its own transaction, or an open unit of work.
#[derive(Clone, Copy)]
pub(crate) enum Scope<'u, 'db> {
    Standalone,
    Unit(&'u UnitOfWork<'db>),
}

/// Clonable handle to one SQLite connection.
///
/// Every [`crate::Record`] keeps its own clone, so all records built from the
/// same handle share commit and rollback boundaries.
#[derive(Clone)]
pub struct Database {
    inner: Rc<DatabaseInner>,
}

struct DatabaseInner {
    conn: Connection,
    statements: Cell<u64>,
}

impl Database {
    /// Wraps an already configured connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Rc::new(DatabaseInner {
                conn,
                statements: Cell::new(0),
            }),
        }
    }

    /// Borrows the underlying connection, e.g. for DDL in tests and tools.
    pub fn connection(&self) -> &Connection {
        &self.inner.conn
    }

    /// Number of statements issued through the mapping engine so far.
    pub fn statements_executed(&self) -> u64 {
        self.inner.statements.get()
    }

    /// Opens a unit of work grouping several record operations into one
    /// transaction.
    pub fn begin(&self) -> OrmResult<UnitOfWork<'_>> {
        UnitOfWork::begin(self)
    }

    pub(crate) fn same_handle(&self, other: &Database) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Runs a write statement with commit/rollback discipline.
    pub(crate) fn write<T>(
        &self,
        scope: Scope<'_, '_>,
        op: &'static str,
        table: &str,
        statement: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> OrmResult<T> {
        match scope {
            Scope::Standalone => {
                let started_at = Instant::now();
                self.bump_statements();
                let tx = self.inner.conn.unchecked_transaction().map_err(|err| {
                    error!(
                        "event=db_execute module=db status=error op={op} table={table} error_code=begin_failed error={err}"
                    );
                    OrmError::from(err)
                })?;

                match statement(&*tx) {
                    Ok(value) => {
                        tx.commit()?;
                        debug!(
                            "event=db_execute module=db status=ok op={op} table={table} scope=standalone duration_ms={}",
                            started_at.elapsed().as_millis()
                        );
                        Ok(value)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = tx.rollback() {
                            error!(
                                "event=db_rollback module=db status=error op={op} table={table} error={rollback_err}"
                            );
                        }
                        error!(
                            "event=db_execute module=db status=error op={op} table={table} scope=standalone rolled_back=true duration_ms={} error={err}",
                            started_at.elapsed().as_millis()
                        );
                        Err(err.into())
                    }
                }
            }
            Scope::Unit(unit) => unit.run(self, op, table, statement),
        }
    }

    /// Runs a read statement. Reads never open their own transaction so they
    /// also work while a unit of work holds the connection.
    pub(crate) fn read<T>(
        &self,
        scope: Scope<'_, '_>,
        op: &'static str,
        table: &str,
        statement: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> OrmResult<T> {
        match scope {
            Scope::Standalone => {
                let started_at = Instant::now();
                self.bump_statements();
                statement(&self.inner.conn)
                    .map(|value| {
                        debug!(
                            "event=db_query module=db status=ok op={op} table={table} duration_ms={}",
                            started_at.elapsed().as_millis()
                        );
                        value
                    })
                    .map_err(|err| {
                        error!(
                            "event=db_query module=db status=error op={op} table={table} error={err}"
                        );
                        err.into()
                    })
            }
            Scope::Unit(unit) => unit.run(self, op, table, statement),
        }
    }

    pub(crate) fn bump_statements(&self) {
        self.inner.statements.set(self.inner.statements.get() + 1);
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("statements", &self.inner.statements.get())
            .finish_non_exhaustive()
    }
}
