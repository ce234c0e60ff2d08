//! Explicit unit of work spanning several record operations.
//!
//! # Responsibility
//! - Group inserts, updates and deletes of many records into one transaction.
//! - Abort the whole unit after the first failed statement.
//!
//! # Invariants
//! - Dropping an uncommitted unit rolls it back.
//! - Once a statement failed, every later statement fails fast with
//!   `UnitAborted` and `commit` rolls back instead of committing.

use super::Database;
use crate::record::error::{OrmError, OrmResult};
use log::{error, info, warn};
use rusqlite::{Connection, Transaction};
use std::cell::Cell;
use std::time::Instant;
use uuid::Uuid;

/// One transaction scope handed to record operations (`save_in`,
/// `delete_in`, `load_in`, `all_in`).
pub struct UnitOfWork<'db> {
    db: &'db Database,
    tx: Transaction<'db>,
    id: Uuid,
    failed: Cell<bool>,
    statements: Cell<u32>,
    started_at: Instant,
}

impl<'db> UnitOfWork<'db> {
    pub(crate) fn begin(db: &'db Database) -> OrmResult<Self> {
        let id = Uuid::new_v4();
        let tx = db.connection().unchecked_transaction().map_err(|err| {
            error!("event=unit_begin module=db status=error unit_id={id} error={err}");
            OrmError::from(err)
        })?;
        info!("event=unit_begin module=db status=ok unit_id={id}");

        Ok(Self {
            db,
            tx,
            id,
            failed: Cell::new(false),
            statements: Cell::new(0),
            started_at: Instant::now(),
        })
    }

    /// Correlation id used in log lines of this unit.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle this unit was opened on.
    pub fn database(&self) -> &'db Database {
        self.db
    }

    /// Whether a statement of this unit has failed.
    pub fn is_aborted(&self) -> bool {
        self.failed.get()
    }

    /// Number of statements issued inside this unit.
    pub fn statement_count(&self) -> u32 {
        self.statements.get()
    }

    /// Commits every statement of the unit.
    ///
    /// # Errors
    /// - `UnitAborted` when an earlier statement failed; the unit is rolled
    ///   back instead.
    /// - `Db` when SQLite refuses the commit.
    pub fn commit(self) -> OrmResult<()> {
        let id = self.id;
        if self.failed.get() {
            warn!("event=unit_commit module=db status=error unit_id={id} error_code=unit_aborted");
            self.tx.rollback()?;
            return Err(OrmError::UnitAborted(id));
        }

        let statements = self.statements.get();
        let elapsed = self.started_at.elapsed().as_millis();
        self.tx.commit().map_err(|err| {
            error!("event=unit_commit module=db status=error unit_id={id} error={err}");
            OrmError::from(err)
        })?;
        info!(
            "event=unit_commit module=db status=ok unit_id={id} statements={statements} duration_ms={elapsed}"
        );
        Ok(())
    }

    /// Rolls back every statement of the unit.
    pub fn rollback(self) -> OrmResult<()> {
        let id = self.id;
        self.tx.rollback()?;
        info!("event=unit_rollback module=db status=ok unit_id={id}");
        Ok(())
    }

    pub(crate) fn run<T>(
        &self,
        db: &Database,
        op: &'static str,
        table: &str,
        statement: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> OrmResult<T> {
        if !self.db.same_handle(db) {
            return Err(OrmError::Configuration(format!(
                "unit of work {} belongs to a different database handle",
                self.id
            )));
        }
        if self.failed.get() {
            return Err(OrmError::UnitAborted(self.id));
        }

        db.bump_statements();
        self.statements.set(self.statements.get() + 1);
        statement(&*self.tx).map_err(|err| {
            self.failed.set(true);
            error!(
                "event=db_execute module=db status=error op={op} table={table} scope=unit unit_id={} error={err}",
                self.id
            );
            err.into()
        })
    }
}
