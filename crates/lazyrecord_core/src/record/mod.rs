//! Active-record engine: one `Record<E>` per table row.
//!
//! # Responsibility
//! - Lazily load a row on first attribute read.
//! - Buffer attribute writes in memory until `save`.
//! - Emit parameterized insert/update/select/delete statements through the
//!   shared [`Database`] handle.
//!
//! # Invariants
//! - `fields` is keyed only by qualified `<table>_<attribute>` names.
//! - `loaded` never goes back to `false`.
//! - Reads fail with `PendingChanges` while writes are buffered.
//! - A deleted record refuses every further operation without touching SQL.

pub mod error;
mod sql;

use crate::db::{default_database, Database, Scope, UnitOfWork};
use crate::model::entity::Entity;
use crate::model::naming;
use error::{OrmError, OrmResult};
use log::{debug, info, warn};
use rusqlite::types::{FromSql, Value, ValueRef};
use rusqlite::{params_from_iter, OptionalExtension, Row};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::marker::PhantomData;

/// Row identifier stored in `<table>_id`.
pub type RecordId = i64;

/// Lifecycle tag of a record handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Active,
    /// The row was deleted through this handle; the handle is stale.
    Deleted,
}

/// In-memory representation of one row of `E`'s table.
#[derive(Debug)]
pub struct Record<E: Entity> {
    db: Database,
    table: String,
    id: Option<RecordId>,
    fields: BTreeMap<String, Value>,
    dirty: BTreeSet<String>,
    transient: HashMap<String, Value>,
    loaded: bool,
    modified: bool,
    state: RecordState,
    entity: PhantomData<E>,
}

impl<E: Entity> Record<E> {
    /// Creates a record that will be inserted on `save`.
    pub fn new(db: &Database) -> OrmResult<Self> {
        Self::build(db.clone(), None)
    }

    /// Creates a handle to an existing row; nothing is read until first use.
    pub fn with_id(db: &Database, id: RecordId) -> OrmResult<Self> {
        Self::build(db.clone(), Some(id))
    }

    /// Creates a record bound to this thread's default database.
    ///
    /// # Errors
    /// - `Configuration` when no default database was installed.
    pub fn from_default(id: Option<RecordId>) -> OrmResult<Self> {
        Self::build(default_database()?, id)
    }

    fn build(db: Database, id: Option<RecordId>) -> OrmResult<Self> {
        let table = E::table_name();
        naming::validate_identifier(&table)?;

        Ok(Self {
            db,
            table,
            id,
            fields: BTreeMap::new(),
            dirty: BTreeSet::new(),
            transient: HashMap::new(),
            loaded: false,
            modified: false,
            state: RecordState::Active,
            entity: PhantomData,
        })
    }

    /// Lists every row of the table as loaded records, in result order.
    ///
    /// Returned records never query the database for their own fields.
    pub fn all(db: &Database) -> OrmResult<Vec<Self>> {
        Self::list(db, Scope::Standalone)
    }

    /// Same as [`Record::all`] but reads inside `unit`.
    pub fn all_in(unit: &UnitOfWork<'_>) -> OrmResult<Vec<Self>> {
        Self::list(unit.database(), Scope::Unit(unit))
    }

    fn list(db: &Database, scope: Scope<'_, '_>) -> OrmResult<Vec<Self>> {
        let table = E::table_name();
        naming::validate_identifier(&table)?;
        let query = sql::list(&table);

        let rows = db.read(scope, "list", &table, |conn| {
            let mut stmt = conn.prepare(&query)?;
            let rows = stmt.query_map([], row_to_fields)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let id_column = naming::id_column(&table);
        let mut records = Vec::with_capacity(rows.len());
        for fields in rows {
            let id = match fields.get(&id_column) {
                Some(Value::Integer(id)) => *id,
                other => {
                    return Err(OrmError::InvalidData(format!(
                        "expected integer `{id_column}`, got {other:?}"
                    )));
                }
            };
            let mut record = Self::build(db.clone(), Some(id))?;
            record.fields = fields;
            record.loaded = true;
            records.push(record);
        }

        debug!(
            "event=record_list module=record status=ok table={table} rows={}",
            records.len()
        );
        Ok(records)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    /// Current field map, keyed by qualified column name.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Value of an undeclared attribute previously passed to [`Record::set`].
    pub fn transient(&self, name: &str) -> Option<&Value> {
        self.transient.get(name)
    }

    /// `<table>_created` from the current fields; never triggers a load.
    pub fn created(&self) -> OrmResult<&Value> {
        self.field(naming::created_column(&self.table))
    }

    /// `<table>_updated` from the current fields; never triggers a load.
    pub fn updated(&self) -> OrmResult<&Value> {
        self.field(naming::updated_column(&self.table))
    }

    fn field(&self, column: String) -> OrmResult<&Value> {
        self.fields
            .get(&column)
            .ok_or(OrmError::UnknownColumn { column })
    }

    /// Reads attribute `name`, loading the row on first access.
    ///
    /// # Errors
    /// - `PendingChanges` while unsaved writes are buffered, whatever `name` is.
    /// - `UnknownColumn` when the row has no `<table>_<name>` column.
    /// - `MissingId`/`RowNotFound` when the row cannot be loaded.
    pub fn get(&mut self, name: &str) -> OrmResult<&Value> {
        self.get_scoped(Scope::Standalone, name)
    }

    /// Same as [`Record::get`], loading inside `unit` when needed.
    pub fn get_in(&mut self, unit: &UnitOfWork<'_>, name: &str) -> OrmResult<&Value> {
        self.get_scoped(Scope::Unit(unit), name)
    }

    /// Reads attribute `name` converted through `FromSql`.
    pub fn get_as<T: FromSql>(&mut self, name: &str) -> OrmResult<T> {
        let value = self.get(name)?;
        T::column_result(ValueRef::from(value))
            .map_err(|err| OrmError::InvalidData(format!("attribute `{name}`: {err}")))
    }

    fn get_scoped(&mut self, scope: Scope<'_, '_>, name: &str) -> OrmResult<&Value> {
        self.ensure_active()?;
        if self.modified {
            return Err(OrmError::PendingChanges {
                table: self.table.clone(),
            });
        }
        self.load_scoped(scope)?;
        self.field(naming::qualified(&self.table, name))
    }

    /// Buffers `value` for a declared column; undeclared names are kept as
    /// transient, never persisted state. No SQL is issued.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> OrmResult<()> {
        self.ensure_active()?;
        let value = value.into();

        if !E::has_column(name) {
            self.transient.insert(name.to_string(), value);
            return Ok(());
        }

        let column = naming::qualified(&self.table, name);
        naming::validate_identifier(&column)?;
        self.fields.insert(column.clone(), value);
        self.dirty.insert(column);
        self.modified = true;
        Ok(())
    }

    /// Loads the row once; later calls are no-ops.
    ///
    /// # Errors
    /// - `PendingChanges` when writes are buffered on a not yet loaded record.
    /// - `MissingId` for a record that was never saved.
    /// - `RowNotFound` when no row has this identifier.
    pub fn load(&mut self) -> OrmResult<()> {
        self.load_scoped(Scope::Standalone)
    }

    pub fn load_in(&mut self, unit: &UnitOfWork<'_>) -> OrmResult<()> {
        self.load_scoped(Scope::Unit(unit))
    }

    fn load_scoped(&mut self, scope: Scope<'_, '_>) -> OrmResult<()> {
        self.ensure_active()?;
        if self.loaded {
            return Ok(());
        }
        if self.modified {
            return Err(OrmError::PendingChanges {
                table: self.table.clone(),
            });
        }
        let id = self.require_id()?;

        let query = sql::select_by_id(&self.table);
        let row = self.db.read(scope, "select", &self.table, |conn| {
            conn.query_row(&query, [id], row_to_fields).optional()
        })?;

        match row {
            Some(fields) => {
                self.fields = fields;
                self.loaded = true;
                debug!(
                    "event=record_load module=record status=ok table={} id={id} columns={}",
                    self.table,
                    self.fields.len()
                );
                Ok(())
            }
            None => {
                warn!(
                    "event=record_load module=record status=error table={} id={id} error_code=row_not_found",
                    self.table
                );
                Err(OrmError::RowNotFound {
                    table: self.table.clone(),
                    id,
                })
            }
        }
    }

    /// Inserts (no identifier) or updates (identifier present) as a
    /// standalone transaction, then clears the modified flag.
    pub fn save(&mut self) -> OrmResult<()> {
        self.save_scoped(Scope::Standalone)
    }

    /// Same as [`Record::save`] inside `unit`. Rolling the unit back does not
    /// revert this record's in-memory state.
    pub fn save_in(&mut self, unit: &UnitOfWork<'_>) -> OrmResult<()> {
        self.save_scoped(Scope::Unit(unit))
    }

    fn save_scoped(&mut self, scope: Scope<'_, '_>) -> OrmResult<()> {
        self.ensure_active()?;
        match self.id {
            None => self.insert(scope)?,
            Some(id) => self.update(scope, id)?,
        }
        self.modified = false;
        self.dirty.clear();
        Ok(())
    }

    fn insert(&mut self, scope: Scope<'_, '_>) -> OrmResult<()> {
        let columns = self.dirty.iter().map(String::as_str).collect::<Vec<_>>();
        let query = sql::insert(&self.table, &columns);
        let values = self.dirty_values(&columns);

        let id = self.db.write(scope, "insert", &self.table, |conn| {
            conn.query_row(&query, params_from_iter(values), |row| {
                row.get::<_, RecordId>(0)
            })
        })?;

        info!(
            "event=record_insert module=record status=ok table={} id={id} columns={}",
            self.table,
            columns.len()
        );
        self.id = Some(id);
        Ok(())
    }

    fn update(&mut self, scope: Scope<'_, '_>, id: RecordId) -> OrmResult<()> {
        let columns = self.dirty.iter().map(String::as_str).collect::<Vec<_>>();
        if columns.is_empty() {
            debug!(
                "event=record_update module=record status=skipped table={} id={id} reason=no_changes",
                self.table
            );
            return Ok(());
        }

        let query = sql::update(&self.table, &columns);
        let id_value = Value::Integer(id);
        let mut values = self.dirty_values(&columns);
        values.push(&id_value);

        let changed = self.db.write(scope, "update", &self.table, |conn| {
            conn.execute(&query, params_from_iter(values))
        })?;
        if changed == 0 {
            return Err(OrmError::RowNotFound {
                table: self.table.clone(),
                id,
            });
        }

        info!(
            "event=record_update module=record status=ok table={} id={id} columns={}",
            self.table,
            columns.len()
        );
        Ok(())
    }

    fn dirty_values<'a>(&'a self, columns: &[&str]) -> Vec<&'a Value> {
        columns
            .iter()
            .filter_map(|column| self.fields.get(*column))
            .collect()
    }

    /// Deletes the row as a standalone transaction and marks this handle
    /// as [`RecordState::Deleted`].
    ///
    /// # Errors
    /// - `MissingId` for a record that was never saved; no SQL is issued.
    /// - `RowNotFound` when no row had this identifier.
    pub fn delete(&mut self) -> OrmResult<()> {
        self.delete_scoped(Scope::Standalone)
    }

    pub fn delete_in(&mut self, unit: &UnitOfWork<'_>) -> OrmResult<()> {
        self.delete_scoped(Scope::Unit(unit))
    }

    fn delete_scoped(&mut self, scope: Scope<'_, '_>) -> OrmResult<()> {
        self.ensure_active()?;
        let id = self.require_id()?;

        let query = sql::delete(&self.table);
        let changed = self.db.write(scope, "delete", &self.table, |conn| {
            conn.execute(&query, [id])
        })?;
        if changed == 0 {
            return Err(OrmError::RowNotFound {
                table: self.table.clone(),
                id,
            });
        }

        self.state = RecordState::Deleted;
        info!(
            "event=record_delete module=record status=ok table={} id={id}",
            self.table
        );
        Ok(())
    }

    fn require_id(&self) -> OrmResult<RecordId> {
        self.id.ok_or_else(|| OrmError::MissingId {
            table: self.table.clone(),
        })
    }

    fn ensure_active(&self) -> OrmResult<()> {
        match (self.state, self.id) {
            (RecordState::Deleted, Some(id)) => Err(OrmError::Deleted {
                table: self.table.clone(),
                id,
            }),
            _ => Ok(()),
        }
    }
}

fn row_to_fields(row: &Row<'_>) -> rusqlite::Result<BTreeMap<String, Value>> {
    let stmt = row.as_ref();
    let mut fields = BTreeMap::new();
    for index in 0..stmt.column_count() {
        let name = stmt.column_name(index)?.to_string();
        fields.insert(name, row.get::<_, Value>(index)?);
    }
    Ok(fields)
}
