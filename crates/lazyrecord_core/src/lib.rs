//! Active-record style mapping of entity types onto single SQLite tables.
//! Table and column names follow the `<table>_<attribute>` convention.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod record;

pub use config::{ConfigError, OrmConfig};
pub use db::{open_db, open_db_in_memory, Database, DbError, UnitOfWork};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::entity::Entity;
pub use record::error::{ErrorKind, OrmError, OrmResult};
pub use record::{Record, RecordId, RecordState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
