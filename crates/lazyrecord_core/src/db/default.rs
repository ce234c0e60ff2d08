//! Per-thread default database for call sites that do not thread a handle
//! through explicitly.
//!
//! # Invariants
//! - A thread installs its default at most once until it is cleared.
//! - Reading an absent default is a configuration error, never a panic.

use super::Database;
use crate::record::error::{OrmError, OrmResult};
use log::{info, warn};
use std::cell::RefCell;

thread_local! {
    static DEFAULT_DATABASE: RefCell<Option<Database>> = const { RefCell::new(None) };
}

/// Installs `db` as this thread's default handle.
///
/// # Errors
/// - `Configuration` when a default is already installed.
pub fn install_default(db: Database) -> OrmResult<()> {
    DEFAULT_DATABASE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            warn!("event=db_default_install module=db status=error error_code=already_installed");
            return Err(OrmError::Configuration(
                "a default database is already installed on this thread".to_string(),
            ));
        }
        *slot = Some(db);
        info!("event=db_default_install module=db status=ok");
        Ok(())
    })
}

/// Returns a clone of this thread's default handle.
pub fn default_database() -> OrmResult<Database> {
    DEFAULT_DATABASE.with(|slot| {
        slot.borrow().clone().ok_or_else(|| {
            OrmError::Configuration("no default database installed on this thread".to_string())
        })
    })
}

/// Removes and returns this thread's default handle.
pub fn clear_default() -> Option<Database> {
    DEFAULT_DATABASE.with(|slot| slot.borrow_mut().take())
}

#[cfg(test)]
mod tests {
    use super::{clear_default, default_database, install_default};
    use crate::db::open_db_in_memory;
    use crate::record::error::ErrorKind;

    #[test]
    fn missing_default_is_a_configuration_error() {
        clear_default();
        let err = default_database().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn second_install_is_rejected_until_cleared() {
        clear_default();
        install_default(open_db_in_memory().unwrap()).unwrap();

        let err = install_default(open_db_in_memory().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        assert!(clear_default().is_some());
        install_default(open_db_in_memory().unwrap()).unwrap();
        assert!(default_database().is_ok());
        clear_default();
    }
}
