//! Statement templates for single-table CRUD.
//!
//! Identifiers passed in must already be validated; every value is bound
//! through a numbered `?N` placeholder.

use crate::model::naming::{id_column, quote};

pub(crate) fn select_by_id(table: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE {} = ?1",
        quote(table),
        quote(&id_column(table))
    )
}

pub(crate) fn list(table: &str) -> String {
    format!("SELECT * FROM {}", quote(table))
}

pub(crate) fn insert(table: &str, columns: &[&str]) -> String {
    let returning = quote(&id_column(table));
    if columns.is_empty() {
        return format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {returning}",
            quote(table)
        );
    }

    let names = columns
        .iter()
        .map(|column| quote(column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders}) RETURNING {returning}",
        quote(table)
    )
}

/// The identifier is bound last, at `?{columns.len() + 1}`.
pub(crate) fn update(table: &str, columns: &[&str]) -> String {
    let assignments = columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{} = ?{}", quote(column), index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {} SET {assignments} WHERE {} = ?{}",
        quote(table),
        quote(&id_column(table)),
        columns.len() + 1
    )
}

pub(crate) fn delete(table: &str) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote(table),
        quote(&id_column(table))
    )
}
