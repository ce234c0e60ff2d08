//! Entity declarations and the naming convention that maps them to tables.
//!
//! # Responsibility
//! - Describe which attribute columns an entity type owns.
//! - Derive table, primary key and qualified column names.
//!
//! # Invariants
//! - Table name is the lowercased entity type name.
//! - Every persisted column is addressed as `<table>_<attribute>`.

pub mod entity;
pub mod naming;
