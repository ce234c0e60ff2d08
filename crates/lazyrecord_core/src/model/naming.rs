//! Table/column naming convention and SQL identifier safety.

use crate::record::error::{OrmError, OrmResult};
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile")
});

/// Lowercases an entity type name into its table name.
pub fn table_name(type_name: &str) -> String {
    type_name.to_lowercase()
}

/// Builds the qualified `<table>_<attribute>` column name.
pub fn qualified(table: &str, attribute: &str) -> String {
    format!("{table}_{attribute}")
}

pub fn id_column(table: &str) -> String {
    qualified(table, "id")
}

pub fn created_column(table: &str) -> String {
    qualified(table, "created")
}

pub fn updated_column(table: &str) -> String {
    qualified(table, "updated")
}

/// Rejects anything that is not a plain SQL identifier.
///
/// Identifiers are spliced into statement text (values never are), so this
/// is the only guard between entity names and the SQL grammar.
pub fn validate_identifier(name: &str) -> OrmResult<()> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(OrmError::InvalidIdentifier(name.to_string()))
    }
}

/// Double-quotes an identifier that already passed [`validate_identifier`].
pub(crate) fn quote(identifier: &str) -> String {
    format!("\"{identifier}\"")
}

#[cfg(test)]
mod tests {
    use super::{id_column, qualified, table_name, validate_identifier};

    #[test]
    fn naming_follows_table_prefix_convention() {
        assert_eq!(table_name("User"), "user");
        assert_eq!(table_name("BlogPost"), "blogpost");
        assert_eq!(qualified("user", "name"), "user_name");
        assert_eq!(id_column("user"), "user_id");
    }

    #[test]
    fn validate_identifier_rejects_sql_fragments() {
        assert!(validate_identifier("user_name").is_ok());
        assert!(validate_identifier("_hidden2").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("name\" = 1; --").is_err());
        assert!(validate_identifier("first name").is_err());
    }
}
