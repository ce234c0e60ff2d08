//! CLI smoke entry point.
//!
//! # Responsibility
//! - Exercise `lazyrecord_core` end to end: open, insert, list.
//! - Keep output deterministic for quick local sanity checks.

use clap::Parser;
use lazyrecord_core::config::IN_MEMORY_DATABASE;
use lazyrecord_core::{entity, init_logging_from_config, OrmConfig, Record};
use log::info;
use std::error::Error;
use std::path::PathBuf;

/// Save one person record and list the table.
#[derive(Parser, Debug)]
#[command(name = "lazyrecord_cli", version)]
struct Cli {
    /// JSON config file; without it the demo runs against an in-memory database
    config: Option<PathBuf>,

    /// Name stored on the demo record
    #[arg(default_value = "Ann")]
    name: String,
}

impl Cli {
    fn orm_config(&self) -> Result<OrmConfig, Box<dyn Error>> {
        match &self.config {
            Some(path) => Ok(OrmConfig::load(path)?),
            None => Ok(OrmConfig {
                database: Some(IN_MEMORY_DATABASE.to_string()),
                ..OrmConfig::default()
            }),
        }
    }
}

entity! {
    struct Person: PersonColumns {
        name: String => set_name,
    }
}

const PERSON_SCHEMA: &str = r#"CREATE TABLE IF NOT EXISTS "person" (
    person_id INTEGER PRIMARY KEY AUTOINCREMENT,
    person_name TEXT NOT NULL,
    person_created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    person_updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);"#;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.orm_config()?;

    init_logging_from_config(&config)?;
    println!("lazyrecord_core version={}", lazyrecord_core::core_version());

    let db = config.open_database()?;
    db.connection().execute_batch(PERSON_SCHEMA)?;

    let mut person = Record::<Person>::new(&db)?;
    person.set_name(cli.name.as_str())?;
    person.save()?;
    info!(
        "event=cli_demo module=cli status=ok id={}",
        person.id().unwrap_or_default()
    );

    for mut row in Record::<Person>::all(&db)? {
        let id = row.id().unwrap_or_default();
        println!("person id={id} name={}", row.name()?);
    }
    println!("statements={}", db.statements_executed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_runs_in_memory_demo_as_ann() {
        let cli = Cli::try_parse_from(["lazyrecord_cli"]).unwrap();
        assert!(cli.config.is_none());
        assert_eq!(cli.name, "Ann");

        let config = cli.orm_config().unwrap();
        assert_eq!(config.database.as_deref(), Some(":memory:"));
    }

    #[test]
    fn positional_config_and_name_are_parsed() {
        let cli = Cli::try_parse_from(["lazyrecord_cli", "db.json", "Bob"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("db.json")));
        assert_eq!(cli.name, "Bob");
    }

    #[test]
    fn extra_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["lazyrecord_cli", "db.json", "Bob", "extra"]).is_err());
    }
}
