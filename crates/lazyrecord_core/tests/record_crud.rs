use lazyrecord_core::{
    entity, open_db_in_memory, Database, ErrorKind, OrmError, Record, RecordState,
};
use rusqlite::types::Value;

entity! {
    /// Account holder used across CRUD tests.
    pub struct User: UserColumns {
        name: String => set_name,
        email: Option<String> => set_email,
        age: Option<i64> => set_age,
    }
}

fn setup() -> Database {
    let db = open_db_in_memory().unwrap();
    db.connection()
        .execute_batch(
            r#"CREATE TABLE "user" (
                user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_name TEXT NOT NULL,
                user_email TEXT UNIQUE,
                user_age INTEGER,
                user_created TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                user_updated TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );"#,
        )
        .unwrap();
    db
}

fn row_count(db: &Database) -> i64 {
    db.connection()
        .query_row(r#"SELECT COUNT(*) FROM "user""#, [], |row| row.get(0))
        .unwrap()
}

#[test]
fn save_inserts_and_assigns_identifier() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();

    user.set_name("Ann").unwrap();
    user.save().unwrap();

    let id = user.id().unwrap();
    assert!(id >= 1);
    assert!(!user.is_modified());
    assert!(!user.is_loaded());

    let before = db.statements_executed();
    assert_eq!(user.name().unwrap(), "Ann");
    assert_eq!(db.statements_executed(), before + 1);
    assert!(user.is_loaded());

    assert_eq!(user.name().unwrap(), "Ann");
    assert_eq!(db.statements_executed(), before + 1);
    assert_eq!(row_count(&db), 1);
}

#[test]
fn saved_fields_roundtrip_through_fresh_handle() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();
    user.set_name("Ann").unwrap();
    user.set_email("ann@example.com".to_string()).unwrap();
    user.set_age(41_i64).unwrap();
    user.save().unwrap();

    let mut loaded = Record::<User>::with_id(&db, user.id().unwrap()).unwrap();
    assert_eq!(loaded.name().unwrap(), "Ann");
    assert_eq!(loaded.email().unwrap().as_deref(), Some("ann@example.com"));
    assert_eq!(loaded.age().unwrap(), Some(41));
    assert!(loaded.created().is_ok());
    assert!(loaded.updated().is_ok());
}

#[test]
fn insert_issues_exactly_one_statement() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();
    user.set_name("Ann").unwrap();

    let before = db.statements_executed();
    user.save().unwrap();
    assert_eq!(db.statements_executed(), before + 1);
}

#[test]
fn update_stores_quoted_values_verbatim() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();
    user.set_name("Ann").unwrap();
    user.save().unwrap();

    let hostile = r#"O'Brien"; DROP TABLE "user"; --"#;
    user.set_name(hostile).unwrap();
    user.save().unwrap();

    let mut reloaded = Record::<User>::with_id(&db, user.id().unwrap()).unwrap();
    assert_eq!(reloaded.name().unwrap(), hostile);
    assert_eq!(row_count(&db), 1);
}

#[test]
fn update_writes_only_changed_columns() {
    let db = setup();
    let mut first = Record::<User>::new(&db).unwrap();
    first.set_name("Ann").unwrap();
    first.set_age(30_i64).unwrap();
    first.save().unwrap();
    let id = first.id().unwrap();

    let mut stale = Record::<User>::with_id(&db, id).unwrap();
    stale.load().unwrap();

    let mut other = Record::<User>::with_id(&db, id).unwrap();
    other.set_age(31_i64).unwrap();
    other.save().unwrap();

    stale.set_name("Annie").unwrap();
    stale.save().unwrap();

    let mut fresh = Record::<User>::with_id(&db, id).unwrap();
    assert_eq!(fresh.name().unwrap(), "Annie");
    assert_eq!(fresh.age().unwrap(), Some(31));
}

#[test]
fn save_without_changes_on_persisted_record_is_a_no_op() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();
    user.set_name("Ann").unwrap();
    user.save().unwrap();

    let before = db.statements_executed();
    user.save().unwrap();
    assert_eq!(db.statements_executed(), before);
}

#[test]
fn update_of_missing_row_reports_row_not_found() {
    let db = setup();
    let mut ghost = Record::<User>::with_id(&db, 42).unwrap();
    ghost.set_name("Nobody").unwrap();

    let err = ghost.save().unwrap_err();
    assert!(matches!(err, OrmError::RowNotFound { id: 42, .. }));
    assert!(ghost.is_modified());
}

#[test]
fn failing_insert_rolls_back_and_leaves_identifier_unset() {
    let db = setup();
    let mut ann = Record::<User>::new(&db).unwrap();
    ann.set_name("Ann").unwrap();
    ann.set_email("shared@example.com".to_string()).unwrap();
    ann.save().unwrap();

    let mut duplicate = Record::<User>::new(&db).unwrap();
    duplicate.set_name("Imposter").unwrap();
    duplicate.set_email("shared@example.com".to_string()).unwrap();

    let err = duplicate.save().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Database);
    assert_eq!(duplicate.id(), None);
    assert!(duplicate.is_modified());
    assert!(db.connection().is_autocommit());
    assert_eq!(row_count(&db), 1);
}

#[test]
fn failing_insert_does_not_poison_later_statements() {
    let db = setup();
    let mut broken = Record::<User>::new(&db).unwrap();
    broken.set_age(3_i64).unwrap();
    assert!(broken.save().is_err());

    let mut ok = Record::<User>::new(&db).unwrap();
    ok.set_name("Bob").unwrap();
    ok.save().unwrap();
    assert_eq!(row_count(&db), 1);
}

#[test]
fn delete_without_identifier_fails_without_sql() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();

    let before = db.statements_executed();
    let err = user.delete().unwrap_err();
    assert!(matches!(err, OrmError::MissingId { .. }));
    assert!(err.is_not_found());
    assert_eq!(db.statements_executed(), before);
}

#[test]
fn delete_removes_row_and_invalidates_handle() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();
    user.set_name("Ann").unwrap();
    user.save().unwrap();
    let id = user.id().unwrap();

    user.delete().unwrap();
    assert_eq!(user.state(), RecordState::Deleted);
    assert_eq!(row_count(&db), 0);

    let before = db.statements_executed();
    assert!(matches!(user.get("name"), Err(OrmError::Deleted { .. })));
    assert!(matches!(user.set_name("Again"), Err(OrmError::Deleted { .. })));
    assert!(matches!(user.save(), Err(OrmError::Deleted { .. })));
    assert!(matches!(user.delete(), Err(OrmError::Deleted { .. })));
    assert_eq!(db.statements_executed(), before);
    assert_eq!(user.id(), Some(id));

    let mut gone = Record::<User>::with_id(&db, id).unwrap();
    assert!(matches!(gone.get("name"), Err(OrmError::RowNotFound { .. })));
}

#[test]
fn delete_of_missing_row_reports_row_not_found() {
    let db = setup();
    let mut ghost = Record::<User>::with_id(&db, 7).unwrap();

    let err = ghost.delete().unwrap_err();
    assert!(matches!(err, OrmError::RowNotFound { id: 7, .. }));
    assert_eq!(ghost.state(), RecordState::Active);
}

#[test]
fn generic_set_and_get_use_raw_values() {
    let db = setup();
    let mut user = Record::<User>::new(&db).unwrap();
    user.set("name", "Ann".to_string()).unwrap();
    user.set("age", Value::Null).unwrap();
    user.save().unwrap();

    assert_eq!(user.get("name").unwrap(), &Value::Text("Ann".to_string()));
    assert_eq!(user.get("age").unwrap(), &Value::Null);
    assert!(matches!(user.get("id").unwrap(), Value::Integer(_)));
}
