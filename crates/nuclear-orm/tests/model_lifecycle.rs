//! Model lifecycle against an in-memory connection.

use nuclear_orm::testing::RecordingConnection;
use nuclear_orm::{Database, Entity, OrmError, Record, Value};
use std::sync::Arc;

struct Test;

impl Entity for Test {
    const FILLABLE: &'static [&'static str] = &["name", "role"];
    const GUARDED: &'static [&'static str] = &["role"];
    const HIDDEN: &'static [&'static str] = &["password"];
}

fn setup() -> (Arc<RecordingConnection>, Database) {
    let conn = Arc::new(RecordingConnection::new().with_columns("tests", &["id", "name", "password"]));
    let db = Database::new(conn.clone());
    (conn, db)
}

fn jo() -> Record {
    [("id", Value::from(1)), ("name", Value::from("Jo"))]
        .into_iter()
        .collect()
}

#[test]
fn wildcard_projection_drops_hidden_columns() {
    let (conn, db) = setup();
    let mut model = db.model::<Test>().unwrap();

    model.all().unwrap();
    assert_eq!(conn.last_statement().unwrap().sql, "SELECT id, name FROM tests");
}

#[test]
fn create_binds_values_in_key_order() {
    let (conn, db) = setup();
    let model = db.model::<Test>().unwrap();
    conn.clear_statements();
    conn.push_affected(1);

    model.create([("name", "Jo")]).unwrap();

    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "INSERT INTO tests (name) VALUES (?)");
    assert_eq!(stmt.params, vec![Value::from("Jo")]);
}

#[test]
fn create_with_non_fillable_key_sends_nothing() {
    let (conn, db) = setup();
    let model = db.model::<Test>().unwrap();
    conn.clear_statements();

    let err = model.create([("role", "admin")]).unwrap_err();
    assert!(matches!(err, OrmError::MassAssignment(ref name) if name == "role"));
    assert!(conn.statements().is_empty());
}

// `role` is both fillable and guarded; guarded wins.
#[test]
fn guarded_attribute_is_rejected_even_when_fillable() {
    let (_, db) = setup();
    let mut model = db.model::<Test>().unwrap();
    assert!(model.set("role", "admin").unwrap_err().is_mass_assignment());
}

#[test]
fn find_on_empty_table() {
    let (_, db) = setup();
    let mut model = db.model::<Test>().unwrap();

    assert_eq!(model.find(1).unwrap(), None);
    assert!(!model.exists());
    assert_eq!(model.primary_key_value(), None);
}

#[test]
fn find_then_save_updates_the_row() {
    let (conn, db) = setup();
    let mut model = db.model::<Test>().unwrap();
    conn.push_rows(vec![jo()]);

    assert_eq!(model.find(1).unwrap(), Some(jo()));
    assert!(model.exists());
    assert_eq!(model.primary_key_value(), Some(&Value::from(1)));

    model.set("name", "Joanna").unwrap();
    conn.push_affected(1);
    model.save().unwrap();

    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "UPDATE tests SET name = ? WHERE id = ?");
    assert_eq!(stmt.params, vec![Value::from("Joanna"), Value::from(1)]);
}

// Saving a new model inserts but does not read back the generated key.
#[test]
fn save_on_new_model_inserts_and_stays_new() {
    let (conn, db) = setup();
    let mut model = db.model::<Test>().unwrap();
    model.set("name", "Jo").unwrap();
    conn.push_affected(1);

    model.save().unwrap();
    assert_eq!(
        conn.last_statement().unwrap().sql,
        "INSERT INTO tests (name) VALUES (?)"
    );
    assert!(!model.exists());

    conn.push_affected(1);
    model.save().unwrap();
    let inserts = conn
        .statements()
        .iter()
        .filter(|s| s.sql.starts_with("INSERT"))
        .count();
    assert_eq!(inserts, 2);
}

#[test]
fn attribute_reads() {
    let (_, db) = setup();
    let model = db.model::<Test>().unwrap();
    assert!(model.get("name").unwrap_err().is_attribute_not_found());

    let (conn, db) = setup();
    let mut model = db.model::<Test>().unwrap();
    let mut row = jo();
    row.insert("password", "secret");
    conn.push_rows(vec![row]);
    model.find(1).unwrap();

    assert_eq!(model.get("name").unwrap(), &Value::from("Jo"));
    assert!(model.get("password").unwrap_err().is_hidden_attribute());
}

#[test]
fn builder_statement_has_no_placeholders_left() {
    let (_, db) = setup();
    let mut qb = db.table("t");
    qb.select_all().where_("a", "=", 1).and("b", "=", 2).limit(5);

    assert_eq!(qb.statement(), "SELECT * FROM t WHERE a = 1 AND b = 2 LIMIT 5");
    assert_eq!(qb.values(), vec![Value::from(1), Value::from(2)]);
}

#[test]
fn driver_failure_surfaces_as_execution_failure() {
    let (conn, db) = setup();
    let mut model = db.model::<Test>().unwrap();
    conn.push_error("connection reset");

    let err = model.find(1).unwrap_err();
    assert!(err.is_execution_failure());
    assert!(!model.exists());
}
