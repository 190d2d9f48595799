use super::{Entity, Model};
use crate::row::Record;
use crate::schema::LiveCatalog;
use crate::testing::RecordingConnection;
use crate::value::Value;
use std::sync::Arc;

struct User;

impl Entity for User {
    const FILLABLE: &'static [&'static str] = &["name", "email", "password", "role"];
    const GUARDED: &'static [&'static str] = &["role"];
    const HIDDEN: &'static [&'static str] = &["password"];
}

fn boot() -> (Arc<RecordingConnection>, Model<User>) {
    let conn = Arc::new(
        RecordingConnection::new().with_columns("users", &["id", "name", "email", "password", "role"]),
    );
    let catalog = LiveCatalog::new(conn.clone());
    let model = Model::<User>::boot(conn.clone(), &catalog).unwrap();
    conn.clear_statements();
    (conn, model)
}

fn row(pairs: &[(&str, Value)]) -> Record {
    pairs.iter().cloned().collect()
}

#[test]
fn test_boot_discovers_columns() {
    let (_, model) = boot();
    assert_eq!(model.table(), "users");
    assert_eq!(model.columns(), ["id", "name", "email", "password", "role"]);
    assert!(!model.exists());
    assert_eq!(model.primary_key(), "id");
    assert!(model.primary_key_value().is_none());
}

#[test]
fn test_guarded_overrides_fillable() {
    assert!(Model::<User>::is_fillable("name"));
    assert!(!Model::<User>::is_fillable("role"));
    assert!(!Model::<User>::is_fillable("id"));
}

#[test]
fn test_set_and_get() {
    let (_, mut model) = boot();
    model.set("name", "Jo").unwrap();
    assert_eq!(model.get("name").unwrap(), &Value::from("Jo"));
    assert_eq!(model.get_as::<String>("name").unwrap(), "Jo");
}

#[test]
fn test_set_rejects_non_fillable() {
    let (_, mut model) = boot();
    assert!(model.set("id", 5).unwrap_err().is_mass_assignment());
    assert!(model.set("role", "admin").unwrap_err().is_mass_assignment());
    assert!(model.attributes().is_empty());
}

#[test]
fn test_get_missing_then_hidden() {
    let (_, mut model) = boot();
    assert!(model.get("password").unwrap_err().is_attribute_not_found());
    model.set("password", "hunter2").unwrap();
    assert!(model.get("password").unwrap_err().is_hidden_attribute());
    assert!(!model.visible_attributes().contains_key("password"));
    assert!(model.attributes().contains_key("password"));
}

#[test]
fn test_get_as_reports_attribute_on_decode_error() {
    let (_, mut model) = boot();
    model.set("name", "Jo").unwrap();
    let err = model.get_as::<i64>("name").unwrap_err();
    assert!(err.to_string().contains("name"));
}

#[test]
fn test_fill_is_all_or_nothing() {
    let (_, mut model) = boot();
    let err = model
        .fill([("name", "Jo"), ("role", "admin")])
        .unwrap_err();
    assert!(err.is_mass_assignment());
    assert!(model.attributes().is_empty());

    model.fill([("name", "Jo"), ("email", "jo@example.com")]).unwrap();
    assert_eq!(model.attributes().len(), 2);
}

#[test]
fn test_wildcard_select_excludes_hidden() {
    let (_, mut model) = boot();
    model.select(&["*"]).unwrap();
    assert_eq!(
        model.pending().unwrap().query(),
        "SELECT id, name, email, role FROM users"
    );

    model.select(&["name", "password"]).unwrap();
    assert_eq!(model.pending().unwrap().query(), "SELECT name FROM users");

    assert!(model.select(&["password"]).unwrap_err().is_invalid_argument());
}

#[test]
fn test_fetch_consumes_pending_query() {
    let (conn, mut model) = boot();
    conn.push_rows(vec![row(&[("id", Value::from(2)), ("name", Value::from("Al"))])]);

    let rows = model
        .where_("name", "=", "Al")
        .and("id", ">", 1)
        .limit(10)
        .fetch()
        .unwrap();

    assert_eq!(rows.len(), 1);
    let stmt = conn.last_statement().unwrap();
    assert_eq!(
        stmt.sql,
        "SELECT id, name, email, role FROM users WHERE name = ? AND id > ? LIMIT 10"
    );
    assert_eq!(stmt.params, vec![Value::from("Al"), Value::from(1)]);
    assert!(model.pending().is_none());
}

#[test]
fn test_all_projects_visible_columns() {
    let (conn, mut model) = boot();
    model.select(&["name"]).unwrap();
    model.all().unwrap();
    assert_eq!(
        conn.last_statement().unwrap().sql,
        "SELECT id, name, email, role FROM users"
    );
}

#[test]
fn test_create_inserts_fillable_data() {
    let (conn, model) = boot();
    conn.push_affected(1);

    assert_eq!(model.create([("name", "Jo")]).unwrap(), 1);
    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "INSERT INTO users (name) VALUES (?)");
    assert_eq!(stmt.params, vec![Value::from("Jo")]);
}

#[test]
fn test_create_rejects_non_fillable_without_database_call() {
    let (conn, model) = boot();
    assert!(model.create([("role", "admin")]).unwrap_err().is_mass_assignment());
    assert!(model.create([("id", 1)]).unwrap_err().is_mass_assignment());
    assert!(conn.statements().is_empty());
}

#[test]
fn test_update_requires_known_key() {
    let (conn, mut model) = boot();
    assert!(model.update([("name", "Jo")]).unwrap_err().is_invalid_argument());
    assert!(conn.statements().is_empty());
}

#[test]
fn test_find_miss_leaves_model_new() {
    let (conn, mut model) = boot();
    assert!(model.find(1).unwrap().is_none());
    assert!(!model.exists());
    assert!(model.primary_key_value().is_none());

    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "SELECT id, name, email, role FROM users WHERE id = ?");
    assert_eq!(stmt.params, vec![Value::from(1)]);
}

#[test]
fn test_find_hit_hydrates() {
    let (conn, mut model) = boot();
    let found = row(&[("id", Value::from(1)), ("name", Value::from("Jo"))]);
    conn.push_rows(vec![found.clone()]);

    assert_eq!(model.find(1).unwrap(), Some(found));
    assert!(model.exists());
    assert_eq!(model.primary_key_value(), Some(&Value::from(1)));
    assert_eq!(model.get_as::<String>("name").unwrap(), "Jo");
}

#[test]
fn test_find_with_columns_keeps_requested_key() {
    let (conn, mut model) = boot();
    conn.push_rows(vec![row(&[("name", Value::from("Jo"))])]);

    model.find_with(7, &["name"]).unwrap();
    assert_eq!(conn.last_statement().unwrap().sql, "SELECT name FROM users WHERE id = ?");
    assert_eq!(model.primary_key_value(), Some(&Value::from(7)));
}

#[test]
fn test_save_new_inserts_and_stays_new() {
    let (conn, mut model) = boot();
    conn.push_affected(1);
    model.set("name", "Jo").unwrap();
    model.set("email", "jo@example.com").unwrap();

    assert_eq!(model.save().unwrap(), 1);
    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "INSERT INTO users (name, email) VALUES (?, ?)");
    assert!(!model.exists());
    assert!(model.primary_key_value().is_none());
}

#[test]
fn test_save_hydrated_updates_by_key() {
    let (conn, mut model) = boot();
    conn.push_rows(vec![row(&[
        ("id", Value::from(1)),
        ("name", Value::from("Jo")),
        ("role", Value::from("user")),
    ])]);
    model.find(1).unwrap();
    model.set("name", "Joanna").unwrap();
    conn.push_affected(1);

    assert_eq!(model.save().unwrap(), 1);
    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "UPDATE users SET name = ? WHERE id = ?");
    assert_eq!(stmt.params, vec![Value::from("Joanna"), Value::from(1)]);
    assert!(model.exists());
}

#[test]
fn test_update_merges_attributes() {
    let (conn, mut model) = boot();
    conn.push_rows(vec![row(&[("id", Value::from(3)), ("name", Value::from("Jo"))])]);
    model.find(3).unwrap();

    model.update([("email", "new@example.com")]).unwrap();
    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "UPDATE users SET email = ? WHERE id = ?");
    assert_eq!(model.get_as::<String>("email").unwrap(), "new@example.com");
}

#[test]
fn test_delete_resets_identity() {
    let (conn, mut model) = boot();
    assert!(model.delete().unwrap_err().is_invalid_argument());

    conn.push_rows(vec![row(&[("id", Value::from(4))])]);
    model.find(4).unwrap();
    conn.push_affected(1);

    assert_eq!(model.delete().unwrap(), 1);
    assert_eq!(conn.last_statement().unwrap().sql, "DELETE FROM users WHERE id = ?");
    assert!(!model.exists());
    assert!(model.primary_key_value().is_none());
}

#[test]
fn test_delete_then_save_inserts() {
    let (conn, mut model) = boot();
    conn.push_rows(vec![row(&[
        ("id", Value::from(4)),
        ("name", Value::from("Jo")),
        ("role", Value::from("admin")),
    ])]);
    model.find(4).unwrap();
    conn.push_affected(1);
    model.delete().unwrap();

    assert_eq!(model.attributes().keys().collect::<Vec<_>>(), vec!["name"]);

    conn.push_affected(1);
    assert_eq!(model.save().unwrap(), 1);
    let stmt = conn.last_statement().unwrap();
    assert_eq!(stmt.sql, "INSERT INTO users (name) VALUES (?)");
    assert_eq!(stmt.params, vec![Value::from("Jo")]);
    assert!(!model.exists());
}

#[test]
fn test_debug_omits_hidden_attributes() {
    let (_, mut model) = boot();
    model.set("password", "hunter2").unwrap();
    assert!(!format!("{model:?}").contains("hunter2"));
}
