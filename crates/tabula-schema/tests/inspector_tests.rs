use std::sync::Arc;
use tabula_core::Connection;
use tabula_driver_sqlite::{SqliteConnection, SqliteOpenOptions};
use tabula_query::{IdentifierRejection, QueryError};
use tabula_schema::{SchemaCache, SchemaError, SchemaInspector};
use tempfile::TempDir;

fn seeded(dir: &TempDir, sql: &str) -> String {
    let path = dir.path().join("schema.db");
    let path = path.to_str().unwrap().to_string();
    let conn = SqliteConnection::open(&path, SqliteOpenOptions::read_write()).unwrap();
    conn.execute_batch(sql).unwrap();
    path
}

fn inspector() -> SchemaInspector {
    SchemaInspector::new(Arc::new(SchemaCache::default()))
}

#[tokio::test]
async fn test_columns_in_declaration_order() {
    let dir = TempDir::new().unwrap();
    let path = seeded(
        &dir,
        "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, price REAL);",
    );
    let conn = SqliteConnection::open(&path, SqliteOpenOptions::default()).unwrap();

    let columns = inspector().columns(&conn, "items").await.unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["id", "name", "price"]);
    assert!(columns[0].is_primary_key);
    assert!(columns[1].not_null);
}

#[tokio::test]
async fn test_missing_table_is_a_schema_error() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir, "CREATE TABLE items (id INTEGER);");
    let conn = SqliteConnection::open(&path, SqliteOpenOptions::default()).unwrap();

    let err = inspector().columns(&conn, "orders").await.unwrap_err();
    assert!(matches!(err, SchemaError::TableNotFound(ref t) if t == "orders"));
}

#[tokio::test]
async fn test_hostile_table_name_is_rejected_before_lookup() {
    let conn = SqliteConnection::open_in_memory().unwrap();

    let err = inspector()
        .columns(&conn, "items; DROP TABLE items")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidIdentifier(QueryError::InvalidIdentifier {
            reason: IdentifierRejection::Pattern,
            ..
        })
    ));
}

#[tokio::test]
async fn test_views_are_inspectable() {
    let dir = TempDir::new().unwrap();
    let path = seeded(
        &dir,
        "CREATE TABLE items (id INTEGER, price REAL); \
         CREATE VIEW priced AS SELECT id, price * 2 AS doubled FROM items;",
    );
    let conn = SqliteConnection::open(&path, SqliteOpenOptions::default()).unwrap();

    let columns = inspector().columns(&conn, "priced").await.unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[1].name, "doubled");
}

#[tokio::test]
async fn test_columns_are_cached_per_identity() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir, "CREATE TABLE items (id INTEGER);");
    let conn = SqliteConnection::open(&path, SqliteOpenOptions::default()).unwrap();
    let inspector = inspector();

    inspector.columns(&conn, "items").await.unwrap();
    assert!(inspector.cache().get_columns(conn.identity(), "items").is_some());

    // A closed connection can still answer from cache
    conn.close().await.unwrap();
    assert_eq!(inspector.columns(&conn, "items").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_changed_database_drops_previous_schema() {
    let dir = TempDir::new().unwrap();
    let path = seeded(&dir, "CREATE TABLE items (id INTEGER);");
    let inspector = inspector();

    let before = SqliteConnection::open(&path, SqliteOpenOptions::default()).unwrap();
    inspector.columns(&before, "items").await.unwrap();

    let writer = SqliteConnection::open(&path, SqliteOpenOptions::read_write()).unwrap();
    writer
        .execute_batch(
            "ALTER TABLE items ADD COLUMN label TEXT; \
             CREATE TABLE padding (b BLOB); INSERT INTO padding VALUES (zeroblob(65536));",
        )
        .unwrap();

    let after = SqliteConnection::open(&path, SqliteOpenOptions::default()).unwrap();
    assert_ne!(before.identity(), after.identity());

    let columns = inspector.columns(&after, "items").await.unwrap();
    assert_eq!(columns.len(), 2);
    assert!(inspector.cache().get_columns(before.identity(), "items").is_none());
    assert_eq!(inspector.cache().len(), 1);
}
