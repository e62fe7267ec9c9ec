//! Common test utilities: on-disk fixture databases

#![allow(dead_code)]

use tabula_driver_sqlite::{SqliteConnection, SqliteOpenOptions};
use tempfile::TempDir;

pub const ITEMS: &str = "
    CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL, price REAL);
    INSERT INTO items VALUES (1, 'a', 10.0), (2, 'b', NULL), (3, 'c', 5.0);
";

pub const SAMPLES: &str = "
    CREATE TABLE samples (
        id INTEGER PRIMARY KEY,
        category TEXT,
        contigs INTEGER,
        score REAL,
        label TEXT,
        collected TEXT
    );
    INSERT INTO samples VALUES
        (1, 'soil', 120, 88.5, 'Alpha', '2024-03-01'),
        (2, 'soil', 40, 12.0, 'beta', '2024-01-15'),
        (3, 'water', 75, 55.0, '-', '2023-12-31'),
        (4, 'water', 10, NULL, 'Gamma', ''),
        (5, 'air', 300, 91.0, 'null', '2024-02-10'),
        (6, NULL, 55, 70.0, 'delta', NULL);
    CREATE VIEW soil_samples AS SELECT id, contigs FROM samples WHERE category = 'soil';
";

/// A database file that lives as long as the fixture
pub struct Fixture {
    dir: TempDir,
    pub path: String,
}

impl Fixture {
    /// Fresh database seeded with `sql`
    pub fn new(sql: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fixture.db").to_string_lossy().to_string();
        let fixture = Self { dir, path };
        fixture.execute(sql);
        fixture
    }

    /// The standard fixture: `items` and `samples`
    pub fn standard() -> Self {
        Self::new(&format!("{}{}", ITEMS, SAMPLES))
    }

    /// Run statements against the file through a separate writable handle
    pub fn execute(&self, sql: &str) {
        let conn = SqliteConnection::open(&self.path, SqliteOpenOptions::read_write())
            .expect("open fixture for writing");
        conn.execute_batch(sql).expect("seed fixture");
    }

    /// Modify the file so its identity changes
    pub fn add_item(&self, id: i64, name: &str, price: f64) {
        self.execute(&format!(
            "INSERT INTO items VALUES ({}, '{}', {});
             CREATE TABLE IF NOT EXISTS padding (b BLOB);
             INSERT INTO padding VALUES (zeroblob(65536));",
            id, name, price
        ));
    }

    pub fn sibling(&self, name: &str, sql: &str) -> String {
        let path = self.dir.path().join(name).to_string_lossy().to_string();
        let conn = SqliteConnection::open(&path, SqliteOpenOptions::read_write())
            .expect("open sibling database");
        conn.execute_batch(sql).expect("seed sibling");
        path
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
