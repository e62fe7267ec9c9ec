//! SQLite connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection as RusqliteConnection, OpenFlags, params_from_iter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tabula_core::{
    ColumnMeta, Connection, DatabaseIdentity, QueryResult, Result, Row, SchemaIntrospection,
    TabulaError, Value,
};

/// Options applied when opening a SQLite database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteOpenOptions {
    /// Open the file read-only. Ignored for `:memory:`.
    pub read_only: bool,
    /// Make `LIKE` case-sensitive for ASCII (`PRAGMA case_sensitive_like`)
    pub case_sensitive_like: bool,
}

impl Default for SqliteOpenOptions {
    fn default() -> Self {
        Self {
            read_only: true,
            case_sensitive_like: true,
        }
    }
}

impl SqliteOpenOptions {
    /// Read-write options, used when a caller needs to create fixture data
    pub fn read_write() -> Self {
        Self {
            read_only: false,
            ..Self::default()
        }
    }
}

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: Arc<Mutex<RusqliteConnection>>,
    identity: DatabaseIdentity,
    closed: AtomicBool,
}

impl SqliteConnection {
    /// Open a SQLite database
    pub fn open(path: &str, options: SqliteOpenOptions) -> Result<Self> {
        tracing::info!(path = %path, read_only = options.read_only, "opening SQLite database");

        let (conn, identity) = if path == ":memory:" {
            let conn = RusqliteConnection::open_in_memory().map_err(|e| {
                TabulaError::Connection(format!("Failed to open in-memory database: {}", e))
            })?;
            (conn, DatabaseIdentity::in_memory())
        } else {
            let expanded_path = Self::expand_path(path)?;
            let flags = if options.read_only {
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
            } else {
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
            };

            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent() {
                    if !parent.exists() {
                        return Err(TabulaError::Connection(format!(
                            "Parent directory does not exist: {}",
                            parent.display()
                        )));
                    }
                }
            }

            let conn = RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                TabulaError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?;
            let identity = DatabaseIdentity::of_file(&expanded_path)?;
            (conn, identity)
        };

        conn.pragma_update(None, "case_sensitive_like", options.case_sensitive_like)
            .map_err(|e| {
                TabulaError::Connection(format!("Failed to set case_sensitive_like: {}", e))
            })?;

        tracing::info!(identity = %identity.fingerprint(), "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            identity,
            closed: AtomicBool::new(false),
        })
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:", SqliteOpenOptions::read_write())
    }

    /// Expand path to handle ~ (home directory) and relative paths
    pub fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                let home_path = std::path::PathBuf::from(home);
                home_path.join(rest).to_string_lossy().to_string()
            } else {
                return Err(TabulaError::Configuration(
                    "Unable to determine HOME directory".into(),
                ));
            }
        } else if path.starts_with('~') {
            return Err(TabulaError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            path.to_string()
        };

        let path_buf = std::path::PathBuf::from(&expanded);
        let result = if path_buf.is_relative() {
            std::env::current_dir()
                .map_err(TabulaError::Io)?
                .join(path_buf)
                .to_string_lossy()
                .to_string()
        } else {
            expanded
        };

        Ok(result)
    }

    /// Execute one or more statements without parameters.
    ///
    /// The engine itself never writes; this exists so callers can seed
    /// databases opened with [`SqliteOpenOptions::read_write`].
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.ensure_open()?;
        let conn = self.conn.lock();
        conn.execute_batch(sql)
            .map_err(|e| TabulaError::Query(format!("Failed to execute batch: {}", e)))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TabulaError::Connection("Connection is closed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.ensure_open()?;
        let start_time = std::time::Instant::now();

        let conn = self.conn.lock();
        let rusqlite_params = values_to_rusqlite(params);

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| TabulaError::Query(format!("Failed to prepare query: {}", e)))?;

        let column_count = stmt.column_count();
        let mut column_names: Vec<String> = Vec::with_capacity(column_count);
        let mut columns: Vec<ColumnMeta> = Vec::with_capacity(column_count);

        for (idx, col) in stmt.columns().iter().enumerate() {
            let name = col.name().to_string();
            // sqlite3_column_decltype: the type from CREATE TABLE, absent for expressions
            let data_type = col.decl_type().unwrap_or("DYNAMIC").to_string();

            column_names.push(name.clone());
            columns.push(ColumnMeta {
                name,
                data_type,
                ordinal: idx,
            });
        }

        let mut rows = Vec::new();
        let mut query_rows = stmt
            .query(params_from_iter(rusqlite_params.iter()))
            .map_err(|e| TabulaError::Query(format!("Failed to execute query: {}", e)))?;

        while let Some(row) = query_rows
            .next()
            .map_err(|e| TabulaError::Query(format!("Failed to fetch row: {}", e)))?
        {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(rusqlite_to_value(row, i)?);
            }
            rows.push(Row::new(column_names.clone(), values));
        }

        let execution_time_ms = start_time.elapsed().as_secs_f64() * 1000.0;

        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );
        Ok(QueryResult {
            id: uuid::Uuid::new_v4(),
            columns,
            rows,
            execution_time_ms,
        })
    }

    fn identity(&self) -> &DatabaseIdentity {
        &self.identity
    }

    async fn close(&self) -> Result<()> {
        tracing::debug!(identity = %self.identity.fingerprint(), "closing SQLite connection");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn as_schema_introspection(&self) -> Option<&dyn SchemaIntrospection> {
        Some(self)
    }
}

fn values_to_rusqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_rusqlite).collect()
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(if *b { 1 } else { 0 }),
        Value::Int64(i) => rusqlite::types::Value::Integer(*i),
        Value::Float64(f) if f.is_nan() => rusqlite::types::Value::Null,
        Value::Float64(f) => rusqlite::types::Value::Real(*f),
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b.clone()),
        Value::Json(j) => rusqlite::types::Value::Text(j.to_string()),
        Value::Array(_) => rusqlite::types::Value::Null,
    }
}

/// Convert rusqlite row value to our Value type
fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| TabulaError::Query(e.to_string()))?;

    let value = match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int64(i),
        ValueRef::Real(f) => Value::Float64(f),
        ValueRef::Text(s) => Value::String(String::from_utf8_lossy(s).to_string()),
        // Text stored in untyped columns can arrive as a blob
        ValueRef::Blob(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::Bytes(b.to_vec()),
        },
    };

    Ok(value)
}
