//! Transactional statement execution against the DuckDB store.
//!
//! This is the one place in the system where failures must reach the
//! caller: an interactive SQL console needs the exact database diagnostic
//! to correct its query.

use std::path::PathBuf;
use std::sync::Arc;

use duckdb::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::schema::SchemaCatalog;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] duckdb::Error),

    #[error("store file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one execute call: tabular for reads, status for writes/DDL.
///
/// Untagged so the wire shape is exactly `{columns, rows}` or
/// `{status, message}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
    },
    Status {
        status: String,
        message: String,
    },
}

/// Executes SQL against the store, one connection and one transaction per
/// call. DuckDB connections are not `Sync`, so nothing is pooled.
pub struct QueryExecutor {
    store_path: PathBuf,
    dump_path: Option<PathBuf>,
    catalog: Arc<SchemaCatalog>,
}

impl QueryExecutor {
    pub fn new(
        store_path: impl Into<PathBuf>,
        dump_path: Option<PathBuf>,
        catalog: Arc<SchemaCatalog>,
    ) -> Self {
        Self {
            store_path: store_path.into(),
            dump_path,
            catalog,
        }
    }

    /// Provision the store schema when missing/empty, or unconditionally
    /// when forced (forced provisioning recreates the store file).
    ///
    /// Returns whether provisioning ran.
    pub fn initialize(&self, force: bool) -> Result<bool, StoreError> {
        let store_empty = match std::fs::metadata(&self.store_path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        if !(force || store_empty) {
            return Ok(false);
        }

        if force && !store_empty {
            std::fs::remove_file(&self.store_path)?;
        }
        if let Some(parent) = self.store_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!(store = %self.store_path.display(), "provisioning store schema");
        let conn = Connection::open(&self.store_path)?;
        conn.execute_batch(&self.catalog.provisioning_script())?;
        self.load_dump(&conn);
        Ok(true)
    }

    /// Best-effort bulk load of the external INSERT dump. A missing or
    /// malformed dump is logged and skipped, never fatal.
    fn load_dump(&self, conn: &Connection) {
        let Some(dump_path) = &self.dump_path else {
            return;
        };
        let script = match std::fs::read_to_string(dump_path) {
            Ok(script) => script,
            Err(e) => {
                debug!(dump = %dump_path.display(), error = %e, "no data dump to load");
                return;
            }
        };
        match conn.execute_batch(&script) {
            Ok(()) => info!(dump = %dump_path.display(), "loaded data dump"),
            Err(e) => warn!(dump = %dump_path.display(), error = %e, "failed to load data dump, skipping"),
        }
    }

    /// Execute one statement transactionally.
    ///
    /// Reads (leading `SELECT`, case-insensitive) return columns and all
    /// rows; everything else returns a success status. On any store-layer
    /// error the transaction rolls back (drop) and the error propagates
    /// with the exact database diagnostic.
    pub fn execute(
        &self,
        sql_text: &str,
        force_reinitialize: bool,
    ) -> Result<QueryOutcome, StoreError> {
        self.initialize(force_reinitialize)?;

        let mut conn = Connection::open(&self.store_path)?;
        let tx = conn.transaction()?;

        let statement = sql_text.trim();
        let outcome = if is_select(statement) {
            let (columns, rows) = {
                let mut stmt = tx.prepare(statement)?;
                let columns: Vec<String> = (0..stmt.column_count())
                    .map(|i| {
                        stmt.column_name(i)
                            .map(|name| name.to_string())
                            .unwrap_or_else(|_| format!("column_{i}"))
                    })
                    .collect();

                let mut rows = stmt.query([])?;
                let mut collected = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut values = Vec::with_capacity(columns.len());
                    for i in 0..columns.len() {
                        values.push(value_ref_to_json(row.get_ref(i)?));
                    }
                    collected.push(values);
                }
                (columns, collected)
            };
            QueryOutcome::Rows { columns, rows }
        } else {
            tx.execute_batch(statement)?;
            QueryOutcome::Status {
                status: "success".to_string(),
                message: "Query executed successfully.".to_string(),
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}

fn is_select(statement: &str) -> bool {
    statement
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("select"))
}

fn value_ref_to_json(value: duckdb::types::ValueRef<'_>) -> serde_json::Value {
    use duckdb::types::ValueRef;

    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(i) => serde_json::json!(i),
        ValueRef::SmallInt(i) => serde_json::json!(i),
        ValueRef::Int(i) => serde_json::json!(i),
        ValueRef::BigInt(i) => serde_json::json!(i),
        ValueRef::HugeInt(i) => serde_json::json!(i),
        ValueRef::UTinyInt(i) => serde_json::json!(i),
        ValueRef::USmallInt(i) => serde_json::json!(i),
        ValueRef::UInt(i) => serde_json::json!(i),
        ValueRef::UBigInt(i) => serde_json::json!(i),
        ValueRef::Float(f) => serde_json::json!(f),
        ValueRef::Double(f) => serde_json::json!(f),
        ValueRef::Text(s) => serde_json::Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
        _ => serde_json::Value::String("<unsupported>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "medquery_{}_{}.duckdb",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn executor(name: &str) -> QueryExecutor {
        QueryExecutor::new(temp_store(name), None, Arc::new(SchemaCatalog::builtin()))
    }

    #[test]
    fn initialize_provisions_only_once() {
        let exec = executor("init_once");
        assert!(exec.initialize(false).unwrap());
        assert!(!exec.initialize(false).unwrap());
    }

    #[test]
    fn select_one_is_idempotent_and_shape_stable() {
        let exec = executor("select_one");
        let first = exec.execute("SELECT 1", false).unwrap();
        let second = exec.execute("SELECT 1", false).unwrap();
        assert_eq!(first, second);
        match first {
            QueryOutcome::Rows { columns, rows } => {
                assert_eq!(columns.len(), 1);
                assert_eq!(rows, vec![vec![serde_json::json!(1)]]);
            }
            QueryOutcome::Status { .. } => panic!("SELECT must return rows"),
        }
    }

    #[test]
    fn lowercase_select_with_whitespace_takes_read_branch() {
        let exec = executor("lower_select");
        match exec.execute("   select 1", false).unwrap() {
            QueryOutcome::Rows { rows, .. } => assert_eq!(rows.len(), 1),
            QueryOutcome::Status { .. } => panic!("read branch expected"),
        }
    }

    #[test]
    fn write_returns_status_and_persists() {
        let exec = executor("write");
        let outcome = exec
            .execute(
                "INSERT INTO shift_types (type_id, name, description) VALUES (1, 'Day', 'Day shift')",
                false,
            )
            .unwrap();
        assert_eq!(
            outcome,
            QueryOutcome::Status {
                status: "success".to_string(),
                message: "Query executed successfully.".to_string(),
            }
        );

        match exec.execute("SELECT name FROM shift_types", false).unwrap() {
            QueryOutcome::Rows { rows, .. } => {
                assert_eq!(rows, vec![vec![serde_json::json!("Day")]]);
            }
            QueryOutcome::Status { .. } => panic!("read branch expected"),
        }
    }

    #[test]
    fn failing_batch_rolls_back_earlier_inserts() {
        let exec = executor("rollback");
        let result = exec.execute(
            "INSERT INTO shift_types (type_id, name, description) VALUES (2, 'Night', 'Night shift'); \
             INSERT INTO no_such_table VALUES (1);",
            false,
        );
        assert!(result.is_err());

        match exec.execute("SELECT * FROM shift_types", false).unwrap() {
            QueryOutcome::Rows { rows, .. } => assert!(rows.is_empty()),
            QueryOutcome::Status { .. } => panic!("read branch expected"),
        }
    }

    #[test]
    fn drop_of_missing_table_surfaces_store_diagnostic() {
        let exec = executor("drop_missing");
        let err = exec
            .execute("DROP TABLE no_such_table", false)
            .expect_err("dropping a missing table must fail");
        assert!(err.to_string().contains("no_such_table") || err.to_string().contains("exist"));
    }

    #[test]
    fn force_reinitialize_recreates_the_store() {
        let exec = executor("force_reinit");
        exec.execute(
            "INSERT INTO shift_types (type_id, name, description) VALUES (3, 'Swing', 'Swing shift')",
            false,
        )
        .unwrap();

        match exec.execute("SELECT * FROM shift_types", true).unwrap() {
            QueryOutcome::Rows { rows, .. } => assert!(rows.is_empty()),
            QueryOutcome::Status { .. } => panic!("read branch expected"),
        }
    }

    #[test]
    fn dump_load_is_best_effort() {
        let dump = std::env::temp_dir().join(format!("medquery_dump_{}.sql", std::process::id()));
        std::fs::write(
            &dump,
            "INSERT INTO shift_types (type_id, name, description) VALUES (9, 'On-call', 'On-call shift');",
        )
        .unwrap();

        let exec = QueryExecutor::new(
            temp_store("dump_ok"),
            Some(dump.clone()),
            Arc::new(SchemaCatalog::builtin()),
        );
        exec.initialize(false).unwrap();
        match exec.execute("SELECT name FROM shift_types", false).unwrap() {
            QueryOutcome::Rows { rows, .. } => {
                assert_eq!(rows, vec![vec![serde_json::json!("On-call")]]);
            }
            QueryOutcome::Status { .. } => panic!("read branch expected"),
        }

        // A malformed dump is skipped, not fatal.
        std::fs::write(&dump, "INSERT INTO nowhere VALUES (").unwrap();
        let exec = QueryExecutor::new(
            temp_store("dump_bad"),
            Some(dump.clone()),
            Arc::new(SchemaCatalog::builtin()),
        );
        assert!(exec.initialize(false).unwrap());
        std::fs::remove_file(dump).ok();
    }
}
