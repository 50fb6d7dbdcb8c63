use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS predictions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT,
    emotion TEXT,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to create database directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Append-only SQLite table of past predictions. A connection is opened for
/// each operation and closed when it returns.
#[derive(Debug, Clone)]
pub struct PredictionLog {
    db_path: PathBuf,
}

impl PredictionLog {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn init(&self) -> Result<(), LogError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LogError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(CREATE_TABLE)?;
        Ok(())
    }

    /// Inserts one row and returns its id.
    pub fn append(&self, filename: &str, emotion: &str) -> Result<i64, LogError> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO predictions (filename, emotion) VALUES (?1, ?2)",
            params![filename, emotion],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    pub(crate) struct PredictionRecord {
        pub id: i64,
        pub filename: String,
        pub emotion: String,
        pub timestamp: String,
    }

    pub(crate) fn read_all(log: &PredictionLog) -> Vec<PredictionRecord> {
        let conn = Connection::open(log.path()).unwrap();
        let mut stmt = conn
            .prepare("SELECT id, filename, emotion, timestamp FROM predictions ORDER BY id")
            .unwrap();
        let rows = stmt
            .query_map([], |row| {
                Ok(PredictionRecord {
                    id: row.get("id")?,
                    filename: row.get("filename")?,
                    emotion: row.get("emotion")?,
                    timestamp: row.get("timestamp")?,
                })
            })
            .unwrap();
        rows.collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("database").join("data.db"));

        log.init().unwrap();
        log.append("static/a.png", "Sad").unwrap();
        log.init().unwrap();

        assert_eq!(read_all(&log).len(), 1);
    }

    #[test]
    fn test_append_assigns_ids_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("data.db"));
        log.init().unwrap();

        let first = log.append("static/a.png", "Happy").unwrap();
        let second = log.append("static/b.png", "Fear").unwrap();
        assert!(second > first);

        let records = read_all(&log);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, first);
        assert_eq!(records[0].filename, "static/a.png");
        assert_eq!(records[0].emotion, "Happy");
        assert_eq!(records[1].emotion, "Fear");
        assert!(records.iter().all(|r| !r.timestamp.is_empty()));
    }

    #[test]
    fn test_append_without_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = PredictionLog::new(dir.path().join("data.db"));

        let result = log.append("static/a.png", "Happy");
        assert!(matches!(result, Err(LogError::Sqlite(_))));
    }

    #[test]
    fn test_unwritable_location_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("database");
        std::fs::write(&blocker, b"a file, not a directory").unwrap();
        let log = PredictionLog::new(blocker.join("data.db"));

        assert!(matches!(log.init(), Err(LogError::Directory { .. })));
        assert!(log.append("static/a.png", "Happy").is_err());
    }
}
