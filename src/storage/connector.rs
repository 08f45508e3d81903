//! Connection provider
//!
//! Every store operation asks for a fresh connection and drops it before
//! returning. There is no pooling here; a pooled provider can implement
//! [`ConnectionProvider`] instead.

use std::path::{Path, PathBuf};
use std::time::Duration;
use rusqlite::Connection;
use crate::Result;
use super::schema;

/// How long a connection waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Supplies a new database connection per request
pub trait ConnectionProvider: Send + Sync {
    fn connect(&self) -> Result<Connection>;
}

/// Opens connections to a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Open a database file (creates if doesn't exist) and make sure the schema is there
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let connector = Self::new(path);
        connector.initialize_schema()?;
        Ok(connector)
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initialize the database schema
    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        tracing::debug!("Schema ready at {}", self.path.display());
        Ok(())
    }
}

impl ConnectionProvider for SqliteConnector {
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(conn)
    }
}
