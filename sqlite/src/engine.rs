//! Connection engine for castings.
//!
//! An [`Engine`] owns the single shared SQLite connection behind a casting.
//! SQLite in-memory databases exist per connection, so every session of a
//! casting borrows the same connection handle; the engine is cheap to clone
//! and all clones share state.
//!
//! Connection strings are the only configuration surface:
//!
//! - `sqlite://` or `:memory:` — in-memory database
//! - `sqlite:///path/to.db` — file database
//! - a bare filesystem path — file database
//!
//! Anything else is rejected rather than guessed at. Free-form engine options
//! are applied as SQLite `PRAGMA`s at connect time.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::{CastError, Result};

/// Where a connection string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectTarget {
    /// Per-connection in-memory database.
    Memory,
    /// File-backed database.
    File(PathBuf),
}

/// Parses a connection string into a target.
pub(crate) fn parse_connect_str(connect_str: &str) -> Result<ConnectTarget> {
    if connect_str == ":memory:" {
        return Ok(ConnectTarget::Memory);
    }
    if let Some(rest) = connect_str.strip_prefix("sqlite://") {
        return Ok(match rest {
            "" | ":memory:" => ConnectTarget::Memory,
            path => ConnectTarget::File(PathBuf::from(path.strip_prefix('/').unwrap_or(path))),
        });
    }
    if connect_str.is_empty() || connect_str.contains("://") {
        return Err(CastError::InvalidConnectionString(connect_str.to_string()));
    }
    Ok(ConnectTarget::File(PathBuf::from(connect_str)))
}

/// The connection engine bound to a casting.
///
/// Owns one shared [`Connection`] and the echo flag. When echo is on, every
/// statement routed through the engine is logged via [`tracing`] before it
/// executes.
#[derive(Clone)]
pub struct Engine {
    connect_str: String,
    target: ConnectTarget,
    conn: Arc<Mutex<Connection>>,
    echo: Arc<AtomicBool>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("connect_str", &self.connect_str)
            .field("target", &self.target)
            .field("echo", &self.echo())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Opens an engine for the given connection string.
    ///
    /// Enables foreign-key enforcement and applies each `(key, value)` pair
    /// in `pragmas` as a SQLite `PRAGMA`.
    ///
    /// # Errors
    ///
    /// Returns [`CastError::InvalidConnectionString`] for strings this
    /// backend does not understand, or [`CastError::Database`] when the
    /// database cannot be opened or a pragma fails.
    pub fn connect(connect_str: &str, echo: bool, pragmas: &[(String, String)]) -> Result<Self> {
        let target = parse_connect_str(connect_str)?;
        let conn = match &target {
            ConnectTarget::Memory => Connection::open_in_memory()?,
            ConnectTarget::File(path) => Connection::open(path)?,
        };
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        for (key, value) in pragmas {
            conn.pragma_update(None, key, value)?;
        }
        tracing::debug!(connect_str, echo, "engine connected");
        Ok(Self {
            connect_str: connect_str.to_string(),
            target,
            conn: Arc::new(Mutex::new(conn)),
            echo: Arc::new(AtomicBool::new(echo)),
        })
    }

    /// Returns the connection string the engine was opened with.
    pub fn connect_str(&self) -> &str {
        &self.connect_str
    }

    /// Returns the parsed connection target.
    pub fn target(&self) -> &ConnectTarget {
        &self.target
    }

    /// Returns whether SQL echoing is enabled.
    pub fn echo(&self) -> bool {
        self.echo.load(Ordering::Relaxed)
    }

    /// Enables or disables SQL echoing on the engine and all its clones.
    pub fn set_echo(&self, on: bool) {
        self.echo.store(on, Ordering::Relaxed);
    }

    /// Logs a statement when echo is enabled.
    pub(crate) fn log_sql(&self, sql: &str) {
        if self.echo() {
            tracing::info!(target: "castiron::sql", sql, "executing");
        }
    }

    /// Locks the shared connection.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Executes a batch of statements.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.log_sql(sql);
        self.lock().execute_batch(sql)?;
        Ok(())
    }

    /// Executes one parameterized statement, returning the affected row count.
    pub fn execute(&self, sql: &str, params: &[rusqlite::types::Value]) -> Result<usize> {
        self.log_sql(sql);
        let conn = self.lock();
        let count = conn.execute(sql, rusqlite::params_from_iter(params.iter()))?;
        Ok(count)
    }
}
