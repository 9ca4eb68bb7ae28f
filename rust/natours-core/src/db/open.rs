use std::env;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

/// SQLite PRAGMA toggles for the tour store.
#[derive(Clone, Debug)]
pub struct DbOpenConfig {
    /// If Some(kb) and kb > 0, set PRAGMA cache_size = -kb (KB units).
    pub cache_size_kb: Option<i64>,
    /// If Some(ms), wait up to ms for a locked database before failing.
    pub busy_timeout_ms: Option<u64>,
    /// If Some, set PRAGMA journal_mode accordingly.
    pub journal_mode: Option<JournalMode>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JournalMode { Wal, Delete, Memory }

impl Display for JournalMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self { JournalMode::Wal => write!(f, "WAL"), JournalMode::Delete => write!(f, "DELETE"), JournalMode::Memory => write!(f, "MEMORY"), }
    }
}

impl Default for DbOpenConfig {
    fn default() -> Self {
        Self {
            cache_size_kb: Some(20_000), // ~20MB
            busy_timeout_ms: Some(5_000),
            journal_mode: Some(JournalMode::Wal),
        }
    }
}

impl DbOpenConfig {
    /// Load toggles from environment variables. Missing/invalid values fall back to defaults.
    ///
    /// Variables:
    /// - NATOURS_SQLITE_CACHE_SIZE_KB: integer KB; 0 disables
    /// - NATOURS_SQLITE_BUSY_TIMEOUT_MS: integer ms; 0 disables
    /// - NATOURS_SQLITE_JOURNAL_MODE: "WAL", "DELETE" or "MEMORY"; empty disables
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("NATOURS_SQLITE_CACHE_SIZE_KB") {
            match v.parse::<i64>() { Ok(n) if n > 0 => cfg.cache_size_kb = Some(n), _ => cfg.cache_size_kb = None }
        }
        if let Ok(v) = env::var("NATOURS_SQLITE_BUSY_TIMEOUT_MS") {
            match v.parse::<u64>() { Ok(n) if n > 0 => cfg.busy_timeout_ms = Some(n), _ => cfg.busy_timeout_ms = None }
        }
        if let Ok(v) = env::var("NATOURS_SQLITE_JOURNAL_MODE") {
            cfg.journal_mode = match v.trim().to_ascii_uppercase().as_str() {
                "WAL" => Some(JournalMode::Wal),
                "DELETE" => Some(JournalMode::Delete),
                "MEMORY" => Some(JournalMode::Memory),
                _ => None,
            };
        }
        cfg
    }
}

/// Open (creating if needed) a SQLite database read-write and apply the PRAGMAs in `cfg`.
/// PRAGMA errors are ignored; an unsupported toggle leaves the SQLite default in place.
pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: &DbOpenConfig) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    apply_pragmas(&conn, cfg);
    Ok(conn)
}

fn apply_pragmas(conn: &Connection, cfg: &DbOpenConfig) {
    let _ = conn.pragma_update(None, "foreign_keys", true);
    if let Some(kb) = cfg.cache_size_kb { if kb > 0 { let _ = conn.pragma_update(None, "cache_size", -kb); } }
    if let Some(ms) = cfg.busy_timeout_ms { let _ = conn.busy_timeout(Duration::from_millis(ms)); }
    if let Some(mode) = cfg.journal_mode { let _ = conn.pragma_update(None, "journal_mode", mode.to_string()); }
}
