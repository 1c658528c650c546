//! SQL schema for the Benchtop SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Live table. Listing order is rowid order, i.e. first insertion.
CREATE TABLE IF NOT EXISTS config (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_by  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,   -- RFC 3339 UTC, millisecond precision
    version     INTEGER NOT NULL CHECK (version >= 1)
);

-- One row per successful write. Strictly append-only.
CREATE TABLE IF NOT EXISTS config_history (
    history_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_by  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    version     INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS config_history_key_idx ON config_history(key, history_id);

PRAGMA user_version = 1;
";
