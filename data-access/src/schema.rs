//! Database schema definitions and migrations

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// SQL schema for the outreach tracker database
///
/// Timestamps are stored as unix seconds. Links carry no UNIQUE constraint:
/// duplicate detection happens before records reach the store.
pub const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL,
    description TEXT
);

-- Active candidate list
CREATE TABLE IF NOT EXISTS models (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT NOT NULL,
    platform TEXT NOT NULL,
    followed_by TEXT,
    follow_date INTEGER,
    dm_sent BOOLEAN NOT NULL DEFAULT FALSE,
    dm_sent_date INTEGER,
    notes TEXT NOT NULL DEFAULT '',
    date_added INTEGER NOT NULL
);

-- Rejected candidates
CREATE TABLE IF NOT EXISTS blacklist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT NOT NULL,
    platform TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    original_date_added INTEGER,
    date_added INTEGER NOT NULL
);

-- Outreach accounts
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    platform TEXT NOT NULL,
    username TEXT NOT NULL,
    created_date INTEGER NOT NULL
);

-- Single settings row, platforms kept as JSON
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    data TEXT NOT NULL -- JSON
);

-- Indexes for common queries
CREATE INDEX IF NOT EXISTS idx_models_link ON models(link);
CREATE INDEX IF NOT EXISTS idx_models_date_added ON models(date_added);
CREATE INDEX IF NOT EXISTS idx_blacklist_link ON blacklist(link);
CREATE INDEX IF NOT EXISTS idx_accounts_created_date ON accounts(created_date);
"#;

/// Migration definitions
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// List of all migrations
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: SCHEMA_SQL,
    },
];

/// Get migration by version
pub fn get_migration(version: u32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version_has_migration() {
        let migration = get_migration(SCHEMA_VERSION).unwrap();
        assert_eq!(migration.version, SCHEMA_VERSION);
        assert!(migration.sql.contains("CREATE TABLE IF NOT EXISTS models"));
    }

    #[test]
    fn test_schema_applies_cleanly() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();
        // Idempotent
        conn.execute_batch(SCHEMA_SQL).unwrap();
    }
}
