//! SQL DDL for an index container.
//!
//! Defines `entries` (position-ordered metadata), `vectors` (vec0, keyed by
//! the same rowid) and `schema_meta`. All DDL is idempotent.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- One row per indexed record; position doubles as the vec0 rowid
CREATE TABLE IF NOT EXISTS entries (
    position INTEGER PRIMARY KEY,
    key TEXT NOT NULL,
    metadata TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables for vectors of `dimensions` entries.
pub fn init_schema(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    // vec0 needs the width baked into its declaration
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS vectors USING vec0(embedding FLOAT[{dimensions}]);"
    ))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('dimensions', ?1)",
        [dimensions.to_string()],
    )?;

    Ok(())
}
