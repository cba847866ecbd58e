//! SQLite containers backing the vector indexes.
//!
//! Each index file holds its vectors (`vec0`) and their metadata rows in one
//! database, so both sides are committed by a single transaction.

pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) an index container at `path` for vectors of `dimensions` entries.
///
/// Fails if the file was created for a different dimension.
pub fn open_index(path: impl AsRef<Path>, dimensions: usize) -> Result<Connection> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open index at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;

    prepare(&conn, dimensions)?;
    tracing::debug!(path = %path.display(), dimensions, "index container opened");
    Ok(conn)
}

fn prepare(conn: &Connection, dimensions: usize) -> Result<()> {
    schema::init_schema(conn, dimensions).context("failed to initialize schema")?;
    migrations::run_migrations(conn).context("failed to run migrations")?;

    let stored = migrations::get_dimensions(conn)?;
    if stored != dimensions {
        return Err(DimensionConflict {
            stored,
            requested: dimensions,
        }
        .into());
    }
    Ok(())
}

/// Row counts and metadata of an existing container.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub entries: usize,
    pub dimensions: usize,
    pub schema_version: u32,
    pub file_size: u64,
}

/// Inspect a container without migrating it. `None` when the file does not exist.
pub fn index_stats(path: impl AsRef<Path>) -> Result<Option<IndexStats>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    load_sqlite_vec();
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open index at {}", path.display()))?;

    let entries: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
    Ok(Some(IndexStats {
        entries: entries as usize,
        dimensions: migrations::get_dimensions(&conn)?,
        schema_version: migrations::get_schema_version(&conn)?,
        file_size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
    }))
}

/// The container on disk was created for a different vector width.
#[derive(Debug, thiserror::Error)]
#[error("index was created for {stored}-dimensional vectors, got {requested}")]
pub struct DimensionConflict {
    pub stored: usize,
    pub requested: usize,
}

/// Reinterpret an f32 slice as raw bytes for sqlite-vec.
pub fn embedding_to_bytes(embedding: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            embedding.as_ptr() as *const u8,
            std::mem::size_of_val(embedding),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopening_with_other_dimensions_fails() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("turns.index.db");
        drop(open_index(&path, 8).unwrap());
        assert!(path.exists());

        let err = open_index(&path, 16).unwrap_err();
        let conflict = err.downcast_ref::<DimensionConflict>().unwrap();
        assert_eq!(conflict.stored, 8);
        assert_eq!(conflict.requested, 16);
    }

    #[test]
    fn stats_report_entries_without_creating_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("s.index.db");
        assert!(index_stats(&path).unwrap().is_none());
        assert!(!path.exists());

        let conn = open_index(&path, 4).unwrap();
        conn.execute(
            "INSERT INTO entries (position, key, metadata, created_at) VALUES (1, 'k', '{}', 'now')",
            [],
        )
        .unwrap();
        drop(conn);

        let stats = index_stats(&path).unwrap().unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.dimensions, 4);
        assert_eq!(stats.schema_version, migrations::CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn embedding_bytes_match_native_f32_layout() {
        let bytes = embedding_to_bytes(&[1.0f32]);
        assert_eq!(bytes, &1.0f32.to_ne_bytes());
    }
}
