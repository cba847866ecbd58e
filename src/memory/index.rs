//! Persisted nearest-neighbour index with per-entry metadata.
//!
//! Vectors live in a sqlite-vec `vec0` table and their metadata in `entries`,
//! both inside one container file and written by one transaction, so the
//! number of vectors always equals the number of metadata rows. The
//! container is reopened on every call so changes made by other handles are
//! always observed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::db::{self, embedding_to_bytes, DimensionConflict};
use crate::embedding::EmbeddingProvider;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("vector has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("index storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("metadata encoding error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// One search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub position: i64,
    pub key: String,
    pub metadata: Value,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Cosine similarity of two unit vectors from their L2 distance.
pub fn l2_to_cosine(distance: f64) -> f32 {
    (1.0 - distance * distance / 2.0) as f32
}

#[derive(Clone)]
pub struct VectorIndex {
    path: PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl VectorIndex {
    pub fn new(path: impl Into<PathBuf>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            path: path.into(),
            embedder,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    fn open(&self) -> Result<Connection, IndexError> {
        db::open_index(&self.path, self.dimensions()).map_err(|e| {
            match e.downcast_ref::<DimensionConflict>() {
                Some(conflict) => IndexError::DimensionMismatch {
                    expected: conflict.stored,
                    actual: conflict.requested,
                },
                None => IndexError::Storage(e),
            }
        })
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, IndexError> {
        let matrix = self
            .embedder
            .encode(&[text])
            .map_err(IndexError::Embedding)?;
        Ok(matrix.row(0).to_vec())
    }

    /// Append one vector with its metadata. Returns the new entry's position.
    pub fn add(&self, vector: &[f32], key: &str, metadata: &Value) -> Result<i64, IndexError> {
        let expected = self.dimensions();
        if vector.len() != expected {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        let vector = unit(vector);
        let metadata_json = serde_json::to_string(metadata)?;

        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        let position: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM entries",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO entries (position, key, metadata, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![position, key, metadata_json, chrono::Utc::now().to_rfc3339()],
        )?;
        tx.execute(
            "INSERT INTO vectors (rowid, embedding) VALUES (?1, ?2)",
            params![position, embedding_to_bytes(&vector)],
        )?;
        tx.commit()?;

        tracing::debug!(index = %self.path.display(), key, position, "vector added");
        Ok(position)
    }

    /// Embed `text` and append it.
    pub fn add_text(&self, text: &str, key: &str, metadata: &Value) -> Result<i64, IndexError> {
        let vector = self.embed(text)?;
        self.add(&vector, key, metadata)
    }

    /// Up to `k` entries whose similarity to `query` is strictly above `min_score`, best first.
    ///
    /// A missing or empty index yields no hits.
    pub fn search(&self, query: &str, k: usize, min_score: f32) -> Result<Vec<Hit>, IndexError> {
        if k == 0 || !self.path.exists() {
            return Ok(vec![]);
        }
        let vector = self.embed(query)?;
        self.search_vector(&vector, k, min_score)
    }

    pub fn search_vector(
        &self,
        vector: &[f32],
        k: usize,
        min_score: f32,
    ) -> Result<Vec<Hit>, IndexError> {
        if k == 0 || !self.path.exists() {
            return Ok(vec![]);
        }
        let expected = self.dimensions();
        if vector.len() != expected {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        let vector = unit(vector);

        let conn = self.open()?;
        let neighbours: Vec<(i64, f64)> = conn
            .prepare(
                "SELECT rowid, distance FROM vectors \
                 WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
            )?
            .query_map(params![embedding_to_bytes(&vector), k as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut hits = Vec::with_capacity(neighbours.len());
        for (position, distance) in neighbours {
            let score = l2_to_cosine(distance);
            // ordered by distance, so everything after is worse
            if score <= min_score {
                break;
            }
            let entry: Option<(String, String)> = conn
                .query_row(
                    "SELECT key, metadata FROM entries WHERE position = ?1",
                    params![position],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((key, metadata)) = entry else {
                tracing::warn!(index = %self.path.display(), position, "vector without metadata row");
                continue;
            };
            hits.push(Hit {
                position,
                key,
                metadata: serde_json::from_str(&metadata)?,
                score,
            });
        }

        tracing::debug!(index = %self.path.display(), k, min_score, hits = hits.len(), "index searched");
        Ok(hits)
    }

    /// Number of stored entries; 0 when the container does not exist yet.
    pub fn len(&self) -> Result<usize, IndexError> {
        if !self.path.exists() {
            return Ok(0);
        }
        let conn = self.open()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }
}

fn unit(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter().map(|x| x / norm).collect()
    } else {
        vector.to_vec()
    }
}
