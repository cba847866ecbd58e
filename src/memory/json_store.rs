//! Durable JSON files: whole-file reads, atomic replacement, array appends.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum JsonStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt JSON in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode JSON for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> JsonStoreError + '_ {
    move |source| JsonStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Read and decode `path`. Missing or blank files yield `None`.
///
/// Content that fails to parse gets one repair attempt: bare content is
/// wrapped in `{}` when it looks like key/value pairs, otherwise in `[]`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, JsonStoreError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path)(e)),
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(source) => match repair(&raw) {
            Some(fixed) => match serde_json::from_str(&fixed) {
                Ok(value) => {
                    tracing::warn!(path = %path.display(), "repaired malformed JSON on read");
                    Ok(Some(value))
                }
                Err(_) => Err(JsonStoreError::Corrupt {
                    path: path.to_path_buf(),
                    source,
                }),
            },
            None => Err(JsonStoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            }),
        },
    }
}

fn repair(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return None;
    }
    Some(if trimmed.contains(':') {
        format!("{{{trimmed}}}")
    } else {
        format!("[{trimmed}]")
    })
}

/// Replace `path` with the encoded value. Readers see the old or the new
/// content, never a partial write.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), JsonStoreError> {
    let encoded = serde_json::to_vec_pretty(value).map_err(|source| JsonStoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err(dir))?;
    tmp.write_all(&encoded).map_err(io_err(path))?;
    tmp.as_file().sync_all().map_err(io_err(path))?;
    tmp.persist(path).map_err(|e| io_err(path)(e.error))?;
    Ok(())
}

/// Append `items` to the JSON array stored at `path`.
///
/// A corrupt existing array is reported, never overwritten.
pub fn append_json<T>(path: &Path, items: &[T]) -> Result<usize, JsonStoreError>
where
    T: Serialize + DeserializeOwned + Clone,
{
    let mut all: Vec<T> = read_json(path)?.unwrap_or_default();
    all.extend_from_slice(items);
    write_json(path, &all)?;
    Ok(all.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        n: u32,
    }

    #[test]
    fn missing_and_blank_files_read_as_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("absent.json");
        assert_eq!(read_json::<Vec<Item>>(&path).unwrap(), None);

        std::fs::write(&path, "  \n").unwrap();
        assert_eq!(read_json::<Vec<Item>>(&path).unwrap(), None);
    }

    #[test]
    fn append_extends_existing_array() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("deep").join("log.json");
        assert_eq!(append_json(&path, &[Item { n: 1 }]).unwrap(), 1);
        assert_eq!(append_json(&path, &[Item { n: 2 }, Item { n: 3 }]).unwrap(), 3);

        let items: Vec<Item> = read_json(&path).unwrap().unwrap();
        assert_eq!(items.iter().map(|i| i.n).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn bare_object_body_is_repaired() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("counter.json");
        std::fs::write(&path, r#" "n": 7 "#).unwrap();
        let item: Item = read_json(&path).unwrap().unwrap();
        assert_eq!(item, Item { n: 7 });
    }

    #[test]
    fn bare_list_body_is_repaired() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("list.json");
        std::fs::write(&path, "1, 2, 3").unwrap();
        let values: Vec<u32> = read_json(&path).unwrap().unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn truncated_array_is_corrupt_and_not_overwritten() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("log.json");
        std::fs::write(&path, r#"[{"n": 1}, {"n""#).unwrap();

        let err = append_json(&path, &[Item { n: 2 }]).unwrap_err();
        assert!(matches!(err, JsonStoreError::Corrupt { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"[{"n": 1}, {"n""#);
    }
}
