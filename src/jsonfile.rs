// Whole-file JSON operations

use crate::error::{Result, StoreError};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Indent used for collection files
const INDENT: &[u8] = b"   ";

/// Read a whole file into memory
pub fn read_raw(path: &Path, collection: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| StoreError::not_found(collection, e))
}

/// Read and decode a whole JSON file
///
/// A missing or unreadable file is `NotFound`, content that does not decode
/// into `T` is `Corrupt`.
pub fn read_json<T: DeserializeOwned>(path: &Path, collection: &str) -> Result<T> {
    let data = read_raw(path, collection)?;
    let value = serde_json::from_slice(&data).map_err(|e| StoreError::corrupt(collection, e))?;

    debug!(file = ?path, bytes = data.len(), "Loaded JSON file");
    Ok(value)
}

/// Serialize with the collection file indentation
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Replace `path` with the pretty-printed JSON of `value`
///
/// Writes a sibling temp file, fsyncs it and renames it over the target, so
/// readers see either the old or the new file and never a partial one.
pub fn write_json_atomic<T: Serialize>(path: &Path, collection: &str, value: &T) -> Result<()> {
    let bytes = to_pretty_json(value).map_err(|e| StoreError::write_failed(collection, e))?;
    let tmp_path = temp_path_for(path);

    if let Err(e) = write_then_rename(&tmp_path, path, &bytes) {
        warn!(file = ?path, error = ?e, "Failed to write JSON file");
        if tmp_path.exists() {
            let _ = fs::remove_file(&tmp_path);
        }
        return Err(StoreError::write_failed(collection, e));
    }

    debug!(file = ?path, bytes = bytes.len(), "Wrote JSON file");
    Ok(())
}

/// Write `bytes` to `path` only if it does not exist yet. Returns true if written.
pub fn write_if_missing(path: &Path, collection: &str, bytes: &[u8]) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(StoreError::write_failed(collection, e)),
    };
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| StoreError::write_failed(collection, e))?;
    Ok(true)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::now_v7()))
}

fn write_then_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(tmp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), "two".to_string());
        map.insert("a".to_string(), "one".to_string());
        map
    }

    #[test]
    fn test_write_and_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.json");

        write_json_atomic(&path, "test", &sample()).unwrap();

        let loaded: BTreeMap<String, String> = read_json(&path, "test").unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_pretty_output_uses_three_space_indent() {
        let bytes = to_pretty_json(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "{\n   \"a\": \"one\",\n   \"b\": \"two\"\n}");
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.json");

        let err = read_json::<BTreeMap<String, String>>(&path, "missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_read_malformed_file_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        fs::write(&path, "{malformed json").unwrap();

        let err = read_json::<BTreeMap<String, String>>(&path, "bad").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_read_wrong_shape_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = read_json::<BTreeMap<String, String>>(&path, "list").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.json");

        write_json_atomic(&path, "test", &sample()).unwrap();
        write_json_atomic(&path, "test", &sample()).unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["test.json".to_string()]);
    }

    #[test]
    fn test_failed_write_reports_write_failed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("no-such-dir").join("test.json");

        let err = write_json_atomic(&path, "test", &sample()).unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed { .. }));
    }

    #[test]
    fn test_write_if_missing_keeps_existing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("seed.json");

        assert!(write_if_missing(&path, "seed", b"{}").unwrap());
        fs::write(&path, "{\"x\": 1}").unwrap();
        assert!(!write_if_missing(&path, "seed", b"{}").unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"x\": 1}");
    }
}
