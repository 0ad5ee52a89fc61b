//! JSON artifact helpers shared by templates, extractions and layouts.
//!
//! Output directories are never created here: writing into a missing folder
//! is an error so artifacts cannot silently land in the wrong place.

use crate::error::BoxcheckError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Fail with [`BoxcheckError::MissingDirectory`] unless `dir` is a directory.
pub fn require_dir(dir: &Path) -> Result<(), BoxcheckError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(BoxcheckError::MissingDirectory(dir.to_path_buf()))
    }
}

/// Fail with [`BoxcheckError::MissingInput`] unless `path` is a file.
pub fn require_file(path: &Path) -> Result<(), BoxcheckError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BoxcheckError::MissingInput(path.to_path_buf()))
    }
}

/// Read and deserialize a JSON file.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, BoxcheckError> {
    require_file(path)?;
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a JSON file if it exists. A present but malformed file is an error.
pub fn load_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, BoxcheckError> {
    if path.exists() {
        load_json(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Write `value` as pretty JSON and return the path actually written.
///
/// With `overwrite == false` an existing file is left alone and the value is
/// written to the first free `<stem>_<n>.json` next to it instead.
pub fn write_json<T: Serialize>(
    value: &T,
    path: &Path,
    overwrite: bool,
) -> Result<PathBuf, BoxcheckError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    require_dir(parent)?;

    let target = if overwrite || !path.exists() {
        path.to_path_buf()
    } else {
        free_path(path)
    };

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(&target, json)?;
    tracing::debug!(path = %target.display(), "wrote JSON");
    Ok(target)
}

/// First `<stem>_<n>.json` (n = 1, 2, ...) next to `path` that does not exist.
pub fn free_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = path.with_file_name(format!("{stem}_{n}.json"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// File stem of a path as an owned string (`"document"` when absent).
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_json_auto_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DOC.first_half.json");

        let first = write_json(&json!({"n": 1}), &path, false).unwrap();
        let second = write_json(&json!({"n": 2}), &path, false).unwrap();
        let third = write_json(&json!({"n": 3}), &path, false).unwrap();

        assert_eq!(first, path);
        assert_eq!(second, dir.path().join("DOC.first_half_1.json"));
        assert_eq!(third, dir.path().join("DOC.first_half_2.json"));

        let original: serde_json::Value = load_json(&path).unwrap();
        assert_eq!(original["n"], 1);
    }

    #[test]
    fn test_write_json_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        write_json(&json!({"n": 1}), &path, true).unwrap();
        let written = write_json(&json!({"n": 2}), &path, true).unwrap();
        assert_eq!(written, path);
        let v: serde_json::Value = load_json(&path).unwrap();
        assert_eq!(v["n"], 2);
    }

    #[test]
    fn test_write_json_missing_dir_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("json_files");
        let err = write_json(&json!({}), &missing.join("t.json"), true).unwrap_err();
        assert!(matches!(err, BoxcheckError::MissingDirectory(_)));
        assert!(!missing.exists());
    }

    #[test]
    fn test_load_json_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_json::<serde_json::Value>(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, BoxcheckError::MissingInput(_)));
        assert!(load_json_if_exists::<serde_json::Value>(&dir.path().join("nope.json"))
            .unwrap()
            .is_none());
    }
}
