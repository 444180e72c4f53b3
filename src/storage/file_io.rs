//! Atomic JSON writes for the small side files next to the database
//!
//! The settings file is rewritten as a whole; writing to a sibling temp file
//! and renaming it over the target keeps a crash from leaving it truncated.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{BookkeeperError, BookkeeperResult};

/// Serialize `data` as pretty JSON and atomically replace `path` with it
pub fn write_json_atomic<T, P>(path: P, data: &T) -> BookkeeperResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let io_err = |what: &str, e: std::io::Error| {
        BookkeeperError::Io(format!("{} {}: {}", what, path.display(), e))
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err("Failed to create directory for", e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path).map_err(|e| io_err("Failed to stage", e))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush().map_err(|e| io_err("Failed to flush", e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| io_err("Failed to sync", e))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        io_err("Failed to replace", e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_creates_parents_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("sample.json");
        let data = Sample {
            name: "groceries".into(),
            value: 42,
        };

        write_json_atomic(&path, &data).unwrap();

        let loaded: Sample =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, data);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_write_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sample.json");
        std::fs::write(&path, "old").unwrap();

        write_json_atomic(&path, &Sample { name: "new".into(), value: 1 }).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().contains("\"new\""));
    }
}
