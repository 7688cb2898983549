//! Atomic write primitives
//!
//! Uses temp→rename pattern to ensure no partial writes

use crate::errors::{io_error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write bytes to a file
///
/// The content goes to a uniquely named sibling temp file which is synced and
/// then renamed over the target, after which the directory entry is synced.
/// Concurrent writers never share a temp file. On any failure the temp file
/// is removed and the target keeps its previous content.
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    let dir = match target_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| io_error("create_state_dir", e))?;

    let prefix = format!(
        ".{}.",
        target_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    );
    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| io_error("create_temp", e))?;
    write_synced(&mut temp, content)?;

    // Dropping the failed temp file inside the error removes it.
    temp.persist(target_path)
        .map_err(|e| io_error("rename_temp", e.error))?;
    sync_dir(dir)
}

fn write_synced(temp: &mut NamedTempFile, content: &[u8]) -> Result<()> {
    temp.write_all(content)
        .map_err(|e| io_error("write_temp", e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| io_error("sync_temp", e))
}

/// Make the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| io_error("sync_state_dir", e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");

        atomic_write(&target, b"hello").unwrap();

        let content = fs::read(&target).unwrap();
        assert_eq!(content, b"hello");
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join(".casewatch").join("state.json");

        atomic_write(&target, b"nested").unwrap();

        let content = fs::read(&target).unwrap();
        assert_eq!(content, b"nested");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");

        atomic_write(&target, b"old").unwrap();
        atomic_write(&target, b"new").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_no_tmp_files_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");

        atomic_write(&target, b"clean").unwrap();

        assert_eq!(tmp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_failed_rename_leaves_target_and_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");
        // A non-empty directory cannot be replaced by a file.
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"durable").unwrap();

        assert!(atomic_write(&target, b"lost").is_err());

        assert_eq!(fs::read(target.join("keep")).unwrap(), b"durable");
        assert_eq!(tmp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_concurrent_writers_do_not_share_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");
        let payloads: Vec<Vec<u8>> = (0..8)
            .map(|i| format!("{{\"writer\":{}}}", i).repeat(2_000).into_bytes())
            .collect();

        let target_ref = &target;
        std::thread::scope(|scope| {
            let handles: Vec<_> = payloads
                .iter()
                .map(|payload| scope.spawn(move || atomic_write(target_ref, payload)))
                .collect();
            for handle in handles {
                assert!(handle.join().unwrap().is_ok());
            }
        });

        let content = fs::read(&target).unwrap();
        assert!(payloads.contains(&content));
        assert_eq!(tmp_files(temp_dir.path()), 0);
    }

    fn tmp_files(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }
}
