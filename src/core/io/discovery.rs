//! Recursive record-file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use super::LoadError;

/// Every regular file under `dir`, at any depth, in sorted path order.
///
/// Hidden files (leading `.`) are skipped. A missing or unreadable
/// directory is an error.
pub fn list_record_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    walk(dir, &mut files)?;
    files.sort();
    log::debug!("Found {} record files under {}", files.len(), dir.display());
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| LoadError::io(dir, e))?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| LoadError::io(&path, e))?;
        if file_type.is_dir() {
            walk(&path, files)?;
        } else if file_type.is_file() || path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_files_are_found_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("b").join("c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("z.gbk"), "").unwrap();
        fs::write(dir.path().join("b").join("a.gbk"), "").unwrap();
        fs::write(nested.join("deep.gbk.gz"), "").unwrap();
        fs::write(dir.path().join(".hidden"), "").unwrap();

        let files = list_record_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("b/a.gbk"),
                PathBuf::from("b/c/deep.gbk.gz"),
                PathBuf::from("z.gbk"),
            ]
        );
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_record_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
