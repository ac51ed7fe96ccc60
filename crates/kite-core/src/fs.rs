use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::SOURCE_FILE_EXTENSION;

/// Canonicalize `path`, falling back to the input when it does not exist.
///
/// Uses `dunce` so Windows paths stay in their familiar (non-UNC) form.
pub fn canonicalize_if_possible(path: &Path) -> io::Result<PathBuf> {
    match dunce::canonicalize(path) {
        Ok(p) => Ok(p),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(path.to_path_buf()),
        Err(e) => Err(e),
    }
}

/// Recursively collect files under `root` that have `extension`.
///
/// Missing directories are treated as empty.
pub fn collect_files_with_extension(root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        };

        for entry in entries {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let path = entry.path();

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }

            if file_type.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

pub fn collect_source_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    collect_files_with_extension(root, SOURCE_FILE_EXTENSION)
}
