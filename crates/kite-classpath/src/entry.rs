use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use kite_cache::{Fingerprint, FingerprintBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{ClasspathError, Result};

/// One location classes are loaded from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClasspathEntry {
    ClassDir(PathBuf),
    Jar(PathBuf),
    Jmod(PathBuf),
}

impl ClasspathEntry {
    /// Classify `path`: directories are class output dirs, `.jmod` files are
    /// jmods and everything else with a zip-like extension is a jar.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_dir() {
            return Ok(ClasspathEntry::ClassDir(path));
        }
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jmod") => Ok(ClasspathEntry::Jmod(path)),
            Some("jar") | Some("zip") => Ok(ClasspathEntry::Jar(path)),
            _ => Err(ClasspathError::UnsupportedEntry { path }),
        }
    }

    pub fn normalize(&self) -> std::io::Result<Self> {
        Ok(match self {
            ClasspathEntry::ClassDir(p) => {
                ClasspathEntry::ClassDir(kite_core::canonicalize_if_possible(p)?)
            }
            ClasspathEntry::Jar(p) => ClasspathEntry::Jar(kite_core::canonicalize_if_possible(p)?),
            ClasspathEntry::Jmod(p) => {
                ClasspathEntry::Jmod(kite_core::canonicalize_if_possible(p)?)
            }
        })
    }

    pub fn path(&self) -> &Path {
        match self {
            ClasspathEntry::ClassDir(p) | ClasspathEntry::Jar(p) | ClasspathEntry::Jmod(p) => p,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClasspathEntry::ClassDir(_) => "dir",
            ClasspathEntry::Jar(_) => "jar",
            ClasspathEntry::Jmod(_) => "jmod",
        }
    }

    /// Fingerprint derived from path, size and mtime.
    ///
    /// Class directories hash the relative path, size and mtime of every
    /// `.class` file below them, so adding or recompiling a class changes it.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let mut builder = FingerprintBuilder::new();
        builder.push_str(self.kind());
        builder.push_str(&self.path().to_string_lossy());

        match self {
            ClasspathEntry::Jar(path) | ClasspathEntry::Jmod(path) => {
                hash_metadata(&mut builder, path)?;
            }
            ClasspathEntry::ClassDir(dir) => {
                let mut class_files: Vec<PathBuf> = Vec::new();
                for entry in walkdir::WalkDir::new(dir).follow_links(false) {
                    let entry = entry?;
                    if entry.file_type().is_file()
                        && entry.path().extension() == Some(OsStr::new("class"))
                    {
                        class_files.push(entry.into_path());
                    }
                }
                class_files.sort();

                for file in class_files {
                    let rel = file.strip_prefix(dir).unwrap_or(&file);
                    builder.push_str(&rel.to_string_lossy());
                    hash_metadata(&mut builder, &file)?;
                }
            }
        }

        Ok(builder.finish())
    }
}

impl fmt::Display for ClasspathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.path().display())
    }
}

fn hash_metadata(builder: &mut FingerprintBuilder, path: &Path) -> Result<()> {
    let meta = std::fs::metadata(path)?;
    let mtime = meta
        .modified()?
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    builder.push_u64(meta.len());
    builder.push_u64(mtime.as_secs());
    builder.push_u64(u64::from(mtime.subsec_nanos()));
    Ok(())
}
