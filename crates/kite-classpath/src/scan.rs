use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::{Read, Seek};
use std::path::Path;

use kite_classfile::ClassFile;

use crate::entry::ClasspathEntry;
use crate::error::Result;
use crate::stub::{is_ignored_class, ClassStub};

/// Read every class stub from `entry`, sorted by binary name.
///
/// A class file that fails to parse is logged and skipped; an unreadable
/// directory or archive fails the whole entry.
pub(crate) fn index_entry(entry: &ClasspathEntry) -> Result<Vec<ClassStub>> {
    let mut stubs = match entry {
        ClasspathEntry::ClassDir(dir) => index_class_dir(dir)?,
        ClasspathEntry::Jar(path) => index_jar(path)?,
        ClasspathEntry::Jmod(path) => index_jmod(path)?,
    };
    stubs.sort_by(|a, b| a.binary_name.cmp(&b.binary_name));
    Ok(stubs)
}

fn parse_stub(bytes: &[u8], location: &str, container: &Path) -> Option<ClassStub> {
    match ClassFile::parse(bytes) {
        Ok(cf) if is_ignored_class(&cf.this_class) => None,
        Ok(cf) => Some(ClassStub::from_classfile(cf, location.to_string())),
        Err(err) => {
            tracing::warn!(
                target = "kite.classpath",
                entry = %container.display(),
                location,
                error = %err,
                "skipping malformed class file"
            );
            None
        }
    }
}

fn index_class_dir(dir: &Path) -> Result<Vec<ClassStub>> {
    let mut out = Vec::new();
    for entry in walkdir::WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path().extension() != Some(OsStr::new("class")) {
            continue;
        }

        let bytes = std::fs::read(entry.path())?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        if let Some(stub) = parse_stub(&bytes, &rel, dir) {
            out.push(stub);
        }
    }
    Ok(out)
}

fn index_jmod(path: &Path) -> Result<Vec<ClassStub>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !file.is_file() {
            continue;
        }
        let name = file.name().to_owned();
        // Jmods keep class files under `classes/`.
        if !name.ends_with(".class") || !name.starts_with("classes/") {
            continue;
        }

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        if let Some(stub) = parse_stub(&bytes, &name, path) {
            out.push(stub);
        }
    }
    Ok(out)
}

/// Multi-release jars keep version-specific classes under
/// `META-INF/versions/<n>/`. Base classes always win; a versioned class is
/// only used when no base class exists, preferring the highest version.
fn index_jar(path: &Path) -> Result<Vec<ClassStub>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let is_multi_release = jar_is_multi_release(&mut archive);

    let mut best: HashMap<String, (u32, ClassStub)> = HashMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if !file.is_file() {
            continue;
        }
        let name = file.name().to_owned();
        if !name.ends_with(".class") {
            continue;
        }

        let version = if let Some(rest) = name.strip_prefix("META-INF/versions/") {
            if !is_multi_release {
                continue;
            }
            let Some((version, _)) = rest.split_once('/') else {
                continue;
            };
            match version.parse::<u32>() {
                Ok(v) => v,
                Err(_) => continue,
            }
        } else if name.starts_with("META-INF/") {
            continue;
        } else {
            0
        };

        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        let Some(stub) = parse_stub(&bytes, &name, path) else {
            continue;
        };

        let replace = match best.get(&stub.binary_name) {
            None => true,
            Some((0, _)) => false,
            Some((existing, _)) => version == 0 || version > *existing,
        };
        if replace {
            best.insert(stub.binary_name.clone(), (version, stub));
        }
    }

    Ok(best.into_values().map(|(_, stub)| stub).collect())
}

fn jar_is_multi_release<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> bool {
    let Ok(mut file) = archive.by_name("META-INF/MANIFEST.MF") else {
        return false;
    };

    let mut manifest = String::new();
    if file.read_to_string(&mut manifest).is_err() {
        return false;
    }
    manifest_is_multi_release(&manifest)
}

fn manifest_is_multi_release(manifest: &str) -> bool {
    manifest
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("Multi-Release"))
        .is_some_and(|(_, value)| value.trim().eq_ignore_ascii_case("true"))
}
