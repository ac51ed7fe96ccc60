use std::fs;
use std::io::{self, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::ZipWriter;

/// Write a jar at `path` holding `entries` as `(entry name, bytes)`.
///
/// Entry names are used verbatim, so `META-INF/MANIFEST.MF` and
/// `META-INF/versions/11/...` can be staged for multi-release tests.
pub fn write_jar(path: &Path, entries: &[(&str, Vec<u8>)]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, bytes) in entries {
        zip.start_file(*name, options).map_err(zip_to_io)?;
        zip.write_all(bytes)?;
    }
    zip.finish().map_err(zip_to_io)?;
    Ok(())
}

/// Write a jmod-shaped archive: class entries are placed under `classes/`.
pub fn write_jmod(path: &Path, classes: &[(&str, Vec<u8>)]) -> io::Result<()> {
    let names: Vec<String> = classes
        .iter()
        .map(|(name, _)| format!("classes/{name}"))
        .collect();
    let entries: Vec<(&str, Vec<u8>)> = names
        .iter()
        .zip(classes)
        .map(|(name, (_, bytes))| (name.as_str(), bytes.clone()))
        .collect();
    write_jar(path, &entries)
}

/// Lay out `(internal name, bytes)` pairs as `.class` files under `root`.
pub fn write_class_dir(root: &Path, classes: &[(&str, Vec<u8>)]) -> io::Result<()> {
    for (internal, bytes) in classes {
        let path = root.join(format!("{internal}.class"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
    }
    Ok(())
}

fn zip_to_io(err: zip::result::ZipError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}
