use std::path::{Path, PathBuf};

use crate::entry::ClasspathEntry;

/// A discovered standard library installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdkInstallation {
    root: PathBuf,
    entries: Vec<ClasspathEntry>,
}

impl JdkInstallation {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Library entries, `java.base` first when present.
    pub fn entries(&self) -> &[ClasspathEntry] {
        &self.entries
    }

    /// Inspect `root`: modular JDKs contribute `jmods/*.jmod`, older ones
    /// `jre/lib/rt.jar` or `lib/rt.jar`.
    pub fn from_root(root: impl AsRef<Path>) -> Option<Self> {
        let root = root.as_ref().to_path_buf();

        let jmods_dir = root.join("jmods");
        if jmods_dir.is_dir() {
            let mut jmods: Vec<PathBuf> = std::fs::read_dir(&jmods_dir)
                .ok()?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "jmod"))
                .collect();
            jmods.sort_by_key(|path| {
                let is_base = path.file_stem().is_some_and(|stem| stem == "java.base");
                (!is_base, path.clone())
            });
            if !jmods.is_empty() {
                return Some(Self {
                    root,
                    entries: jmods.into_iter().map(ClasspathEntry::Jmod).collect(),
                });
            }
        }

        for candidate in ["jre/lib/rt.jar", "lib/rt.jar"] {
            let rt = root.join(candidate);
            if rt.is_file() {
                return Some(Self {
                    root,
                    entries: vec![ClasspathEntry::Jar(rt)],
                });
            }
        }

        None
    }

    /// Discover the standard library: an explicit `jdk_home` wins, otherwise
    /// `JAVA_HOME` is consulted. Absence is logged, never an error.
    pub fn discover(jdk_home: Option<&Path>) -> Option<Self> {
        let (source, root) = match jdk_home {
            Some(home) => ("config", home.to_path_buf()),
            None => match std::env::var_os("JAVA_HOME") {
                Some(home) if !home.is_empty() => ("JAVA_HOME", PathBuf::from(home)),
                _ => {
                    tracing::info!(
                        target = "kite.classpath",
                        "no JDK configured and JAVA_HOME is unset; indexing without the standard library"
                    );
                    return None;
                }
            },
        };

        let found = Self::from_root(&root);
        match &found {
            Some(jdk) => tracing::debug!(
                target = "kite.classpath",
                source,
                root = %root.display(),
                entries = jdk.entries.len(),
                "discovered JDK"
            ),
            None => tracing::warn!(
                target = "kite.classpath",
                source,
                root = %root.display(),
                "JDK root has neither jmods/ nor rt.jar; indexing without the standard library"
            ),
        }
        found
    }
}
