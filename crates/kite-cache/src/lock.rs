use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use fs2::FileExt as _;
use parking_lot::{Mutex, MutexGuard};

use crate::error::Result;

/// A filesystem-backed lock shared between Kite processes.
///
/// `fs2` locks are process-scoped on Unix, so an in-process mutex per path is
/// held alongside the file lock to also exclude other threads. Released on
/// drop.
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    _guard: MutexGuard<'static, ()>,
}

impl CacheLock {
    /// Acquire an exclusive lock on `path`, creating the lock file if needed.
    /// Blocks until the lock is available.
    pub fn lock_exclusive(path: &Path) -> Result<Self> {
        let guard = process_lock_for_path(path).lock();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;

        Ok(Self {
            file,
            _guard: guard,
        })
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            tracing::debug!(target = "kite.cache", error = %err, "failed to release cache lock");
        }
    }
}

fn process_lock_for_path(path: &Path) -> &'static Mutex<()> {
    static PROCESS_LOCKS: OnceLock<Mutex<HashMap<PathBuf, &'static Mutex<()>>>> = OnceLock::new();
    let locks = PROCESS_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));

    let mut map = locks.lock();
    if let Some(existing) = map.get(path) {
        return existing;
    }

    let mutex: &'static Mutex<()> = Box::leak(Box::new(Mutex::new(())));
    map.insert(path.to_path_buf(), mutex);
    mutex
}
