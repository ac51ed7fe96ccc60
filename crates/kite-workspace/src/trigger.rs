use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Runs one job at a time on a dedicated thread.
///
/// Triggering while a job is in flight does nothing; the caller gets `None`
/// back and the running job is left alone.
#[derive(Debug, Clone)]
pub struct BackgroundTrigger {
    name: &'static str,
    running: Arc<AtomicBool>,
}

/// Clears the running flag when the job finishes, panics included.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BackgroundTrigger {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start `job` unless a previous one is still running.
    pub fn trigger<T, F>(&self, job: F) -> Option<JoinHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(target = "kite.workspace", trigger = self.name, "already running; ignoring trigger");
            return None;
        }

        let guard = RunningGuard(Arc::clone(&self.running));
        let name = self.name;
        let spawned = std::thread::Builder::new()
            .name(format!("kite-{name}"))
            .spawn(move || {
                let _guard = guard;
                tracing::debug!(target = "kite.workspace", trigger = name, "background job started");
                job()
            });

        match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                // The closure, and with it the guard, was dropped on failure.
                tracing::warn!(
                    target = "kite.workspace",
                    trigger = name,
                    error = %err,
                    "failed to spawn background thread"
                );
                None
            }
        }
    }
}
