//! Shared task plumbing for the built-in sources.
//!
//! A source owns at most one Tokio task. `stop` aborts it, which drops the
//! file or socket it holds. A task that returns an error marks the source
//! failed.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::ChannelError;

#[derive(Debug, Default)]
pub(crate) struct SourceTask {
    listening: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SourceTask {
    /// Spawn `run` unless a task is already listening
    pub(crate) fn spawn<F>(&self, name: &str, run: F)
    where
        F: Future<Output = Result<(), ChannelError>> + Send + 'static,
    {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            error!(source = %name, "sources must be started inside a Tokio runtime");
            self.listening.store(false, Ordering::SeqCst);
            self.failed.store(true, Ordering::SeqCst);
            return;
        };

        let name = name.to_string();
        let listening = self.listening.clone();
        let failed = self.failed.clone();
        let handle = runtime.spawn(async move {
            match run.await {
                Ok(()) => debug!(source = %name, "source finished"),
                Err(e) => {
                    warn!(source = %name, error = %e, "source failed");
                    failed.store(true, Ordering::SeqCst);
                }
            }
            listening.store(false, Ordering::SeqCst);
        });
        *self.task.lock() = Some(handle);
    }

    pub(crate) fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    pub(crate) fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}

impl Drop for SourceTask {
    fn drop(&mut self) {
        self.stop();
    }
}
