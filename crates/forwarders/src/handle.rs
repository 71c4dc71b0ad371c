//! ForwarderHandle - a forwarder behind its own queue and worker task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use contracts::{
    ContractError, Forwarder, ForwarderDescriptor, ForwarderPatch, Identity, Lifecycle,
    LifecycleState,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::metrics::{ForwarderMetrics, MetricsSnapshot};

/// One sentence as written on the wire
pub fn frame_line(sentence: &str) -> Bytes {
    let mut line = String::with_capacity(sentence.len() + 2);
    line.push_str(sentence);
    line.push_str("\r\n");
    Bytes::from(line)
}

/// Handle to a running forwarder worker
pub struct ForwarderHandle {
    identity: Identity,
    name: String,
    descriptor: RwLock<ForwarderDescriptor>,
    tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    lifecycle: Arc<Lifecycle>,
    verbose: Arc<AtomicBool>,
    metrics: Arc<ForwarderMetrics>,
    dropping: AtomicBool,
}

impl std::fmt::Debug for ForwarderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwarderHandle")
            .field("identity", &self.identity)
            .field("state", &self.lifecycle.state())
            .finish()
    }
}

impl ForwarderHandle {
    /// Spawn the worker task; must be called inside a tokio runtime
    pub fn spawn<F: Forwarder + 'static>(descriptor: ForwarderDescriptor, forwarder: F) -> Self {
        let identity = descriptor.identity();
        let name = identity.to_string();
        let (tx, rx) = mpsc::channel(descriptor.queue_capacity.max(1));
        let metrics = Arc::new(ForwarderMetrics::new());
        let verbose = Arc::new(AtomicBool::new(descriptor.verbose));
        let lifecycle = Arc::new(Lifecycle::new());
        lifecycle.start();

        let worker = tokio::spawn(forwarder_worker(
            forwarder,
            rx,
            Arc::clone(&metrics),
            Arc::clone(&verbose),
            Arc::clone(&lifecycle),
            name.clone(),
        ));

        Self {
            identity,
            name,
            descriptor: RwLock::new(descriptor),
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            lifecycle,
            verbose,
            metrics,
            dropping: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn descriptor(&self) -> ForwarderDescriptor {
        self.descriptor.read().clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Queue a line without waiting.
    ///
    /// Returns false when the queue is full (the line is dropped) or the
    /// forwarder is no longer running.
    pub fn try_send(&self, line: Bytes) -> bool {
        if !self.lifecycle.is_running() {
            return false;
        }
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            return false;
        };

        match tx.try_send(line) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(tx.max_capacity() - tx.capacity());
                if self.dropping.swap(false, Ordering::Relaxed) {
                    info!(forwarder = %self.name, "queue drained, no longer dropping");
                }
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_dropped();
                metrics::counter!("forwarder_dropped_total", "forwarder" => self.name.clone())
                    .increment(1);
                if !self.dropping.swap(true, Ordering::Relaxed) {
                    warn!(forwarder = %self.name, "queue full, dropping sentences");
                }
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(forwarder = %self.name, "forwarder worker closed unexpectedly");
                self.lifecycle.fail();
                false
            }
        }
    }

    /// Apply the mutable fields of `patch`
    pub fn update(&self, patch: &ForwarderPatch) -> Result<(), ContractError> {
        let mut descriptor = self.descriptor.write();
        if let Some(verbose) = patch.verbose {
            descriptor.verbose = verbose;
            self.verbose.store(verbose, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Drain the queue, flush and close the transport. Idempotent.
    #[instrument(name = "forwarder_stop", skip(self), fields(forwarder = %self.name))]
    pub async fn stop(&self) {
        if !self.lifecycle.stop() {
            return;
        }
        drop(self.tx.lock().take());

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(forwarder = %self.name, error = ?e, "forwarder worker panicked");
            }
        }
        debug!(forwarder = %self.name, "forwarder stopped");
    }
}

#[instrument(
    name = "forwarder_worker_loop",
    skip(forwarder, rx, metrics, verbose, lifecycle),
    fields(forwarder = %name)
)]
async fn forwarder_worker<F: Forwarder>(
    mut forwarder: F,
    mut rx: mpsc::Receiver<Bytes>,
    metrics: Arc<ForwarderMetrics>,
    verbose: Arc<AtomicBool>,
    lifecycle: Arc<Lifecycle>,
    name: String,
) {
    debug!("forwarder worker started");

    while let Some(line) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match forwarder.write(&line).await {
            Ok(()) => {
                metrics.record_written();
                metrics::counter!("forwarder_sentences_total", "forwarder" => name.clone())
                    .increment(1);
                let sentence = String::from_utf8_lossy(&line);
                if verbose.load(Ordering::Relaxed) {
                    info!(sentence = %sentence.trim_end(), "sent");
                } else {
                    trace!(sentence = %sentence.trim_end(), "sent");
                }
            }
            Err(e) => {
                metrics.record_error();
                metrics::counter!("forwarder_errors_total", "forwarder" => name.clone())
                    .increment(1);
                // Lines already queued are still drained, later sends are refused
                if lifecycle.fail() {
                    error!(error = %e, "write failed, forwarder marked failed");
                } else {
                    debug!(error = %e, "write failed");
                }
            }
        }
    }

    if let Err(e) = forwarder.flush().await {
        error!(error = %e, "flush failed on shutdown");
    }
    if let Err(e) = forwarder.close().await {
        error!(error = %e, "close failed on shutdown");
    }

    debug!("forwarder worker stopped");
}
