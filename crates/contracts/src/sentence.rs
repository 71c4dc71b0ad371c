//! Sentence events and the SentenceSource trait
//!
//! A `SentenceSource` is the transport half of a channel: it reads or
//! generates raw lines and hands them to a callback. Filtering, lifecycle and
//! routing live in the channel wrapper, not in the source.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::Identity;

/// One raw sentence travelling from a channel to the registry
#[derive(Debug, Clone)]
pub struct SentenceEvent {
    /// Channel that produced the sentence; `None` for locally generated ones
    pub origin: Option<Identity>,
    pub sentence: Arc<str>,
    pub received_at: DateTime<Utc>,
}

impl SentenceEvent {
    pub fn from_channel(origin: Identity, sentence: impl Into<Arc<str>>) -> Self {
        Self {
            origin: Some(origin),
            sentence: sentence.into(),
            received_at: Utc::now(),
        }
    }

    /// Sentence injected by a computer or an operator
    pub fn unattributed(sentence: impl Into<Arc<str>>) -> Self {
        Self {
            origin: None,
            sentence: sentence.into(),
            received_at: Utc::now(),
        }
    }
}

/// Raw line callback
///
/// Uses `Arc` so the callback can be moved into the source's task.
pub type SentenceCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Sentence source trait
///
/// Abstracts files, sockets and generators behind a callback interface.
///
/// ```ignore
/// let source: Box<dyn SentenceSource> = build_source();
/// source.listen(Arc::new(|line| println!("{line}")));
/// // ...
/// source.stop();
/// ```
pub trait SentenceSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Start producing lines.
    ///
    /// Repeated calls while listening are ignored. Sources that run a task
    /// must be listened to from within a Tokio runtime.
    fn listen(&self, callback: SentenceCallback);

    /// Stop producing lines and release the transport
    fn stop(&self);

    /// Whether lines may still arrive
    fn is_listening(&self) -> bool;

    /// Whether the transport ended on an error
    fn has_failed(&self) -> bool {
        false
    }
}
