//! Bounded feed from every channel to the registry pump.

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::SentenceEvent;
use tracing::{trace, warn};

use crate::DropPolicy;

/// Bounded multi-producer sentence queue
#[derive(Debug)]
pub struct SentenceFeed {
    tx: Sender<SentenceEvent>,
    rx: Receiver<SentenceEvent>,
    policy: DropPolicy,
}

impl SentenceFeed {
    pub fn new(capacity: usize, policy: DropPolicy) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx, policy }
    }

    pub fn sender(&self) -> FeedSender {
        FeedSender {
            tx: self.tx.clone(),
            evict: match self.policy {
                DropPolicy::DropOldest => Some(self.rx.clone()),
                DropPolicy::DropNewest => None,
            },
        }
    }

    pub fn receiver(&self) -> Receiver<SentenceEvent> {
        self.rx.clone()
    }

    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Wake the pump with an error once every queued event is consumed
    pub fn close(&self) {
        self.tx.close();
    }
}

/// Producer half of the feed
#[derive(Debug, Clone)]
pub struct FeedSender {
    tx: Sender<SentenceEvent>,
    evict: Option<Receiver<SentenceEvent>>,
}

impl FeedSender {
    /// Non-blocking push. Returns false when the event was dropped.
    pub fn push(&self, event: SentenceEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => match &self.evict {
                Some(rx) => {
                    let _ = rx.try_recv();
                    trace!("feed full, oldest sentence evicted");
                    self.tx.try_send(event).is_ok()
                }
                None => {
                    trace!("feed full, sentence dropped");
                    false
                }
            },
            Err(TrySendError::Closed(_)) => {
                warn!("sentence feed closed");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_newest_when_full() {
        let feed = SentenceFeed::new(2, DropPolicy::DropNewest);
        let tx = feed.sender();
        assert!(tx.push(SentenceEvent::unattributed("a")));
        assert!(tx.push(SentenceEvent::unattributed("b")));
        assert!(!tx.push(SentenceEvent::unattributed("c")));

        let rx = feed.receiver();
        assert_eq!(&*rx.try_recv().unwrap().sentence, "a");
        assert_eq!(&*rx.try_recv().unwrap().sentence, "b");
    }

    #[test]
    fn test_drop_oldest_when_full() {
        let feed = SentenceFeed::new(2, DropPolicy::DropOldest);
        let tx = feed.sender();
        tx.push(SentenceEvent::unattributed("a"));
        tx.push(SentenceEvent::unattributed("b"));
        assert!(tx.push(SentenceEvent::unattributed("c")));

        let rx = feed.receiver();
        assert_eq!(&*rx.try_recv().unwrap().sentence, "b");
        assert_eq!(&*rx.try_recv().unwrap().sentence, "c");
    }

    #[test]
    fn test_closed_feed_rejects() {
        let feed = SentenceFeed::new(2, DropPolicy::DropNewest);
        let tx = feed.sender();
        feed.close();
        assert!(tx.is_closed());
        assert!(!tx.push(SentenceEvent::unattributed("a")));
    }
}
