//! UTC clock source emitting ZDA sentences.

use std::time::Duration;

use chrono::Utc;
use contracts::{SentenceCallback, SentenceSource};
use nmea_codec::generate;

use super::task::SourceTask;
use crate::ChannelError;

const TALKER: &str = "GP";

#[derive(Debug)]
pub struct ZdaSource {
    period: Duration,
    task: SourceTask,
}

impl ZdaSource {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period: Duration::from_millis(period_ms.max(1)),
            task: SourceTask::default(),
        }
    }
}

async fn tick(period: Duration, callback: SentenceCallback) -> Result<(), ChannelError> {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        callback(generate::zda(TALKER, Utc::now()));
    }
}

impl SentenceSource for ZdaSource {
    fn name(&self) -> &str {
        "zda"
    }

    fn listen(&self, callback: SentenceCallback) {
        self.task.spawn("zda", tick(self.period, callback));
    }

    fn stop(&self) {
        self.task.stop();
    }

    fn is_listening(&self) -> bool {
        self.task.is_listening()
    }
}
