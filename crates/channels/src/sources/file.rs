//! Log file replay, one sentence per line.

use std::path::PathBuf;
use std::time::Duration;

use contracts::{SentenceCallback, SentenceSource};
use tokio::fs::File;
use tokio::io::BufReader;
use tracing::debug;

use super::lines::LineReader;
use super::task::SourceTask;
use crate::ChannelError;

/// Replays a file line by line, optionally looping
#[derive(Debug)]
pub struct FileSource {
    name: String,
    path: PathBuf,
    loop_playback: bool,
    between_records: Duration,
    task: SourceTask,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, loop_playback: bool, between_records_ms: u64) -> Self {
        let path = path.into();
        Self {
            name: format!("file:{}", path.display()),
            path,
            loop_playback,
            between_records: Duration::from_millis(between_records_ms),
            task: SourceTask::default(),
        }
    }
}

async fn replay(
    name: String,
    path: PathBuf,
    loop_playback: bool,
    between_records: Duration,
    callback: SentenceCallback,
) -> Result<(), ChannelError> {
    loop {
        let file = File::open(&path)
            .await
            .map_err(|e| ChannelError::io(&name, e))?;
        let mut lines = LineReader::new(BufReader::new(file), &name);
        let mut replayed = 0usize;
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| ChannelError::io(&name, e))?
        {
            callback(line);
            replayed += 1;
            if !between_records.is_zero() {
                tokio::time::sleep(between_records).await;
            }
        }
        debug!(source = %name, replayed, "end of file");
        if !loop_playback || replayed == 0 {
            return Ok(());
        }
    }
}

impl SentenceSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn listen(&self, callback: SentenceCallback) {
        self.task.spawn(
            &self.name,
            replay(
                self.name.clone(),
                self.path.clone(),
                self.loop_playback,
                self.between_records,
                callback,
            ),
        );
    }

    fn stop(&self) {
        self.task.stop();
    }

    fn is_listening(&self) -> bool {
        self.task.is_listening()
    }

    fn has_failed(&self) -> bool {
        self.task.has_failed()
    }
}
