//! TCP client source: reads sentences from a remote NMEA server.

use contracts::{SentenceCallback, SentenceSource};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::info;

use super::lines::LineReader;
use super::task::SourceTask;
use crate::ChannelError;

#[derive(Debug)]
pub struct TcpSource {
    name: String,
    host: String,
    port: u16,
    task: SourceTask,
}

impl TcpSource {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        Self {
            name: format!("tcp:{host}:{port}"),
            host,
            port,
            task: SourceTask::default(),
        }
    }
}

async fn read_stream(
    name: String,
    address: String,
    callback: SentenceCallback,
) -> Result<(), ChannelError> {
    let stream = TcpStream::connect(&address)
        .await
        .map_err(|e| ChannelError::io(&name, e))?;
    info!(source = %name, %address, "connected");

    let mut lines = LineReader::new(BufReader::new(stream), &name);
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| ChannelError::io(&name, e))?
    {
        callback(line);
    }
    Err(ChannelError::io(
        &name,
        std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "server closed the connection"),
    ))
}

impl SentenceSource for TcpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn listen(&self, callback: SentenceCallback) {
        let address = format!("{}:{}", self.host, self.port);
        self.task
            .spawn(&self.name, read_stream(self.name.clone(), address, callback));
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
