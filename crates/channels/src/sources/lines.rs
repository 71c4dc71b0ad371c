//! Line framing shared by the stream sources.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

/// Splits a byte stream into trimmed, non-empty text lines.
///
/// Lines that are not valid UTF-8 are line noise: they are counted and
/// skipped, and reading carries on with the next line.
pub(crate) struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    origin: String,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub(crate) fn new(reader: R, origin: impl Into<String>) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(128),
            origin: origin.into(),
        }
    }

    /// Next line, or `None` at end of stream
    pub(crate) async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            match std::str::from_utf8(&self.buf) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        return Ok(Some(line.to_string()));
                    }
                }
                Err(_) => {
                    metrics::counter!("nmea_sentences_dropped_total", "reason" => "invalid_utf8")
                        .increment(1);
                    trace!(source = %self.origin, bytes = self.buf.len(), "non-UTF-8 line skipped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_skips_noise_and_blank_lines() {
        let input: &[u8] = b"$IIHDT,123.0,T*2B\r\n\xff\xfe garbage\r\n\r\n$IIHDM,120.0,M*2C";
        let mut reader = LineReader::new(input, "test");

        assert_eq!(
            reader.next_line().await.unwrap().as_deref(),
            Some("$IIHDT,123.0,T*2B")
        );
        assert_eq!(
            reader.next_line().await.unwrap().as_deref(),
            Some("$IIHDM,120.0,M*2C")
        );
        assert_eq!(reader.next_line().await.unwrap(), None);
    }
}
