//! Interactive channel on top of a transport.

use std::time::Duration;

use log::trace;
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use super::patterns::PromptMatcher;
use crate::error::{ChannelError, Result};
use crate::transport::Transport;

/// How long a single read waits before the deadline is checked again.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// High-level channel for interactive device sessions.
///
/// Wraps a transport and provides pattern-based read operations with
/// timeout handling.
pub struct PtyChannel {
    transport: Box<dyn Transport>,

    /// Pattern buffer for accumulating output.
    buffer: PatternBuffer,

    poll_interval: Duration,
}

impl PtyChannel {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            buffer: PatternBuffer::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Send `line` followed by a newline.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.transport.write(&data).await
    }

    /// Send bytes as-is.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.transport.write(data).await
    }

    /// Read until `matcher` matches the buffered output.
    ///
    /// Returns everything read, including the match.
    pub async fn read_until(
        &mut self,
        matcher: &dyn PromptMatcher,
        timeout: Duration,
    ) -> Result<String> {
        self.read_until_any(&[matcher], timeout)
            .await
            .map(|(_, output)| output)
    }

    /// Read until any of `matchers` matches.
    ///
    /// Returns the index of the first matcher (in slice order) that matched
    /// and everything read. On timeout the partial output is carried in
    /// [`ChannelError::PatternTimeout`].
    pub async fn read_until_any(
        &mut self,
        matchers: &[&dyn PromptMatcher],
        timeout: Duration,
    ) -> Result<(usize, String)> {
        let deadline = Instant::now() + timeout;

        loop {
            let tail = self.buffer.tail();
            if let Some(index) = matchers.iter().position(|m| m.is_match(tail)) {
                return Ok((index, self.buffer.take_string()));
            }

            let now = Instant::now();
            if now >= deadline {
                let pattern = matchers
                    .iter()
                    .map(|m| m.describe())
                    .collect::<Vec<_>>()
                    .join(" | ");
                return Err(ChannelError::PatternTimeout {
                    pattern,
                    timeout,
                    partial: self.buffer.take_string(),
                }
                .into());
            }

            let wait = self.poll_interval.min(deadline - now);
            if let Some(chunk) = self.transport.read_chunk(wait).await? {
                trace!("read {} bytes: {:?}", chunk.len(), String::from_utf8_lossy(&chunk));
                self.buffer.extend(&chunk);
            }
        }
    }

    /// Discard anything buffered.
    pub fn clear_buffer(&mut self) {
        if !self.buffer.is_empty() {
            trace!("discarding unread output: {:?}", self.buffer.take_string());
        }
        self.buffer.clear();
    }

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.buffer.clear();
        self.transport.close().await
    }
}
