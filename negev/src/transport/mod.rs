//! Raw byte links to a switch.
//!
//! This module owns dialing and the wire protocol (Telnet option negotiation,
//! SSH handshake and PTY request). Everything above it sees a plain duplex
//! byte stream through the [`Transport`] trait.

pub mod config;
mod ssh;
mod telnet;

pub use config::ConnectionConfig;
pub use ssh::SshTransport;
pub use telnet::{IacFilter, TelnetTransport};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::policy::TransportKind;

/// A connected duplex byte stream.
#[async_trait]
pub trait Transport: Send {
    /// Write raw bytes to the device.
    async fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Wait at most `poll` for data.
    ///
    /// Returns `Ok(None)` when nothing arrived in time. A closed stream is an
    /// error, never an empty read.
    async fn read_chunk(&mut self, poll: Duration) -> Result<Option<Vec<u8>>>;

    /// Close the underlying connection.
    async fn close(&mut self) -> Result<()>;
}

/// Dial the device using the transport selected in `config`.
pub async fn dial(config: &ConnectionConfig) -> Result<Box<dyn Transport>> {
    match config.kind {
        TransportKind::Telnet => Ok(Box::new(TelnetTransport::connect(config).await?)),
        TransportKind::Ssh => Ok(Box::new(SshTransport::connect(config).await?)),
    }
}
