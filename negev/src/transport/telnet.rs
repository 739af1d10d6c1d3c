//! Telnet transport over a plain TCP stream.
//!
//! Only enough of RFC 854 is spoken to get a line-mode CLI: the server may
//! echo and suppress go-ahead, every other option is refused.

use std::borrow::Cow;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use super::Transport;
use super::config::ConnectionConfig;
use crate::error::{Result, TransportError};

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_ECHO: u8 = 1;
const OPT_SGA: u8 = 3;

const READ_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IacState {
    Data,
    Iac,
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Incremental Telnet command filter.
///
/// Strips IAC sequences out of the byte stream and produces the replies the
/// client owes the server. State carries across reads, so a sequence split
/// between two TCP segments is handled.
#[derive(Debug)]
pub struct IacFilter {
    state: IacState,
}

impl IacFilter {
    pub fn new() -> Self {
        Self {
            state: IacState::Data,
        }
    }

    /// Feed raw bytes from the wire.
    ///
    /// Returns `(data, replies)`: the payload with Telnet commands removed,
    /// and the negotiation bytes to write back.
    pub fn feed(&mut self, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut data = Vec::with_capacity(input.len());
        let mut replies = Vec::new();

        for &b in input {
            self.state = match self.state {
                IacState::Data if b == IAC => IacState::Iac,
                IacState::Data => {
                    data.push(b);
                    IacState::Data
                }
                IacState::Iac => match b {
                    IAC => {
                        data.push(IAC);
                        IacState::Data
                    }
                    DO | DONT | WILL | WONT => IacState::Negotiate(b),
                    SB => IacState::Sub,
                    // NOP, GA and friends carry no option byte
                    _ => IacState::Data,
                },
                IacState::Negotiate(cmd) => {
                    Self::reply(cmd, b, &mut replies);
                    IacState::Data
                }
                IacState::Sub if b == IAC => IacState::SubIac,
                IacState::Sub => IacState::Sub,
                IacState::SubIac if b == SE => IacState::Data,
                IacState::SubIac => IacState::Sub,
            };
        }

        (data, replies)
    }

    fn reply(cmd: u8, option: u8, replies: &mut Vec<u8>) {
        let answer = match cmd {
            DO => WONT,
            WILL if matches!(option, OPT_ECHO | OPT_SGA) => DO,
            WILL => DONT,
            // DONT / WONT need no acknowledgement
            _ => return,
        };
        trace!("telnet option {}: cmd {} -> {}", option, cmd, answer);
        replies.extend_from_slice(&[IAC, answer, option]);
    }
}

impl Default for IacFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Double every IAC byte so payload data is not read as a command.
fn escape_iac(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.contains(&IAC) {
        return Cow::Borrowed(data);
    }
    let mut out = Vec::with_capacity(data.len() + 4);
    for &b in data {
        out.push(b);
        if b == IAC {
            out.push(IAC);
        }
    }
    Cow::Owned(out)
}

/// Telnet transport, generic over the underlying stream.
pub struct TelnetTransport<S = TcpStream> {
    stream: S,
    filter: IacFilter,
}

impl TelnetTransport<TcpStream> {
    /// Dial `host:port` within the configured timeout.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        debug!("Dialing telnet {}", config.socket_addr());

        let stream = tokio::time::timeout(config.timeout, TcpStream::connect(config.socket_addr()))
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))?
            .map_err(|source| TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source,
            })?;
        stream.set_nodelay(true).map_err(TransportError::Io)?;

        Ok(Self::new(stream))
    }
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            filter: IacFilter::new(),
        }
    }
}

#[async_trait]
impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(&escape_iac(data))
            .await
            .map_err(TransportError::Io)?;
        self.stream.flush().await.map_err(TransportError::Io)?;
        Ok(())
    }

    async fn read_chunk(&mut self, poll: Duration) -> Result<Option<Vec<u8>>> {
        let mut buf = [0u8; READ_BUFFER_SIZE];

        let n = match tokio::time::timeout(poll, self.stream.read(&mut buf)).await {
            Err(_) => return Ok(None),
            Ok(Ok(0)) => return Err(TransportError::Disconnected.into()),
            Ok(Ok(n)) => n,
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionReset => {
                return Err(TransportError::Disconnected.into());
            }
            Ok(Err(e)) => return Err(TransportError::Io(e).into()),
        };

        let (data, replies) = self.filter.feed(&buf[..n]);
        if !replies.is_empty() {
            self.stream
                .write_all(&replies)
                .await
                .map_err(TransportError::Io)?;
        }

        if data.is_empty() {
            Ok(None)
        } else {
            Ok(Some(data))
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(TransportError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_plain_data_passes_through() {
        let mut filter = IacFilter::new();
        let (data, replies) = filter.feed(b"Username: ");
        assert_eq!(data, b"Username: ");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_accepts_echo_and_sga() {
        let mut filter = IacFilter::new();
        let (data, replies) = filter.feed(&[IAC, WILL, OPT_ECHO, IAC, WILL, OPT_SGA, b'>']);
        assert_eq!(data, b">");
        assert_eq!(replies, vec![IAC, DO, OPT_ECHO, IAC, DO, OPT_SGA]);
    }

    #[test]
    fn test_refuses_other_options() {
        let mut filter = IacFilter::new();
        // DO TERMINAL-TYPE, WILL STATUS
        let (data, replies) = filter.feed(&[IAC, DO, 24, IAC, WILL, 5]);
        assert!(data.is_empty());
        assert_eq!(replies, vec![IAC, WONT, 24, IAC, DONT, 5]);
    }

    #[test]
    fn test_sequence_split_across_reads() {
        let mut filter = IacFilter::new();
        let (data, replies) = filter.feed(&[b'a', IAC]);
        assert_eq!(data, b"a");
        assert!(replies.is_empty());

        let (data, replies) = filter.feed(&[DO, 31, b'b']);
        assert_eq!(data, b"b");
        assert_eq!(replies, vec![IAC, WONT, 31]);
    }

    #[test]
    fn test_subnegotiation_skipped() {
        let mut filter = IacFilter::new();
        let (data, replies) = filter.feed(&[b'x', IAC, SB, 24, 1, IAC, SE, b'y']);
        assert_eq!(data, b"xy");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_escaped_iac_is_data() {
        let mut filter = IacFilter::new();
        let (data, _) = filter.feed(&[IAC, IAC]);
        assert_eq!(data, vec![IAC]);
    }

    #[test]
    fn test_escape_on_write() {
        assert!(matches!(escape_iac(b"plain"), Cow::Borrowed(_)));
        assert_eq!(escape_iac(&[1, IAC, 2]).as_ref(), &[1, IAC, IAC, 2]);
    }

    #[tokio::test]
    async fn test_read_chunk_answers_negotiation() {
        let mock = tokio_test::io::Builder::new()
            .read(&[IAC, WILL, OPT_ECHO, b'U', b's', b'e', b'r', b':'])
            .write(&[IAC, DO, OPT_ECHO])
            .write(b"admin\n")
            .build();
        let mut transport = TelnetTransport::new(mock);

        let chunk = transport
            .read_chunk(Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(chunk.as_deref(), Some(&b"User:"[..]));

        transport.write(b"admin\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_eof_is_disconnect() {
        let mock = tokio_test::io::Builder::new().build();
        let mut transport = TelnetTransport::new(mock);

        let err = transport
            .read_chunk(Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::Disconnected)
        ));
    }
}
