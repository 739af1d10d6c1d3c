//! Telnet/SSH CLI session.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use secrecy::ExposeSecret;

use super::Session;
use super::auth::{AuthPrompt, AuthStage, default_sequence};
use crate::channel::{Literal, PromptMatcher, PtyChannel, TrailingPrompt};
use crate::error::{Error, Result, SessionError};
use crate::policy::TransportKind;
use crate::transport::{self, ConnectionConfig, Transport};

/// Interactive CLI session over Telnet or SSH.
pub struct CliSession {
    config: ConnectionConfig,

    /// Login script replayed on every connect.
    auth_sequence: Vec<AuthPrompt>,

    /// Open channel (None when disconnected).
    channel: Option<PtyChannel>,

    /// Deadline for each login step and each command.
    timeout: Duration,

    /// Set when a timed out command forced the link closed; the next
    /// command re-dials.
    reconnect_pending: bool,
}

impl CliSession {
    /// Create a disconnected session using the Cisco-style login script.
    pub fn new(config: ConnectionConfig) -> Self {
        let auth_sequence = default_sequence(
            &config.username,
            config.password.expose_secret(),
            config.enable_password.expose_secret(),
        );
        Self {
            timeout: config.timeout,
            config,
            auth_sequence,
            channel: None,
            reconnect_pending: false,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Log in over an already dialed transport.
    pub(crate) async fn connect_with(&mut self, transport: Box<dyn Transport>) -> Result<()> {
        let mut channel = PtyChannel::new(transport);
        match self.login(&mut channel).await {
            Ok(()) => {
                self.channel = Some(channel);
                Ok(())
            }
            Err(e) => {
                let _ = channel.close().await;
                Err(e)
            }
        }
    }

    /// Replay the login script.
    ///
    /// Enable steps also watch for a privileged prompt; once one shows up the
    /// remaining enable steps are skipped and the prompt output is handed to
    /// the next step.
    async fn login(&mut self, channel: &mut PtyChannel) -> Result<()> {
        let skip_login = self.config.kind == TransportKind::Ssh;
        let privileged = TrailingPrompt('#');
        let mut is_privileged = false;
        let mut pending: Option<String> = None;

        for step in &self.auth_sequence {
            match step.stage {
                AuthStage::Login if skip_login => continue,
                AuthStage::Enable if is_privileged => {
                    debug!("Already privileged, skipping wait for {:?}", step.wait_for);
                    continue;
                }
                _ => {}
            }

            let wait = Literal::new(step.wait_for.as_str());
            let satisfied = pending
                .take()
                .is_some_and(|out| wait.is_match(out.as_bytes()));

            if !satisfied {
                debug!("Waiting for {:?}", step.wait_for);
                let read = if step.stage == AuthStage::Enable {
                    channel
                        .read_until_any(&[&wait, &privileged], self.timeout)
                        .await
                } else {
                    channel
                        .read_until(&wait, self.timeout)
                        .await
                        .map(|out| (0, out))
                };

                let (index, output) = read.map_err(|source| SessionError::LoginFailed {
                    wait_for: step.wait_for.clone(),
                    source: Box::new(source),
                })?;

                if index == 1 {
                    is_privileged = true;
                    pending = Some(output);
                    continue;
                }
            }

            if !step.send.is_empty() {
                channel.write_raw(step.send.as_bytes()).await?;
            }
        }

        Ok(())
    }
}

/// Drop the echoed command (first line) and the prompt (last line).
pub(crate) fn command_body(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    if lines.len() <= 2 {
        return String::new();
    }
    lines[1..lines.len() - 1]
        .iter()
        .map(|line| line.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Session for CliSession {
    async fn connect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            self.disconnect().await?;
        }

        info!(
            "Connecting to {} via {}",
            self.config.socket_addr(),
            self.config.kind
        );
        let transport = transport::dial(&self.config).await?;
        self.connect_with(transport).await
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.reconnect_pending = false;
        match self.channel.take() {
            Some(mut channel) => {
                debug!("Disconnecting from {}", self.config.host);
                channel.close().await
            }
            None => Ok(()),
        }
    }

    fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    async fn execute_command(&mut self, command: &str) -> Result<String> {
        if self.channel.is_none() && self.reconnect_pending {
            info!("Reconnecting to {} after a timed out command", self.config.host);
            self.reconnect_pending = false;
            self.connect().await?;
        }

        let timeout = self.timeout;
        let channel = self.channel.as_mut().ok_or(SessionError::NotConnected)?;

        debug!("Executing {:?}", command);
        channel.clear_buffer();
        let result = match channel.send_line(command).await {
            Ok(()) => channel.read_until(&TrailingPrompt('#'), timeout).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(raw) => Ok(command_body(&raw)),
            Err(source) => {
                if source.is_timeout() {
                    // late output would answer the next command; start over
                    if let Some(mut channel) = self.channel.take() {
                        let _ = channel.close().await;
                    }
                    self.reconnect_pending = true;
                } else if source.is_disconnect() {
                    self.channel = None;
                }
                Err(Error::from(SessionError::CommandFailed {
                    command: command.to_string(),
                    source: Box::new(source),
                }))
            }
        }
    }

    fn set_auth_sequence(&mut self, sequence: Vec<AuthPrompt>) {
        self.auth_sequence = sequence;
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionBuilder;
    use crate::transport::TelnetTransport;
    use tokio_test::io::Builder;

    fn session(kind: TransportKind) -> CliSession {
        let mut session = SessionBuilder::new("192.0.2.10")
            .transport(kind)
            .username("admin")
            .password("secret")
            .enable_password("en")
            .build()
            .unwrap();
        session.set_timeout(Duration::from_millis(500));
        session
    }

    fn telnet(mock: tokio_test::io::Mock) -> Box<dyn Transport> {
        Box::new(TelnetTransport::new(mock))
    }

    #[test]
    fn test_command_body() {
        let raw = "show vlan brief\r\n1    default\r\n10   users\r\nswitch#";
        assert_eq!(command_body(raw), "1    default\n10   users");
        assert_eq!(command_body("show clock\r\nswitch#"), "");
        assert_eq!(command_body(""), "");
    }

    #[tokio::test]
    async fn test_telnet_login_with_enable() {
        let mock = Builder::new()
            .read(b"\r\nUser Access Verification\r\n\r\nUsername: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nswitch>")
            .write(b"enable\n")
            .read(b"Password: ")
            .write(b"en\n")
            .read(b"\r\nswitch#")
            .write(b"terminal length 0\n")
            .read(b"terminal length 0\r\nswitch#")
            .write(b"show vlan brief\n")
            .read(b"show vlan brief\r\n1    default    active\r\n10   users      active\r\nswitch#")
            .build();

        let mut session = session(TransportKind::Telnet);
        session.connect_with(telnet(mock)).await.unwrap();
        assert!(session.is_connected());

        let out = session.execute_command("show vlan brief").await.unwrap();
        assert_eq!(out, "1    default    active\n10   users      active");
    }

    #[tokio::test]
    async fn test_already_privileged_skips_enable() {
        let mock = Builder::new()
            .read(b"Username: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nswitch#")
            .write(b"terminal length 0\n")
            .read(b"terminal length 0\r\nswitch#")
            .build();

        let mut session = session(TransportKind::Telnet);
        session.connect_with(telnet(mock)).await.unwrap();
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_ssh_skips_login_steps() {
        let mock = Builder::new()
            .read(b"\r\nswitch>")
            .write(b"enable\n")
            .read(b"Password: ")
            .write(b"en\n")
            .read(b"\r\nswitch#")
            .write(b"terminal length 0\n")
            .read(b"\r\nswitch#")
            .build();

        let mut session = session(TransportKind::Ssh);
        session.connect_with(telnet(mock)).await.unwrap();
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_login_failure_leaves_session_disconnected() {
        let mock = Builder::new()
            .read(b"Username: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\n% Login invalid\r\n\r\nUsername: ")
            .wait(Duration::from_secs(1))
            .build();

        let mut session = session(TransportKind::Telnet);
        let err = session.connect_with(telnet(mock)).await.unwrap_err();
        assert!(matches!(
            &err,
            Error::Session(SessionError::LoginFailed { wait_for, .. }) if wait_for == ">"
        ));
        assert!(err.is_timeout());
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_timed_out_command_never_answers_the_next() {
        let mock = Builder::new()
            .read(b"Username: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nswitch#")
            .write(b"terminal length 0\n")
            .read(b"\r\nswitch#")
            .write(b"show tech-support\n")
            .read(b"show tech-support\r\n----- show version -----\r\n")
            .wait(Duration::from_secs(2))
            .build();

        // nothing listens on port 1, so the re-dial fails
        let mut session = SessionBuilder::new("127.0.0.1")
            .port(1)
            .username("admin")
            .password("secret")
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        session.connect_with(telnet(mock)).await.unwrap();

        let err = session.execute_command("show tech-support").await.unwrap_err();
        assert!(err.is_timeout());
        assert!(!session.is_connected());

        let err = session.execute_command("show version").await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "unexpected: {err}");
    }

    #[tokio::test]
    async fn test_execute_requires_connection() {
        let mut session = session(TransportKind::Telnet);
        let err = session.execute_command("show version").await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_closed_link_disconnects_session() {
        let mock = Builder::new()
            .read(b"Username: ")
            .write(b"admin\n")
            .read(b"Password: ")
            .write(b"secret\n")
            .read(b"\r\nswitch#")
            .write(b"terminal length 0\n")
            .read(b"\r\nswitch#")
            .write(b"show version\n")
            .build();

        let mut session = session(TransportKind::Telnet);
        session.connect_with(telnet(mock)).await.unwrap();

        let err = session.execute_command("show version").await.unwrap_err();
        assert!(err.is_disconnect());
        assert!(!session.is_connected());
    }
}
