//! Builder for CLI sessions.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use super::Session;
use super::auth::AuthPrompt;
use super::cli::CliSession;
use crate::error::{Result, SessionError};
use crate::policy::{SwitchPolicy, TransportKind};
use crate::transport::ConnectionConfig;
use crate::transport::config::DEFAULT_TIMEOUT;

/// Builder for creating [`CliSession`]s.
///
/// # Example
///
/// ```rust,no_run
/// use negev::{Session, SessionBuilder, TransportKind};
///
/// # async fn example() -> Result<(), negev::Error> {
/// let mut session = SessionBuilder::new("192.0.2.10")
///     .transport(TransportKind::Ssh)
///     .username("admin")
///     .password("secret")
///     .enable_password("secret")
///     .build()?;
///
/// session.connect().await?;
/// let output = session.execute_command("show vlan brief").await?;
/// println!("{}", output);
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    host: String,
    port: Option<u16>,
    kind: TransportKind,
    username: String,
    password: SecretString,
    enable_password: SecretString,
    auth_sequence: Option<Vec<AuthPrompt>>,
    timeout: Duration,
    terminal_width: u32,
    terminal_height: u32,
}

impl SessionBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            kind: TransportKind::default(),
            username: String::new(),
            password: SecretString::from(String::new()),
            enable_password: SecretString::from(String::new()),
            auth_sequence: None,
            timeout: DEFAULT_TIMEOUT,
            terminal_width: 80,
            terminal_height: 40,
        }
    }

    /// Start from a resolved switch policy (target, transport and credentials).
    pub fn from_policy(policy: &SwitchPolicy) -> Self {
        let creds = &policy.credentials;
        Self::new(policy.target.as_str())
            .transport(policy.transport)
            .username(creds.username.as_str())
            .password(creds.password.expose_secret())
            .enable_password(creds.enable_password.expose_secret())
    }

    /// Override the transport's well-known port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn transport(mut self, kind: TransportKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = SecretString::from(password.into());
        self
    }

    pub fn enable_password(mut self, password: impl Into<String>) -> Self {
        self.enable_password = SecretString::from(password.into());
        self
    }

    /// Use a platform's login script instead of the Cisco-style default.
    pub fn auth_sequence(mut self, sequence: Vec<AuthPrompt>) -> Self {
        self.auth_sequence = Some(sequence);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Build a disconnected session.
    pub fn build(self) -> Result<CliSession> {
        let host = self.host.trim().to_string();
        if host.is_empty() {
            return Err(SessionError::InvalidConfig {
                message: "Target host is required".to_string(),
            }
            .into());
        }

        let config = ConnectionConfig {
            host,
            port: self.port.unwrap_or_else(|| self.kind.default_port()),
            kind: self.kind,
            username: self.username,
            password: self.password,
            enable_password: self.enable_password,
            timeout: self.timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
        };

        let mut session = CliSession::new(config);
        if let Some(sequence) = self.auth_sequence {
            session.set_auth_sequence(sequence);
        }
        Ok(session)
    }
}
