//! Connection configuration.

use std::time::Duration;

use secrecy::SecretString;

use crate::policy::TransportKind;

/// Default deadline for dialing, login steps and commands.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for platforms with slow discovery commands.
pub const SLOW_PLATFORM_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything needed to dial and log into one switch.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// TCP port (23 for Telnet, 22 for SSH unless overridden).
    pub port: u16,

    /// Telnet or SSH.
    pub kind: TransportKind,

    /// Username for authentication.
    pub username: String,

    /// Login password.
    pub password: SecretString,

    /// Privileged-mode (enable) password.
    pub enable_password: SecretString,

    /// Connection and read deadline.
    pub timeout: Duration,

    /// Terminal width for the SSH PTY.
    pub terminal_width: u32,

    /// Terminal height for the SSH PTY.
    pub terminal_height: u32,
}

impl ConnectionConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
