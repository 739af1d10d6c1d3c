//! Authenticated CLI sessions.
//!
//! A [`Session`] is a logged-in, privileged shell on one switch: commands go
//! in, the text between the echoed command and the next prompt comes out.
//! [`CliSession`] is the Telnet/SSH implementation; [`ClientCache`] shares
//! sessions between callers that target the same switch with the same
//! credentials.

mod auth;
mod builder;
mod cache;
mod cli;

pub use auth::{AuthPrompt, AuthStage, PRIVILEGED_PROMPT, default_sequence};
pub use builder::SessionBuilder;
pub use cache::{ClientCache, SharedSession, cache_key};
pub use cli::CliSession;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// A privileged CLI session on a switch.
#[async_trait]
pub trait Session: Send {
    /// Dial and log in. Calling this on a connected session re-dials.
    async fn connect(&mut self) -> Result<()>;

    /// Close the link. Safe to call when not connected.
    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Run one command and return its output without the echo and prompt lines.
    async fn execute_command(&mut self, command: &str) -> Result<String>;

    /// Replace the login script used by the next [`connect`](Session::connect).
    fn set_auth_sequence(&mut self, _sequence: Vec<AuthPrompt>) {}

    /// Change the per-step read deadline.
    fn set_timeout(&mut self, _timeout: Duration) {}
}
