//! Test doubles.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ChannelError, Result, TransportError};
use crate::session::Session;

const INVALID_INPUT: &str = "% Invalid input detected at '^' marker.";

/// CLI mode tracked by a mode-aware [`ScriptedSession`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum CliMode {
    #[default]
    Exec,
    Config,
    Submode,
}

/// A [`Session`] that replays canned output and records every command.
///
/// Unknown commands return empty output, which is what a switch prints for
/// most configuration lines. With [`with_cli_modes`](Self::with_cli_modes)
/// it also tracks exec/config/sub-mode the way an IOS or DmOS CLI does and
/// rejects lines typed in the wrong mode.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSession {
    responses: HashMap<String, String>,
    failures: HashSet<String>,
    executed: Vec<String>,
    connected: bool,
    refuse_connect: bool,
    modes: Option<CliMode>,
    pub connects: usize,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, command: &str, output: &str) -> Self {
        self.responses.insert(command.to_string(), output.to_string());
        self
    }

    /// Make `command` time out.
    pub fn with_failure(mut self, command: &str) -> Self {
        self.failures.insert(command.to_string());
        self
    }

    /// Reject lines typed in the wrong CLI mode with `% Invalid input`.
    pub fn with_cli_modes(mut self) -> Self {
        self.modes = Some(CliMode::Exec);
        self
    }

    pub fn refusing_connect(mut self) -> Self {
        self.refuse_connect = true;
        self
    }

    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Executed commands that are not `show` queries.
    pub fn config_commands(&self) -> Vec<&str> {
        self.executed
            .iter()
            .map(String::as_str)
            .filter(|c| !c.starts_with("show "))
            .collect()
    }

    /// Move between modes; `false` when the line is invalid in the current one.
    fn enter(&mut self, command: &str) -> bool {
        let Some(mode) = self.modes else {
            return true;
        };
        let mut words = command.split_whitespace();
        let first = words.next().unwrap_or("");
        let second = words.next().unwrap_or("");

        let (accepted, next) = match (mode, first) {
            (CliMode::Exec, "configure") => (true, CliMode::Config),
            (CliMode::Exec, "show" | "write" | "copy" | "save" | "terminal") => (true, mode),
            (CliMode::Exec, _) => (false, mode),
            (_, "show" | "write" | "copy" | "save" | "configure") => (false, mode),
            (_, "end") => (true, CliMode::Exec),
            (CliMode::Submode, "exit") => (true, CliMode::Config),
            (_, "exit") => (true, CliMode::Exec),
            (_, "interface" | "vlan") => (true, CliMode::Submode),
            // global `no` forms leave the sub-mode implicitly
            (_, "no") if matches!(second, "interface" | "vlan") => (true, CliMode::Config),
            (CliMode::Submode, _) => (true, mode),
            (_, _) => (false, mode),
        };
        self.modes = Some(next);
        accepted
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn connect(&mut self) -> Result<()> {
        self.connects += 1;
        if self.refuse_connect {
            return Err(TransportError::Disconnected.into());
        }
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn execute_command(&mut self, command: &str) -> Result<String> {
        self.executed.push(command.to_string());
        if self.failures.contains(command) {
            return Err(ChannelError::PatternTimeout {
                pattern: "#".to_string(),
                timeout: Duration::from_secs(30),
                partial: String::new(),
            }
            .into());
        }
        if !self.enter(command) {
            return Ok(INVALID_INPUT.to_string());
        }
        Ok(self.responses.get(command).cloned().unwrap_or_default())
    }
}
