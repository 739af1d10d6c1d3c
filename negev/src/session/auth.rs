//! Login scripts.

/// Text that marks a privileged prompt.
pub const PRIVILEGED_PROMPT: &str = "#";

/// Where a login step belongs.
///
/// SSH authenticates in the handshake, so [`AuthStage::Login`] steps are
/// skipped there. [`AuthStage::Enable`] steps are skipped once the device is
/// already showing a privileged prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Login,
    Enable,
    Setup,
}

/// One step of a login script: wait for `wait_for`, then send `send`.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthPrompt {
    /// Text that must appear in the output.
    pub wait_for: String,

    /// Bytes to send once it does, newline included. Empty means wait only.
    pub send: String,

    pub stage: AuthStage,
}

impl AuthPrompt {
    fn new(stage: AuthStage, wait_for: &str, send: String) -> Self {
        Self {
            wait_for: wait_for.to_string(),
            send,
            stage,
        }
    }

    /// A credential step, skipped on SSH.
    pub fn login(wait_for: &str, line: &str) -> Self {
        Self::new(AuthStage::Login, wait_for, format!("{line}\n"))
    }

    /// A privilege escalation step.
    pub fn enable(wait_for: &str, line: &str) -> Self {
        Self::new(AuthStage::Enable, wait_for, format!("{line}\n"))
    }

    /// A post-login setup command such as disabling paging.
    pub fn setup(wait_for: &str, line: &str) -> Self {
        Self::new(AuthStage::Setup, wait_for, format!("{line}\n"))
    }

    /// Wait for `wait_for` without sending anything.
    pub fn wait(wait_for: &str) -> Self {
        Self::new(AuthStage::Setup, wait_for, String::new())
    }
}

// Credentials travel in `send`; keep them out of debug output.
impl std::fmt::Debug for AuthPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPrompt")
            .field("wait_for", &self.wait_for)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

/// Cisco-style login script used when no platform supplies its own.
pub fn default_sequence(username: &str, password: &str, enable_password: &str) -> Vec<AuthPrompt> {
    vec![
        AuthPrompt::login("Username:", username),
        AuthPrompt::login("Password:", password),
        AuthPrompt::enable(">", "enable"),
        AuthPrompt::enable("Password:", enable_password),
        AuthPrompt::setup(PRIVILEGED_PROMPT, "terminal length 0"),
        AuthPrompt::wait(PRIVILEGED_PROMPT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let seq = default_sequence("admin", "secret", "enable-secret");
        let waits: Vec<&str> = seq.iter().map(|s| s.wait_for.as_str()).collect();
        assert_eq!(waits, ["Username:", "Password:", ">", "Password:", "#", "#"]);
        assert_eq!(seq[0].send, "admin\n");
        assert_eq!(seq[3].send, "enable-secret\n");
        assert_eq!(seq[4].send, "terminal length 0\n");
        assert!(seq[5].send.is_empty());
    }

    #[test]
    fn test_empty_password_still_sends_newline() {
        let seq = default_sequence("admin", "", "");
        assert_eq!(seq[1].send, "\n");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let step = AuthPrompt::login("Password:", "hunter2");
        assert!(!format!("{step:?}").contains("hunter2"));
    }
}
