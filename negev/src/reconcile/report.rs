//! Outcome of one reconciliation run.

use std::fmt;

/// Why a port was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Listed in `exclude_ports`.
    ExcludedPort,

    /// Trunk link.
    Trunk,

    /// No MAC learned on the port.
    NoDevice,

    /// More than one MAC learned on the port; the MACs seen.
    MultipleDevices(Vec<String>),

    /// The only MAC on the port is excluded.
    ExcludedMac(String),

    /// Neither the OUI mapping nor the default VLAN names a target.
    NoTargetVlan,

    /// The target VLAN does not exist on the switch.
    MissingVlan(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExcludedPort => f.write_str("excluded port"),
            SkipReason::Trunk => f.write_str("trunk port"),
            SkipReason::NoDevice => f.write_str("no device"),
            SkipReason::MultipleDevices(macs) => {
                write!(f, "multiple devices ({})", macs.join(", "))
            }
            SkipReason::ExcludedMac(mac) => write!(f, "excluded MAC {mac}"),
            SkipReason::NoTargetVlan => f.write_str("no target VLAN"),
            SkipReason::MissingVlan(vlan) => write!(f, "VLAN {vlan} does not exist"),
        }
    }
}

/// A port moved (or, in sandbox mode, that would be moved) to a new VLAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortChange {
    pub interface: String,
    pub mac: String,
    pub from_vlan: String,
    pub to_vlan: String,

    /// Configuration lines the switch rejected or that failed on the wire.
    pub failed_commands: Vec<String>,
}

/// What happened to the running configuration after the port loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Persistence {
    /// Nothing changed.
    #[default]
    NotNeeded,

    /// Sandbox run; changes were only printed.
    Simulated,

    /// Saved with this command.
    Saved(String),

    /// Every save candidate failed; the operator must save manually.
    Failed,
}

/// Decisions taken during one `process_ports` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub vlans_created: Vec<String>,
    pub vlans_deleted: Vec<String>,

    /// Extra VLANs kept because they are protected.
    pub vlans_protected: Vec<String>,

    pub reconfigured: Vec<PortChange>,

    /// Ports already in their target VLAN.
    pub unchanged: Vec<String>,

    pub skipped: Vec<(String, SkipReason)>,

    /// Whether any port was (or would have been) reconfigured.
    pub changed: bool,

    pub persistence: Persistence,
}

impl RunReport {
    /// Reason `interface` was skipped, if it was.
    pub fn skip_reason(&self, interface: &str) -> Option<&SkipReason> {
        self.skipped
            .iter()
            .find(|(name, _)| name == interface)
            .map(|(_, reason)| reason)
    }

    pub(crate) fn skip(&mut self, interface: &str, reason: SkipReason) {
        self.skipped.push((interface.to_string(), reason));
    }
}
