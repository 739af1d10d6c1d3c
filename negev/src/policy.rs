//! Resolved per-switch policy.
//!
//! A `SwitchPolicy` is produced by an external configuration loader (YAML
//! parsing, validation and global/per-switch merging happen there) and stays
//! immutable for the duration of a run.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use log::LevelFilter;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::model::normalize_mac;

/// Transport used to reach the switch CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Telnet on port 23.
    #[default]
    Telnet,

    /// SSH on port 22, password authentication.
    Ssh,
}

impl TransportKind {
    /// Well-known port for this transport.
    pub fn default_port(self) -> u16 {
        match self {
            TransportKind::Telnet => 23,
            TransportKind::Ssh => 22,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Telnet => "telnet",
            TransportKind::Ssh => "ssh",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log target carrying raw switch output.
pub const RAW_OUTPUT_TARGET: &str = "negev::raw";

/// Output verbosity selected by the front door.
///
/// `0` = quiet, `1` = decision traces, `2` = raw switch output, `3` = both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Verbosity(pub u8);

impl Verbosity {
    pub fn is_debug_enabled(self) -> bool {
        matches!(self.0, 1 | 3)
    }

    pub fn is_raw_output_enabled(self) -> bool {
        matches!(self.0, 2 | 3)
    }

    /// `(target, level)` directives a front door should install.
    ///
    /// The first applies to everything; the second scopes raw output to
    /// [`RAW_OUTPUT_TARGET`] so it can be shown without decision traces.
    pub fn log_filters(self) -> [(Option<&'static str>, LevelFilter); 2] {
        let base = if self.is_debug_enabled() {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        let raw = if self.is_raw_output_enabled() {
            LevelFilter::Trace
        } else {
            LevelFilter::Off
        };
        [(None, base), (Some(RAW_OUTPUT_TARGET), raw)]
    }
}

/// Login credentials for one switch.
#[derive(Debug, Deserialize)]
#[serde(from = "RawCredentials")]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    pub enable_password: SecretString,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        enable_password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            enable_password: SecretString::from(enable_password.into()),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self::new(
            self.username.clone(),
            self.password.expose_secret(),
            self.enable_password.expose_secret(),
        )
    }
}

/// Fully resolved policy for one switch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SwitchPolicy {
    /// Switch address (hostname or IP).
    pub target: String,

    pub transport: TransportKind,

    /// `ios`, `dmos` or `auto`.
    pub platform: String,

    #[serde(flatten)]
    pub credentials: Credentials,

    /// OUI (first six hex characters of a normalized MAC) to VLAN.
    pub mac_to_vlan: IndexMap<String, String>,

    /// MACs never touched, normalized.
    pub exclude_macs: Vec<String>,

    /// Port names never touched, compared case-insensitively.
    pub exclude_ports: Vec<String>,

    pub default_vlan: String,

    /// VLANs that must exist when `create_vlans` is set.
    pub allowed_vlans: Vec<String>,

    /// VLANs never deleted by sync.
    pub protected_vlans: Vec<String>,

    /// Dry run: print would-be commands instead of sending them.
    #[serde(skip)]
    pub sandbox: bool,

    /// Sync the VLAN table against `allowed_vlans`.
    #[serde(skip)]
    pub create_vlans: bool,

    /// Assign VLANs without checking that they exist on the switch.
    #[serde(skip)]
    pub skip_vlan_check: bool,

    #[serde(skip)]
    pub verbosity: Verbosity,
}

impl SwitchPolicy {
    /// Canonicalize MAC-derived keys so lookups are total.
    ///
    /// OUI keys and excluded MACs are normalized; the platform name is trimmed
    /// and lower-cased, defaulting to `ios`.
    pub fn normalized(mut self) -> Self {
        self.mac_to_vlan = self
            .mac_to_vlan
            .into_iter()
            .map(|(oui, vlan)| (normalize_mac(&oui), vlan))
            .collect();
        self.exclude_macs = self.exclude_macs.iter().map(|m| normalize_mac(m)).collect();
        self.platform = self.platform.trim().to_lowercase();
        if self.platform.is_empty() {
            self.platform = "ios".to_string();
        }
        self
    }

    /// Target VLAN for an OUI, if a real mapping exists.
    ///
    /// `"0"` and `"00"` mean "no mapping".
    pub fn vlan_for_oui(&self, oui: &str) -> Option<&str> {
        let oui = normalize_mac(oui);
        self.mac_to_vlan
            .iter()
            .find(|(key, _)| normalize_mac(key) == oui)
            .map(|(_, vlan)| vlan.as_str())
            .filter(|v| !v.is_empty() && *v != "0" && *v != "00")
    }

    pub fn is_mac_excluded(&self, mac: &str) -> bool {
        let mac = normalize_mac(mac);
        self.exclude_macs.iter().any(|m| normalize_mac(m) == mac)
    }

    /// Lower-cased set of excluded port names.
    pub fn excluded_ports(&self) -> HashSet<String> {
        self.exclude_ports.iter().map(|p| p.to_lowercase()).collect()
    }

    pub fn is_raw_output_enabled(&self) -> bool {
        self.verbosity.is_raw_output_enabled()
    }
}

#[derive(Deserialize)]
struct RawCredentials {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    enable_password: String,
}

impl From<RawCredentials> for Credentials {
    fn from(raw: RawCredentials) -> Self {
        Self::new(raw.username, raw.password, raw.enable_password)
    }
}
