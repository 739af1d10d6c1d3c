//! Data records exchanged between platform drivers and the reconciliation engine.

use std::collections::BTreeSet;
use std::fmt;

/// Set of VLAN identifiers present on a switch.
pub type VlanSet = BTreeSet<String>;

/// Set of trunk interface names, lower-cased.
pub type InterfaceSet = BTreeSet<String>;

/// An active (link-up) switch port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    /// Interface identifier in the vendor's native form (e.g. `Gi1/0/1`).
    pub interface: String,

    /// VLAN the port currently sits in, as reported by the switch.
    pub vlan: String,
}

impl Port {
    pub fn new(interface: impl Into<String>, vlan: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            vlan: vlan.into(),
        }
    }
}

/// A MAC address learned behind a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// VLAN the address was learned in.
    pub vlan: String,

    /// 12 lower-case hex characters, no separators.
    pub mac: String,

    /// Colon separated form of `mac`.
    pub mac_full: String,

    /// Interface the address was learned on.
    pub interface: String,
}

impl Device {
    /// Build a device from any MAC notation.
    pub fn new(vlan: impl Into<String>, mac: &str, interface: impl Into<String>) -> Self {
        let mac = normalize_mac(mac);
        Self {
            vlan: vlan.into(),
            mac_full: format_mac(&mac),
            mac,
            interface: interface.into(),
        }
    }

    /// Organizationally unique identifier of this device's MAC.
    pub fn oui(&self) -> &str {
        oui(&self.mac)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} (vlan {})", self.mac_full, self.interface, self.vlan)
    }
}

/// Normalize a MAC address: lower-case, with `:`, `.` and `-` separators removed.
///
/// Total and idempotent; input that is not a MAC is passed through lower-cased.
pub fn normalize_mac(mac: &str) -> String {
    mac.chars()
        .filter(|c| !matches!(c, ':' | '.' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// First six hex characters of a normalized MAC.
///
/// Returns the whole input when it is shorter than six characters.
pub fn oui(normalized: &str) -> &str {
    normalized.get(..6).unwrap_or(normalized)
}

/// Expand a normalized MAC into colon separated pairs.
pub fn format_mac(normalized: &str) -> String {
    let mut out = String::with_capacity(normalized.len() + normalized.len() / 2);
    for (i, c) in normalized.chars().enumerate() {
        if i > 0 && i % 2 == 0 {
            out.push(':');
        }
        out.push(c);
    }
    out
}

/// Whether `s` is a normalized 48-bit MAC (12 lower-case hex characters).
pub fn is_plain_mac(s: &str) -> bool {
    s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
