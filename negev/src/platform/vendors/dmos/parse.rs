//! Parsers for DmOS `show` output.
//!
//! Most DmOS reports are label/value blocks rather than tables:
//!
//! ```text
//! Information of Eth 1/25:
//!  Native VLAN:                   1
//!  Allowed VLANs:                  1(s,t),    10(s,t),    11(s,t),
//!                                 20(s,t),    21(s,t)
//!  Forbidden VLANs:
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Device, InterfaceSet, Port, VlanSet, is_plain_mac, normalize_mac};
use crate::platform::parse::{contains_hint, is_separator_line};

static VLAN_TABLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^VLAN\s+(\d+)\s*(?:\[.*?\])?:\s*").unwrap());

static VLAN_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\d{1,4})\b").unwrap());

static PORT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)ethernet\s+\d+/\d+(?:/\d+)?").unwrap());

static COLUMN_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

static BLOCK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Information of\s+Eth\w*\s+(\d+/\d+(?:/\d+)?)").unwrap()
});

static MAC_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\d+\s+\w*\s+Eth\s+(\d+/\d+)\s+([0-9A-F:]+)\s+(\d+)\s+.*Learned").unwrap()
});

const COMMAND_ERROR_HINTS: &[&str] = &["unknown command", "invalid", "incomplete", "syntax error"];

const TAGGED_MEMBER: &str = "(s,t)";

pub(super) fn is_command_error(output: &str) -> bool {
    contains_hint(output, COMMAND_ERROR_HINTS)
}

/// Canonical DmOS port name: lower-case, `ethernet ` prefixed.
pub fn normalize_port(interface: &str) -> String {
    let trimmed = interface.trim().to_lowercase();
    if trimmed.starts_with("ethernet") {
        trimmed
    } else {
        format!("ethernet {trimmed}")
    }
}

/// Interface named by an `Information of Eth X/Y` block header.
fn block_interface(line: &str) -> Option<String> {
    BLOCK_HEADER
        .captures(line)
        .map(|caps| format!("ethernet {}", &caps[1]))
}

/// `VLAN 10 [name]: static, active` rows, or rows led by a VLAN number.
pub(super) fn parse_vlan_list(output: &str) -> VlanSet {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            VLAN_TABLE_LINE
                .captures(line)
                .or_else(|| VLAN_PREFIX.captures(line))
                .map(|caps| caps[1].to_string())
        })
        .collect()
}

/// Tagged-ports column of `show vlan port`.
pub(super) fn parse_vlan_port_trunks(output: &str) -> InterfaceSet {
    let mut trunks = InterfaceSet::new();
    for line in output.lines().map(str::trim) {
        if line.is_empty()
            || is_separator_line(line)
            || !line.starts_with(|c: char| c.is_ascii_digit())
        {
            continue;
        }
        let Some(tagged) = COLUMN_GAP.split(line).nth(1) else {
            continue;
        };
        for port in PORT_NAME.find_iter(tagged) {
            let name = port.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
            trunks.insert(name.to_lowercase());
        }
    }
    trunks
}

/// Ports whose allowed-VLAN list has tagged members.
pub(super) fn parse_switchport_trunks(output: &str) -> InterfaceSet {
    let mut trunks = InterfaceSet::new();
    let mut current: Option<String> = None;
    let mut in_allowed = false;

    for line in output.lines().map(str::trim) {
        if let Some(interface) = block_interface(line) {
            current = Some(interface);
            in_allowed = false;
            continue;
        }
        let Some(interface) = current.as_ref() else {
            continue;
        };

        if line.contains("Allowed VLANs:") {
            in_allowed = true;
        } else if in_allowed && line.contains(':') {
            // next label, e.g. "Forbidden VLANs:"
            in_allowed = false;
            continue;
        }

        if in_allowed && line.contains(TAGGED_MEMBER) {
            trunks.insert(interface.clone());
            in_allowed = false;
        }
    }
    trunks
}

/// Native (untagged) VLAN of every port in the switchport report.
pub(super) fn parse_native_vlans(output: &str) -> HashMap<String, String> {
    let mut vlans = HashMap::new();
    let mut current: Option<String> = None;

    for line in output.lines().map(str::trim) {
        if let Some(interface) = block_interface(line) {
            current = Some(interface);
            continue;
        }
        if let (Some(interface), Some(value)) = (current.as_ref(), line.strip_prefix("Native VLAN:")) {
            if let Some(vlan) = value.split_whitespace().next() {
                vlans.insert(interface.clone(), vlan.to_string());
            }
        }
    }
    vlans
}

/// Sort key ordering `ethernet 1/4` before `ethernet 1/25`.
fn port_sort_key(name: &str) -> (Vec<u32>, String) {
    let numbers = name
        .split_whitespace()
        .nth(1)
        .map(|unit_port| {
            unit_port
                .split('/')
                .map(|n| n.parse::<u32>().unwrap_or(0))
                .collect()
        })
        .unwrap_or_default();
    (numbers, name.to_string())
}

/// Link-up ports from the per-interface status blocks.
///
/// The VLAN is left empty; the status report does not carry it.
pub(super) fn parse_interface_status(output: &str) -> Vec<Port> {
    let mut ports = Vec::new();
    let mut current: Option<(String, bool)> = None;

    for line in output.lines().map(str::trim) {
        if let Some(interface) = block_interface(line) {
            if let Some((name, true)) = current.take() {
                ports.push(Port::new(name, ""));
            }
            current = Some((interface, false));
            continue;
        }
        if let (Some((_, up)), Some(status)) = (current.as_mut(), line.strip_prefix("Link status:")) {
            *up = status.trim().eq_ignore_ascii_case("up");
        }
    }
    if let Some((name, true)) = current {
        ports.push(Port::new(name, ""));
    }

    ports.sort_by_cached_key(|port| port_sort_key(&port.interface));
    ports
}

/// Learned entries of the MAC table, minus anything seen on a trunk.
pub(super) fn parse_mac_table(output: &str, trunks: &InterfaceSet) -> Vec<Device> {
    output
        .lines()
        .filter_map(|line| MAC_ENTRY.captures(line))
        .filter_map(|caps| {
            let interface = format!("ethernet {}", &caps[1]);
            if trunks.contains(&interface) {
                return None;
            }
            let mac = normalize_mac(&caps[2]);
            is_plain_mac(&mac).then(|| Device::new(&caps[3], &mac, interface))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(items: &[&str]) -> std::collections::BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_vlan_table() {
        let output = "\
VLAN 1 [DefaultVlan]: static, active
VLAN 10: static, active
VLAN 20: static, active
VLAN 100: static, active
";
        assert_eq!(parse_vlan_list(output), set(&["1", "10", "20", "100"]));
    }

    #[test]
    fn test_parse_vlan_simple_format() {
        let output = "\
VLAN Name          Type
1    default       active
10   users         active
20   guests        active
";
        assert_eq!(parse_vlan_list(output), set(&["1", "10", "20"]));
    }

    #[test]
    fn test_parse_vlan_port_trunks() {
        let output = "\
VLAN   Tagged Ports             Untagged Ports
-----  -----------------------  ----------------------
10     ethernet 1/24            ethernet 1/1
20     ethernet 1/24
";
        assert_eq!(parse_vlan_port_trunks(output), set(&["ethernet 1/24"]));
    }

    const SWITCHPORT: &str = "\
Information of Eth 1/1:
 Native VLAN:                   12
 Allowed VLANs:                 12(s,u)
Information of Eth 1/11:
 Native VLAN:                   12
 Allowed VLANs:                 12(s,u),    30(s,u)
Information of Eth 1/25:
 Native VLAN:                   1
 Allowed VLANs:                  1(s,u),    10(s,t),    11(s,t),    12(s,t),
                                20(s,t),    21(s,t),    22(s,t),    30(s,t)
 Forbidden VLANs:
Information of Eth 1/26:
 Allowed VLANs:                  1(s,u),
                                10(s,t),    11(s,t)
 Forbidden VLANs:
Information of Eth 1/27:
 Allowed VLANs:                  1(s,u)
 Forbidden VLANs:               10(s,t)
";

    #[test]
    fn test_parse_switchport_trunks() {
        assert_eq!(
            parse_switchport_trunks(SWITCHPORT),
            set(&["ethernet 1/25", "ethernet 1/26"])
        );
    }

    #[test]
    fn test_parse_native_vlans() {
        let vlans = parse_native_vlans(SWITCHPORT);
        assert_eq!(vlans.len(), 3);
        assert_eq!(vlans["ethernet 1/1"], "12");
        assert_eq!(vlans["ethernet 1/11"], "12");
        assert_eq!(vlans["ethernet 1/25"], "1");
    }

    #[test]
    fn test_parse_interface_status() {
        let output = "\
Information of  Eth 1/25
 Current status:
  Link status:            Up
  Operation speed-duplex: 1000M full

Information of  Eth 1/1
 Current status:
  Link status:            Down

Information of  Eth 1/4
 Current status:
  Link status:            Up
  Operation speed-duplex: 10M full
";
        assert_eq!(
            parse_interface_status(output),
            vec![Port::new("ethernet 1/4", ""), Port::new("ethernet 1/25", "")]
        );
    }

    #[test]
    fn test_parse_mac_table() {
        let output = "\
Unit Block Interface MAC Address       VLAN VPN Type
   1       Eth  1/4  5E:15:F4:01:9A:57   10   - Learned
   1       Eth  1/25 B0:7D:47:CE:A2:AF  201   - Learned
   1       Eth  1/6  18:0D:2C:0D:B3:0A   32   - Learned
";
        let devices = parse_mac_table(output, &set(&["ethernet 1/25"]));
        assert_eq!(
            devices,
            vec![
                Device::new("10", "5e15f4019a57", "ethernet 1/4"),
                Device::new("32", "180d2c0db30a", "ethernet 1/6"),
            ]
        );
    }

    #[test]
    fn test_normalize_port() {
        assert_eq!(normalize_port("1/4"), "ethernet 1/4");
        assert_eq!(normalize_port(" Ethernet 1/4 "), "ethernet 1/4");
    }

    #[test]
    fn test_port_sort_key() {
        assert!(port_sort_key("ethernet 1/4") < port_sort_key("ethernet 1/25"));
        assert!(port_sort_key("ethernet 1/25") < port_sort_key("ethernet 2/1"));
    }

    #[test]
    fn test_command_error() {
        assert!(is_command_error("% Unknown command."));
        assert!(is_command_error("syntax error: unknown element"));
        assert!(!is_command_error("VLAN 10: static, active"));
    }
}
