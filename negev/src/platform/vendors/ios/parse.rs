//! Parsers for IOS `show` output.
//!
//! ```text
//! VLAN Name                             Status    Ports
//! ---- -------------------------------- --------- -------------------------------
//! 1    default                          active    Gi1/0/1, Gi1/0/2
//!
//! Port      Name               Status       Vlan       Duplex Speed Type
//! Gi1/0/1                      connected    10         a-full a-100 10/100/1000
//!
//!    VLAN    MAC Address       Type        Ports
//!    10      0011.2233.4455    DYNAMIC     Gi1/0/1
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Device, InterfaceSet, Port, VlanSet, is_plain_mac, normalize_mac};
use crate::platform::parse::{contains_hint, is_separator_line};

static VLAN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:vlan\s+)?(\d{1,4})\b").unwrap());

static INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+\d+(?:/\d+){0,2}$").unwrap());

static MAC_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\s*(\d+)\s+([0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4}\.[0-9A-Fa-f]{4})\s+DYNAMIC\s+(\S+)\s*$",
    )
    .unwrap()
});

const COMMAND_ERROR_HINTS: &[&str] = &[
    "invalid input",
    "unknown command",
    "incomplete command",
    "ambiguous command",
    "unrecognized command",
    "invalid command",
    "syntax error",
    "cannot find command",
];

/// Status tokens that mean the link is up.
const UP_STATUSES: &[&str] = &["connected", "up", "forward", "monitor", "active", "link-up"];

pub(super) fn is_command_error(output: &str) -> bool {
    contains_hint(output, COMMAND_ERROR_HINTS)
}

fn content_lines(output: &str) -> impl Iterator<Item = &str> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_separator_line(line))
}

pub(super) fn parse_vlan_list(output: &str) -> VlanSet {
    content_lines(output)
        .filter_map(|line| VLAN_LINE.captures(line))
        .map(|caps| caps[1].to_string())
        .collect()
}

/// First column of every row that names an interface.
pub(super) fn parse_trunks(output: &str) -> InterfaceSet {
    content_lines(output)
        .filter_map(|line| line.split_whitespace().next())
        .filter(|field| INTERFACE.is_match(field))
        .map(str::to_lowercase)
        .collect()
}

/// Link-up rows of `show interfaces status`, sorted by name ignoring case.
///
/// The description column is free text, so the status is located by token
/// and the VLAN is the field after it.
pub(super) fn parse_interface_status(output: &str) -> Vec<Port> {
    let mut ports: Vec<Port> = content_lines(output)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 || !INTERFACE.is_match(fields[0]) {
                return None;
            }
            let status = fields[1..]
                .iter()
                .position(|f| UP_STATUSES.contains(&f.to_lowercase().as_str()))?
                + 1;
            let vlan = fields.get(status + 1)?;
            if vlan.eq_ignore_ascii_case("trunk") || VLAN_LINE.is_match(vlan) {
                Some(Port::new(fields[0], vlan.to_lowercase()))
            } else {
                None
            }
        })
        .collect();

    ports.sort_by_key(|port| port.interface.to_lowercase());
    ports
}

/// Dynamic entries of the MAC table, minus anything learned on a trunk.
pub(super) fn parse_mac_table(output: &str, trunks: &InterfaceSet) -> Vec<Device> {
    MAC_ENTRY
        .captures_iter(output)
        .filter_map(|caps| {
            let (vlan, mac, interface) = (&caps[1], &caps[2], &caps[3]);
            if !INTERFACE.is_match(interface) || trunks.contains(&interface.to_lowercase()) {
                return None;
            }
            let plain = normalize_mac(mac);
            is_plain_mac(&plain).then(|| Device::new(vlan, &plain, interface))
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
    fn test_parse_vlan_brief() {
        let output = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Gi1/0/1, Gi1/0/2
10   USERS                            active    Gi1/0/3
20   SERVERS                          active    Gi1/0/4
                                                Gi1/0/5, Gi1/0/6
";
        assert_eq!(parse_vlan_list(output), set(&["1", "10", "20"]));
    }

    #[test]
    fn test_parse_vlan_prefixed_rows() {
        assert_eq!(parse_vlan_list("vlan 30\nVLAN 40 name x\n"), set(&["30", "40"]));
    }

    #[test]
    fn test_parse_trunks() {
        let output = "\
Port        Mode         Encapsulation  Status        Native vlan
Gi1/0/24    on           802.1q         trunking      10
Po1         on           802.1q         trunking      1

Port        Vlans allowed on trunk
Gi1/0/24    1-4094
";
        assert_eq!(parse_trunks(output), set(&["gi1/0/24", "po1"]));
    }

    #[test]
    fn test_parse_interface_status() {
        let output = "\
Port      Name               Status       Vlan       Duplex Speed Type
Gi1/0/3                      connected    trunk      a-full a-1000 10/100/1000
Gi1/0/1   Front desk         connected    10         a-full a-100 10/100/1000
Gi1/0/2                      notconnect   1          auto   auto  10/100/1000
";
        assert_eq!(
            parse_interface_status(output),
            vec![Port::new("Gi1/0/1", "10"), Port::new("Gi1/0/3", "trunk")]
        );
    }

    #[test]
    fn test_parse_mac_table_skips_trunks() {
        let output = "\
          Mac Address Table
-------------------------------------------

   VLAN    MAC Address       Type        Ports
   ----    -----------       --------    -----
   10      0011.2233.4455    DYNAMIC     Gi1/0/1
   20      aa11.bb22.cc33    DYNAMIC     Gi1/0/24
   1       0011.2233.4466    STATIC      CPU
Total Mac Addresses for this criterion: 3
";
        let devices = parse_mac_table(output, &set(&["gi1/0/24"]));
        assert_eq!(devices, vec![Device::new("10", "0011.2233.4455", "Gi1/0/1")]);
        assert_eq!(devices[0].mac, "001122334455");
        assert_eq!(devices[0].mac_full, "00:11:22:33:44:55");
    }

    #[test]
    fn test_command_error() {
        assert!(is_command_error(
            "         ^\n% Invalid input detected at '^' marker."
        ));
        assert!(is_command_error("% Ambiguous command:  \"show v\""));
        assert!(!is_command_error("1    default    active"));
    }
}
