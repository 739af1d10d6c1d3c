//! Cisco IOS driver.
//!
//! Catalyst-style CLI: `show vlan brief`, `show interfaces trunk`,
//! `show interfaces status` and `show mac address-table dynamic`, with
//! `switchport access vlan` for assignment and `write memory` to persist.

use async_trait::async_trait;
use log::debug;

use super::parse;
use crate::error::Result;
use crate::model::{Device, InterfaceSet, Port, VlanSet};
use crate::platform::SwitchDriver;
use crate::platform::parse::query_candidates;
use crate::policy::SwitchPolicy;
use crate::session::Session;

/// Driver for Cisco IOS switches.
#[derive(Debug, Default, Clone, Copy)]
pub struct IosDriver;

impl IosDriver {
    pub const NAME: &'static str = "ios";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SwitchDriver for IosDriver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn detect(&self, session: &mut dyn Session) -> Result<bool> {
        let output = session.execute_command("show version").await?;
        Ok(output.to_lowercase().contains("cisco ios"))
    }

    async fn vlan_list(&self, session: &mut dyn Session, policy: &SwitchPolicy) -> Result<VlanSet> {
        let vlans = query_candidates(
            session,
            policy,
            "VLAN list",
            &["show vlan brief", "show vlan"],
            parse::is_command_error,
            |_, output| parse::parse_vlan_list(output),
        )
        .await?;
        debug!("Existing VLANs: {:?}", vlans);
        Ok(vlans)
    }

    async fn trunk_interfaces(
        &self,
        session: &mut dyn Session,
        policy: &SwitchPolicy,
    ) -> Result<InterfaceSet> {
        let trunks = query_candidates(
            session,
            policy,
            "trunk interfaces",
            &["show interfaces trunk"],
            parse::is_command_error,
            |_, output| parse::parse_trunks(output),
        )
        .await?;
        debug!("Trunk interfaces: {:?}", trunks);
        Ok(trunks)
    }

    async fn active_ports(
        &self,
        session: &mut dyn Session,
        policy: &SwitchPolicy,
    ) -> Result<Vec<Port>> {
        let ports = query_candidates(
            session,
            policy,
            "interface status",
            &["show interfaces status"],
            parse::is_command_error,
            |_, output| parse::parse_interface_status(output),
        )
        .await?;
        debug!("Found {} active ports", ports.len());
        Ok(ports)
    }

    async fn mac_table(&self, session: &mut dyn Session, policy: &SwitchPolicy) -> Result<Vec<Device>> {
        let trunks = self.trunk_interfaces(session, policy).await?;
        let devices = query_candidates(
            session,
            policy,
            "MAC table",
            &["show mac address-table dynamic", "show mac-address-table dynamic"],
            parse::is_command_error,
            |_, output| parse::parse_mac_table(output, &trunks),
        )
        .await?;
        debug!("Found {} devices in MAC table", devices.len());
        Ok(devices)
    }

    fn configure_access_commands(&self, interface: &str, vlan: &str) -> Vec<String> {
        vec![
            "configure terminal".to_string(),
            format!("interface {interface}"),
            "switchport mode access".to_string(),
            format!("switchport access vlan {vlan}"),
            "end".to_string(),
        ]
    }

    fn create_vlan_commands(&self, vlan: &str) -> Vec<String> {
        vec![
            "configure terminal".to_string(),
            format!("vlan {vlan}"),
            "exit".to_string(),
            format!("interface vlan {vlan}"),
            "no shutdown".to_string(),
            "end".to_string(),
        ]
    }

    fn delete_vlan_commands(&self, vlan: &str) -> Vec<String> {
        vec![
            "configure terminal".to_string(),
            format!("interface vlan {vlan}"),
            "shutdown".to_string(),
            "exit".to_string(),
            format!("no interface vlan {vlan}"),
            format!("no vlan {vlan}"),
            "end".to_string(),
        ]
    }

    fn save_commands(&self) -> Vec<String> {
        vec!["write memory".to_string()]
    }

    fn is_command_error(&self, output: &str) -> bool {
        parse::is_command_error(output)
    }

    fn interface_eq(&self, a: &str, b: &str) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, PlatformError};
    use crate::testing::ScriptedSession;
    use pretty_assertions::assert_eq;

    const TRUNKS: &str = "\
Port        Mode         Encapsulation  Status        Native vlan
Gi1/0/24    on           802.1q         trunking      1
";

    const MAC_TABLE: &str = "\
   VLAN    MAC Address       Type        Ports
   ----    -----------       --------    -----
   10      0011.2233.4455    DYNAMIC     Gi1/0/1
   1       aa11.bb22.cc33    DYNAMIC     Gi1/0/24
";

    #[tokio::test]
    async fn test_detect() {
        let driver = IosDriver::new();
        let mut session = ScriptedSession::new().with_response(
            "show version",
            "Cisco IOS Software, C2960X Software (C2960X-UNIVERSALK9-M), Version 15.2(7)E3",
        );
        assert!(driver.detect(&mut session).await.unwrap());

        let mut session =
            ScriptedSession::new().with_response("show version", "DmOS 5.2.0 - Datacom");
        assert!(!driver.detect(&mut session).await.unwrap());
    }

    #[tokio::test]
    async fn test_vlan_list_falls_back_to_show_vlan() {
        let driver = IosDriver::new();
        let mut session = ScriptedSession::new()
            .with_response("show vlan brief", "% Invalid input detected at '^' marker.")
            .with_response("show vlan", "VLAN Name Status\n1 default active\n30 cams active");

        let vlans = driver
            .vlan_list(&mut session, &SwitchPolicy::default())
            .await
            .unwrap();
        assert_eq!(vlans.into_iter().collect::<Vec<_>>(), ["1", "30"]);
    }

    #[tokio::test]
    async fn test_vlan_list_unsupported() {
        let driver = IosDriver::new();
        let mut session = ScriptedSession::new()
            .with_response("show vlan brief", "% Unknown command")
            .with_response("show vlan", "% Unknown command");

        let err = driver
            .vlan_list(&mut session, &SwitchPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::QueryFailed { what: "VLAN list", .. })
        ));
    }

    #[tokio::test]
    async fn test_mac_table_excludes_trunks() {
        let driver = IosDriver::new();
        let mut session = ScriptedSession::new()
            .with_response("show interfaces trunk", TRUNKS)
            .with_response("show mac address-table dynamic", MAC_TABLE);

        let devices = driver
            .mac_table(&mut session, &SwitchPolicy::default())
            .await
            .unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].interface, "Gi1/0/1");
        assert_eq!(
            session.executed(),
            ["show interfaces trunk", "show mac address-table dynamic"]
        );
    }

    #[tokio::test]
    async fn test_mac_table_older_firmware_command() {
        let driver = IosDriver::new();
        let mut session = ScriptedSession::new()
            .with_response("show interfaces trunk", "")
            .with_response(
                "show mac address-table dynamic",
                "% Invalid input detected at '^' marker.",
            )
            .with_response("show mac-address-table dynamic", MAC_TABLE);

        let devices = driver
            .mac_table(&mut session, &SwitchPolicy::default())
            .await
            .unwrap();
        assert_eq!(devices.len(), 2);
    }

    #[test]
    fn test_command_sequences() {
        let driver = IosDriver::new();
        assert_eq!(
            driver.configure_access_commands("Gi1/0/1", "20"),
            [
                "configure terminal",
                "interface Gi1/0/1",
                "switchport mode access",
                "switchport access vlan 20",
                "end",
            ]
        );
        assert_eq!(
            driver.create_vlan_commands("30"),
            [
                "configure terminal",
                "vlan 30",
                "exit",
                "interface vlan 30",
                "no shutdown",
                "end",
            ]
        );
        // `no vlan` must stay in global configuration mode
        assert_eq!(
            driver.delete_vlan_commands("30"),
            [
                "configure terminal",
                "interface vlan 30",
                "shutdown",
                "exit",
                "no interface vlan 30",
                "no vlan 30",
                "end",
            ]
        );
        assert_eq!(driver.save_commands(), ["write memory"]);
    }

    #[test]
    fn test_interface_eq_ignores_case() {
        let driver = IosDriver::new();
        assert!(driver.interface_eq("Gi1/0/1", "gi1/0/1"));
        assert!(!driver.interface_eq("Gi1/0/1", "Gi1/0/10"));
    }
}
