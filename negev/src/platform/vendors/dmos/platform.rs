//! Datacom DmOS driver.
//!
//! DmOS reports are slow and block-structured. Trunks are ports carrying
//! tagged VLAN members; access assignment goes through the VLAN interface's
//! untagged member list plus the port's native VLAN.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace, warn};

use super::parse;
use super::parse::normalize_port;
use crate::error::Result;
use crate::model::{Device, InterfaceSet, Port, VlanSet};
use crate::platform::SwitchDriver;
use crate::platform::parse::query_candidates;
use crate::policy::{RAW_OUTPUT_TARGET, SwitchPolicy};
use crate::session::{AuthPrompt, PRIVILEGED_PROMPT, Session};
use crate::transport::config::SLOW_PLATFORM_TIMEOUT;

const SHOW_SWITCHPORT: &str = "show interface switchport";
const SHOW_VLAN_PORT: &str = "show vlan port";

/// Driver for Datacom DmOS switches.
#[derive(Debug, Default, Clone, Copy)]
pub struct DmosDriver;

impl DmosDriver {
    pub const NAME: &'static str = "dmos";

    pub fn new() -> Self {
        Self
    }

    /// Fill in each port's native VLAN from the switchport report.
    ///
    /// Ports stay at an empty VLAN when the report is unavailable.
    async fn enrich_native_vlans(
        &self,
        session: &mut dyn Session,
        policy: &SwitchPolicy,
        ports: &mut [Port],
    ) {
        let output = match session.execute_command(SHOW_SWITCHPORT).await {
            Ok(output) if !parse::is_command_error(&output) => output,
            Ok(_) => {
                warn!("Switch rejected {:?}; current port VLANs unknown", SHOW_SWITCHPORT);
                return;
            }
            Err(e) => {
                warn!("Failed to read port VLANs: {}", e);
                return;
            }
        };
        if policy.is_raw_output_enabled() {
            trace!(
                target: RAW_OUTPUT_TARGET,
                "Raw output of {:?}:\n{}",
                SHOW_SWITCHPORT,
                output
            );
        }

        let native = parse::parse_native_vlans(&output);
        for port in ports.iter_mut() {
            if let Some(vlan) = native.get(&port.interface) {
                port.vlan = vlan.clone();
            }
        }
    }
}

#[async_trait]
impl SwitchDriver for DmosDriver {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn detect(&self, session: &mut dyn Session) -> Result<bool> {
        let output = session.execute_command("show version").await?.to_lowercase();
        Ok(output.contains("dmos") || output.contains("datacom"))
    }

    fn authentication_sequence(
        &self,
        username: &str,
        password: &str,
        _enable_password: &str,
    ) -> Vec<AuthPrompt> {
        vec![
            AuthPrompt::login("login:", username),
            AuthPrompt::login("Password:", password),
            AuthPrompt::wait(PRIVILEGED_PROMPT),
        ]
    }

    fn command_timeout(&self) -> Duration {
        SLOW_PLATFORM_TIMEOUT
    }

    async fn vlan_list(&self, session: &mut dyn Session, policy: &SwitchPolicy) -> Result<VlanSet> {
        let vlans = query_candidates(
            session,
            policy,
            "VLAN list",
            &["show vlan table", "show vlan"],
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
            &[SHOW_SWITCHPORT, SHOW_VLAN_PORT],
            parse::is_command_error,
            |command, output| match command {
                SHOW_SWITCHPORT => parse::parse_switchport_trunks(output),
                _ => parse::parse_vlan_port_trunks(output),
            },
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
        let mut ports = query_candidates(
            session,
            policy,
            "interface status",
            &["show interfaces status"],
            parse::is_command_error,
            |_, output| parse::parse_interface_status(output),
        )
        .await?;

        if !ports.is_empty() {
            self.enrich_native_vlans(session, policy, &mut ports).await;
        }
        debug!("Found {} active ports", ports.len());
        Ok(ports)
    }

    async fn mac_table(&self, session: &mut dyn Session, policy: &SwitchPolicy) -> Result<Vec<Device>> {
        let trunks = self.trunk_interfaces(session, policy).await?;
        let devices = query_candidates(
            session,
            policy,
            "MAC table",
            &["show mac-address-table dynamic", "show mac-address-table"],
            parse::is_command_error,
            |_, output| parse::parse_mac_table(output, &trunks),
        )
        .await?;
        debug!("Found {} devices in MAC table", devices.len());
        Ok(devices)
    }

    fn configure_access_commands(&self, interface: &str, vlan: &str) -> Vec<String> {
        let port = normalize_port(interface);
        vec![
            "configure terminal".to_string(),
            format!("interface vlan {vlan}"),
            format!("set-member untagged {port}"),
            "exit".to_string(),
            format!("interface {port}"),
            format!("switchport native vlan {vlan}"),
            "switchport acceptable-frame-type all".to_string(),
            "exit".to_string(),
            "end".to_string(),
        ]
    }

    fn create_vlan_commands(&self, vlan: &str) -> Vec<String> {
        vec![
            "configure terminal".to_string(),
            format!("interface vlan {vlan}"),
            "exit".to_string(),
            "end".to_string(),
        ]
    }

    fn delete_vlan_commands(&self, vlan: &str) -> Vec<String> {
        vec![
            "configure terminal".to_string(),
            format!("no interface vlan {vlan}"),
            "end".to_string(),
        ]
    }

    fn save_commands(&self) -> Vec<String> {
        vec![
            "copy running-config startup-config".to_string(),
            "save".to_string(),
        ]
    }

    fn is_command_error(&self, output: &str) -> bool {
        parse::is_command_error(output)
    }

    fn interface_eq(&self, a: &str, b: &str) -> bool {
        normalize_port(a) == normalize_port(b)
    }
}
