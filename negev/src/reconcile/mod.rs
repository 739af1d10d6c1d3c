//! VLAN reconciliation engine.
//!
//! One pass over a switch: optionally sync the VLAN table against the allowed
//! list, then move every unambiguous access port into the VLAN its device's
//! OUI maps to, then save. Ambiguity (several MACs on a port, unknown target
//! VLAN) always resolves to leaving the port alone.
//!
//! Command sequences are sent line by line with no rollback. A failure half
//! way through a block leaves the switch partly configured.

mod report;

pub use report::{Persistence, PortChange, RunReport, SkipReason};

use std::collections::HashSet;
use std::ops::RangeInclusive;

use log::{debug, error, info, warn};
use secrecy::ExposeSecret;

use crate::error::{ReconcileError, Result};
use crate::model::{Device, InterfaceSet, Port, VlanSet, normalize_mac, oui};
use crate::platform::SwitchDriver;
use crate::policy::SwitchPolicy;
use crate::session::Session;

/// VLAN IDs never deleted by sync, whatever the policy says.
pub const PROTECTED_VLAN_RANGE: RangeInclusive<u32> = 1000..=4094;

/// Whether sync must keep `vlan`: explicitly protected, or in the reserved range.
pub fn is_protected_vlan(vlan: &str, protected: &[String]) -> bool {
    protected.iter().any(|p| p.trim() == vlan)
        || vlan
            .parse::<u32>()
            .is_ok_and(|id| PROTECTED_VLAN_RANGE.contains(&id))
}

/// Switch state gathered before the port loop.
struct Inventory {
    existing: VlanSet,
    trunks: InterfaceSet,
    devices: Vec<Device>,
    excluded_ports: HashSet<String>,
}

/// Reconciles one switch's access ports against a policy.
pub struct VlanService<'a> {
    session: &'a mut dyn Session,
    driver: &'a dyn SwitchDriver,
    policy: &'a SwitchPolicy,
}

impl<'a> VlanService<'a> {
    /// Bind a session to a driver and policy.
    ///
    /// Applies the driver's command timeout and login script to the session;
    /// the login script takes effect on the next connect.
    pub fn new(
        session: &'a mut dyn Session,
        driver: &'a dyn SwitchDriver,
        policy: &'a SwitchPolicy,
    ) -> Self {
        let creds = &policy.credentials;
        session.set_timeout(driver.command_timeout());
        session.set_auth_sequence(driver.authentication_sequence(
            &creds.username,
            creds.password.expose_secret(),
            creds.enable_password.expose_secret(),
        ));
        Self {
            session,
            driver,
            policy,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// Discovery failures and VLAN sync failures abort the run. Per-port
    /// problems are logged, recorded in the report and skipped.
    pub async fn process_ports(&mut self) -> Result<RunReport> {
        let mut report = RunReport::default();

        if !self.session.is_connected() {
            self.session.connect().await?;
        }

        let mut existing = self.get_vlan_list().await?;
        if existing.is_empty() {
            warn!("No VLANs reported by {}", self.policy.target);
        }
        if self.policy.create_vlans {
            self.sync_vlans(&mut existing, &mut report).await?;
        }

        let trunks = self.get_trunk_interfaces().await?;
        let ports = self.get_active_ports().await?;
        if ports.is_empty() {
            info!("No active ports found");
            return Ok(report);
        }

        let devices = self.get_mac_table().await?;
        if devices.is_empty() {
            info!("No devices found in MAC table");
            return Ok(report);
        }

        let inventory = Inventory {
            existing,
            trunks,
            devices,
            excluded_ports: self.policy.excluded_ports(),
        };
        for port in &ports {
            self.process_port(port, &inventory, &mut report).await;
        }

        report.persistence = self.persist(report.changed).await;
        Ok(report)
    }

    pub async fn get_vlan_list(&mut self) -> Result<VlanSet> {
        self.driver.vlan_list(&mut *self.session, self.policy).await
    }

    pub async fn get_trunk_interfaces(&mut self) -> Result<InterfaceSet> {
        self.driver
            .trunk_interfaces(&mut *self.session, self.policy)
            .await
    }

    pub async fn get_active_ports(&mut self) -> Result<Vec<Port>> {
        self.driver.active_ports(&mut *self.session, self.policy).await
    }

    pub async fn get_mac_table(&mut self) -> Result<Vec<Device>> {
        self.driver.mac_table(&mut *self.session, self.policy).await
    }

    /// Put `interface` into access VLAN `vlan`.
    ///
    /// In sandbox mode the commands are only logged. Otherwise every line is
    /// sent even after a failure; the failed lines are returned.
    pub async fn configure_vlan(&mut self, interface: &str, vlan: &str) -> Vec<String> {
        let commands = self.driver.configure_access_commands(interface, vlan);
        if self.policy.sandbox {
            info!("[sandbox] Would move {} to VLAN {}:", interface, vlan);
            for command in &commands {
                info!("[sandbox]   {}", command);
            }
            return Vec::new();
        }

        let mut failed = Vec::new();
        for command in commands {
            if let Err(reason) = self.run_checked(&command).await {
                error!("Command {:?} failed on {}: {}", command, interface, reason);
                failed.push(command);
            }
        }
        failed
    }

    /// Create `vlan`. Any failing line aborts with an error.
    pub async fn create_vlan(&mut self, vlan: &str) -> Result<()> {
        let commands = self.driver.create_vlan_commands(vlan);
        if self.policy.sandbox {
            info!("[sandbox] Would create VLAN {}:", vlan);
            for command in &commands {
                info!("[sandbox]   {}", command);
            }
            return Ok(());
        }

        for command in &commands {
            self.run_checked(command)
                .await
                .map_err(|reason| ReconcileError::CreateVlan {
                    vlan: vlan.to_string(),
                    reason: format!("{command:?}: {reason}"),
                })?;
        }
        info!("Created VLAN {}", vlan);
        Ok(())
    }

    /// Delete `vlan`. Any failing line aborts with an error.
    pub async fn delete_vlan(&mut self, vlan: &str) -> Result<()> {
        let commands = self.driver.delete_vlan_commands(vlan);
        if self.policy.sandbox {
            info!("[sandbox] Would delete VLAN {}:", vlan);
            for command in &commands {
                info!("[sandbox]   {}", command);
            }
            return Ok(());
        }

        for command in &commands {
            self.run_checked(command)
                .await
                .map_err(|reason| ReconcileError::DeleteVlan {
                    vlan: vlan.to_string(),
                    reason: format!("{command:?}: {reason}"),
                })?;
        }
        info!("Deleted VLAN {}", vlan);
        Ok(())
    }

    /// Send one line; a wire failure or a rejection by the switch is an `Err`
    /// carrying a printable reason.
    async fn run_checked(&mut self, command: &str) -> std::result::Result<(), String> {
        match self.session.execute_command(command).await {
            Ok(output) if self.driver.is_command_error(&output) => Err(output.trim().to_string()),
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }

    async fn sync_vlans(&mut self, existing: &mut VlanSet, report: &mut RunReport) -> Result<()> {
        let policy = self.policy;
        let allowed: VlanSet = policy
            .allowed_vlans
            .iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if allowed.is_empty() {
            info!("Skipping VLAN sync: no allowed_vlans configured");
            return Ok(());
        }

        for vlan in &allowed {
            if !existing.contains(vlan) {
                info!("Creating missing VLAN {}", vlan);
                self.create_vlan(vlan).await?;
                existing.insert(vlan.clone());
                report.vlans_created.push(vlan.clone());
            }
        }

        let extra: Vec<String> = existing
            .iter()
            .filter(|vlan| !allowed.contains(*vlan))
            .cloned()
            .collect();
        for vlan in extra {
            if is_protected_vlan(&vlan, &policy.protected_vlans) {
                info!("Skipping protected VLAN {}", vlan);
                report.vlans_protected.push(vlan);
                continue;
            }
            info!("Deleting VLAN {} (not allowed)", vlan);
            self.delete_vlan(&vlan).await?;
            existing.remove(&vlan);
            report.vlans_deleted.push(vlan);
        }
        Ok(())
    }

    async fn process_port(&mut self, port: &Port, inventory: &Inventory, report: &mut RunReport) {
        let policy = self.policy;
        let name = port.interface.as_str();
        let lower = name.to_lowercase();

        if inventory.excluded_ports.contains(&lower) {
            debug!("Skipping excluded port {}", name);
            report.skip(name, SkipReason::ExcludedPort);
            return;
        }
        if inventory.trunks.contains(&lower) || port.vlan.eq_ignore_ascii_case("trunk") {
            debug!("Skipping trunk port {}", name);
            report.skip(name, SkipReason::Trunk);
            return;
        }

        let found: Vec<&Device> = inventory
            .devices
            .iter()
            .filter(|d| self.driver.interface_eq(&d.interface, name))
            .collect();
        let device = match found.as_slice() {
            [] => {
                debug!("No device on port {}", name);
                report.skip(name, SkipReason::NoDevice);
                return;
            }
            [device] => *device,
            many => {
                let macs: Vec<String> = many.iter().map(|d| d.mac_full.clone()).collect();
                warn!(
                    "Multiple MACs detected on port {}: [{}]. Ignoring port to stay safe.",
                    name,
                    macs.join(", ")
                );
                report.skip(name, SkipReason::MultipleDevices(macs));
                return;
            }
        };

        let mac = normalize_mac(&device.mac);
        if policy.is_mac_excluded(&mac) {
            debug!("Skipping excluded MAC {} on {}", device.mac_full, name);
            report.skip(name, SkipReason::ExcludedMac(device.mac_full.clone()));
            return;
        }

        let prefix = oui(&mac);
        let target = match policy.vlan_for_oui(prefix) {
            Some(vlan) => {
                debug!("OUI {} on {} maps to VLAN {}", prefix, name, vlan);
                vlan
            }
            None => {
                debug!(
                    "OUI {} on {} has no mapping, using default VLAN {:?}",
                    prefix, name, policy.default_vlan
                );
                policy.default_vlan.trim()
            }
        };
        if target.is_empty() {
            debug!("No target VLAN for {} on {}", device.mac_full, name);
            report.skip(name, SkipReason::NoTargetVlan);
            return;
        }

        if !policy.skip_vlan_check && !inventory.existing.contains(target) {
            error!(
                "VLAN {} does not exist on {}; skipping port {}",
                target, policy.target, name
            );
            report.skip(name, SkipReason::MissingVlan(target.to_string()));
            return;
        }

        if port.vlan == target {
            debug!("Port {} already in VLAN {}", name, target);
            report.unchanged.push(name.to_string());
            return;
        }

        info!(
            "Port {} ({}): VLAN {:?} -> {}",
            name, device.mac_full, port.vlan, target
        );
        let failed_commands = self.configure_vlan(name, target).await;
        report.changed = true;
        report.reconfigured.push(PortChange {
            interface: name.to_string(),
            mac: device.mac_full.clone(),
            from_vlan: port.vlan.clone(),
            to_vlan: target.to_string(),
            failed_commands,
        });
    }

    /// Save after changes, trying each candidate until one is accepted.
    async fn persist(&mut self, changed: bool) -> Persistence {
        if !changed {
            info!("No changes required");
            return Persistence::NotNeeded;
        }
        if self.policy.sandbox {
            info!("[sandbox] Changes simulated; configuration not saved");
            return Persistence::Simulated;
        }

        for command in self.driver.save_commands() {
            match self.run_checked(&command).await {
                Ok(()) => {
                    info!("Configuration saved with {:?}", command);
                    return Persistence::Saved(command);
                }
                Err(reason) => warn!("Save with {:?} failed: {}", command, reason),
            }
        }

        warn!(
            "Could not save the configuration on {}; save it manually",
            self.policy.target
        );
        Persistence::Failed
    }
}
