//! Vendor drivers.
//!
//! A [`SwitchDriver`] knows one CLI dialect: which commands list VLANs,
//! trunks, link-up ports and learned MACs, how to read their output, and
//! which command sequences configure, create, delete and save. Drivers hold
//! no connection state; they act on the [`Session`] they are handed.

pub(crate) mod parse;
mod registry;
pub mod vendors;

pub use registry::PlatformRegistry;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Device, InterfaceSet, Port, VlanSet};
use crate::policy::SwitchPolicy;
use crate::session::{AuthPrompt, Session, default_sequence};
use crate::transport::config::DEFAULT_TIMEOUT;

/// Platform name that asks the registry to detect the device.
pub const AUTO_DETECT: &str = "auto";

/// Capability set of one switch dialect.
#[async_trait]
pub trait SwitchDriver: Send + Sync {
    /// Registry name, e.g. `ios`.
    fn name(&self) -> &'static str;

    /// Whether the device on `session` speaks this dialect.
    async fn detect(&self, session: &mut dyn Session) -> Result<bool>;

    /// Login script for this platform.
    fn authentication_sequence(
        &self,
        username: &str,
        password: &str,
        enable_password: &str,
    ) -> Vec<AuthPrompt> {
        default_sequence(username, password, enable_password)
    }

    /// Read deadline for commands on this platform.
    fn command_timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }

    /// VLAN IDs configured on the switch.
    async fn vlan_list(&self, session: &mut dyn Session, policy: &SwitchPolicy) -> Result<VlanSet>;

    /// Trunk interfaces, lower-cased.
    async fn trunk_interfaces(
        &self,
        session: &mut dyn Session,
        policy: &SwitchPolicy,
    ) -> Result<InterfaceSet>;

    /// Link-up ports with their current VLAN.
    async fn active_ports(&self, session: &mut dyn Session, policy: &SwitchPolicy)
    -> Result<Vec<Port>>;

    /// Dynamically learned MACs, never including devices seen on trunks.
    async fn mac_table(&self, session: &mut dyn Session, policy: &SwitchPolicy)
    -> Result<Vec<Device>>;

    /// Commands that make `interface` an access port in `vlan`.
    fn configure_access_commands(&self, interface: &str, vlan: &str) -> Vec<String>;

    fn create_vlan_commands(&self, vlan: &str) -> Vec<String>;

    fn delete_vlan_commands(&self, vlan: &str) -> Vec<String>;

    /// Save candidates, tried in order until one succeeds.
    fn save_commands(&self) -> Vec<String>;

    /// Whether `output` is the switch rejecting a command.
    fn is_command_error(&self, output: &str) -> bool;

    /// Whether two interface names denote the same port.
    fn interface_eq(&self, a: &str, b: &str) -> bool {
        a == b
    }
}
