//! # Negev
//!
//! Access VLAN assignment for managed switches, driven by MAC address prefix.
//!
//! Negev logs into a switch over Telnet or SSH, reads its VLAN table, trunk
//! list, link-up ports and dynamic MAC table, and moves every port that has
//! exactly one device behind it into the VLAN mapped to that device's OUI.
//!
//! ## Features
//!
//! - Async Telnet and SSH transports (russh) behind one session API
//! - Scripted login with optional enable escalation
//! - Cisco IOS and Datacom DmOS drivers, with platform auto-detection
//! - Optional VLAN table sync against an allowed list, with protected VLANs
//! - Sandbox mode that prints the configuration instead of sending it
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use negev::{ClientCache, PlatformRegistry, SwitchPolicy, VlanService};
//!
//! # async fn example(policy: SwitchPolicy) -> Result<(), negev::Error> {
//! let cache = ClientCache::new();
//! let shared = cache.get(&policy).await?;
//! let mut session = shared.lock().await;
//!
//! let driver = PlatformRegistry::global().resolve(&policy, &mut *session).await?;
//! let report = VlanService::new(&mut *session, driver.as_ref(), &policy)
//!     .process_ports()
//!     .await?;
//! println!("{} ports reconfigured", report.reconfigured.len());
//!
//! drop(session);
//! cache.close_all().await;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod error;
pub mod model;
pub mod platform;
pub mod policy;
pub mod reconcile;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use model::{Device, Port};
pub use platform::{PlatformRegistry, SwitchDriver};
pub use policy::{Credentials, SwitchPolicy, TransportKind, Verbosity};
pub use reconcile::{Persistence, RunReport, SkipReason, VlanService};
pub use session::{AuthPrompt, CliSession, ClientCache, Session, SessionBuilder};
pub use transport::ConnectionConfig;
