//! Platform registry: lookup by name and auto-detection.

use std::sync::{Arc, LazyLock};

use log::{debug, info};

use super::vendors::{dmos::DmosDriver, ios::IosDriver};
use super::{AUTO_DETECT, SwitchDriver};
use crate::error::{Error, PlatformError, Result};
use crate::policy::SwitchPolicy;
use crate::session::Session;

static REGISTRY: LazyLock<PlatformRegistry> = LazyLock::new(PlatformRegistry::default);

/// Ordered set of switch drivers.
///
/// Detection tries drivers in registration order, so the built-in order
/// (`ios`, then `dmos`) is significant.
pub struct PlatformRegistry {
    drivers: Vec<Arc<dyn SwitchDriver>>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// The registry of built-in drivers.
    pub fn global() -> &'static PlatformRegistry {
        &REGISTRY
    }

    /// Register a driver after the existing ones.
    pub fn register(&mut self, driver: Arc<dyn SwitchDriver>) -> Result<()> {
        if self.contains(driver.name()) {
            return Err(PlatformError::AlreadyRegistered {
                name: driver.name().to_string(),
            }
            .into());
        }
        self.drivers.push(driver);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers.iter().any(|d| d.name() == name)
    }

    /// Look a driver up by name, ignoring case and surrounding whitespace.
    pub fn get(&self, name: &str) -> Result<Arc<dyn SwitchDriver>> {
        let wanted = name.trim().to_lowercase();
        self.drivers
            .iter()
            .find(|d| d.name() == wanted)
            .cloned()
            .ok_or_else(|| PlatformError::UnknownPlatform { name: wanted }.into())
    }

    /// Registered platform names, in detection order.
    pub fn available(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    /// Try every driver against the device and return the first that claims it.
    ///
    /// Connects the session first if needed. When no driver matched and every
    /// check failed, the last detection error is returned instead of
    /// [`PlatformError::DetectionFailed`].
    pub async fn detect(&self, session: &mut dyn Session) -> Result<Arc<dyn SwitchDriver>> {
        if !session.is_connected() {
            session.connect().await?;
        }

        let mut last_err: Option<Error> = None;
        let mut answered = false;
        for driver in &self.drivers {
            match driver.detect(session).await {
                Ok(true) => {
                    info!("Detected platform {}", driver.name());
                    return Ok(Arc::clone(driver));
                }
                Ok(false) => {
                    debug!("Platform {} does not match", driver.name());
                    answered = true;
                }
                Err(e) => {
                    debug!("Platform {} detection failed: {}", driver.name(), e);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if !answered => Err(e),
            _ => Err(PlatformError::DetectionFailed.into()),
        }
    }

    /// Driver named by the policy, probing the device for `auto`.
    pub async fn resolve(
        &self,
        policy: &SwitchPolicy,
        session: &mut dyn Session,
    ) -> Result<Arc<dyn SwitchDriver>> {
        if policy.platform.trim().eq_ignore_ascii_case(AUTO_DETECT) {
            self.detect(session).await
        } else {
            self.get(&policy.platform)
        }
    }
}

impl Default for PlatformRegistry {
    fn default() -> Self {
        Self {
            drivers: vec![Arc::new(IosDriver::new()), Arc::new(DmosDriver::new())],
        }
    }
}
