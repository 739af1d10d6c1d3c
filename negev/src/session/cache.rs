//! Session cache keyed by switch and credentials.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::Session;
use super::builder::SessionBuilder;
use super::cli::CliSession;
use crate::error::Result;
use crate::policy::SwitchPolicy;

/// A session shared between callers; lock it for the length of a conversation.
pub type SharedSession = Arc<Mutex<CliSession>>;

/// Cache key for a policy: SHA-256 over transport, target and credentials.
///
/// Passwords only ever appear hashed. Fields are separated so `("ab", "c")`
/// and `("a", "bc")` hash differently.
pub fn cache_key(policy: &SwitchPolicy) -> String {
    let creds = &policy.credentials;
    let mut hasher = Sha256::new();
    for field in [
        policy.transport.as_str(),
        policy.target.as_str(),
        creds.username.as_str(),
        creds.password.expose_secret(),
        creds.enable_password.expose_secret(),
    ] {
        hasher.update(field.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Process-wide pool of sessions.
///
/// Sessions are created disconnected and connected lazily by their users.
#[derive(Default)]
pub struct ClientCache {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for this policy, creating it on first use.
    pub async fn get(&self, policy: &SwitchPolicy) -> Result<SharedSession> {
        let key = cache_key(policy);
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.get(&key) {
            debug!("Reusing session for {}", policy.target);
            return Ok(Arc::clone(session));
        }

        debug!("Creating {} session for {}", policy.transport, policy.target);
        let session = Arc::new(Mutex::new(SessionBuilder::from_policy(policy).build()?));
        sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Disconnect and evict every cached session.
    ///
    /// Disconnect failures are logged; the cache is empty afterwards either way.
    pub async fn close_all(&self) {
        let drained: Vec<(String, SharedSession)> = self.sessions.lock().await.drain().collect();
        for (_, session) in drained {
            let mut session = session.lock().await;
            if let Err(e) = session.disconnect().await {
                warn!("Failed to disconnect from {}: {}", session.config().host, e);
            }
        }
    }
}
