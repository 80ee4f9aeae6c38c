//! Camera permission gate
//!
//! Tracks whether the camera capability is authorized for this process and
//! asks the permission facility once per capture request. The token starts
//! out unknown on every launch and is never persisted.

pub mod console;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

pub use console::{ConsentPolicy, ConsolePermission};

/// A guarded OS capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Camera,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Camera => "camera",
        }
    }
}

/// Answer from the permission facility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Granted,
    Denied,
}

/// Tri-state authorization status for a capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapabilityToken {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl From<AuthorizationOutcome> for CapabilityToken {
    fn from(outcome: AuthorizationOutcome) -> Self {
        match outcome {
            AuthorizationOutcome::Granted => CapabilityToken::Granted,
            AuthorizationOutcome::Denied => CapabilityToken::Denied,
        }
    }
}

/// Platform facility that authorizes capabilities, possibly by asking the user
#[async_trait]
pub trait PermissionFacility: Send + Sync {
    async fn request(&self, capability: Capability) -> AuthorizationOutcome;
}

/// Guards the capture stage behind camera authorization
pub struct PermissionGate {
    facility: Arc<dyn PermissionFacility>,
    token: RwLock<CapabilityToken>,
}

impl PermissionGate {
    pub fn new(facility: Arc<dyn PermissionFacility>) -> Self {
        Self {
            facility,
            token: RwLock::new(CapabilityToken::Unknown),
        }
    }

    /// Current authorization status
    pub fn token(&self) -> CapabilityToken {
        *self.token.read()
    }

    /// Ask for camera access and record the answer
    ///
    /// The facility is consulted on every call; it may answer immediately
    /// when the capability was granted before.
    pub async fn ensure_capture_authorized(&self) -> AuthorizationOutcome {
        debug!(
            "Requesting {} permission (currently {:?})",
            Capability::Camera.as_str(),
            self.token()
        );

        let outcome = self.facility.request(Capability::Camera).await;
        *self.token.write() = outcome.into();

        info!("Camera permission: {:?}", outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::ScriptedPermission;

    #[tokio::test]
    async fn test_token_starts_unknown() {
        let gate = PermissionGate::new(Arc::new(ScriptedPermission::new(
            AuthorizationOutcome::Granted,
        )));
        assert_eq!(gate.token(), CapabilityToken::Unknown);
    }

    #[tokio::test]
    async fn test_grant_updates_token() {
        let facility = Arc::new(ScriptedPermission::new(AuthorizationOutcome::Granted));
        let gate = PermissionGate::new(facility.clone());

        assert_eq!(gate.ensure_capture_authorized().await, AuthorizationOutcome::Granted);
        assert_eq!(gate.token(), CapabilityToken::Granted);
        assert_eq!(facility.requests(), 1);
    }

    #[tokio::test]
    async fn test_deny_updates_token() {
        let gate = PermissionGate::new(Arc::new(ScriptedPermission::new(
            AuthorizationOutcome::Denied,
        )));

        assert_eq!(gate.ensure_capture_authorized().await, AuthorizationOutcome::Denied);
        assert_eq!(gate.token(), CapabilityToken::Denied);
    }

    #[tokio::test]
    async fn test_each_invocation_asks_again() {
        let facility = Arc::new(ScriptedPermission::new(AuthorizationOutcome::Denied));
        let gate = PermissionGate::new(facility.clone());

        gate.ensure_capture_authorized().await;
        gate.ensure_capture_authorized().await;
        assert_eq!(facility.requests(), 2);
    }
}
