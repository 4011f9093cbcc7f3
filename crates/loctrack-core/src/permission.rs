//! Location permission gate.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::traits::PermissionGate;

/// A permission gate backed by a flag that can be flipped at runtime.
///
/// Hosts without an OS-level prompt seed it from configuration; tests flip
/// it to simulate a user revoking access mid-run.
#[derive(Debug)]
pub struct PermissionSwitch {
    granted: AtomicBool,
}

impl PermissionSwitch {
    /// Create a switch in the given state.
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    /// Allow location access.
    pub fn grant(&self) {
        if !self.granted.swap(true, Ordering::SeqCst) {
            info!("Location permission granted");
        }
    }

    /// Deny location access.
    pub fn revoke(&self) {
        if self.granted.swap(false, Ordering::SeqCst) {
            info!("Location permission revoked");
        }
    }
}

impl Default for PermissionSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

impl PermissionGate for PermissionSwitch {
    fn has_location_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}
