//! Microphone permission gate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Boolean permission query consulted before a session is allocated
pub trait PermissionGate: Send + Sync {
    fn has_permission(&self) -> bool;
}

/// Permission state set by the host (e.g. after its own OS prompt)
#[derive(Debug, Clone)]
pub struct StaticPermission(Arc<AtomicBool>);

impl StaticPermission {
    pub fn granted() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn denied() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self, granted: bool) {
        self.0.store(granted, Ordering::SeqCst);
    }
}

impl PermissionGate for StaticPermission {
    fn has_permission(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
