use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// DispatchRegistry tracks the cancellation tokens of in-flight dispatches
/// so that a separate request can stop a running batch.
#[derive(Default)]
pub struct DispatchRegistry {
    active: Mutex<HashMap<Uuid, CancellationToken>>,
}

impl DispatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels a running dispatch. Returns `false` when no dispatch with that
    /// id is in flight.
    pub fn cancel(&self, notification_id: &Uuid) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.get(notification_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Registers a dispatch for the lifetime of the returned guard. `None`
    /// when a dispatch with the same id is already in flight.
    pub fn begin(self: &Arc<Self>, notification_id: Uuid) -> Option<DispatchGuard> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.contains_key(&notification_id) {
            return None;
        }
        let token = CancellationToken::new();
        active.insert(notification_id, token.clone());
        Some(DispatchGuard {
            registry: Arc::clone(self),
            notification_id,
            token,
        })
    }

    fn remove(&self, notification_id: &Uuid) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(notification_id);
    }

    #[cfg(test)]
    fn active_count(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// DispatchGuard unregisters its dispatch when dropped, including when the
/// request future is dropped mid-dispatch.
pub struct DispatchGuard {
    registry: Arc<DispatchRegistry>,
    notification_id: Uuid,
    token: CancellationToken,
}

impl DispatchGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.notification_id);
    }
}
