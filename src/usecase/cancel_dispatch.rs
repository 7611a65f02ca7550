use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entity::actor::Actor;
use crate::domain::service::AccessPolicy;
use crate::infrastructure::dispatch_registry::DispatchRegistry;

#[derive(Debug, thiserror::Error)]
pub enum CancelDispatchError {
    #[error("actor '{0}' may not cancel notifications")]
    PermissionDenied(String),

    #[error("no dispatch in progress for notification {0}")]
    NotFound(Uuid),
}

/// CancelDispatchUseCase stops an in-flight dispatch. Outcomes recorded
/// before the cancel are kept.
pub struct CancelDispatchUseCase {
    registry: Arc<DispatchRegistry>,
}

impl CancelDispatchUseCase {
    pub fn new(registry: Arc<DispatchRegistry>) -> Self {
        Self { registry }
    }

    pub fn execute(&self, actor: &Actor, notification_id: Uuid) -> Result<(), CancelDispatchError> {
        if !AccessPolicy::can_manage_notifications(actor) {
            return Err(CancelDispatchError::PermissionDenied(actor.role.to_string()));
        }
        if !self.registry.cancel(&notification_id) {
            return Err(CancelDispatchError::NotFound(notification_id));
        }
        tracing::info!(notification_id = %notification_id, actor_id = %actor.id, "dispatch cancel requested");
        Ok(())
    }
}
