use crate::domain::entity::actor::{Actor, ActorRole};

/// AccessPolicy is the single place that maps actor roles to capabilities.
///
/// - hod / principal / director / admin: manage notifications, view the audit log
/// - admin: purge delivery history
/// - student / faculty: none of the above
pub struct AccessPolicy;

impl AccessPolicy {
    pub fn can_manage_notifications(actor: &Actor) -> bool {
        Self::is_manager(actor.role)
    }

    pub fn can_view_audit_log(actor: &Actor) -> bool {
        Self::is_manager(actor.role)
    }

    pub fn can_purge_history(actor: &Actor) -> bool {
        actor.role == ActorRole::Admin
    }

    fn is_manager(role: ActorRole) -> bool {
        matches!(
            role,
            ActorRole::Hod | ActorRole::Principal | ActorRole::Director | ActorRole::Admin
        )
    }
}
