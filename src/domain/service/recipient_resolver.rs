use std::sync::Arc;

use crate::domain::entity::actor::Actor;
use crate::domain::entity::notification_request::AudienceSelector;
use crate::domain::entity::recipient::{Recipient, RecipientFilter, RecipientRole};
use crate::domain::repository::RecipientRepository;

/// RecipientResolver expands an audience selector into concrete recipients.
/// A selector that matches nobody yields an empty list, not an error.
pub struct RecipientResolver {
    recipient_repo: Arc<dyn RecipientRepository>,
}

impl RecipientResolver {
    pub fn new(recipient_repo: Arc<dyn RecipientRepository>) -> Self {
        Self { recipient_repo }
    }

    pub async fn resolve(
        &self,
        audience: AudienceSelector,
        actor: &Actor,
    ) -> anyhow::Result<Vec<Recipient>> {
        let Some(filter) = Self::filter_for(audience, actor) else {
            return Ok(Vec::new());
        };
        self.recipient_repo.find(&filter).await
    }

    /// `None` when the selector cannot match anyone for this actor.
    fn filter_for(audience: AudienceSelector, actor: &Actor) -> Option<RecipientFilter> {
        match audience {
            AudienceSelector::All => Some(RecipientFilter::default()),
            AudienceSelector::Students => Some(RecipientFilter {
                role: Some(RecipientRole::Student),
                department: None,
            }),
            AudienceSelector::Faculty => Some(RecipientFilter {
                role: Some(RecipientRole::Faculty),
                department: None,
            }),
            AudienceSelector::Department => {
                actor.department.as_ref().map(|department| RecipientFilter {
                    role: None,
                    department: Some(department.clone()),
                })
            }
        }
    }
}
