use async_trait::async_trait;

use crate::domain::entity::recipient::{Recipient, RecipientFilter};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipientRepository: Send + Sync {
    /// Returns matching recipients ordered by display name, then id.
    async fn find(&self, filter: &RecipientFilter) -> anyhow::Result<Vec<Recipient>>;
}
