pub mod config;
pub mod database;
pub mod delivery;
pub mod dispatch_registry;
pub mod event_bus;
pub mod jwt_verifier;
pub mod retry;
pub mod telemetry;

use async_trait::async_trait;

use crate::domain::entity::actor::Actor;

/// TokenVerifier turns a bearer token into the authenticated actor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> anyhow::Result<Actor>;
}
