use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::entity::actor::{Actor, ActorRole};

use super::config::AuthConfig;
use super::TokenVerifier;

/// Claims carried by campus ERP access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
    pub exp: u64,
    pub iss: String,
    pub aud: String,
}

/// JwtVerifier validates HS256 tokens issued by the ERP identity service.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &Secret<String>, issuer: &str, audience: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.leeway = leeway_secs;
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    pub fn from_config(cfg: &AuthConfig) -> Self {
        Self::new(&cfg.jwt_secret, &cfg.issuer, &cfg.audience, cfg.leeway_secs)
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify_token(&self, token: &str) -> anyhow::Result<Actor> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| anyhow::anyhow!("invalid token: {}", e))?;
        let claims = data.claims;
        let role: ActorRole = claims
            .role
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid token: unknown role '{}'", claims.role))?;
        let name = if claims.name.is_empty() {
            claims.sub.clone()
        } else {
            claims.name
        };
        Ok(Actor::new(claims.sub, name, role, claims.department))
    }
}
