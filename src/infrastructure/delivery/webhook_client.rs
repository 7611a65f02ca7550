use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::service::{DeliveryError, MessagingChannel, SentMessage};

use super::{classify_status, classify_transport_error};

/// WebhookChannel posts each message as JSON to a gateway endpoint.
///
/// The gateway may answer with `{"message_id": "..."}`; otherwise a local id
/// is generated.
pub struct WebhookChannel {
    url: String,
    bearer_token: Option<Secret<String>>,
    client: Client,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    message_id: Option<String>,
}

impl WebhookChannel {
    pub fn new(
        url: &str,
        bearer_token: Option<Secret<String>>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            bearer_token,
            client,
        })
    }
}

#[async_trait]
impl MessagingChannel for WebhookChannel {
    async fn send(&self, contact_address: &str, text: &str) -> Result<SentMessage, DeliveryError> {
        let payload = json!({
            "to": contact_address,
            "text": text,
        });

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(classify_status(status, &body_text));
        }

        let body_text = response.text().await.unwrap_or_default();
        let parsed: WebhookResponse = serde_json::from_str(&body_text).unwrap_or_default();
        Ok(SentMessage {
            message_id: parsed
                .message_id
                .unwrap_or_else(|| format!("webhook-{}", Uuid::new_v4())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_without_token() {
        let channel =
            WebhookChannel::new("https://sms.example.com/send", None, Duration::from_secs(5))
                .unwrap();
        assert_eq!(channel.url, "https://sms.example.com/send");
        assert!(channel.bearer_token.is_none());
    }

    #[test]
    fn test_response_without_message_id_parses() {
        let parsed: WebhookResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.message_id.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transient() {
        let channel =
            WebhookChannel::new("http://127.0.0.1:9/send", None, Duration::from_millis(500))
                .unwrap();
        let err = channel.send("+910000000000", "hi").await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
