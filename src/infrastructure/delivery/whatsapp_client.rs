use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::json;

use crate::domain::service::{DeliveryError, MessagingChannel, SentMessage};

use super::{classify_status, classify_transport_error};

/// WhatsAppChannel sends plain-text messages through the WhatsApp Cloud API.
pub struct WhatsAppChannel {
    messages_url: String,
    access_token: Secret<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessageRef>,
}

#[derive(Debug, Deserialize)]
struct SentMessageRef {
    id: String,
}

impl WhatsAppChannel {
    pub fn new(
        api_base_url: &str,
        phone_number_id: &str,
        access_token: Secret<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            messages_url: messages_url(api_base_url, phone_number_id),
            access_token,
            client,
        })
    }
}

fn messages_url(api_base_url: &str, phone_number_id: &str) -> String {
    format!(
        "{}/{}/messages",
        api_base_url.trim_end_matches('/'),
        phone_number_id
    )
}

/// The API wants digits only, with the country code and without '+'.
fn normalize_address(contact_address: &str) -> String {
    contact_address
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

#[async_trait]
impl MessagingChannel for WhatsAppChannel {
    async fn send(&self, contact_address: &str, text: &str) -> Result<SentMessage, DeliveryError> {
        let to = normalize_address(contact_address);
        if to.is_empty() {
            return Err(DeliveryError::InvalidRecipient(format!(
                "no digits in contact address '{}'",
                contact_address
            )));
        }

        let payload = json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "text",
            "text": { "body": text },
        });

        let response = self
            .client
            .post(&self.messages_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&payload)
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

        let body: SendResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Other(format!("unreadable send response: {}", e)))?;
        let message_id = body
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| DeliveryError::Other("send response has no message id".to_string()))?;

        Ok(SentMessage { message_id })
    }
}
