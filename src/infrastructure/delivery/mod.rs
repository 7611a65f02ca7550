pub mod webhook_client;
pub mod whatsapp_client;

use std::sync::Arc;

use reqwest::StatusCode;

use crate::domain::service::{DeliveryError, MessagingChannel};

use super::config::ChannelConfig;

pub use webhook_client::WebhookChannel;
pub use whatsapp_client::WhatsAppChannel;

/// Builds the messaging channel selected in configuration.
pub fn build_channel(cfg: &ChannelConfig) -> anyhow::Result<Arc<dyn MessagingChannel>> {
    cfg.validate()?;
    let timeout = cfg.request_timeout();
    let channel: Arc<dyn MessagingChannel> = match cfg {
        ChannelConfig::Whatsapp {
            api_base_url,
            phone_number_id,
            access_token,
            ..
        } => Arc::new(WhatsAppChannel::new(
            api_base_url,
            phone_number_id,
            access_token.clone(),
            timeout,
        )?),
        ChannelConfig::Webhook {
            url, bearer_token, ..
        } => Arc::new(WebhookChannel::new(url, bearer_token.clone(), timeout)?),
    };
    Ok(channel)
}

/// Maps a transport-level reqwest failure onto a delivery error.
pub(crate) fn classify_transport_error(err: &reqwest::Error) -> DeliveryError {
    if err.is_timeout() {
        DeliveryError::Timeout(err.to_string())
    } else if err.is_connect() || err.is_request() {
        DeliveryError::ConnectionFailed(err.to_string())
    } else {
        DeliveryError::Other(err.to_string())
    }
}

/// Maps a non-success HTTP status onto a delivery error.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> DeliveryError {
    let detail = format!("{}: {}", status, body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        DeliveryError::RateLimited(detail)
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        DeliveryError::ConnectionFailed(detail)
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
        DeliveryError::InvalidRecipient(detail)
    } else {
        DeliveryError::Rejected(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            DeliveryError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, ""),
            DeliveryError::ConnectionFailed(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad number"),
            DeliveryError::InvalidRecipient(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            DeliveryError::Rejected(_)
        ));
    }

    #[test]
    fn test_server_errors_are_transient_client_errors_are_not() {
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").is_transient());
    }

    #[test]
    fn test_build_channel_rejects_invalid_url() {
        let cfg = ChannelConfig::Webhook {
            url: "not a url".to_string(),
            bearer_token: None,
            request_timeout_secs: 5,
        };
        assert!(build_channel(&cfg).is_err());
    }
}
