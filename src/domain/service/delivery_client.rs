use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("delivery error: {0}")]
    Other(String),
}

impl DeliveryError {
    /// Transient errors may succeed when the same message is sent again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DeliveryError::ConnectionFailed(_)
                | DeliveryError::Timeout(_)
                | DeliveryError::RateLimited(_)
        )
    }
}

/// SentMessage is the channel's acknowledgement of one accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: String,
}

/// MessagingChannel delivers one text message to one contact address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn send(&self, contact_address: &str, text: &str) -> Result<SentMessage, DeliveryError>;
}
