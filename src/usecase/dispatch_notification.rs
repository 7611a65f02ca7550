use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::entity::actor::Actor;
use crate::domain::entity::delivery_record::DeliveryRecord;
use crate::domain::entity::notification_request::NotificationRequest;
use crate::domain::entity::notification_stats::NotificationStats;
use crate::domain::entity::recipient::Recipient;
use crate::domain::service::{
    AccessPolicy, MessageRenderer, MessagingChannel, NotificationLedger, RecipientResolver,
};
use crate::infrastructure::event_bus::{NotificationEvent, NotificationEventBus};
use crate::infrastructure::retry::{with_retry, RetryPolicy};

const DEFAULT_INTER_SEND_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum DispatchNotificationError {
    #[error("actor '{0}' may not send notifications")]
    PermissionDenied(String),

    #[error("notification {0} has already been dispatched")]
    AlreadyDispatched(Uuid),

    #[error("recipient resolution failed: {0}")]
    Resolution(String),

    #[error("delivery ledger write failed: {0}")]
    Persistence(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// DispatchOutcome summarises one bulk dispatch. Records are in resolver order.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub notification_id: Uuid,
    pub records: Vec<DeliveryRecord>,
    pub stats: NotificationStats,
    pub cancelled: bool,
}

/// DispatchNotificationUseCase fans one notification out to its audience.
///
/// Sends are strictly sequential with a fixed delay between recipients, since
/// the upstream channel's rate limit is the binding constraint. A failed send
/// is recorded and the batch moves on; only a ledger write failure aborts it.
pub struct DispatchNotificationUseCase {
    resolver: Arc<RecipientResolver>,
    renderer: Arc<MessageRenderer>,
    channel: Arc<dyn MessagingChannel>,
    ledger: Arc<NotificationLedger>,
    event_bus: Arc<NotificationEventBus>,
    retry_policy: RetryPolicy,
    inter_send_delay: Duration,
}

impl DispatchNotificationUseCase {
    pub fn new(
        resolver: Arc<RecipientResolver>,
        renderer: Arc<MessageRenderer>,
        channel: Arc<dyn MessagingChannel>,
        ledger: Arc<NotificationLedger>,
        event_bus: Arc<NotificationEventBus>,
    ) -> Self {
        Self {
            resolver,
            renderer,
            channel,
            ledger,
            event_bus,
            retry_policy: RetryPolicy::default(),
            inter_send_delay: DEFAULT_INTER_SEND_DELAY,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn with_inter_send_delay(mut self, delay: Duration) -> Self {
        self.inter_send_delay = delay;
        self
    }

    pub async fn execute(
        &self,
        request: &NotificationRequest,
        actor: &Actor,
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome, DispatchNotificationError> {
        if !AccessPolicy::can_manage_notifications(actor) {
            return Err(DispatchNotificationError::PermissionDenied(
                actor.role.to_string(),
            ));
        }

        let recipients = self
            .resolver
            .resolve(request.audience, actor)
            .await
            .map_err(|e| DispatchNotificationError::Resolution(e.to_string()))?;

        if recipients.is_empty() {
            tracing::info!(
                notification_id = %request.id,
                "audience resolved to no recipients"
            );
            return Ok(DispatchOutcome {
                notification_id: request.id,
                records: Vec::new(),
                stats: NotificationStats::default(),
                cancelled: false,
            });
        }

        let already_dispatched = self
            .ledger
            .has_records(request.id)
            .await
            .map_err(|e| DispatchNotificationError::Persistence(e.to_string()))?;
        if already_dispatched {
            return Err(DispatchNotificationError::AlreadyDispatched(request.id));
        }

        self.event_bus
            .publish(NotificationEvent::DispatchStarted {
                notification_id: request.id,
                kind: request.kind,
                total_recipients: recipients.len(),
            })
            .await;

        let mut records = Vec::with_capacity(recipients.len());
        let mut cancelled = false;

        for (index, recipient) in recipients.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if index > 0 && !self.inter_send_delay.is_zero() {
                tokio::select! {
                    () = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    () = tokio::time::sleep(self.inter_send_delay) => {}
                }
            }

            let record = self.deliver(request, recipient).await?;
            self.event_bus
                .publish(NotificationEvent::DeliveryRecorded {
                    record: record.clone(),
                })
                .await;
            records.push(record);
        }

        let stats = NotificationStats::from_records(&records);
        if cancelled {
            tracing::warn!(
                notification_id = %request.id,
                delivered = records.len(),
                remaining = recipients.len() - records.len(),
                "dispatch cancelled"
            );
        }
        self.event_bus
            .publish(NotificationEvent::DispatchCompleted {
                notification_id: request.id,
                stats,
                cancelled,
            })
            .await;

        Ok(DispatchOutcome {
            notification_id: request.id,
            records,
            stats,
            cancelled,
        })
    }

    /// Renders, records, sends and finalizes the message for one recipient.
    async fn deliver(
        &self,
        request: &NotificationRequest,
        recipient: &Recipient,
    ) -> Result<DeliveryRecord, DispatchNotificationError> {
        let contact_address = recipient.contact_address.clone().unwrap_or_default();
        let rendered = self
            .renderer
            .render(request.kind, &request.title, recipient, &request.payload);

        let (mut record, render_error) = match rendered {
            Ok(text) => (
                DeliveryRecord::new(
                    request.id,
                    request.kind,
                    recipient.id.clone(),
                    contact_address,
                    text,
                ),
                None,
            ),
            Err(e) => (
                DeliveryRecord::new(
                    request.id,
                    request.kind,
                    recipient.id.clone(),
                    contact_address,
                    String::new(),
                ),
                Some(e),
            ),
        };

        self.ledger
            .record(&record)
            .await
            .map_err(|e| DispatchNotificationError::Persistence(e.to_string()))?;

        let transition = if let Some(e) = render_error {
            tracing::warn!(
                notification_id = %request.id,
                recipient_id = %recipient.id,
                error = %e,
                "message rendering failed"
            );
            record.mark_failed(e.to_string(), 0)
        } else {
            let contact = record.contact_address.clone();
            let text = record.rendered_message.clone();
            let attempt =
                with_retry(&self.retry_policy, || self.channel.send(&contact, &text)).await;
            match attempt.result {
                Ok(sent) => record.mark_sent(sent.message_id, attempt.attempts),
                Err(e) => {
                    tracing::warn!(
                        notification_id = %request.id,
                        recipient_id = %recipient.id,
                        attempts = attempt.attempts,
                        error = %e,
                        "delivery failed"
                    );
                    record.mark_failed(e.to_string(), attempt.attempts)
                }
            }
        };
        transition.map_err(|e| DispatchNotificationError::Internal(e.to_string()))?;

        self.ledger
            .finalize(&record)
            .await
            .map_err(|e| DispatchNotificationError::Persistence(e.to_string()))?;

        Ok(record)
    }
}
