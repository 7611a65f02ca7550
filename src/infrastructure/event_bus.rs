use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::entity::audit_entry::AuditEntry;
use crate::domain::entity::delivery_record::DeliveryRecord;
use crate::domain::entity::notification_request::NotificationKind;
use crate::domain::entity::notification_stats::NotificationStats;

/// NotificationEvent is published as a dispatch or audit append progresses.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    DispatchStarted {
        notification_id: Uuid,
        kind: NotificationKind,
        total_recipients: usize,
    },
    DeliveryRecorded {
        record: DeliveryRecord,
    },
    DispatchCompleted {
        notification_id: Uuid,
        stats: NotificationStats,
        cancelled: bool,
    },
    AuditEntryAppended {
        entry: AuditEntry,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    DispatchStarted,
    DeliveryRecorded,
    DispatchCompleted,
    AuditEntryAppended,
}

impl NotificationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NotificationEvent::DispatchStarted { .. } => EventKind::DispatchStarted,
            NotificationEvent::DeliveryRecorded { .. } => EventKind::DeliveryRecorded,
            NotificationEvent::DispatchCompleted { .. } => EventKind::DispatchCompleted,
            NotificationEvent::AuditEntryAppended { .. } => EventKind::AuditEntryAppended,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationEventHandler: Send + Sync {
    /// Event kinds this handler wants. Defaults to all of them.
    fn accepts(&self, _kind: EventKind) -> bool {
        true
    }

    async fn handle(&self, event: &NotificationEvent) -> anyhow::Result<()>;
}

type SubscriptionId = u64;
type HandlerList = Arc<RwLock<Vec<(SubscriptionId, Arc<dyn NotificationEventHandler>)>>>;

#[derive(Debug, Clone)]
pub struct EventBusConfig {
    pub handler_timeout: Duration,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            handler_timeout: Duration::from_secs(5),
        }
    }
}

/// NotificationEventBus delivers typed events to subscribed handlers.
///
/// Handler failures and timeouts are logged and never reach the publisher.
pub struct NotificationEventBus {
    config: EventBusConfig,
    handlers: HandlerList,
    next_id: AtomicU64,
}

impl NotificationEventBus {
    pub fn new(config: EventBusConfig) -> Self {
        Self {
            config,
            handlers: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a handler. It stays registered until the returned
    /// subscription is dropped or unsubscribed.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe(&self, handler: Arc<dyn NotificationEventHandler>) -> EventSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, handler));
        EventSubscription {
            id,
            handlers: self.handlers.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub async fn publish(&self, event: NotificationEvent) {
        let kind = event.kind();
        // snapshot so the lock is never held across an await
        let targets: Vec<Arc<dyn NotificationEventHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, h)| h.accepts(kind))
            .map(|(_, h)| h.clone())
            .collect();

        for handler in targets {
            match tokio::time::timeout(self.config.handler_timeout, handler.handle(&event)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(event = ?kind, error = %e, "notification event handler failed");
                }
                Err(_) => {
                    tracing::warn!(event = ?kind, "notification event handler timed out");
                }
            }
        }
    }
}

impl Default for NotificationEventBus {
    fn default() -> Self {
        Self::new(EventBusConfig::default())
    }
}

/// EventSubscription ties a handler's registration to the subscriber's
/// lifetime.
pub struct EventSubscription {
    id: SubscriptionId,
    handlers: HandlerList,
}

impl EventSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(id, _)| *id != self.id);
    }
}

/// TracingEventHandler writes every event to the structured log.
pub struct TracingEventHandler;

#[async_trait]
impl NotificationEventHandler for TracingEventHandler {
    async fn handle(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        match event {
            NotificationEvent::DispatchStarted {
                notification_id,
                kind,
                total_recipients,
            } => tracing::info!(
                notification_id = %notification_id,
                kind = %kind,
                total_recipients,
                "dispatch started"
            ),
            NotificationEvent::DeliveryRecorded { record } => tracing::debug!(
                notification_id = %record.notification_id,
                recipient_id = %record.recipient_id,
                status = %record.status,
                attempts = record.attempts,
                "delivery recorded"
            ),
            NotificationEvent::DispatchCompleted {
                notification_id,
                stats,
                cancelled,
            } => tracing::info!(
                notification_id = %notification_id,
                sent = stats.sent,
                failed = stats.failed,
                pending = stats.pending,
                cancelled,
                "dispatch completed"
            ),
            NotificationEvent::AuditEntryAppended { entry } => tracing::info!(
                audit_id = %entry.id,
                metric_type = %entry.metric_type,
                metric_name = %entry.metric_name,
                actor_id = %entry.actor_id,
                "audit entry appended"
            ),
        }
        Ok(())
    }
}
