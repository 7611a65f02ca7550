use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use campus_notification_server::adapter::repository::{
    InMemoryDeliveryRecordRepository, InMemoryRecipientRepository,
};
use campus_notification_server::domain::entity::actor::{Actor, ActorRole};
use campus_notification_server::domain::entity::delivery_record::{
    DeliveryRecordFilter, DeliveryStatus,
};
use campus_notification_server::domain::entity::notification_request::{
    AudienceSelector, NotificationKind, NotificationRequest, Priority,
};
use campus_notification_server::domain::entity::recipient::{Recipient, RecipientRole};
use campus_notification_server::domain::service::{
    DeliveryError, MessageRenderer, MessagingChannel, NotificationLedger, RecipientResolver,
    SentMessage,
};
use campus_notification_server::infrastructure::event_bus::{
    EventKind, NotificationEvent, NotificationEventBus, NotificationEventHandler,
};
use campus_notification_server::infrastructure::retry::RetryPolicy;
use campus_notification_server::usecase::DispatchNotificationUseCase;

// --- Test doubles ---

struct FakeChannel {
    failing: HashSet<String>,
    sent: Mutex<Vec<(String, String)>>,
    cancel_after_first: Option<CancellationToken>,
}

impl FakeChannel {
    fn new(failing: &[&str]) -> Self {
        Self {
            failing: failing.iter().map(|s| s.to_string()).collect(),
            sent: Mutex::new(Vec::new()),
            cancel_after_first: None,
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingChannel for FakeChannel {
    async fn send(&self, contact_address: &str, text: &str) -> Result<SentMessage, DeliveryError> {
        if let Some(ref token) = self.cancel_after_first {
            token.cancel();
        }
        if self.failing.contains(contact_address) {
            return Err(DeliveryError::Rejected("number not on whatsapp".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push((contact_address.to_string(), text.to_string()));
        Ok(SentMessage {
            message_id: format!("wamid.{}", sent.len()),
        })
    }
}

#[derive(Default)]
struct CollectingHandler {
    kinds: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl NotificationEventHandler for CollectingHandler {
    async fn handle(&self, event: &NotificationEvent) -> anyhow::Result<()> {
        self.kinds.lock().unwrap().push(event.kind());
        Ok(())
    }
}

fn recipient(id: &str, name: &str, phone: Option<&str>, role: RecipientRole) -> Recipient {
    Recipient {
        id: id.to_string(),
        contact_address: phone.map(str::to_string),
        display_name: name.to_string(),
        role,
        department: Some("CSE".to_string()),
    }
}

fn directory() -> Vec<Recipient> {
    vec![
        recipient("stu-2", "Bhavna", Some("+910000000002"), RecipientRole::Student),
        recipient("stu-1", "Aarav", Some("+910000000001"), RecipientRole::Student),
        recipient("stu-3", "Chetan", Some("+910000000003"), RecipientRole::Student),
        recipient("stu-4", "Deepa", None, RecipientRole::Student),
    ]
}

struct Harness {
    usecase: DispatchNotificationUseCase,
    ledger: Arc<NotificationLedger>,
    events: Arc<CollectingHandler>,
    _bus: Arc<NotificationEventBus>,
    _subscription: campus_notification_server::infrastructure::event_bus::EventSubscription,
}

fn harness(recipients: Vec<Recipient>, channel: Arc<FakeChannel>) -> Harness {
    let ledger = Arc::new(NotificationLedger::new(Arc::new(
        InMemoryDeliveryRecordRepository::new(),
    )));
    let bus = Arc::new(NotificationEventBus::default());
    let events = Arc::new(CollectingHandler::default());
    let subscription = bus.subscribe(events.clone());
    let usecase = DispatchNotificationUseCase::new(
        Arc::new(RecipientResolver::new(Arc::new(
            InMemoryRecipientRepository::new(recipients),
        ))),
        Arc::new(MessageRenderer::new().unwrap()),
        channel,
        ledger.clone(),
        bus.clone(),
    )
    .with_retry_policy(RetryPolicy::no_retry())
    .with_inter_send_delay(Duration::ZERO);
    Harness {
        usecase,
        ledger,
        events,
        _bus: bus,
        _subscription: subscription,
    }
}

fn principal() -> Actor {
    Actor::new("emp-1", "Principal Rao", ActorRole::Principal, None)
}

fn marks_request(audience: AudienceSelector) -> NotificationRequest {
    let payload = serde_json::json!({
        "subject": "Mathematics",
        "exam_type": "Midterm",
        "marks": 85,
        "max_marks": 100
    });
    NotificationRequest::new(
        NotificationKind::Marks,
        audience,
        "Exam results".to_string(),
        payload.as_object().unwrap().clone(),
        Priority::High,
        "emp-1".to_string(),
    )
}

// --- Integration Tests ---

#[tokio::test]
async fn test_failed_recipient_does_not_stop_the_batch() {
    let channel = Arc::new(FakeChannel::new(&["+910000000002"]));
    let h = harness(directory(), channel.clone());
    let request = marks_request(AudienceSelector::Students);

    let outcome = h
        .usecase
        .execute(&request, &principal(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(!outcome.cancelled);
    let ids: Vec<&str> = outcome.records.iter().map(|r| r.recipient_id.as_str()).collect();
    assert_eq!(ids, vec!["stu-1", "stu-2", "stu-3"]);
    assert_eq!(outcome.records[0].status, DeliveryStatus::Sent);
    assert_eq!(outcome.records[1].status, DeliveryStatus::Failed);
    assert!(outcome.records[1].error_reason.is_some());
    assert_eq!(outcome.records[2].status, DeliveryStatus::Sent);
    assert_eq!(outcome.stats.sent, 2);
    assert_eq!(outcome.stats.failed, 1);

    let sent = channel.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.contains("Dear Aarav"));
    assert!(sent[0].1.contains("85/100"));
    assert!(sent[0].1.contains("grade A"));

    let stored = h
        .ledger
        .query(&DeliveryRecordFilter::for_notification(request.id))
        .await
        .unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|r| r.status != DeliveryStatus::Pending));

    let kinds = h.events.kinds.lock().unwrap().clone();
    assert_eq!(kinds.first(), Some(&EventKind::DispatchStarted));
    assert_eq!(kinds.last(), Some(&EventKind::DispatchCompleted));
    assert_eq!(
        kinds.iter().filter(|k| **k == EventKind::DeliveryRecorded).count(),
        3
    );
}

#[tokio::test]
async fn test_empty_audience_creates_no_records() {
    let channel = Arc::new(FakeChannel::new(&[]));
    let h = harness(
        vec![recipient("fac-1", "Meera", Some("+919"), RecipientRole::Faculty)],
        channel.clone(),
    );
    let request = marks_request(AudienceSelector::Students);

    let outcome = h
        .usecase
        .execute(&request, &principal(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.stats.total, 0);
    assert!(channel.sent().is_empty());
    assert!(h.events.kinds.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_department_audience_without_actor_department_is_empty() {
    let channel = Arc::new(FakeChannel::new(&[]));
    let h = harness(directory(), channel.clone());
    let request = marks_request(AudienceSelector::Department);

    let outcome = h
        .usecase
        .execute(&request, &principal(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert!(channel.sent().is_empty());
}

#[tokio::test]
async fn test_cancellation_stops_before_next_recipient() {
    let token = CancellationToken::new();
    let channel = Arc::new(FakeChannel {
        cancel_after_first: Some(token.clone()),
        ..FakeChannel::new(&[])
    });
    let h = harness(directory(), channel.clone());
    let request = marks_request(AudienceSelector::Students);

    let outcome = h
        .usecase
        .execute(&request, &principal(), &token)
        .await
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].recipient_id, "stu-1");
    assert_eq!(channel.sent().len(), 1);

    let stored = h
        .ledger
        .query(&DeliveryRecordFilter::for_notification(request.id))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_faculty_actor_is_denied() {
    let channel = Arc::new(FakeChannel::new(&[]));
    let h = harness(directory(), channel.clone());
    let faculty = Actor::new("fac-1", "Meera", ActorRole::Faculty, Some("CSE".to_string()));

    let result = h
        .usecase
        .execute(
            &marks_request(AudienceSelector::All),
            &faculty,
            &CancellationToken::new(),
        )
        .await;

    assert!(result.is_err());
    assert!(channel.sent().is_empty());
}
