pub mod audit_handler;
pub mod health;
pub mod notification_handler;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::adapter::middleware::auth::{auth_middleware, AuthState};
use crate::domain::repository::{
    AuditEntryRepository, DeliveryRecordRepository, RecipientRepository,
};
use crate::domain::service::{
    MessageRenderer, MessagingChannel, NotificationLedger, RecipientResolver,
};
use crate::infrastructure::dispatch_registry::DispatchRegistry;
use crate::infrastructure::event_bus::NotificationEventBus;
use crate::infrastructure::retry::RetryPolicy;
use crate::infrastructure::TokenVerifier;
use crate::usecase::{
    CancelDispatchUseCase, DispatchNotificationUseCase, ExportAuditLogUseCase,
    GetNotificationStatsUseCase, ListDeliveryRecordsUseCase, PurgeDeliveryRecordsUseCase,
    RecordMetricChangeUseCase, SearchAuditEntriesUseCase,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatch_notification_uc: Arc<DispatchNotificationUseCase>,
    pub cancel_dispatch_uc: Arc<CancelDispatchUseCase>,
    pub list_delivery_records_uc: Arc<ListDeliveryRecordsUseCase>,
    pub get_notification_stats_uc: Arc<GetNotificationStatsUseCase>,
    pub purge_delivery_records_uc: Arc<PurgeDeliveryRecordsUseCase>,
    pub record_metric_change_uc: Arc<RecordMetricChangeUseCase>,
    pub search_audit_entries_uc: Arc<SearchAuditEntriesUseCase>,
    pub export_audit_log_uc: Arc<ExportAuditLogUseCase>,
    pub dispatch_registry: Arc<DispatchRegistry>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub db_pool: Option<sqlx::PgPool>,
}

/// AppDependencies are the ports the application is assembled from.
pub struct AppDependencies {
    pub recipient_repo: Arc<dyn RecipientRepository>,
    pub record_repo: Arc<dyn DeliveryRecordRepository>,
    pub audit_repo: Arc<dyn AuditEntryRepository>,
    pub channel: Arc<dyn MessagingChannel>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub event_bus: Arc<NotificationEventBus>,
    pub retry_policy: RetryPolicy,
    pub inter_send_delay: Duration,
    pub db_pool: Option<sqlx::PgPool>,
}

impl AppState {
    /// Wires use cases and domain services from their ports.
    pub fn build(deps: AppDependencies) -> anyhow::Result<Self> {
        let resolver = Arc::new(RecipientResolver::new(deps.recipient_repo));
        let renderer = Arc::new(MessageRenderer::new()?);
        let ledger = Arc::new(NotificationLedger::new(deps.record_repo));
        let dispatch_registry = Arc::new(DispatchRegistry::new());

        let dispatch_notification_uc = Arc::new(
            DispatchNotificationUseCase::new(
                resolver,
                renderer,
                deps.channel,
                ledger.clone(),
                deps.event_bus.clone(),
            )
            .with_retry_policy(deps.retry_policy)
            .with_inter_send_delay(deps.inter_send_delay),
        );

        Ok(Self {
            dispatch_notification_uc,
            cancel_dispatch_uc: Arc::new(CancelDispatchUseCase::new(dispatch_registry.clone())),
            list_delivery_records_uc: Arc::new(ListDeliveryRecordsUseCase::new(ledger.clone())),
            get_notification_stats_uc: Arc::new(GetNotificationStatsUseCase::new(ledger.clone())),
            purge_delivery_records_uc: Arc::new(PurgeDeliveryRecordsUseCase::new(ledger)),
            record_metric_change_uc: Arc::new(RecordMetricChangeUseCase::new(
                deps.audit_repo.clone(),
                deps.event_bus,
            )),
            search_audit_entries_uc: Arc::new(SearchAuditEntriesUseCase::new(
                deps.audit_repo.clone(),
            )),
            export_audit_log_uc: Arc::new(ExportAuditLogUseCase::new(deps.audit_repo)),
            dispatch_registry,
            token_verifier: deps.token_verifier,
            db_pool: deps.db_pool,
        })
    }
}

/// Build the REST API router. Every `/api/v1` route requires a bearer token.
pub fn router(state: AppState) -> Router {
    let auth_state = AuthState {
        verifier: state.token_verifier.clone(),
    };

    let public_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz));

    let api_routes = Router::new()
        .route(
            "/api/v1/notifications/dispatch",
            post(notification_handler::dispatch_notification),
        )
        .route(
            "/api/v1/notifications/{id}/cancel",
            post(notification_handler::cancel_dispatch),
        )
        .route(
            "/api/v1/notifications/records",
            get(notification_handler::list_delivery_records)
                .delete(notification_handler::purge_delivery_records),
        )
        .route(
            "/api/v1/notifications/stats",
            get(notification_handler::get_notification_stats),
        )
        .route(
            "/api/v1/audit/entries",
            post(audit_handler::record_metric_change).get(audit_handler::search_audit_entries),
        )
        .route("/api/v1/audit/export", get(audit_handler::export_audit_log))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        }
    }
}
