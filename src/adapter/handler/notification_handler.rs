use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{AppState, ErrorResponse};
use crate::domain::entity::actor::Actor;
use crate::domain::entity::delivery_record::DeliveryRecordFilter;
use crate::domain::entity::notification_request::{
    AudienceSelector, NotificationKind, NotificationRequest, Priority,
};
use crate::usecase::cancel_dispatch::CancelDispatchError;
use crate::usecase::dispatch_notification::DispatchNotificationError;
use crate::usecase::get_notification_stats::GetNotificationStatsError;
use crate::usecase::list_delivery_records::ListDeliveryRecordsError;
use crate::usecase::purge_delivery_records::PurgeDeliveryRecordsError;

#[derive(Debug, Deserialize)]
pub struct DispatchNotificationRequest {
    /// Caller-chosen id, so the dispatch can be cancelled while it runs.
    #[serde(default)]
    pub notification_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub audience: AudienceSelector,
    pub title: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Deserialize)]
pub struct PurgeParams {
    pub before: String,
}

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

/// POST /api/v1/notifications/dispatch
pub async fn dispatch_notification(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<DispatchNotificationRequest>,
) -> Response {
    if req.title.trim().is_empty() {
        return error(
            StatusCode::BAD_REQUEST,
            "NOTIFY_VALIDATION_FAILED",
            "title is required",
        );
    }

    let mut request = NotificationRequest::new(
        req.kind,
        req.audience,
        req.title,
        req.payload,
        req.priority,
        actor.id.clone(),
    );
    if let Some(id) = req.notification_id {
        request.id = id;
    }

    let Some(guard) = state.dispatch_registry.begin(request.id) else {
        return error(
            StatusCode::CONFLICT,
            "NOTIFY_DISPATCH_IN_PROGRESS",
            &format!("notification {} is already being dispatched", request.id),
        );
    };

    // Detached from the request: a dropped connection must not abort the
    // batch between recording and finalizing a delivery.
    let notification_id = request.id;
    let uc = state.dispatch_notification_uc.clone();
    let task = tokio::spawn(async move {
        let result = uc.execute(&request, &actor, guard.token()).await;
        drop(guard);
        result
    });
    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(%notification_id, error = %e, "dispatch task failed");
            return error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOTIFY_INTERNAL_ERROR",
                "dispatch task failed",
            );
        }
    };

    match result {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => {
            let msg = e.to_string();
            match e {
                DispatchNotificationError::PermissionDenied(_) => {
                    error(StatusCode::FORBIDDEN, "NOTIFY_PERMISSION_DENIED", &msg)
                }
                DispatchNotificationError::AlreadyDispatched(_) => {
                    error(StatusCode::CONFLICT, "NOTIFY_ALREADY_DISPATCHED", &msg)
                }
                DispatchNotificationError::Resolution(_) => error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFY_RESOLUTION_FAILED",
                    &msg,
                ),
                DispatchNotificationError::Persistence(_) => {
                    tracing::error!(%notification_id, error = %msg, "dispatch aborted");
                    error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "NOTIFY_LEDGER_WRITE_FAILED",
                        &msg,
                    )
                }
                DispatchNotificationError::Internal(_) => error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "NOTIFY_INTERNAL_ERROR",
                    &msg,
                ),
            }
        }
    }
}

/// POST /api/v1/notifications/{id}/cancel
pub async fn cancel_dispatch(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.cancel_dispatch_uc.execute(&actor, id) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "notification_id": id,
                "status": "cancelling"
            })),
        )
            .into_response(),
        Err(e @ CancelDispatchError::PermissionDenied(_)) => error(
            StatusCode::FORBIDDEN,
            "NOTIFY_PERMISSION_DENIED",
            &e.to_string(),
        ),
        Err(e @ CancelDispatchError::NotFound(_)) => error(
            StatusCode::NOT_FOUND,
            "NOTIFY_DISPATCH_NOT_FOUND",
            &e.to_string(),
        ),
    }
}

/// GET /api/v1/notifications/records
pub async fn list_delivery_records(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<DeliveryRecordFilter>,
) -> Response {
    match state.list_delivery_records_uc.execute(&actor, &filter).await {
        Ok(records) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "total": records.len(),
                "records": records
            })),
        )
            .into_response(),
        Err(e @ ListDeliveryRecordsError::PermissionDenied(_)) => error(
            StatusCode::FORBIDDEN,
            "NOTIFY_PERMISSION_DENIED",
            &e.to_string(),
        ),
        Err(e @ ListDeliveryRecordsError::Internal(_)) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "NOTIFY_LIST_FAILED",
            &e.to_string(),
        ),
    }
}

/// GET /api/v1/notifications/stats
pub async fn get_notification_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<DeliveryRecordFilter>,
) -> Response {
    match state.get_notification_stats_uc.execute(&actor, &filter).await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e @ GetNotificationStatsError::PermissionDenied(_)) => error(
            StatusCode::FORBIDDEN,
            "NOTIFY_PERMISSION_DENIED",
            &e.to_string(),
        ),
        Err(e @ GetNotificationStatsError::Internal(_)) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "NOTIFY_STATS_FAILED",
            &e.to_string(),
        ),
    }
}

/// DELETE /api/v1/notifications/records?before=<rfc3339>
pub async fn purge_delivery_records(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<PurgeParams>,
) -> Response {
    let before = match DateTime::parse_from_rfc3339(&params.before) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => {
            return error(
                StatusCode::BAD_REQUEST,
                "NOTIFY_INVALID_CUTOFF",
                &format!("invalid before datetime: {}", params.before),
            )
        }
    };

    match state.purge_delivery_records_uc.execute(&actor, before).await {
        Ok(purged) => (
            StatusCode::OK,
            Json(serde_json::json!({ "purged": purged })),
        )
            .into_response(),
        Err(e @ PurgeDeliveryRecordsError::PermissionDenied(_)) => error(
            StatusCode::FORBIDDEN,
            "NOTIFY_PERMISSION_DENIED",
            &e.to_string(),
        ),
        Err(e @ PurgeDeliveryRecordsError::CutoffInFuture(_)) => error(
            StatusCode::BAD_REQUEST,
            "NOTIFY_INVALID_CUTOFF",
            &e.to_string(),
        ),
        Err(e @ PurgeDeliveryRecordsError::Internal(_)) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "NOTIFY_PURGE_FAILED",
            &e.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_request_defaults() {
        let req: DispatchNotificationRequest = serde_json::from_str(
            r#"{"kind":"emergency","audience":"all","title":"Campus closed","payload":{"message":"Heavy rain"}}"#,
        )
        .unwrap();
        assert_eq!(req.kind, NotificationKind::Emergency);
        assert_eq!(req.audience, AudienceSelector::All);
        assert_eq!(req.priority, Priority::Medium);
        assert!(req.notification_id.is_none());
    }

    #[test]
    fn test_dispatch_request_rejects_unknown_kind() {
        let result: Result<DispatchNotificationRequest, _> = serde_json::from_str(
            r#"{"kind":"sms","audience":"all","title":"x"}"#,
        );
        assert!(result.is_err());
    }
}
