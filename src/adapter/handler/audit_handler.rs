use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};

use super::{AppState, ErrorResponse};
use crate::domain::entity::actor::Actor;
use crate::domain::entity::audit_entry::{AuditEntryFilter, NewAuditEntry};
use crate::usecase::export_audit_log::ExportAuditLogError;
use crate::usecase::record_metric_change::RecordMetricChangeError;
use crate::usecase::search_audit_entries::SearchAuditEntriesError;

fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(ErrorResponse::new(code, message))).into_response()
}

/// POST /api/v1/audit/entries
pub async fn record_metric_change(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(input): Json<NewAuditEntry>,
) -> Response {
    match state.record_metric_change_uc.execute(&actor, input).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e @ RecordMetricChangeError::Validation(_)) => error(
            StatusCode::BAD_REQUEST,
            "NOTIFY_AUDIT_VALIDATION_FAILED",
            &e.to_string(),
        ),
        Err(e @ RecordMetricChangeError::Persistence(_)) => {
            tracing::error!(actor_id = %actor.id, error = %e, "audit append failed");
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOTIFY_AUDIT_WRITE_FAILED",
                &e.to_string(),
            )
        }
    }
}

/// GET /api/v1/audit/entries
pub async fn search_audit_entries(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<AuditEntryFilter>,
) -> Response {
    match state.search_audit_entries_uc.execute(&actor, &filter).await {
        Ok(entries) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "total": entries.len(),
                "entries": entries
            })),
        )
            .into_response(),
        Err(e @ SearchAuditEntriesError::PermissionDenied(_)) => error(
            StatusCode::FORBIDDEN,
            "NOTIFY_PERMISSION_DENIED",
            &e.to_string(),
        ),
        Err(e @ SearchAuditEntriesError::Internal(_)) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "NOTIFY_AUDIT_SEARCH_FAILED",
            &e.to_string(),
        ),
    }
}

/// GET /api/v1/audit/export - the filtered log as a JSON attachment
pub async fn export_audit_log(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<AuditEntryFilter>,
) -> Response {
    let snapshot = match state.export_audit_log_uc.execute(&actor, filter).await {
        Ok(snapshot) => snapshot,
        Err(e @ ExportAuditLogError::PermissionDenied(_)) => {
            return error(
                StatusCode::FORBIDDEN,
                "NOTIFY_PERMISSION_DENIED",
                &e.to_string(),
            )
        }
        Err(e @ ExportAuditLogError::Internal(_)) => {
            return error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "NOTIFY_AUDIT_EXPORT_FAILED",
                &e.to_string(),
            )
        }
    };

    match snapshot.to_json() {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", snapshot.file_name()),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "NOTIFY_AUDIT_EXPORT_FAILED",
            &e.to_string(),
        ),
    }
}
