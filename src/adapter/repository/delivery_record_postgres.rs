use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::delivery_record::{DeliveryRecord, DeliveryRecordFilter};
use crate::domain::repository::DeliveryRecordRepository;

use super::contains_ignore_case;

const SELECT_COLUMNS: &str = "SELECT id, notification_id, notification_kind, recipient_id, contact_address, \
     rendered_message, status, attempts, external_message_id, error_reason, attempted_at, created_at \
     FROM notification.delivery_records";

pub struct DeliveryRecordPostgresRepository {
    pool: Arc<PgPool>,
}

impl DeliveryRecordPostgresRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DeliveryRecordRow {
    id: Uuid,
    notification_id: Uuid,
    notification_kind: String,
    recipient_id: String,
    contact_address: String,
    rendered_message: String,
    status: String,
    attempts: i32,
    external_message_id: Option<String>,
    error_reason: Option<String>,
    attempted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DeliveryRecordRow> for DeliveryRecord {
    type Error = anyhow::Error;

    fn try_from(r: DeliveryRecordRow) -> Result<Self, Self::Error> {
        Ok(DeliveryRecord {
            id: r.id,
            notification_id: r.notification_id,
            notification_kind: r.notification_kind.parse().map_err(anyhow::Error::msg)?,
            recipient_id: r.recipient_id,
            contact_address: r.contact_address,
            rendered_message: r.rendered_message,
            status: r.status.parse().map_err(anyhow::Error::msg)?,
            attempts: u32::try_from(r.attempts)?,
            external_message_id: r.external_message_id,
            error_reason: r.error_reason,
            attempted_at: r.attempted_at,
            created_at: r.created_at,
        })
    }
}

fn into_records(rows: Vec<DeliveryRecordRow>) -> anyhow::Result<Vec<DeliveryRecord>> {
    rows.into_iter().map(TryInto::try_into).collect()
}

fn search_sql(filter: &DeliveryRecordFilter) -> String {
    let mut conditions = Vec::new();
    let mut bind_index = 1u32;

    if filter.notification_id.is_some() {
        conditions.push(format!("notification_id = ${}", bind_index));
        bind_index += 1;
    }
    if filter.kind.is_some() {
        conditions.push(format!("notification_kind = ${}", bind_index));
        bind_index += 1;
    }
    if filter.status.is_some() {
        conditions.push(format!("status = ${}", bind_index));
        bind_index += 1;
    }
    if filter.search.as_deref().is_some_and(|s| !s.is_empty()) {
        conditions.push(format!(
            "({} OR {})",
            contains_ignore_case("rendered_message", bind_index),
            contains_ignore_case("contact_address", bind_index)
        ));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    format!("{} {} ORDER BY created_at ASC, seq ASC", SELECT_COLUMNS, where_clause)
}

#[async_trait]
impl DeliveryRecordRepository for DeliveryRecordPostgresRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<DeliveryRecord>> {
        let row: Option<DeliveryRecordRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_COLUMNS))
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn search(&self, filter: &DeliveryRecordFilter) -> anyhow::Result<Vec<DeliveryRecord>> {
        let search = filter.search.as_deref().filter(|s| !s.is_empty());
        let sql = search_sql(filter);

        let mut query = sqlx::query_as::<_, DeliveryRecordRow>(&sql);
        if let Some(id) = filter.notification_id {
            query = query.bind(id);
        }
        if let Some(kind) = filter.kind {
            query = query.bind(kind.as_str());
        }
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(s) = search {
            query = query.bind(s);
        }

        let rows = query.fetch_all(self.pool.as_ref()).await?;
        into_records(rows)
    }

    async fn create(&self, record: &DeliveryRecord) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO notification.delivery_records \
             (id, notification_id, notification_kind, recipient_id, contact_address, rendered_message, \
              status, attempts, external_message_id, error_reason, attempted_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(record.id)
        .bind(record.notification_id)
        .bind(record.notification_kind.as_str())
        .bind(&record.recipient_id)
        .bind(&record.contact_address)
        .bind(&record.rendered_message)
        .bind(record.status.as_str())
        .bind(i32::try_from(record.attempts)?)
        .bind(&record.external_message_id)
        .bind(&record.error_reason)
        .bind(record.attempted_at)
        .bind(record.created_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn finalize(&self, record: &DeliveryRecord) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE notification.delivery_records \
             SET status = $2, attempts = $3, external_message_id = $4, error_reason = $5, attempted_at = $6 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(record.id)
        .bind(record.status.as_str())
        .bind(i32::try_from(record.attempts)?)
        .bind(&record.external_message_id)
        .bind(&record.error_reason)
        .bind(record.attempted_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn purge(&self, before: DateTime<Utc>) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM notification.delivery_records WHERE created_at < $1")
            .bind(before)
            .execute(self.pool.as_ref())
            .await?;
        Ok(result.rows_affected())
    }
}
