use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::audit_entry::{AuditEntry, AuditEntryFilter};
use crate::domain::repository::AuditEntryRepository;

use super::contains_ignore_case;

/// AuditEntryPostgresRepository stores the audit log. The table only ever
/// receives INSERTs; `seq` breaks timestamp ties in append order.
pub struct AuditEntryPostgresRepository {
    pool: Arc<PgPool>,
}

impl AuditEntryPostgresRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AuditEntryRow {
    id: Uuid,
    timestamp: DateTime<Utc>,
    actor_id: String,
    actor_name: String,
    actor_role: String,
    metric_type: String,
    metric_name: String,
    previous_value: Option<f64>,
    new_value: f64,
    percentage_change: Option<f64>,
    department: Option<String>,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = anyhow::Error;

    fn try_from(r: AuditEntryRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: r.id,
            timestamp: r.timestamp,
            actor_id: r.actor_id,
            actor_name: r.actor_name,
            actor_role: r.actor_role.parse().map_err(anyhow::Error::msg)?,
            metric_type: r.metric_type,
            metric_name: r.metric_name,
            previous_value: r.previous_value,
            new_value: r.new_value,
            percentage_change: r.percentage_change,
            department: r.department,
        })
    }
}

fn search_sql(
    metric_type: Option<&str>,
    actor_name: Option<&str>,
    search: Option<&str>,
) -> String {
    let mut conditions = Vec::new();
    let mut bind_index = 1u32;

    if metric_type.is_some() {
        conditions.push(format!("metric_type = ${}", bind_index));
        bind_index += 1;
    }
    if actor_name.is_some() {
        conditions.push(contains_ignore_case("actor_name", bind_index));
        bind_index += 1;
    }
    if search.is_some() {
        let columns = ["metric_name", "metric_type", "actor_name", "department"];
        let any: Vec<String> = columns
            .iter()
            .map(|c| contains_ignore_case(c, bind_index))
            .collect();
        conditions.push(format!("({})", any.join(" OR ")));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    format!(
        "SELECT id, timestamp, actor_id, actor_name, actor_role, metric_type, metric_name, \
         previous_value, new_value, percentage_change, department \
         FROM notification.audit_entries {} ORDER BY timestamp DESC, seq DESC",
        where_clause
    )
}

#[async_trait]
impl AuditEntryRepository for AuditEntryPostgresRepository {
    async fn append(&self, entry: &AuditEntry) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO notification.audit_entries \
             (id, timestamp, actor_id, actor_name, actor_role, metric_type, metric_name, \
              previous_value, new_value, percentage_change, department) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(entry.id)
        .bind(entry.timestamp)
        .bind(&entry.actor_id)
        .bind(&entry.actor_name)
        .bind(entry.actor_role.as_str())
        .bind(&entry.metric_type)
        .bind(&entry.metric_name)
        .bind(entry.previous_value)
        .bind(entry.new_value)
        .bind(entry.percentage_change)
        .bind(&entry.department)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    async fn search(&self, filter: &AuditEntryFilter) -> anyhow::Result<Vec<AuditEntry>> {
        let metric_type = filter.metric_type.as_deref().filter(|s| !s.is_empty());
        let actor_name = filter.actor_name.as_deref().filter(|s| !s.is_empty());
        let search = filter.search.as_deref().filter(|s| !s.is_empty());

        let sql = search_sql(metric_type, actor_name, search);

        let mut query = sqlx::query_as::<_, AuditEntryRow>(&sql);
        if let Some(v) = metric_type {
            query = query.bind(v);
        }
        if let Some(v) = actor_name {
            query = query.bind(v);
        }
        if let Some(v) = search {
            query = query.bind(v);
        }

        let rows = query.fetch_all(self.pool.as_ref()).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
