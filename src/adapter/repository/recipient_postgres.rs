use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::entity::recipient::{Recipient, RecipientFilter};
use crate::domain::repository::RecipientRepository;

/// RecipientPostgresRepository reads the recipient directory. Rows without a
/// usable contact address are never returned.
pub struct RecipientPostgresRepository {
    pool: Arc<PgPool>,
}

impl RecipientPostgresRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RecipientRow {
    id: String,
    contact_address: Option<String>,
    display_name: String,
    role: String,
    department: Option<String>,
}

impl TryFrom<RecipientRow> for Recipient {
    type Error = anyhow::Error;

    fn try_from(r: RecipientRow) -> Result<Self, Self::Error> {
        Ok(Recipient {
            id: r.id,
            contact_address: r.contact_address,
            display_name: r.display_name,
            role: r.role.parse().map_err(anyhow::Error::msg)?,
            department: r.department,
        })
    }
}

#[async_trait]
impl RecipientRepository for RecipientPostgresRepository {
    async fn find(&self, filter: &RecipientFilter) -> anyhow::Result<Vec<Recipient>> {
        let mut conditions =
            vec!["contact_address IS NOT NULL AND btrim(contact_address) <> ''".to_string()];
        let mut bind_index = 1u32;

        if filter.role.is_some() {
            conditions.push(format!("role = ${}", bind_index));
            bind_index += 1;
        }
        if filter.department.is_some() {
            conditions.push(format!("department = ${}", bind_index));
        }

        let sql = format!(
            "SELECT id, contact_address, display_name, role, department \
             FROM notification.recipients WHERE {} ORDER BY display_name ASC, id ASC",
            conditions.join(" AND ")
        );

        let mut query = sqlx::query_as::<_, RecipientRow>(&sql);
        if let Some(role) = filter.role {
            query = query.bind(role.as_str());
        }
        if let Some(ref department) = filter.department {
            query = query.bind(department);
        }

        let rows = query.fetch_all(self.pool.as_ref()).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}
