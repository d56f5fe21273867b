use {async_trait::async_trait, sqlx::SqlitePool};

use mistok_common::PartyId;

/// A consultation request joined with the requester's profile, as rendered
/// in the administrator listing. Profile fields are `None` when the user
/// row no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultationRow {
    pub id: i64,
    pub user_id: PartyId,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub datetime: String,
    pub created_at: String,
}

/// Append-only log of consultation requests; rows leave only through the
/// explicit admin delete or the account-deletion cascade.
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    /// Insert a request and return its id.
    async fn append(&self, user_id: PartyId, datetime_text: &str) -> anyhow::Result<i64>;

    /// All requests, newest first.
    async fn list_all(&self) -> anyhow::Result<Vec<ConsultationRow>>;

    /// Returns whether a row was actually removed.
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;

    /// Remove every request belonging to `user_id` (account-deletion
    /// cascade). Returns the number of rows removed.
    async fn delete_for_user(&self, user_id: PartyId) -> anyhow::Result<u64>;
}

pub struct SqliteConsultationStore {
    pool: SqlitePool,
}

impl SqliteConsultationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConsultationStore for SqliteConsultationStore {
    async fn append(&self, user_id: PartyId, datetime_text: &str) -> anyhow::Result<i64> {
        let result = sqlx::query("INSERT INTO consultations (user_id, datetime) VALUES (?, ?)")
            .bind(user_id.0)
            .bind(datetime_text)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<ConsultationRow>> {
        let rows: Vec<(i64, i64, Option<String>, Option<String>, String, String)> =
            sqlx::query_as(
                "SELECT c.id, c.user_id, u.username, u.phone, c.datetime, c.created_at
                 FROM consultations c
                 LEFT JOIN users u ON u.user_id = c.user_id
                 ORDER BY c.id DESC",
            )
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, username, phone, datetime, created_at)| ConsultationRow {
                    id,
                    user_id: PartyId(user_id),
                    username: username.filter(|u| !u.is_empty()),
                    phone: phone.filter(|p| !p.is_empty()),
                    datetime,
                    created_at,
                },
            )
            .collect())
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM consultations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_user(&self, user_id: PartyId) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM consultations WHERE user_id = ?")
            .bind(user_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
