use {async_trait::async_trait, sqlx::SqlitePool};

use mistok_common::PartyId;

/// A stored user profile, keyed by the transport identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: PartyId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub phone: String,
}

impl UserProfile {
    /// "{first} {last}" with empty parts collapsed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Durable profile mapping. A non-empty phone number is what unlocks the
/// menu for non-administrators.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert(&self, profile: &UserProfile) -> anyhow::Result<()>;

    /// The stored phone number, or `None` when the user is unknown or the
    /// stored number is empty.
    async fn phone(&self, id: PartyId) -> anyhow::Result<Option<String>>;

    /// All profiles ordered by id.
    async fn list_all(&self) -> anyhow::Result<Vec<UserProfile>>;

    /// Returns whether a row was actually removed.
    async fn delete(&self, id: PartyId) -> anyhow::Result<bool>;
}

pub struct SqliteProfileStore {
    pool: SqlitePool,
}

impl SqliteProfileStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for SqliteProfileStore {
    async fn upsert(&self, profile: &UserProfile) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO users (user_id, first_name, last_name, username, phone)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name  = excluded.last_name,
                 username   = excluded.username,
                 phone      = excluded.phone",
        )
        .bind(profile.user_id.0)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.username)
        .bind(&profile.phone)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn phone(&self, id: PartyId) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT phone FROM users WHERE user_id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(phone,)| phone).filter(|phone| !phone.is_empty()))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<UserProfile>> {
        let rows: Vec<(i64, String, String, String, String)> = sqlx::query_as(
            "SELECT user_id, first_name, last_name, username, phone
             FROM users ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(
                |(user_id, first_name, last_name, username, phone)| UserProfile {
                    user_id: PartyId(user_id),
                    first_name,
                    last_name,
                    username,
                    phone,
                },
            )
            .collect())
    }

    async fn delete(&self, id: PartyId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
