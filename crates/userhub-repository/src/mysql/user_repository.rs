//! MySQL user repository implementation.

use crate::{traits::UserRepository, DatabasePool};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;
use userhub_core::{Email, HubError, HubResult, NewUser, UserChanges, UserId, UserProfile};

/// MySQL user repository implementation.
#[derive(Clone)]
pub struct MySqlUserRepository {
    pool: Arc<DatabasePool>,
}

impl MySqlUserRepository {
    /// Creates a new MySQL user repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }
}

/// Database row for a user, without the password hash.
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            name: row.name,
            email: Email::new_unchecked(row.email),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Keeps the server's own wording (table and index names) out of the error
/// that reaches clients.
fn rejected(err: sqlx::Error) -> HubError {
    debug!("Write rejected by MySQL: {}", err);
    HubError::from(err)
}

#[async_trait]
impl UserRepository for MySqlUserRepository {
    async fn find_by_id(&self, id: UserId) -> HubResult<Option<UserProfile>> {
        debug!("Finding user by id: {}", id);

        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, created_at, updated_at
            FROM users
            WHERE id = ?
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(row.map(UserProfile::from))
    }

    async fn find_all(&self) -> HubResult<Vec<UserProfile>> {
        debug!("Finding all users");

        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, created_at, updated_at
            FROM users
            ORDER BY id ASC
            ",
        )
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    async fn exists_by_email(&self, email: &str) -> HubResult<bool> {
        let result: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM users WHERE LOWER(email) = LOWER(?) LIMIT 1")
                .bind(email)
                .fetch_optional(self.pool.inner())
                .await?;

        Ok(result.is_some())
    }

    async fn insert(&self, user: &NewUser) -> HubResult<UserProfile> {
        debug!("Inserting new user: {}", user.email);

        let now = Utc::now();

        // MySQL doesn't support RETURNING, so insert then select
        let result = sqlx::query(
            r"
            INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .execute(self.pool.inner())
        .await
        .map_err(rejected)?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|e| HubError::Internal(format!("Inserted id out of range: {e}")))?;

        self.find_by_id(UserId(id))
            .await?
            .ok_or_else(|| HubError::Internal("Failed to fetch inserted user".to_string()))
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> HubResult<Option<UserProfile>> {
        debug!("Updating user: {}", id);

        let result = sqlx::query(
            r"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(changes.name.as_deref())
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(changes.password_hash.as_deref())
        .bind(Utc::now())
        .bind(id.into_inner())
        .execute(self.pool.inner())
        .await
        .map_err(rejected)?;

        // MySQL reports zero affected rows when nothing changed, so
        // existence is decided by the follow-up read.
        debug!("Update touched {} row(s)", result.rows_affected());
        self.find_by_id(id).await
    }

    async fn delete(&self, id: UserId) -> HubResult<bool> {
        debug!("Deleting user: {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.into_inner())
            .execute(self.pool.inner())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
