use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{session::Session, user::User},
};

#[derive(Clone)]
pub struct SessionStore {
    db: DbPool,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(db: DbPool, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    pub async fn create(&self, user: &User) -> Result<Session, AppError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            created_at: now,
            last_seen_at: now,
            expires_at: Some(now + self.ttl),
        };

        sqlx::query(
            "INSERT INTO sessions (id, user_id, username, created_at, last_seen_at, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.username)
        .bind(session.created_at)
        .bind(session.last_seen_at)
        .bind(session.expires_at)
        .execute(&self.db)
        .await?;

        debug!(username = %session.username, "session created");
        Ok(session)
    }

    /// Resolves a live session and bumps `last_seen_at`. Expired sessions
    /// are removed and reported as absent.
    pub async fn find_active(&self, id: &str) -> Result<Option<Session>, AppError> {
        let Some(mut session) = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, username, created_at, last_seen_at, expires_at \
             FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        else {
            return Ok(None);
        };

        let now = Utc::now();
        if session.is_expired_at(now) {
            debug!(username = %session.username, "session expired");
            self.destroy(id).await?;
            return Ok(None);
        }

        sqlx::query("UPDATE sessions SET last_seen_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.db)
            .await?;
        session.last_seen_at = now;
        Ok(Some(session))
    }

    pub async fn destroy(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
