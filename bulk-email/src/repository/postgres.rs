//! PostgreSQL-backed bulk email repository
//!
//! Reads the three tables created by `migrations/0001_bulk_email.sql`:
//! - `bulk_email_optouts` keyed by (user_id, course_id)
//! - `bulk_email_flags`, an append-only history of the global switch
//! - `bulk_email_course_authorizations` keyed by course_id

use crate::{
    config::BulkEmailConfig,
    error::BulkEmailError,
    models::*,
    repository::BulkEmailRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info, warn};

/// PostgreSQL-backed bulk email repository
#[derive(Clone)]
pub struct PostgresBulkEmailRepository {
    pool: PgPool,
}

impl PostgresBulkEmailRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pool sized from configuration
    pub async fn connect(config: &BulkEmailConfig) -> Result<Self, BulkEmailError> {
        let url = config.require_database_url()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(url)
            .await
            .map_err(|e| BulkEmailError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Bulk email database pool created"
        );
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn is_healthy(&self) -> bool {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Bulk email database health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl BulkEmailRepository for PostgresBulkEmailRepository {
    async fn find_optout(&self, user_id: &UserId, course_id: &CourseId) -> Result<bool, BulkEmailError> {
        debug!(user_id = %user_id, course_id = %course_id, "Looking up opt-out");

        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bulk_email_optouts
                WHERE user_id = $1
                  AND course_id = $2
            )
            "#,
        )
        .bind(user_id.as_str())
        .bind(course_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BulkEmailError::Storage(format!("Failed to look up opt-out: {}", e)))?;

        Ok(exists)
    }

    async fn current_flag(&self) -> Result<Option<BulkEmailFlag>, BulkEmailError> {
        debug!("Loading current bulk email flag");

        let row = sqlx::query(
            r#"
            SELECT enabled, require_course_email_auth, change_date, changed_by
            FROM bulk_email_flags
            ORDER BY change_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BulkEmailError::Storage(format!("Failed to load bulk email flag: {}", e)))?;

        let Some(row) = row else {
            debug!("No bulk email flag stored");
            return Ok(None);
        };

        let change_date: DateTime<Utc> = row.try_get("change_date")?;
        Ok(Some(BulkEmailFlag {
            enabled: row.try_get("enabled")?,
            require_course_email_auth: row.try_get("require_course_email_auth")?,
            change_date,
            changed_by: row.try_get("changed_by")?,
        }))
    }

    async fn find_course_authorization(
        &self,
        course_id: &CourseId,
    ) -> Result<Option<CourseAuthorization>, BulkEmailError> {
        debug!(course_id = %course_id, "Looking up course authorization");

        let email_enabled = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT email_enabled
            FROM bulk_email_course_authorizations
            WHERE course_id = $1
            "#,
        )
        .bind(course_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            BulkEmailError::Storage(format!("Failed to look up course authorization: {}", e))
        })?;

        Ok(email_enabled.map(|email_enabled| CourseAuthorization::new(course_id.clone(), email_enabled)))
    }
}
