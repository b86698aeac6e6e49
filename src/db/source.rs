use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::analytics::AnalyticsInput;
use crate::error::AppResult;
use crate::models::{CompletionEvent, HabitRecord, RewardSnapshot};

/// Fingerprint of a user's rows: counts plus a digest over every column the
/// analytics read. Any insert, delete or edit of those columns changes it,
/// whether or not the writer touched `updated_at`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, FromRow)]
pub struct DataVersion {
    pub completion_count: i64,
    pub completions_digest: Option<String>,
    pub habit_count: i64,
    pub habits_digest: Option<String>,
    pub reward_count: i64,
    pub rewards_digest: Option<String>,
}

/// Read-only access to a user's habit data. Handed to the service as a
/// trait object so the analytics never reach for a global client.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Completion events at or after `since` (all history when `None`).
    async fn completions(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<CompletionEvent>>;

    async fn habits(&self, user_id: Uuid) -> AppResult<Vec<HabitRecord>>;

    async fn rewards(&self, user_id: Uuid) -> AppResult<Vec<RewardSnapshot>>;

    async fn version(&self, user_id: Uuid) -> AppResult<DataVersion>;

    async fn ping(&self) -> AppResult<()>;

    /// Everything the aggregators need, with completions limited to `since`.
    async fn snapshot(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<AnalyticsInput> {
        let (completions, habits, rewards) = tokio::try_join!(
            self.completions(user_id, since),
            self.habits(user_id),
            self.rewards(user_id),
        )?;
        Ok(AnalyticsInput {
            completions,
            habits,
            rewards,
        })
    }
}

#[derive(Clone)]
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsSource for PgSource {
    async fn completions(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<CompletionEvent>> {
        let rows = sqlx::query_as::<_, CompletionEvent>(
            r#"
            SELECT id, habit_id, user_id, completed_at, points_earned
            FROM habit_completions
            WHERE user_id = $1 AND ($2::timestamptz IS NULL OR completed_at >= $2)
            ORDER BY completed_at ASC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn habits(&self, user_id: Uuid) -> AppResult<Vec<HabitRecord>> {
        let rows = sqlx::query_as::<_, HabitRecord>(
            r#"
            SELECT id, reward_id, user_id, name, points_per_completion, created_at
            FROM habits
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn rewards(&self, user_id: Uuid) -> AppResult<Vec<RewardSnapshot>> {
        let rows = sqlx::query_as::<_, RewardSnapshot>(
            r#"
            SELECT id, user_id, title, current_points, target_points, is_claimed
            FROM rewards
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn version(&self, user_id: Uuid) -> AppResult<DataVersion> {
        let version = sqlx::query_as::<_, DataVersion>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM habit_completions WHERE user_id = $1) AS completion_count,
                (SELECT md5(string_agg(
                    concat_ws('|', id, habit_id, extract(epoch FROM completed_at), points_earned),
                    ',' ORDER BY id))
                 FROM habit_completions WHERE user_id = $1) AS completions_digest,
                (SELECT COUNT(*) FROM habits WHERE user_id = $1) AS habit_count,
                (SELECT md5(string_agg(
                    concat_ws('|', id, reward_id, name, points_per_completion, extract(epoch FROM created_at)),
                    ',' ORDER BY id))
                 FROM habits WHERE user_id = $1) AS habits_digest,
                (SELECT COUNT(*) FROM rewards WHERE user_id = $1) AS reward_count,
                (SELECT md5(string_agg(
                    concat_ws('|', id, title, current_points, target_points, is_claimed),
                    ',' ORDER BY id))
                 FROM rewards WHERE user_id = $1) AS rewards_digest
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(version)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
