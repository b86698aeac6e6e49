use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::source::{AnalyticsSource, DataVersion};
use crate::error::AppResult;
use crate::models::{CompletionEvent, HabitRecord, RewardSnapshot};

/// In-process source for local runs and tests.
#[derive(Clone, Default)]
pub struct MemorySource {
    tables: Arc<Mutex<Tables>>,
}

#[derive(Default)]
struct Tables {
    completions: Vec<CompletionEvent>,
    habits: Vec<HabitRecord>,
    rewards: Vec<RewardSnapshot>,
}

/// Digest of rows keyed by id, independent of insertion order. `None` when
/// there are no rows.
fn digest(mut rows: Vec<(Uuid, String)>) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    rows.sort_by_key(|(id, _)| *id);
    let mut hasher = Sha256::new();
    for (_, row) in &rows {
        hasher.update(row.as_bytes());
        hasher.update(b",");
    }
    Some(hex::encode(hasher.finalize()))
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_habit(&self, habit: HabitRecord) {
        let mut tables = self.tables.lock().await;
        tables.habits.retain(|h| h.id != habit.id);
        tables.habits.push(habit);
    }

    pub async fn upsert_reward(&self, reward: RewardSnapshot) {
        let mut tables = self.tables.lock().await;
        match tables.rewards.iter_mut().find(|r| r.id == reward.id) {
            Some(existing) => *existing = reward,
            None => tables.rewards.push(reward),
        }
    }

    pub async fn record_completion(&self, event: CompletionEvent) {
        self.tables.lock().await.completions.push(event);
    }

    /// Remove a completion, as the "undo" action does. Returns whether it existed.
    pub async fn undo_completion(&self, completion_id: Uuid) -> bool {
        let mut tables = self.tables.lock().await;
        let before = tables.completions.len();
        tables.completions.retain(|c| c.id != completion_id);
        tables.completions.len() != before
    }
}

#[async_trait]
impl AnalyticsSource for MemorySource {
    async fn completions(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<CompletionEvent>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<CompletionEvent> = tables
            .completions
            .iter()
            .filter(|c| c.user_id == user_id)
            .filter(|c| since.map_or(true, |s| c.completed_at >= s))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.completed_at);
        Ok(rows)
    }

    async fn habits(&self, user_id: Uuid) -> AppResult<Vec<HabitRecord>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<HabitRecord> = tables
            .habits
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn rewards(&self, user_id: Uuid) -> AppResult<Vec<RewardSnapshot>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rewards
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn version(&self, user_id: Uuid) -> AppResult<DataVersion> {
        let tables = self.tables.lock().await;

        let completions: Vec<(Uuid, String)> = tables
            .completions
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| {
                let row = format!(
                    "{}|{}|{}|{}",
                    c.id,
                    c.habit_id,
                    c.completed_at.timestamp_micros(),
                    c.points_earned
                );
                (c.id, row)
            })
            .collect();
        let habits: Vec<(Uuid, String)> = tables
            .habits
            .iter()
            .filter(|h| h.user_id == user_id)
            .map(|h| {
                let row = format!(
                    "{}|{}|{}|{}|{}",
                    h.id,
                    h.reward_id,
                    h.name,
                    h.points_per_completion,
                    h.created_at.timestamp_micros()
                );
                (h.id, row)
            })
            .collect();
        let rewards: Vec<(Uuid, String)> = tables
            .rewards
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| {
                let row = format!(
                    "{}|{}|{}|{}|{}",
                    r.id, r.title, r.current_points, r.target_points, r.is_claimed
                );
                (r.id, row)
            })
            .collect();

        Ok(DataVersion {
            completion_count: completions.len() as i64,
            completions_digest: digest(completions),
            habit_count: habits.len() as i64,
            habits_digest: digest(habits),
            reward_count: rewards.len() as i64,
            rewards_digest: digest(rewards),
        })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
