//! Conversion of loosely-typed snapshots (string timestamps, wide integers)
//! into the typed rows the aggregators work on.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::calendar::parse_timestamp;
use super::{AnalyticsError, AnalyticsResult};
use crate::models::{CompletionEvent, HabitRecord, RewardSnapshot};

/// Everything the aggregators read for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsInput {
    pub completions: Vec<CompletionEvent>,
    pub habits: Vec<HabitRecord>,
    pub rewards: Vec<RewardSnapshot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    /// Evaluation instant; the wall clock is used when absent.
    pub now: Option<String>,
    #[serde(default)]
    pub completions: Vec<RawCompletion>,
    #[serde(default)]
    pub habits: Vec<RawHabit>,
    #[serde(default)]
    pub rewards: Vec<RawReward>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompletion {
    pub id: Option<Uuid>,
    pub habit_id: Uuid,
    pub completed_at: String,
    pub points_earned: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHabit {
    pub id: Uuid,
    pub reward_id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    pub created_at: String,
    pub points_per_completion: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReward {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    pub current_points: i64,
    pub target_points: i64,
    #[serde(default)]
    pub is_claimed: bool,
}

impl RawSnapshot {
    pub fn into_parts(self) -> AnalyticsResult<(Option<DateTime<Utc>>, AnalyticsInput)> {
        let now = self
            .now
            .as_deref()
            .map(|raw| parse_field(raw, "now"))
            .transpose()?;

        let completions = self
            .completions
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.parse(i))
            .collect::<AnalyticsResult<Vec<_>>>()?;
        let habits = self
            .habits
            .into_iter()
            .enumerate()
            .map(|(i, h)| h.parse(i))
            .collect::<AnalyticsResult<Vec<_>>>()?;
        let rewards = self
            .rewards
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.parse(i))
            .collect::<AnalyticsResult<Vec<_>>>()?;

        Ok((
            now,
            AnalyticsInput {
                completions,
                habits,
                rewards,
            },
        ))
    }
}

impl RawCompletion {
    fn parse(self, index: usize) -> AnalyticsResult<CompletionEvent> {
        let field = format!("completions[{}]", index);
        Ok(CompletionEvent {
            id: self.id.unwrap_or_else(Uuid::nil),
            habit_id: self.habit_id,
            user_id: Uuid::nil(),
            completed_at: parse_field(&self.completed_at, &format!("{}.completedAt", field))?,
            points_earned: points_in_range(self.points_earned, 0, &format!("{}.pointsEarned", field))?,
        })
    }
}

impl RawHabit {
    fn parse(self, index: usize) -> AnalyticsResult<HabitRecord> {
        let field = format!("habits[{}]", index);
        Ok(HabitRecord {
            id: self.id,
            reward_id: self.reward_id.unwrap_or_else(Uuid::nil),
            user_id: Uuid::nil(),
            name: self.name,
            points_per_completion: points_in_range(
                self.points_per_completion,
                1,
                &format!("{}.pointsPerCompletion", field),
            )?,
            created_at: parse_field(&self.created_at, &format!("{}.createdAt", field))?,
        })
    }
}

impl RawReward {
    fn parse(self, index: usize) -> AnalyticsResult<RewardSnapshot> {
        let field = format!("rewards[{}]", index);
        Ok(RewardSnapshot {
            id: self.id,
            user_id: Uuid::nil(),
            title: self.title,
            current_points: points_in_range(self.current_points, 0, &format!("{}.currentPoints", field))?,
            target_points: points_in_range(self.target_points, 1, &format!("{}.targetPoints", field))?,
            is_claimed: self.is_claimed,
        })
    }
}

fn parse_field(raw: &str, field: &str) -> AnalyticsResult<DateTime<Utc>> {
    parse_timestamp(raw).map_err(|e| match e {
        AnalyticsError::MalformedInput(msg) => AnalyticsError::MalformedInput(format!("{}: {}", field, msg)),
        other => other,
    })
}

fn points_in_range(value: i64, min: i32, field: &str) -> AnalyticsResult<i32> {
    i32::try_from(value)
        .ok()
        .filter(|v| *v >= min)
        .ok_or_else(|| {
            AnalyticsError::MalformedInput(format!(
                "{}: expected an integer between {} and {}, got {}",
                field,
                min,
                i32::MAX,
                value
            ))
        })
}
