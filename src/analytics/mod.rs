//! Pure analytics over a user's completion history and reward snapshots.
//!
//! Nothing in here performs I/O. Every function takes an explicit `now` and a
//! [`Calendar`] so that the same inputs always produce the same report.

pub mod calendar;
pub mod daily;
pub mod habits;
pub mod input;
pub mod report;
pub mod rewards;
pub mod streak;
pub mod weekly;

pub use calendar::Calendar;
pub use daily::{daily_stats, DailyStat};
pub use habits::{habit_day_status, HabitDayStatus};
pub use input::{AnalyticsInput, RawSnapshot};
pub use report::{AnalyticsReport, ReportParams};
pub use rewards::{reward_overview, reward_progress, RewardOverview, RewardProgress};
pub use streak::{streak_data, StreakData};
pub use weekly::{weekly_stats, WeeklyStat};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};
    use uuid::Uuid;

    use crate::models::{CompletionEvent, HabitRecord, RewardSnapshot};

    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    /// Fixed evaluation instant used across the analytics tests.
    pub fn now() -> DateTime<Utc> {
        at(2024, 3, 15, 12, 0)
    }

    pub fn habit(created_at: DateTime<Utc>) -> HabitRecord {
        HabitRecord {
            id: Uuid::new_v4(),
            reward_id: Uuid::nil(),
            user_id: Uuid::nil(),
            name: "Read 20 pages".into(),
            points_per_completion: 10,
            created_at,
        }
    }

    pub fn completion(habit_id: Uuid, completed_at: DateTime<Utc>, points: i32) -> CompletionEvent {
        CompletionEvent {
            id: Uuid::new_v4(),
            habit_id,
            user_id: Uuid::nil(),
            completed_at,
            points_earned: points,
        }
    }

    pub fn reward(current: i32, target: i32, claimed: bool) -> RewardSnapshot {
        RewardSnapshot {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            title: "New headphones".into(),
            current_points: current,
            target_points: target,
            is_claimed: claimed,
        }
    }
}
