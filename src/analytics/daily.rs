use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;

use super::{AnalyticsError, AnalyticsResult, Calendar};
use crate::models::{CompletionEvent, HabitRecord};

/// Longest window any aggregator will build, about a century of days.
pub const MAX_WINDOW_DAYS: u32 = 36_600;

/// One calendar day's rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: NaiveDate,
    pub completions: i64,
    pub points_earned: i64,
    /// Habits created on or before `date`.
    pub total_habits: i64,
    /// `completions / total_habits * 100`. Not clamped: a habit done twice
    /// in one day pushes it past 100.
    pub completion_rate: f64,
}

impl DailyStat {
    fn empty(date: NaiveDate, total_habits: i64) -> Self {
        Self {
            date,
            completions: 0,
            points_earned: 0,
            total_habits,
            completion_rate: 0.0,
        }
    }
}

/// Bucket completions into the trailing `days` calendar days ending today,
/// oldest first. Events outside the window are ignored.
pub fn daily_stats(
    events: &[CompletionEvent],
    habits: &[HabitRecord],
    days: u32,
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> AnalyticsResult<Vec<DailyStat>> {
    if days == 0 {
        return Err(AnalyticsError::InvalidArgument(
            "days must be a positive integer".into(),
        ));
    }
    if days > MAX_WINDOW_DAYS {
        return Err(AnalyticsError::InvalidArgument(format!(
            "days may be at most {}, got {}",
            MAX_WINDOW_DAYS, days
        )));
    }

    let today = calendar.day_of(now);
    let window_start = today
        .checked_sub_days(Days::new(u64::from(days) - 1))
        .ok_or_else(|| {
            AnalyticsError::InvalidArgument(format!("{} days reaches before the calendar", days))
        })?;

    let mut habit_days: Vec<NaiveDate> = habits
        .iter()
        .map(|h| calendar.day_of(h.created_at))
        .collect();
    habit_days.sort_unstable();

    let mut stats: Vec<DailyStat> = Calendar::days_ending(today, days)
        .map(|date| {
            let active = habit_days.partition_point(|created| *created <= date);
            DailyStat::empty(date, active as i64)
        })
        .collect();

    for event in events {
        let day = calendar.day_of(event.completed_at);
        if day < window_start || day > today {
            continue;
        }
        let index = (day - window_start).num_days() as usize;
        if let Some(stat) = stats.get_mut(index) {
            stat.completions += 1;
            stat.points_earned += i64::from(event.points_earned);
        }
    }

    for stat in &mut stats {
        if stat.total_habits > 0 {
            stat.completion_rate = stat.completions as f64 / stat.total_habits as f64 * 100.0;
        }
    }

    Ok(stats)
}
