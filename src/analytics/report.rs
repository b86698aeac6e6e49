use chrono::{DateTime, Utc};
use serde::Serialize;

use super::daily::MAX_WINDOW_DAYS;
use super::{
    daily_stats, reward_overview, streak_data, weekly_stats, AnalyticsError, AnalyticsInput,
    AnalyticsResult, Calendar, DailyStat, RewardOverview, StreakData, WeeklyStat,
};

pub const DEFAULT_DAYS: u32 = 30;
pub const DEFAULT_WEEKS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportParams {
    pub days: u32,
    pub weeks: u32,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self {
            days: DEFAULT_DAYS,
            weeks: DEFAULT_WEEKS,
        }
    }
}

impl ReportParams {
    pub fn new(days: i64, weeks: i64) -> AnalyticsResult<Self> {
        Ok(Self {
            days: window_len(days, "days")?,
            weeks: window_len(weeks, "weeks")?,
        })
    }
}

/// Narrow a caller-supplied window length, rejecting zero, negatives and
/// anything past [`MAX_WINDOW_DAYS`].
pub fn window_len(value: i64, name: &str) -> AnalyticsResult<u32> {
    if value <= 0 {
        return Err(AnalyticsError::InvalidArgument(format!(
            "{} must be a positive integer, got {}",
            name, value
        )));
    }
    u32::try_from(value)
        .ok()
        .filter(|len| *len <= MAX_WINDOW_DAYS)
        .ok_or_else(|| AnalyticsError::InvalidArgument(format!("{} is too large: {}", name, value)))
}

/// The full dashboard: all four computations over one input snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub daily: Vec<DailyStat>,
    pub weekly: Vec<WeeklyStat>,
    pub streak: StreakData,
    pub rewards: RewardOverview,
}

impl AnalyticsReport {
    pub fn compute(
        input: &AnalyticsInput,
        params: ReportParams,
        now: DateTime<Utc>,
        calendar: &Calendar,
    ) -> AnalyticsResult<Self> {
        Ok(Self {
            daily: daily_stats(&input.completions, &input.habits, params.days, now, calendar)?,
            weekly: weekly_stats(&input.completions, &input.habits, params.weeks, now, calendar)?,
            streak: streak_data(&input.completions, now, calendar),
            rewards: reward_overview(&input.rewards),
        })
    }
}
