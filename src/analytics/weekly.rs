use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{daily_stats, AnalyticsError, AnalyticsResult, Calendar, DailyStat};
use crate::models::{CompletionEvent, HabitRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyStat {
    /// `"YYYY-MM-DD - YYYY-MM-DD"`
    pub week: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub completions: i64,
    pub points_earned: i64,
    /// Unweighted mean of the seven daily rates. Days with more habits do
    /// not weigh more, so this is an approximation of the weekly rate.
    pub average_completion_rate: f64,
}

impl WeeklyStat {
    fn from_days(days: &[DailyStat]) -> Option<Self> {
        let week_start = days.first()?.date;
        let week_end = days.last()?.date;
        let rate_sum: f64 = days.iter().map(|d| d.completion_rate).sum();

        Some(Self {
            week: format!("{} - {}", week_start, week_end),
            week_start,
            week_end,
            completions: days.iter().map(|d| d.completions).sum(),
            points_earned: days.iter().map(|d| d.points_earned).sum(),
            average_completion_rate: rate_sum / days.len() as f64,
        })
    }
}

/// Roll the trailing `weeks * 7` days into non-overlapping 7-day windows,
/// oldest first. Window `k` (counting back from the most recent) ends at
/// `today - 7k`.
pub fn weekly_stats(
    events: &[CompletionEvent],
    habits: &[HabitRecord],
    weeks: u32,
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> AnalyticsResult<Vec<WeeklyStat>> {
    if weeks == 0 {
        return Err(AnalyticsError::InvalidArgument(
            "weeks must be a positive integer".into(),
        ));
    }
    let days = weeks
        .checked_mul(7)
        .ok_or_else(|| AnalyticsError::InvalidArgument(format!("{} weeks is too many", weeks)))?;

    let daily = daily_stats(events, habits, days, now, calendar)?;

    Ok(daily.chunks(7).filter_map(WeeklyStat::from_days).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{at, completion, habit, now};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    #[test]
    fn windows_are_anchored_at_today() {
        let stats = weekly_stats(&[], &[], 2, now(), &Calendar::utc()).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].week_start, date(3, 2));
        assert_eq!(stats[0].week_end, date(3, 8));
        assert_eq!(stats[1].week_start, date(3, 9));
        assert_eq!(stats[1].week_end, date(3, 15));
        assert_eq!(stats[1].week, "2024-03-09 - 2024-03-15");
    }

    #[test]
    fn sums_match_daily_window() {
        let h = habit(at(2024, 1, 1, 0, 0));
        let events: Vec<_> = (1..=20)
            .map(|d| completion(h.id, at(2024, 3, d, 7, 0), 5))
            .chain(std::iter::once(completion(h.id, at(2024, 2, 1, 7, 0), 5)))
            .collect();
        let habits = vec![h];

        let weekly = weekly_stats(&events, &habits, 3, now(), &Calendar::utc()).unwrap();
        let daily = daily_stats(&events, &habits, 21, now(), &Calendar::utc()).unwrap();

        let weekly_total: i64 = weekly.iter().map(|w| w.completions).sum();
        let daily_total: i64 = daily.iter().map(|d| d.completions).sum();
        assert_eq!(weekly_total, daily_total);
        assert_eq!(weekly_total, 15);
        assert_eq!(weekly.iter().map(|w| w.points_earned).sum::<i64>(), 75);
    }

    #[test]
    fn average_rate_is_unweighted() {
        let early = habit(at(2024, 1, 1, 0, 0));
        // Second habit only exists for the last day of the week.
        let late = habit(at(2024, 3, 15, 6, 0));
        let events = vec![
            completion(early.id, at(2024, 3, 14, 9, 0), 10),
            completion(early.id, at(2024, 3, 15, 9, 0), 10),
        ];

        let stats = weekly_stats(&events, &[early, late], 1, now(), &Calendar::utc()).unwrap();

        // Daily rates: five zeros, 100 and 50.
        assert!((stats[0].average_completion_rate - 150.0 / 7.0).abs() < 1e-9);
        assert_eq!(stats[0].completions, 2);
    }

    #[test]
    fn oversized_window_is_invalid() {
        for weeks in [600_000_000, u32::MAX] {
            assert!(matches!(
                weekly_stats(&[], &[], weeks, now(), &Calendar::utc()),
                Err(AnalyticsError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn zero_weeks_is_invalid() {
        assert!(matches!(
            weekly_stats(&[], &[], 0, now(), &Calendar::utc()),
            Err(AnalyticsError::InvalidArgument(_))
        ));
    }
}
