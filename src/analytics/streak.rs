use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use super::Calendar;
use crate::models::CompletionEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_completion_date: Option<DateTime<Utc>>,
}

/// Consecutive-day streaks over the distinct days that have at least one
/// completion. The current streak only survives if the latest such day is
/// today or yesterday.
pub fn streak_data(events: &[CompletionEvent], now: DateTime<Utc>, calendar: &Calendar) -> StreakData {
    let Some(last_completion) = events.iter().map(|e| e.completed_at).max() else {
        return StreakData::default();
    };

    let distinct: BTreeSet<NaiveDate> = events
        .iter()
        .map(|e| calendar.day_of(e.completed_at))
        .collect();
    let descending: Vec<NaiveDate> = distinct.into_iter().rev().collect();

    let today = calendar.day_of(now);
    let yesterday = today - Duration::days(1);

    let current_streak = match descending.first() {
        Some(latest) if *latest == today || *latest == yesterday => leading_run(&descending),
        _ => 0,
    };
    let longest_streak = longest_run(&descending).max(current_streak);

    StreakData {
        current_streak,
        longest_streak,
        last_completion_date: Some(last_completion),
    }
}

fn is_previous_day(later: NaiveDate, earlier: NaiveDate) -> bool {
    later - earlier == Duration::days(1)
}

/// Length of the unbroken run starting at the head of a descending list.
fn leading_run(descending: &[NaiveDate]) -> i32 {
    if descending.is_empty() {
        return 0;
    }
    let unbroken = descending
        .windows(2)
        .take_while(|pair| is_previous_day(pair[0], pair[1]))
        .count();
    unbroken as i32 + 1
}

fn longest_run(descending: &[NaiveDate]) -> i32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for day in descending {
        run = match prev {
            Some(p) if is_previous_day(p, *day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*day);
    }

    longest
}
