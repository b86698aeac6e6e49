use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::Calendar;
use crate::models::{CompletionEvent, HabitRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDayStatus {
    pub habit_id: Uuid,
    pub reward_id: Uuid,
    pub name: String,
    pub points_per_completion: i32,
    pub completions_today: i64,
    pub points_today: i64,
}

/// Today's completion count per habit, newest habit first.
pub fn habit_day_status(
    habits: &[HabitRecord],
    events: &[CompletionEvent],
    now: DateTime<Utc>,
    calendar: &Calendar,
) -> Vec<HabitDayStatus> {
    let today = calendar.day_of(now);
    let todays: Vec<&CompletionEvent> = events
        .iter()
        .filter(|e| calendar.day_of(e.completed_at) == today)
        .collect();

    let mut ordered: Vec<&HabitRecord> = habits.iter().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

    ordered
        .into_iter()
        .map(|habit| {
            let (completions_today, points_today) = todays
                .iter()
                .filter(|e| e.habit_id == habit.id)
                .fold((0i64, 0i64), |(n, pts), e| (n + 1, pts + i64::from(e.points_earned)));

            HabitDayStatus {
                habit_id: habit.id,
                reward_id: habit.reward_id,
                name: habit.name.clone(),
                points_per_completion: habit.points_per_completion,
                completions_today,
                points_today,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{at, completion, habit, now};

    #[test]
    fn counts_only_todays_completions() {
        let older = habit(at(2024, 2, 1, 0, 0));
        let newer = habit(at(2024, 3, 1, 0, 0));
        let events = vec![
            completion(older.id, at(2024, 3, 15, 7, 0), 10),
            completion(older.id, at(2024, 3, 15, 9, 0), 12),
            completion(older.id, at(2024, 3, 14, 9, 0), 10),
            completion(newer.id, at(2024, 3, 14, 23, 0), 10),
        ];

        let status = habit_day_status(&[older.clone(), newer.clone()], &events, now(), &Calendar::utc());

        assert_eq!(status[0].habit_id, newer.id);
        assert_eq!(status[0].completions_today, 0);
        assert_eq!(status[1].habit_id, older.id);
        assert_eq!(status[1].completions_today, 2);
        assert_eq!(status[1].points_today, 22);
    }

    #[test]
    fn offset_decides_what_today_means() {
        let h = habit(at(2024, 3, 1, 0, 0));
        let events = vec![completion(h.id, at(2024, 3, 14, 23, 0), 10)];
        let east = Calendar::from_offset_minutes(60).unwrap();

        let status = habit_day_status(&[h], &events, now(), &east);
        assert_eq!(status[0].completions_today, 1);
    }
}
