use serde::Serialize;
use uuid::Uuid;

use crate::models::{HabitRecord, RewardSnapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardOverview {
    pub total_rewards: i64,
    /// Unclaimed and below target.
    pub active_rewards: i64,
    /// At or above target, claimed or not. Overlaps with `claimed_rewards`.
    pub completed_rewards: i64,
    pub claimed_rewards: i64,
    pub total_points_earned: i64,
    pub total_target_points: i64,
}

pub fn reward_overview(rewards: &[RewardSnapshot]) -> RewardOverview {
    rewards
        .iter()
        .fold(RewardOverview::default(), |mut acc, reward| {
            acc.total_rewards += 1;
            if reward.is_active() {
                acc.active_rewards += 1;
            }
            if reward.has_reached_target() {
                acc.completed_rewards += 1;
            }
            if reward.is_claimed {
                acc.claimed_rewards += 1;
            }
            acc.total_points_earned += i64::from(reward.current_points);
            acc.total_target_points += i64::from(reward.target_points);
            acc
        })
}

/// Progress of a single reward towards its threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardProgress {
    pub reward_id: Uuid,
    pub title: String,
    pub current_points: i32,
    pub target_points: i32,
    /// Capped at 100 for display; `current_points` keeps the real value.
    pub progress_percent: f64,
    pub points_remaining: i32,
    pub is_claimed: bool,
    pub is_ready_to_claim: bool,
    pub habit_count: i64,
}

impl RewardProgress {
    fn new(reward: &RewardSnapshot, habit_count: i64) -> Self {
        let progress_percent = if reward.target_points > 0 {
            (f64::from(reward.current_points) / f64::from(reward.target_points) * 100.0).min(100.0)
        } else {
            0.0
        };

        Self {
            reward_id: reward.id,
            title: reward.title.clone(),
            current_points: reward.current_points,
            target_points: reward.target_points,
            progress_percent,
            points_remaining: (reward.target_points - reward.current_points).max(0),
            is_claimed: reward.is_claimed,
            is_ready_to_claim: reward.is_ready_to_claim(),
            habit_count,
        }
    }
}

/// Per-reward progress, in the order the rewards were given.
pub fn reward_progress(rewards: &[RewardSnapshot], habits: &[HabitRecord]) -> Vec<RewardProgress> {
    rewards
        .iter()
        .map(|reward| {
            let habit_count = habits.iter().filter(|h| h.reward_id == reward.id).count() as i64;
            RewardProgress::new(reward, habit_count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::fixtures::{at, habit, reward};

    #[test]
    fn overview_matches_reference_example() {
        let rewards = vec![
            reward(100, 100, false),
            reward(50, 100, false),
            reward(200, 100, true),
        ];

        assert_eq!(
            reward_overview(&rewards),
            RewardOverview {
                total_rewards: 3,
                active_rewards: 1,
                completed_rewards: 2,
                claimed_rewards: 1,
                total_points_earned: 350,
                total_target_points: 300,
            }
        );
    }

    #[test]
    fn empty_rewards_yield_zeroes() {
        assert_eq!(reward_overview(&[]), RewardOverview::default());
    }

    #[test]
    fn claimed_below_target_is_neither_active_nor_completed() {
        let overview = reward_overview(&[reward(20, 100, true)]);
        assert_eq!(overview.active_rewards, 0);
        assert_eq!(overview.completed_rewards, 0);
        assert_eq!(overview.claimed_rewards, 1);
    }

    #[test]
    fn progress_caps_percent_and_counts_habits() {
        let over = reward(250, 200, false);
        let partial = reward(30, 120, false);

        let mut h1 = habit(at(2024, 3, 1, 0, 0));
        h1.reward_id = over.id;
        let mut h2 = habit(at(2024, 3, 2, 0, 0));
        h2.reward_id = over.id;
        let mut h3 = habit(at(2024, 3, 3, 0, 0));
        h3.reward_id = partial.id;

        let progress = reward_progress(&[over, partial], &[h1, h2, h3]);

        assert_eq!(progress[0].progress_percent, 100.0);
        assert_eq!(progress[0].points_remaining, 0);
        assert!(progress[0].is_ready_to_claim);
        assert_eq!(progress[0].habit_count, 2);

        assert_eq!(progress[1].progress_percent, 25.0);
        assert_eq!(progress[1].points_remaining, 90);
        assert!(!progress[1].is_ready_to_claim);
        assert_eq!(progress[1].habit_count, 1);
    }
}
