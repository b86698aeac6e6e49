use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A goal with a point threshold. Claiming is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RewardSnapshot {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub current_points: i32,
    pub target_points: i32,
    pub is_claimed: bool,
}

impl RewardSnapshot {
    pub fn has_reached_target(&self) -> bool {
        self.current_points >= self.target_points
    }

    pub fn is_ready_to_claim(&self) -> bool {
        self.has_reached_target() && !self.is_claimed
    }

    pub fn is_active(&self) -> bool {
        !self.is_claimed && !self.has_reached_target()
    }
}
