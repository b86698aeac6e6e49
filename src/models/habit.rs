use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HabitRecord {
    pub id: Uuid,
    pub reward_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub points_per_completion: i32,
    pub created_at: DateTime<Utc>,
}
