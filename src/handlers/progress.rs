use axum::{
    extract::{Query, State},
    Extension,
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::analytics::{habit_day_status, reward_progress};
use crate::auth::middleware::AuthUser;
use crate::cache::{CachedReport, ReportKind};
use crate::error::AppResult;
use crate::handlers::analytics::{cached_report, calendar_for};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    pub utc_offset_minutes: Option<i32>,
}

/// GET /api/rewards/progress
pub async fn get_reward_progress(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<CachedReport> {
    let calendar = state.config.analytics.calendar;
    let now = Utc::now();

    cached_report(
        &state,
        auth_user.id,
        ReportKind::RewardProgress,
        calendar,
        now,
        // completions are not read
        Some(now),
        |input| Ok(reward_progress(&input.rewards, &input.habits)),
    )
    .await
}

/// GET /api/habits/today
pub async fn get_habits_today(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<TodayQuery>,
) -> AppResult<CachedReport> {
    let calendar = calendar_for(&state, query.utc_offset_minutes)?;
    let now = Utc::now();

    cached_report(
        &state,
        auth_user.id,
        ReportKind::HabitsToday,
        calendar,
        now,
        Some(now - Duration::days(1)),
        |input| Ok(habit_day_status(&input.habits, &input.completions, now, &calendar)),
    )
    .await
}
