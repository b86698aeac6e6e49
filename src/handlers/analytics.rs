use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::analytics::report::window_len;
use crate::analytics::{
    daily_stats, reward_overview, streak_data, weekly_stats, AnalyticsInput, AnalyticsReport,
    Calendar, RawSnapshot, ReportParams,
};
use crate::auth::middleware::AuthUser;
use crate::cache::{CacheKey, CachedReport, ReportKind};
use crate::config::AnalyticsConfig;
use crate::error::{AppError, AppResult};
use crate::AppState;

const MAX_SNAPSHOT_ROWS: usize = 50_000;

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
    pub weeks: Option<i64>,
    pub utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "snapshot_size"))]
pub struct ComputeRequest {
    #[serde(flatten)]
    pub snapshot: RawSnapshot,
    pub days: Option<i64>,
    pub weeks: Option<i64>,
    pub utc_offset_minutes: Option<i32>,
}

fn snapshot_size(body: &ComputeRequest) -> Result<(), ValidationError> {
    let snapshot = &body.snapshot;
    let rows = snapshot.completions.len() + snapshot.habits.len() + snapshot.rewards.len();
    if rows > MAX_SNAPSHOT_ROWS {
        let mut err = ValidationError::new("too_many_rows");
        err.message = Some(format!("snapshot may hold at most {} rows", MAX_SNAPSHOT_ROWS).into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub invalidated: usize,
}

pub(crate) fn calendar_for(state: &AppState, offset_minutes: Option<i32>) -> AppResult<Calendar> {
    match offset_minutes {
        Some(minutes) => Ok(Calendar::from_offset_minutes(minutes)?),
        None => Ok(state.config.analytics.calendar),
    }
}

fn check_days(cfg: &AnalyticsConfig, days: u32) -> AppResult<u32> {
    if days > cfg.max_days {
        return Err(AppError::InvalidArgument(format!(
            "days may be at most {}, got {}",
            cfg.max_days, days
        )));
    }
    Ok(days)
}

fn check_weeks(cfg: &AnalyticsConfig, weeks: u32) -> AppResult<u32> {
    if u64::from(weeks) * 7 > u64::from(cfg.max_days) {
        return Err(AppError::InvalidArgument(format!(
            "weeks may be at most {}, got {}",
            cfg.max_days / 7,
            weeks
        )));
    }
    Ok(weeks)
}

fn days_param(state: &AppState, days: Option<i64>) -> AppResult<u32> {
    let cfg = &state.config.analytics;
    let days = window_len(days.unwrap_or_else(|| i64::from(cfg.default_days)), "days")?;
    check_days(cfg, days)
}

fn weeks_param(state: &AppState, weeks: Option<i64>) -> AppResult<u32> {
    let cfg = &state.config.analytics;
    let weeks = window_len(weeks.unwrap_or_else(|| i64::from(cfg.default_weeks)), "weeks")?;
    check_weeks(cfg, weeks)
}

/// Both dashboard windows, defaulted from config and capped at `max_days`.
fn report_params(state: &AppState, days: Option<i64>, weeks: Option<i64>) -> AppResult<ReportParams> {
    let cfg = &state.config.analytics;
    let params = ReportParams::new(
        days.unwrap_or_else(|| i64::from(cfg.default_days)),
        weeks.unwrap_or_else(|| i64::from(cfg.default_weeks)),
    )?;
    check_days(cfg, params.days)?;
    check_weeks(cfg, params.weeks)?;
    Ok(params)
}

/// Earliest completion a trailing window of `days` can contain.
fn window_since(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Look the report up in the cache, or fetch the user's rows and build it.
pub(crate) async fn cached_report<T, F>(
    state: &AppState,
    user_id: Uuid,
    kind: ReportKind,
    calendar: Calendar,
    now: DateTime<Utc>,
    since: Option<DateTime<Utc>>,
    build: F,
) -> AppResult<CachedReport>
where
    T: Serialize,
    F: FnOnce(AnalyticsInput) -> AppResult<T>,
{
    let version = state.source.version(user_id).await?;
    let key = CacheKey {
        user_id,
        kind,
        day: calendar.day_of(now),
        offset_minutes: calendar.offset_minutes(),
    };

    state
        .cache
        .get_or_compute(key, version, async move {
            let input = state.source.snapshot(user_id, since).await?;
            CachedReport::encode(&build(input)?)
        })
        .await
}

pub async fn get_daily_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> AppResult<CachedReport> {
    let days = days_param(&state, query.days)?;
    let calendar = calendar_for(&state, query.utc_offset_minutes)?;
    let now = Utc::now();

    cached_report(
        &state,
        auth_user.id,
        ReportKind::Daily { days },
        calendar,
        now,
        Some(window_since(now, days)),
        |input| Ok(daily_stats(&input.completions, &input.habits, days, now, &calendar)?),
    )
    .await
}

pub async fn get_weekly_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> AppResult<CachedReport> {
    let weeks = weeks_param(&state, query.weeks)?;
    let calendar = calendar_for(&state, query.utc_offset_minutes)?;
    let now = Utc::now();

    cached_report(
        &state,
        auth_user.id,
        ReportKind::Weekly { weeks },
        calendar,
        now,
        Some(window_since(now, weeks * 7)),
        |input| Ok(weekly_stats(&input.completions, &input.habits, weeks, now, &calendar)?),
    )
    .await
}

pub async fn get_streak(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> AppResult<CachedReport> {
    let calendar = calendar_for(&state, query.utc_offset_minutes)?;
    let now = Utc::now();

    cached_report(
        &state,
        auth_user.id,
        ReportKind::Streak,
        calendar,
        now,
        None,
        |input| Ok(streak_data(&input.completions, now, &calendar)),
    )
    .await
}

pub async fn get_reward_overview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<CachedReport> {
    let calendar = state.config.analytics.calendar;
    let now = Utc::now();

    cached_report(
        &state,
        auth_user.id,
        ReportKind::Rewards,
        calendar,
        now,
        // completions are not read
        Some(now),
        |input| Ok(reward_overview(&input.rewards)),
    )
    .await
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<WindowQuery>,
) -> AppResult<CachedReport> {
    let params = report_params(&state, query.days, query.weeks)?;
    let calendar = calendar_for(&state, query.utc_offset_minutes)?;
    let now = Utc::now();

    cached_report(
        &state,
        auth_user.id,
        ReportKind::Dashboard(params),
        calendar,
        now,
        None,
        |input| Ok(AnalyticsReport::compute(&input, params, now, &calendar)?),
    )
    .await
}

/// Stateless computation over a caller-supplied snapshot.
pub async fn compute_report(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<ComputeRequest>,
) -> AppResult<CachedReport> {
    body.validate()?;

    let params = report_params(&state, body.days, body.weeks)?;
    let calendar = calendar_for(&state, body.utc_offset_minutes)?;
    let (now, input) = body.snapshot.into_parts()?;
    let now = now.unwrap_or_else(Utc::now);

    tracing::debug!(
        user_id = %auth_user.id,
        completions = input.completions.len(),
        habits = input.habits.len(),
        rewards = input.rewards.len(),
        "Computing report from supplied snapshot"
    );

    let report = AnalyticsReport::compute(&input, params, now, &calendar)?;
    CachedReport::encode(&report)
}

/// Drop the caller's cached reports, e.g. right after a completion or claim.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<RefreshResponse>> {
    let invalidated = state.cache.invalidate(auth_user.id).await;
    tracing::info!(user_id = %auth_user.id, invalidated, "Analytics cache refreshed");
    Ok(Json(RefreshResponse { invalidated }))
}
