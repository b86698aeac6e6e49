use axum::{
    body::Bytes,
    extract::Request,
    http::{
        header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::analytics::ReportParams;
use crate::db::DataVersion;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Daily { days: u32 },
    Weekly { weeks: u32 },
    Streak,
    Rewards,
    Dashboard(ReportParams),
    RewardProgress,
    HabitsToday,
}

/// Reports only depend on "now" through its calendar day, so the day and
/// the offset that produced it are part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: Uuid,
    pub kind: ReportKind,
    pub day: NaiveDate,
    pub offset_minutes: i32,
}

/// A serialized report plus its content hash.
#[derive(Debug, Clone)]
pub struct CachedReport {
    pub body: Bytes,
    pub etag: String,
}

impl CachedReport {
    pub fn encode<T: Serialize>(value: &T) -> AppResult<Self> {
        let body = serde_json::to_vec(value).map_err(|e| AppError::Internal(e.into()))?;
        let etag = format!("\"{}\"", hex::encode(Sha256::digest(&body)));
        Ok(Self {
            body: Bytes::from(body),
            etag,
        })
    }
}

impl IntoResponse for CachedReport {
    fn into_response(self) -> Response {
        (
            [(CONTENT_TYPE, "application/json".to_string()), (ETAG, self.etag)],
            self.body,
        )
            .into_response()
    }
}

/// Whether an `If-None-Match` value names `etag`. Handles lists, `*` and
/// weak validators.
fn etag_matches(if_none_match: &HeaderValue, etag: &HeaderValue) -> bool {
    let (Ok(candidates), Ok(etag)) = (if_none_match.to_str(), etag.to_str()) else {
        return false;
    };
    let etag = etag.trim_start_matches("W/");
    candidates
        .split(',')
        .map(str::trim)
        .any(|tag| tag == "*" || tag.trim_start_matches("W/") == etag)
}

/// Turn a 200 whose `ETag` the client already holds into a bodiless 304.
pub async fn conditional_get(req: Request, next: Next) -> Response {
    let if_none_match = req.headers().get(IF_NONE_MATCH).cloned();
    let response = next.run(req).await;

    let Some(if_none_match) = if_none_match else {
        return response;
    };
    match response.headers().get(ETAG) {
        Some(etag) if response.status() == StatusCode::OK && etag_matches(&if_none_match, etag) => {
            (StatusCode::NOT_MODIFIED, [(ETAG, etag.clone())]).into_response()
        }
        _ => response,
    }
}

struct CacheEntry {
    version: DataVersion,
    report: CachedReport,
    stored_at: Instant,
}

/// In-memory report cache (single instance). An entry is served only while
/// it is younger than the TTL and the source version still matches.
#[derive(Clone)]
pub struct ReportCache {
    entries: Arc<Mutex<HashMap<CacheKey, CacheEntry>>>,
    ttl: Duration,
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &CacheKey, version: &DataVersion) -> Option<CachedReport> {
        let entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if entry.version != *version || entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.report.clone())
    }

    pub async fn insert(&self, key: CacheKey, version: DataVersion, report: CachedReport) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key,
            CacheEntry {
                version,
                report,
                stored_at: Instant::now(),
            },
        );
    }

    /// Serve from cache or run `compute` and remember its result. The lock
    /// is not held while computing.
    pub async fn get_or_compute<F>(
        &self,
        key: CacheKey,
        version: DataVersion,
        compute: F,
    ) -> AppResult<CachedReport>
    where
        F: Future<Output = AppResult<CachedReport>>,
    {
        if let Some(hit) = self.get(&key, &version).await {
            tracing::debug!(user_id = %key.user_id, kind = ?key.kind, "Report cache hit");
            return Ok(hit);
        }

        tracing::debug!(user_id = %key.user_id, kind = ?key.kind, "Report cache miss");
        let report = compute.await?;
        self.insert(key, version, report.clone()).await;
        Ok(report)
    }

    pub async fn invalidate(&self, user_id: Uuid) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|key, _| key.user_id != user_id);
        before - entries.len()
    }

    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() <= ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Evict expired entries every `period` (call once at startup).
pub fn spawn_cache_purge_worker(cache: ReportCache, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let purged = cache.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Report cache: evicted expired entries");
            }
        }
    });
}
