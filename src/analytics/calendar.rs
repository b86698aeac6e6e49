use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use super::{AnalyticsError, AnalyticsResult};

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Calendar-day convention shared by every aggregator.
///
/// Event timestamps, habit creation timestamps and "now" all go through the
/// same offset. Mixing conventions shifts completions across midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    /// Offset east of UTC in minutes, e.g. `-300` for US Eastern standard time.
    pub fn from_offset_minutes(minutes: i32) -> AnalyticsResult<Self> {
        if minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(AnalyticsError::InvalidArgument(format!(
                "utc offset must be within ±{} minutes, got {}",
                MAX_OFFSET_MINUTES, minutes
            )));
        }
        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            AnalyticsError::InvalidArgument(format!("invalid utc offset: {} minutes", minutes))
        })?;
        Ok(Self { offset })
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// The `days` consecutive calendar days ending at `end`, oldest first.
    pub fn days_ending(end: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
        (0..i64::from(days)).rev().map(move |back| end - Duration::days(back))
    }
}

/// Parse an RFC 3339 timestamp as delivered by the hosted backend.
pub fn parse_timestamp(raw: &str) -> AnalyticsResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            AnalyticsError::MalformedInput(format!("'{}' is not an RFC 3339 timestamp: {}", raw, e))
        })
}
