use std::env;
use std::str::FromStr;

use anyhow::Context;

use crate::analytics::daily::MAX_WINDOW_DAYS;
use crate::analytics::report::{DEFAULT_DAYS, DEFAULT_WEEKS};
use crate::analytics::Calendar;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    /// Shared secret of the auth provider that issues the bearer tokens.
    pub jwt_secret: String,
    /// Expected `aud` claim; audience is not checked when unset.
    pub jwt_audience: Option<String>,

    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Day boundary used when a request does not pass `utc_offset_minutes`.
    pub calendar: Calendar,
    pub default_days: u32,
    pub default_weeks: u32,
    pub max_days: u32,
    pub cache_ttl_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            calendar: Calendar::utc(),
            default_days: DEFAULT_DAYS,
            default_weeks: DEFAULT_WEEKS,
            max_days: 366,
            cache_ttl_secs: 30,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid value, got '{}'", key, raw)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = AnalyticsConfig::default();

        let offset_minutes: i32 = env_or("ANALYTICS_UTC_OFFSET_MINUTES", 0)?;
        let calendar = Calendar::from_offset_minutes(offset_minutes)
            .context("ANALYTICS_UTC_OFFSET_MINUTES out of range")?;

        let analytics = AnalyticsConfig {
            calendar,
            default_days: env_or("ANALYTICS_DEFAULT_DAYS", defaults.default_days)?,
            default_weeks: env_or("ANALYTICS_DEFAULT_WEEKS", defaults.default_weeks)?,
            max_days: env_or("ANALYTICS_MAX_DAYS", defaults.max_days)?,
            cache_ttl_secs: env_or("ANALYTICS_CACHE_TTL_SECS", defaults.cache_ttl_secs)?,
        };
        if analytics.default_days == 0 || analytics.default_weeks == 0 {
            anyhow::bail!("ANALYTICS_DEFAULT_DAYS and ANALYTICS_DEFAULT_WEEKS must be positive");
        }
        if analytics.max_days > MAX_WINDOW_DAYS {
            anyhow::bail!("ANALYTICS_MAX_DAYS may be at most {}", MAX_WINDOW_DAYS);
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 20)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 8080)?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_audience: env::var("JWT_AUDIENCE").ok().filter(|s| !s.is_empty()),
            analytics,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
