use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

/// How the day count of a leave request is derived from its date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DayCountPolicy {
    /// Inclusive calendar span.
    Calendar,
    /// Inclusive span minus weekends and holidays.
    Working,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,
    pub db_max_connections: u32,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub leave_day_count: DayCountPolicy,
    /// Check-ins after this time are marked late.
    pub office_start: NaiveTime,

    pub ai_service_url: Option<String>,
    pub ai_timeout_secs: u64,

    pub log_dir: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let office_start = env::var("OFFICE_START").unwrap_or_else(|_| "09:30".to_string());
        let office_start = NaiveTime::parse_from_str(office_start.trim(), "%H:%M")
            .with_context(|| format!("OFFICE_START={office_start:?} must be HH:MM"))?;

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", "900")?, // default 15 min
            refresh_token_ttl: parsed("REFRESH_TOKEN_TTL", "604800")?, // default 7 days
            db_max_connections: parsed("DB_MAX_CONNECTIONS", "10")?,

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", "60")?,
            rate_refresh_per_min: parsed("RATE_REFRESH_PER_MIN", "30")?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            leave_day_count: parsed("LEAVE_DAY_COUNT", "calendar")?,
            office_start,

            ai_service_url: env::var("AI_SERVICE_URL")
                .ok()
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            ai_timeout_secs: parsed("AI_TIMEOUT_SECS", "10")?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_count_policy_parses_case_insensitively() {
        assert_eq!(
            DayCountPolicy::from_str("Working").unwrap(),
            DayCountPolicy::Working
        );
        assert_eq!(
            DayCountPolicy::from_str("calendar").unwrap(),
            DayCountPolicy::Calendar
        );
        assert!(DayCountPolicy::from_str("business").is_err());
    }

    #[test]
    fn parsed_falls_back_to_default() {
        let v: u32 = parsed("HRM_TEST_SURELY_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(v, 42);
    }
}
