use anyhow::{ensure, Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

const MAX_CONCURRENCY: i64 = 64;
const MAX_GATEWAY_TIMEOUT_SECS: i64 = 3600;
/// One week.
const MAX_INTERVAL_MINUTES: i64 = 7 * 24 * 60;
const MAX_COMMENT_PAGES: i64 = 1000;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub unipile_dsn: String,
    pub unipile_api_key: String,
    /// Bearer secret required by the cron endpoint. Open when unset.
    pub cron_secret: Option<String>,
    /// Cron expression for the in-process sweep scheduler. Disabled when unset.
    pub sweep_cron: Option<String>,
    pub sweep: SweepSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = SweepSettings::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_var("PORT", 8080)?,
            unipile_dsn: env::var("UNIPILE_DSN").context("UNIPILE_DSN must be set")?,
            unipile_api_key: env::var("UNIPILE_API_KEY")
                .context("UNIPILE_API_KEY must be set")?,
            cron_secret: non_empty_var("CRON_SECRET"),
            sweep_cron: non_empty_var("SWEEP_CRON"),
            sweep: SweepSettings {
                concurrency: bounded_var(
                    "SWEEP_CONCURRENCY",
                    defaults.concurrency as i64,
                    MAX_CONCURRENCY,
                )? as usize,
                gateway_timeout: std::time::Duration::from_secs(bounded_var(
                    "GATEWAY_TIMEOUT_SECS",
                    defaults.gateway_timeout.as_secs() as i64,
                    MAX_GATEWAY_TIMEOUT_SECS,
                )? as u64),
                default_poll_interval: Duration::minutes(bounded_var(
                    "DEFAULT_POLL_INTERVAL_MINUTES",
                    defaults.default_poll_interval.num_minutes(),
                    MAX_INTERVAL_MINUTES,
                )?),
                claim_lease: Duration::minutes(bounded_var(
                    "CLAIM_LEASE_MINUTES",
                    defaults.claim_lease.num_minutes(),
                    MAX_INTERVAL_MINUTES,
                )?),
                max_comment_pages: bounded_var(
                    "MAX_COMMENT_PAGES",
                    defaults.max_comment_pages.into(),
                    MAX_COMMENT_PAGES,
                )? as u32,
            },
        })
    }
}

/// Tuning knobs for a single sweep.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    /// Jobs processed at once within one sweep.
    pub concurrency: usize,
    /// Upper bound on every outbound gateway call.
    pub gateway_timeout: std::time::Duration,
    /// Used when a job has no poll interval of its own.
    pub default_poll_interval: Duration,
    /// A `running` job whose last claim is older than this may be reclaimed.
    pub claim_lease: Duration,
    pub max_comment_pages: u32,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            concurrency: 1,
            gateway_timeout: std::time::Duration::from_secs(30),
            default_poll_interval: Duration::minutes(5),
            claim_lease: Duration::minutes(15),
            max_comment_pages: 10,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        None => Ok(default),
    }
}

/// Integer setting that must fall within `1..=max`.
fn bounded_var(name: &str, default: i64, max: i64) -> Result<i64> {
    parse_bounded(name, non_empty_var(name).as_deref(), default, max)
}

fn parse_bounded(name: &str, raw: Option<&str>, default: i64, max: i64) -> Result<i64> {
    let value = match raw {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{} must be a valid number", name))?,
        None => default,
    };

    ensure!(
        (1..=max).contains(&value),
        "{} must be between 1 and {}, got {}",
        name,
        max,
        value
    );
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_defaults() {
        let settings = SweepSettings::default();
        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.gateway_timeout.as_secs(), 30);
        assert_eq!(settings.default_poll_interval.num_minutes(), 5);
        assert_eq!(settings.claim_lease.num_minutes(), 15);
        assert_eq!(settings.max_comment_pages, 10);
    }

    #[test]
    fn parse_var_falls_back_when_unset() {
        let value: u32 = parse_var("ENGAGEMENT_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn bounded_setting_uses_default_when_unset() {
        assert_eq!(parse_bounded("GATEWAY_TIMEOUT_SECS", None, 30, 3600).unwrap(), 30);
        assert_eq!(
            parse_bounded("GATEWAY_TIMEOUT_SECS", Some(" 45 "), 30, 3600).unwrap(),
            45
        );
    }

    #[test]
    fn zero_and_negative_settings_are_rejected() {
        let zero_timeout = parse_bounded("GATEWAY_TIMEOUT_SECS", Some("0"), 30, 3600).unwrap_err();
        assert!(zero_timeout.to_string().contains("GATEWAY_TIMEOUT_SECS"));

        let negative = parse_bounded("DEFAULT_POLL_INTERVAL_MINUTES", Some("-5"), 5, 10080);
        assert!(negative.is_err());
    }

    #[test]
    fn oversized_settings_are_rejected_instead_of_overflowing() {
        let huge = parse_bounded(
            "CLAIM_LEASE_MINUTES",
            Some("9223372036854775807"),
            15,
            MAX_INTERVAL_MINUTES,
        )
        .unwrap_err();
        assert!(huge.to_string().contains("between 1 and 10080"));

        let not_a_number = parse_bounded("MAX_COMMENT_PAGES", Some("lots"), 10, 1000);
        assert!(not_a_number.is_err());
    }
}
