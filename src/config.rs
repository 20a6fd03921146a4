use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use dotenvy::dotenv;

use crate::model::sheet::SheetTarget;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// Unset means the in-memory sheet store
    pub database_url: Option<String>,
    pub api_prefix: String,
    pub log_dir: String,
    pub timezone: Tz,

    // Worksheets
    pub checkin_log: SheetTarget,
    pub checkout_log: SheetTarget,
    pub corrections_form: SheetTarget,
    pub roster_sheet: SheetTarget,

    // Cache lifetimes
    pub roster_cache_ttl: Duration,
    pub board_cache_ttl: Duration,
    pub presence_cache_ttl: Duration,

    // Rate limiting
    pub rate_read_per_min: u32,
    pub rate_write_per_min: u32,

    /// Settings that were present but unparseable and fell back to their
    /// default. Logged by `main` once the subscriber is installed.
    pub fallbacks: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            database_url: None,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            timezone: chrono_tz::America::Los_Angeles,

            checkin_log: SheetTarget::new("checkin", "checkins"),
            checkout_log: SheetTarget::new("checkout", "checkouts"),
            corrections_form: SheetTarget::new("corrections", "Form Responses 1"),
            roster_sheet: SheetTarget::new("studentinfo", "roster"),

            roster_cache_ttl: Duration::from_secs(86_400), // 1 day
            board_cache_ttl: Duration::from_secs(10_800),  // 3 hours
            presence_cache_ttl: Duration::from_secs(10),

            rate_read_per_min: 600,
            rate_write_per_min: 60,

            fallbacks: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let d = Self::default();

        let timezone = match env::var("TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("TIMEZONE '{}' is not a known zone: {}", name, e))?,
            Err(_) => d.timezone,
        };

        let mut fallbacks = Vec::new();
        let mut secs = |key: &str, default: Duration| {
            Duration::from_secs(parse_or(key, env::var(key).ok(), default.as_secs(), &mut fallbacks))
        };
        let roster_cache_ttl = secs("ROSTER_CACHE_TTL_SECS", d.roster_cache_ttl);
        let board_cache_ttl = secs("BOARD_CACHE_TTL_SECS", d.board_cache_ttl);
        let presence_cache_ttl = secs("PRESENCE_CACHE_TTL_SECS", d.presence_cache_ttl);
        let rate_read_per_min = env_or("RATE_READ_PER_MIN", d.rate_read_per_min, &mut fallbacks);
        let rate_write_per_min = env_or("RATE_WRITE_PER_MIN", d.rate_write_per_min, &mut fallbacks);

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or(d.server_addr),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            api_prefix: env::var("API_PREFIX").unwrap_or(d.api_prefix),
            log_dir: env::var("LOG_DIR").unwrap_or(d.log_dir),
            timezone,

            checkin_log: target_from_env("CHECKIN", d.checkin_log),
            checkout_log: target_from_env("CHECKOUT", d.checkout_log),
            corrections_form: target_from_env("CORRECTIONS", d.corrections_form),
            roster_sheet: target_from_env("ROSTER", d.roster_sheet),

            roster_cache_ttl,
            board_cache_ttl,
            presence_cache_ttl,

            rate_read_per_min,
            rate_write_per_min,

            fallbacks,
        })
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T, fallbacks: &mut Vec<String>) -> T {
    parse_or(key, env::var(key).ok(), default, fallbacks)
}

/// Parses `raw` when set. An unparseable value keeps `default` and is noted in `fallbacks`.
fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    key: &str,
    raw: Option<String>,
    default: T,
    fallbacks: &mut Vec<String>,
) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            fallbacks.push(format!("{}='{}' is not a valid value, using {}", key, raw, default));
            default
        }),
        None => default,
    }
}

/// `<PREFIX>_SPREADSHEET` and `<PREFIX>_WORKSHEET`, each falling back separately.
fn target_from_env(prefix: &str, default: SheetTarget) -> SheetTarget {
    SheetTarget {
        spreadsheet: env::var(format!("{}_SPREADSHEET", prefix)).unwrap_or(default.spreadsheet),
        worksheet: env::var(format!("{}_WORKSHEET", prefix)).unwrap_or(default.worksheet),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_school_setup() {
        let c = Config::default();
        assert_eq!(c.corrections_form.worksheet, "Form Responses 1");
        assert_eq!(c.board_cache_ttl, Duration::from_secs(3 * 60 * 60));
        assert_eq!(c.timezone, chrono_tz::America::Los_Angeles);
        assert!(c.database_url.is_none());
    }

    #[test]
    fn missing_key_uses_default() {
        let mut fallbacks = Vec::new();
        assert_eq!(env_or("NEST_ATTENDANCE_TEST_UNSET_KEY", 42u32, &mut fallbacks), 42);
        assert!(fallbacks.is_empty());
    }

    #[test]
    fn unparseable_value_falls_back_and_is_reported() {
        let mut fallbacks = Vec::new();
        let rate = parse_or("RATE_READ_PER_MIN", Some("lots".into()), 600u32, &mut fallbacks);
        assert_eq!(rate, 600);
        assert_eq!(fallbacks, vec!["RATE_READ_PER_MIN='lots' is not a valid value, using 600".to_string()]);

        let ttl = parse_or("BOARD_CACHE_TTL_SECS", Some(" 60 ".into()), 10_800u64, &mut fallbacks);
        assert_eq!(ttl, 60);
        assert_eq!(fallbacks.len(), 1);
    }
}
