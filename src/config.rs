//! Environment-driven configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file by the binaries before `AppConfig::from_env` runs.

use crate::error::AgentError;
use crate::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_LIMINAL_BASE_URL: &str = "https://api.liminal.cash";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_PATH: &str = "employees.db";
pub const DEFAULT_WINDOW_DAYS: i64 = 14;
pub const DEFAULT_FETCH_LIMIT: u32 = 100;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub liminal_base_url: String,
    pub port: u16,
    pub employees_db_path: String,
    pub payroll: PayrollSettings,
    pub log_level: String,
}

/// Knobs for the reconciliation workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollSettings {
    pub window_days: i64,
    pub fetch_limit: u32,
    pub upstream_timeout: Duration,
}

impl Default for PayrollSettings {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let liminal_base_url = get("LIMINAL_BASE_URL")
            .unwrap_or_else(|| DEFAULT_LIMINAL_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => DEFAULT_PORT,
        };

        let window_days = parse_or("PAYROLL_WINDOW_DAYS", get("PAYROLL_WINDOW_DAYS"), DEFAULT_WINDOW_DAYS)?;
        if window_days < 1 {
            return Err(AgentError::Config(
                "PAYROLL_WINDOW_DAYS must be at least 1".to_string(),
            ));
        }

        let payroll = PayrollSettings {
            window_days,
            fetch_limit: parse_or("TRANSACTION_FETCH_LIMIT", get("TRANSACTION_FETCH_LIMIT"), DEFAULT_FETCH_LIMIT)?,
            upstream_timeout: Duration::from_secs(parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                get("UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            liminal_base_url,
            port,
            employees_db_path: get("EMPLOYEES_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            payroll,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AgentError::Config(format!("{} has invalid value '{}'", key, raw)))
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.liminal_base_url, DEFAULT_LIMINAL_BASE_URL);
        assert_eq!(config.port, 8080);
        assert_eq!(config.employees_db_path, "employees.db");
        assert_eq!(config.payroll, PayrollSettings::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LIMINAL_BASE_URL", "http://localhost:9000/"),
            ("API_PORT", "3000"),
            ("PAYROLL_WINDOW_DAYS", "7"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(config.liminal_base_url, "http://localhost:9000");
        assert_eq!(config.port, 3000);
        assert_eq!(config.payroll.window_days, 7);
        assert_eq!(config.payroll.upstream_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]),
            Err(AgentError::Config(_))
        ));
        assert!(matches!(
            config_from(&[("PAYROLL_WINDOW_DAYS", "0")]),
            Err(AgentError::Config(_))
        ));
    }
}
