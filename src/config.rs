use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

pub const DB_PATH_VAR: &str = "PLACEREVIEW_DB_PATH";
pub const ADDR_VAR: &str = "PLACEREVIEW_ADDR";
pub const WORKERS_VAR: &str = "PLACEREVIEW_WORKERS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: String,
    pub addr: String,
    pub workers: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            db_path: try_load(DB_PATH_VAR, "placereview.db")?,
            addr: try_load(ADDR_VAR, "127.0.0.1:8000")?,
            workers: try_load_optional(WORKERS_VAR)?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse<T: FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }
    })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse(key, raw)
}

fn try_load_optional<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    var(key).map(|raw| parse(key, raw)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_reports_key() {
        let workers: usize = parse(WORKERS_VAR, " 4 ".to_string()).unwrap();
        assert_eq!(workers, 4);

        let err = parse::<usize>(WORKERS_VAR, "many".to_string()).unwrap_err();
        let ConfigError::Invalid { key, value, .. } = err;
        assert_eq!(key, WORKERS_VAR);
        assert_eq!(value, "many");
    }

    #[test]
    fn test_defaults_apply_for_unset_variables() {
        let value: String = try_load("PLACEREVIEW_TEST_SURELY_UNSET", "fallback").unwrap();
        assert_eq!(value, "fallback");

        let missing: Option<usize> = try_load_optional("PLACEREVIEW_TEST_SURELY_UNSET").unwrap();
        assert_eq!(missing, None);
    }
}
