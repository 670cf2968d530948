use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::export::browser::ChromeSettings;

const DEFAULT_BROWSER_POOL_SIZE: usize = 2;
const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub export: ExportConfig,
}

/// Settings for the document export pipeline. Built once at startup and
/// handed to the PDF engine; nothing reads these from the environment later.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub chrome_path: Option<PathBuf>,
    /// Idle headless browsers kept warm. 0 = launch one per request.
    pub browser_pool_size: usize,
    pub render_timeout: Duration,
}

impl ExportConfig {
    pub fn chrome_settings(&self) -> ChromeSettings {
        ChromeSettings {
            chrome_path: self.chrome_path.clone(),
            pool_size: self.browser_pool_size,
            render_timeout: self.render_timeout,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let render_timeout_secs: u64 = parse_or(
            "RENDER_TIMEOUT_SECS",
            std::env::var("RENDER_TIMEOUT_SECS").ok(),
            DEFAULT_RENDER_TIMEOUT_SECS,
        )?;
        if render_timeout_secs == 0 {
            bail!("RENDER_TIMEOUT_SECS must be greater than zero");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_or("PORT", std::env::var("PORT").ok(), 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            export: ExportConfig {
                chrome_path: std::env::var("CHROME_PATH")
                    .ok()
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
                browser_pool_size: parse_or(
                    "BROWSER_POOL_SIZE",
                    std::env::var("BROWSER_POOL_SIZE").ok(),
                    DEFAULT_BROWSER_POOL_SIZE,
                )?,
                render_timeout: Duration::from_secs(render_timeout_secs),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses `raw` if set, otherwise returns `default`.
fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        assert_eq!(parse_or::<u16>("PORT", None, 8080).unwrap(), 8080);
    }

    #[test]
    fn test_parse_or_parses_value() {
        assert_eq!(
            parse_or::<usize>("BROWSER_POOL_SIZE", Some(" 4 ".to_string()), 2).unwrap(),
            4
        );
    }

    #[test]
    fn test_parse_or_rejects_garbage() {
        let err = parse_or::<u16>("PORT", Some("eighty".to_string()), 8080).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_chrome_settings_carry_pool_and_timeout() {
        let config = ExportConfig {
            chrome_path: Some(PathBuf::from("/usr/bin/chromium")),
            browser_pool_size: 3,
            render_timeout: Duration::from_secs(12),
        };
        let settings = config.chrome_settings();
        assert_eq!(settings.pool_size, 3);
        assert_eq!(settings.render_timeout, Duration::from_secs(12));
        assert_eq!(settings.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
    }
}
