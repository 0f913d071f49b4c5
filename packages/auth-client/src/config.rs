use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the session API (sign-in, refresh, profile endpoints)
    pub api_base_url: String,
    /// How long persisted tokens stay valid in the store
    pub session_ttl: chrono::Duration,
}

/// Default lifetime for persisted tokens (matches the session API's
/// refresh-token lifetime)
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let ttl_days = env::var("SESSION_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_SESSION_TTL_DAYS.to_string())
            .parse::<i64>()
            .context("SESSION_TTL_DAYS must be a valid number of days")?;

        Ok(Self {
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3333".to_string()),
            session_ttl: chrono::Duration::days(ttl_days),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3333".to_string(),
            session_ttl: chrono::Duration::days(DEFAULT_SESSION_TTL_DAYS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:3333");
        assert_eq!(config.session_ttl, chrono::Duration::days(30));
    }
}
