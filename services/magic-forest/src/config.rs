//! Service configuration
//!
//! Loaded once at startup from the environment (and `.env` when present),
//! then handed to each component. Nothing reads the environment after that.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Minimum one-time donation (USD) that unlocks a tree
pub const DEFAULT_TREE_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub port: u16,
    /// "test" enables the simulated fallback on provider failure
    pub stripe_mode: String,
    pub stripe_secret_key: Option<String>,
    pub stripe_publishable_key: Option<String>,
    pub stripe_api_base: String,
    /// Base for checkout success/cancel redirects
    pub frontend_url: String,
    pub tree_threshold: Decimal,
    pub database_url: Option<String>,
    pub provider_timeout_secs: u64,
}

impl Settings {
    /// Read settings from environment variables over built-in defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }

        config::Config::builder()
            .set_default("port", 8001)?
            .set_default("stripe_mode", "test")?
            .set_default("stripe_api_base", "https://api.stripe.com")?
            .set_default("frontend_url", "http://localhost:3000")?
            .set_default("tree_threshold", DEFAULT_TREE_THRESHOLD)?
            .set_default("provider_timeout_secs", 30)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn is_test_mode(&self) -> bool {
        self.stripe_mode.trim().eq_ignore_ascii_case("test")
    }

    pub fn frontend_url(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: 8001,
            stripe_mode: "test".to_string(),
            stripe_secret_key: None,
            stripe_publishable_key: None,
            stripe_api_base: "https://api.stripe.com".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            tree_threshold: Decimal::from(DEFAULT_TREE_THRESHOLD),
            database_url: None,
            provider_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_flag() {
        let mut settings = Settings::default();
        assert!(settings.is_test_mode());

        settings.stripe_mode = "live".to_string();
        assert!(!settings.is_test_mode());

        settings.stripe_mode = " TEST ".to_string();
        assert!(settings.is_test_mode());
    }

    #[test]
    fn test_frontend_url_trims_trailing_slash() {
        let settings = Settings {
            frontend_url: "https://forest.example.com/".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings.frontend_url(), "https://forest.example.com");
    }
}
