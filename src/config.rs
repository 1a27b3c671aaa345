//! Configuration management for GuildForge.
//!
//! This module handles loading and validating environment variables and application settings.

use crate::error::{GuildForgeError, Result};
use crate::remote::RetryPolicy;
use std::env;
use std::time::Duration;

const DEFAULT_PLAYER_API_URL: &str = "https://game-tools.ir/api/v1/servers/fivem/DiamondRP/players";
const DEFAULT_DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DEFAULT_PANEL_ADDRESS: &str = "0.0.0.0:10000";

/// Configuration for the application, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Game-server endpoint listing online players
    pub player_api_url: String,
    /// Discord REST base used for history paging
    pub discord_api_base: String,
    /// Admin panel bind address (host:port)
    pub panel_address: String,
    /// Retry policy of every outbound data-API call
    pub retry_policy: RetryPolicy,
    /// Default delay between bulk mutations
    pub pacing_delay: Duration,
    /// Default delay between spam sweeps
    pub spam_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This will attempt to load a .env file if present using dotenv,
    /// then read required environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required environment variable is missing or invalid.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use guildforge::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load configuration");
    /// println!("Panel: {}", config.panel_address);
    /// ```
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (ignore errors - it's optional)
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| GuildForgeError::Config(
                "Missing DISCORD_TOKEN environment variable. Set it in your environment or create a .env file (never commit this file).".to_string()
            ))?;

        let player_api_url = env::var("PLAYER_API_URL")
            .unwrap_or_else(|_| DEFAULT_PLAYER_API_URL.to_string());
        Self::validate_http_url("PLAYER_API_URL", &player_api_url)?;

        let discord_api_base = env::var("DISCORD_API_BASE")
            .unwrap_or_else(|_| DEFAULT_DISCORD_API_BASE.to_string());
        Self::validate_http_url("DISCORD_API_BASE", &discord_api_base)?;

        let panel_address = Self::get_panel_address(env::var("PANEL_ADDRESS").ok(), env::var("PORT").ok());
        Self::validate_panel_address(&panel_address)?;

        let base_timeout = Self::parse_millis("REMOTE_TIMEOUT_MS", 5000)?;
        if base_timeout.is_zero() {
            return Err(GuildForgeError::Config(
                "REMOTE_TIMEOUT_MS must be greater than 0".to_string()
            ));
        }

        let multiplier = match env::var("RETRY_TIMEOUT_MULTIPLIER") {
            Ok(raw) => Self::parse_multiplier(&raw)?,
            Err(_) => 2.0,
        };

        Ok(Self {
            discord_token,
            player_api_url,
            discord_api_base,
            panel_address,
            retry_policy: RetryPolicy::new(base_timeout, multiplier),
            pacing_delay: Self::parse_millis("PACING_DELAY_MS", 1000)?,
            spam_interval: Self::parse_millis("SPAM_INTERVAL_MS", 2000)?,
        })
    }

    /// Resolve the panel address; a bare `PORT` overrides the default port.
    fn get_panel_address(address: Option<String>, port: Option<String>) -> String {
        match (address, port) {
            (Some(address), _) => address,
            (None, Some(port)) => format!("0.0.0.0:{}", port),
            (None, None) => DEFAULT_PANEL_ADDRESS.to_string(),
        }
    }

    /// Validate that the panel address has a valid host:port format.
    fn validate_panel_address(address: &str) -> Result<()> {
        let Some((host, port_str)) = address.rsplit_once(':') else {
            return Err(GuildForgeError::Config(
                format!("Invalid PANEL_ADDRESS format: '{}'. Expected 'host:port' format.", address)
            ));
        };

        if host.is_empty() {
            return Err(GuildForgeError::Config(
                format!("Missing host in PANEL_ADDRESS: '{}'", address)
            ));
        }

        port_str.parse::<u16>()
            .map_err(|_| GuildForgeError::Config(
                format!("Invalid port in PANEL_ADDRESS: '{}'", port_str)
            ))?;

        Ok(())
    }

    /// Validate a URL format using proper URL parsing.
    fn validate_http_url(name: &str, url_str: &str) -> Result<()> {
        use url::Url;

        let parsed_url = Url::parse(url_str)
            .map_err(|e| GuildForgeError::Config(
                format!("Invalid {} '{}': {}", name, url_str, e)
            ))?;

        // Ensure it's HTTP or HTTPS
        let scheme = parsed_url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(GuildForgeError::Config(
                format!("{} must use http:// or https:// scheme, got: '{}'", name, scheme)
            ));
        }

        if parsed_url.host_str().is_none() {
            return Err(GuildForgeError::Config(
                format!("{} must contain a valid host: '{}'", name, url_str)
            ));
        }

        Ok(())
    }

    fn parse_millis(name: &str, default: u64) -> Result<Duration> {
        match env::var(name) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| GuildForgeError::Config(
                    format!("{} must be a whole number of milliseconds, got: '{}'", name, raw)
                )),
            Err(_) => Ok(Duration::from_millis(default)),
        }
    }

    fn parse_multiplier(raw: &str) -> Result<f64> {
        let value = raw.trim().parse::<f64>()
            .map_err(|_| GuildForgeError::Config(
                format!("RETRY_TIMEOUT_MULTIPLIER must be a number, got: '{}'", raw)
            ))?;

        if !(1.0..=4.0).contains(&value) {
            return Err(GuildForgeError::Config(
                format!("RETRY_TIMEOUT_MULTIPLIER must be between 1.0 and 4.0, got {}", value)
            ));
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_panel_address() {
        assert!(Config::validate_panel_address("0.0.0.0:10000").is_ok());
        assert!(Config::validate_panel_address("localhost:8080").is_ok());

        assert!(Config::validate_panel_address("localhost").is_err());
        assert!(Config::validate_panel_address(":8080").is_err());
        assert!(Config::validate_panel_address("localhost:abc").is_err());
        assert!(Config::validate_panel_address("localhost:99999").is_err());
    }

    #[test]
    fn test_get_panel_address() {
        assert_eq!(Config::get_panel_address(None, None), "0.0.0.0:10000");
        assert_eq!(Config::get_panel_address(None, Some("3000".into())), "0.0.0.0:3000");
        assert_eq!(
            Config::get_panel_address(Some("127.0.0.1:1".into()), Some("3000".into())),
            "127.0.0.1:1"
        );
    }

    #[test]
    fn test_validate_http_url() {
        assert!(Config::validate_http_url("X", DEFAULT_PLAYER_API_URL).is_ok());
        assert!(Config::validate_http_url("X", "http://localhost:8080/api").is_ok());

        assert!(Config::validate_http_url("X", "not a url").is_err());
        assert!(Config::validate_http_url("X", "ftp://example.com").is_err());
    }

    #[test]
    fn test_parse_multiplier() {
        assert_eq!(Config::parse_multiplier("1.5").unwrap(), 1.5);
        assert_eq!(Config::parse_multiplier(" 2 ").unwrap(), 2.0);

        assert!(Config::parse_multiplier("0.5").is_err());
        assert!(Config::parse_multiplier("10").is_err());
        assert!(Config::parse_multiplier("fast").is_err());
    }

    #[test]
    fn test_parse_millis_default_and_override() {
        // Save original value (if any)
        let original_value = env::var("GUILDFORGE_TEST_MILLIS").ok();

        env::remove_var("GUILDFORGE_TEST_MILLIS");
        assert_eq!(
            Config::parse_millis("GUILDFORGE_TEST_MILLIS", 250).unwrap(),
            Duration::from_millis(250)
        );

        env::set_var("GUILDFORGE_TEST_MILLIS", "40");
        assert_eq!(
            Config::parse_millis("GUILDFORGE_TEST_MILLIS", 250).unwrap(),
            Duration::from_millis(40)
        );

        env::set_var("GUILDFORGE_TEST_MILLIS", "soon");
        assert!(Config::parse_millis("GUILDFORGE_TEST_MILLIS", 250).is_err());

        // Restore original value
        match original_value {
            Some(val) => env::set_var("GUILDFORGE_TEST_MILLIS", val),
            None => env::remove_var("GUILDFORGE_TEST_MILLIS"),
        }
    }
}
