use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token; the process refuses to start without it
    pub bot_token: String,

    /// Telegram Bot API host
    pub telegram_api_url: String,

    /// Broadcast interval in minutes
    pub broadcast_interval_min: u64,

    /// Symbol the signals are quoted for
    pub symbol: String,

    /// Path of the persisted price history
    pub prices_file: String,

    /// Path of the persisted subscriber set
    pub subscribers_file: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            bot_token: env::var("TG_BOT_TOKEN")
                .context("TG_BOT_TOKEN must be set (Telegram bot token)")?,

            telegram_api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),

            broadcast_interval_min: env::var("BROADCAST_INTERVAL_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("BROADCAST_INTERVAL_MIN must be a valid number")?,

            symbol: env::var("SYMBOL").unwrap_or_else(|_| "XAUUSD".to_string()),

            prices_file: env::var("PRICES_FILE")
                .unwrap_or_else(|_| "data/prices.json".to_string()),

            subscribers_file: env::var("SUBSCRIBERS_FILE")
                .unwrap_or_else(|_| "data/subscribers.json".to_string()),
        })
    }

    /// Effective broadcast interval, floored at one minute
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs((self.broadcast_interval_min * 60).max(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_interval(minutes: u64) -> Config {
        Config {
            bot_token: "test-token".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            broadcast_interval_min: minutes,
            symbol: "XAUUSD".to_string(),
            prices_file: "data/prices.json".to_string(),
            subscribers_file: "data/subscribers.json".to_string(),
        }
    }

    #[test]
    fn interval_floor_is_one_minute() {
        assert_eq!(
            config_with_interval(0).broadcast_interval(),
            Duration::from_secs(60)
        );
        assert_eq!(
            config_with_interval(30).broadcast_interval(),
            Duration::from_secs(1800)
        );
    }
}
