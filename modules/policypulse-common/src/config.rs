use std::env;

use crate::vocab::DEFAULT_NEWS_FEEDS;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    /// Shared secret for the ingestion trigger. When unset, the
    /// endpoint is open (local development).
    pub cron_secret: Option<String>,

    /// RSS feeds polled for policy news.
    pub news_feeds: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),
            news_feeds: news_feeds_from_env(),
        }
    }

    /// Load a minimal config for the bulk backfill binary, which never
    /// serves HTTP or polls news feeds.
    pub fn bulk_from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            web_host: String::new(),
            web_port: 0,
            cron_secret: None,
            news_feeds: Vec::new(),
        }
    }
}

fn news_feeds_from_env() -> Vec<String> {
    // AP_NEWS_RSS_URL is the older single-feed name, kept for existing
    // deployments.
    let configured = env::var("NEWS_RSS_FEEDS")
        .or_else(|_| env::var("AP_NEWS_RSS_URL"))
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if configured.is_empty() {
        DEFAULT_NEWS_FEEDS.iter().map(|s| s.to_string()).collect()
    } else {
        configured
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
