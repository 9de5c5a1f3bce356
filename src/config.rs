use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::services::{providers::RetryPolicy, Weights};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding one JSON file per venue
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Google Places API key; lookups fail while it is empty
    #[serde(default)]
    pub google_api_key: String,

    /// Google Places API base URL
    #[serde(default = "default_places_api_url")]
    pub places_api_url: String,

    #[serde(default = "default_weight")]
    pub weight_rating: f64,

    #[serde(default = "default_weight")]
    pub weight_last_visit: f64,

    #[serde(default = "default_weight")]
    pub weight_day_count: f64,

    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,

    #[serde(default = "default_lookup_max_attempts")]
    pub lookup_max_attempts: u32,

    #[serde(default = "default_lookup_backoff_ms")]
    pub lookup_backoff_ms: u64,

    /// Fixed seed for reproducible picks
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4334
}

fn default_places_api_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_weight() -> f64 {
    1.0
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

fn default_lookup_max_attempts() -> u32 {
    3
}

fn default_lookup_backoff_ms() -> u64 {
    200
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.weights()?;
        Ok(config)
    }

    /// Weighted pick multipliers, validated
    pub fn weights(&self) -> anyhow::Result<Weights> {
        let weights = Weights {
            rating: self.weight_rating,
            last_visit: self.weight_last_visit,
            day_count: self.weight_day_count,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.lookup_max_attempts,
            initial_backoff: Duration::from_millis(self.lookup_backoff_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}
