use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::AppResult,
    services::reranker::{
        ScoringPolicy, DEFAULT_GENRE_CAP, DEFAULT_GENRE_STEP, DEFAULT_UPVOTE_BOOST,
    },
};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL, used for signal persistence and status caching
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Ranking provider base URL
    #[serde(default = "default_ranking_api_url")]
    pub ranking_api_url: String,

    /// Ranking provider API key; empty means the provider is not set up
    #[serde(default)]
    pub ranking_api_key: String,

    /// Model queried for rankings and status
    #[serde(default = "default_ranking_model_id")]
    pub ranking_model_id: String,

    /// Dataset that receives interaction events
    #[serde(default)]
    pub ranking_dataset_id: String,

    /// Per-request timeout for provider calls, in seconds
    #[serde(default = "default_ranking_timeout_secs")]
    pub ranking_timeout_secs: u64,

    /// Number of recommendations requested per feed
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    #[serde(default = "default_upvote_boost")]
    pub upvote_boost: f64,

    #[serde(default = "default_genre_step")]
    pub genre_step: f64,

    #[serde(default = "default_genre_cap")]
    pub genre_cap: f64,

    /// Optional JSON file with the initial catalog snapshot
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_ranking_api_url() -> String {
    "https://api.shaped.ai/v1".to_string()
}

fn default_ranking_model_id() -> String {
    "movielens_movie_recommendation".to_string()
}

fn default_ranking_timeout_secs() -> u64 {
    10
}

fn default_recommendation_limit() -> usize {
    50
}

fn default_upvote_boost() -> f64 {
    DEFAULT_UPVOTE_BOOST
}

fn default_genre_step() -> f64 {
    DEFAULT_GENRE_STEP
}

fn default_genre_cap() -> f64 {
    DEFAULT_GENRE_CAP
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Validated boost constants for the reranker
    pub fn scoring_policy(&self) -> AppResult<ScoringPolicy> {
        ScoringPolicy::new(self.upvote_boost, self.genre_step, self.genre_cap)
    }

    pub fn ranking_timeout(&self) -> Duration {
        Duration::from_secs(self.ranking_timeout_secs)
    }
}
