use std::env;

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_FLUSH_THRESHOLD: usize = 1000;

/// Runtime configuration for a reindex run. The search engine connection
/// target and the database URL are the only required pieces of state.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub database_url: String,
    pub search_url: String,
    pub chunk_size: usize,
    pub flush_threshold: usize,
}

impl IndexerConfig {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?,
            search_url: env_string("SEARCH_URL", "http://localhost:9200"),
            chunk_size: env_usize("INDEXER_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            flush_threshold: env_usize("INDEXER_FLUSH_THRESHOLD", DEFAULT_FLUSH_THRESHOLD),
        })
    }
}
