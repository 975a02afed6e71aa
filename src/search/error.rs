use reqwest::StatusCode;
use thiserror::Error;

/// Errors that occur while interacting with search infrastructure.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("elasticsearch HTTP error: {0}")]
    ElasticHttp(reqwest::Error),
    #[error("elasticsearch returned status {status}: {body}")]
    ElasticStatus { status: StatusCode, body: String },
    #[error("failed to encode bulk payload: {0}")]
    Encode(serde_json::Error),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl SearchError {
    pub fn elastic_status(status: StatusCode, body: String) -> Self {
        SearchError::ElasticStatus { status, body }
    }
}
