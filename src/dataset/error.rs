use crate::source::error::SourceError;
use crate::types::month_key::ParseMonthKeyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to parse weather dataset JSON")]
    JsonParse(#[from] serde_json::Error),

    #[error("Weather dataset contains an invalid month key")]
    InvalidMonthKey(#[from] ParseMonthKeyError),

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
