use crate::source::error::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("Failed to parse boundary GeoJSON")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid GeoJSON structure")]
    GeoJson(#[from] geojson::Error),

    #[error("Boundary GeoJSON root must be a FeatureCollection, found '{0}'")]
    NotAFeatureCollection(String),

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
