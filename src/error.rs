use crate::dataset::error::DatasetError;
use crate::provinces::error::BoundaryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Boundaries(#[from] BoundaryError),
}
