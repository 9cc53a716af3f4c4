use thiserror::Error;

/// The dataset could not be fetched or parsed. Never retried.
#[derive(Debug, Error)]
#[error("failed to load NDVI data from {source_name}: {cause:#}")]
pub struct LoadError {
    /// Path or URL the load was attempted from.
    pub source_name: String,
    #[source]
    pub cause: anyhow::Error,
}

impl LoadError {
    pub fn new(source_name: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            source_name: source_name.into(),
            cause,
        }
    }
}

/// Nearest-location lookup on a dataset without records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the NDVI dataset contains no locations")]
pub struct EmptyDatasetError;

/// The dataset load has not completed (or failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("NDVI data not loaded yet!")]
pub struct NotReady;
