//! Error types for the pd-app service layer.

use crate::refresh::FetchKind;

/// Application error type wrapping the lower crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Failed to fetch {kind}: {message}")]
    UpstreamFetch { kind: FetchKind, message: String },

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pd-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<pd_data::DataError> for AppError {
    fn from(err: pd_data::DataError) -> Self {
        AppError::Data(err.to_string())
    }
}

impl From<pd_data::ValidationError> for AppError {
    fn from(err: pd_data::ValidationError) -> Self {
        AppError::Data(err.to_string())
    }
}

impl From<pd_store::StoreError> for AppError {
    fn from(err: pd_store::StoreError) -> Self {
        match err {
            pd_store::StoreError::NotFound { collection, id } => {
                AppError::NotFound(format!("{collection} {id}"))
            }
            other => AppError::Store(other.to_string()),
        }
    }
}

impl From<pd_analysis::AnalysisError> for AppError {
    fn from(err: pd_analysis::AnalysisError) -> Self {
        AppError::Analysis(err.to_string())
    }
}
