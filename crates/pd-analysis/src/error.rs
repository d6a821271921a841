use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unknown chart kind: {0}")]
    UnknownChartKind(String),

    #[error("Unknown metric kind: {0}")]
    UnknownMetricKind(String),

    #[error("Unknown performance counter: {0}")]
    UnknownCounter(String),

    #[error("Chart surface unavailable: {message}")]
    SurfaceUnavailable { message: String },

    #[error("Render failed: {message}")]
    Render { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
