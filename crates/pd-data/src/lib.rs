//! pd-data: measurement schema, upload parsing and dashboard configuration.

pub mod config;
pub mod parse;
pub mod schema;
pub mod validate;

pub use config::{AxisDef, ChartOptionsDef, DashboardConfig, WarningThresholds};
pub use parse::{ParseError, ParsedUpload, parse_line, parse_upload};
pub use schema::*;
pub use validate::{ValidationError, validate_config, validate_measurement};

pub type DataResult<T> = Result<T, DataError>;

#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_config(path: &std::path::Path) -> DataResult<DashboardConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: DashboardConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_config(path: &std::path::Path, config: &DashboardConfig) -> DataResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Reads an upload file and parses every non-empty line.
pub fn load_upload(path: &std::path::Path) -> DataResult<ParsedUpload> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_upload(&content))
}
