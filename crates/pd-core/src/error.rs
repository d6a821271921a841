use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Negative value for {what}: {value}")]
    Negative { what: &'static str, value: f64 },

    #[error("Expected an integer for {what}, got {value}")]
    NotIntegral { what: &'static str, value: f64 },

    #[error("Empty identifier for {what}")]
    EmptyId { what: &'static str },
}
