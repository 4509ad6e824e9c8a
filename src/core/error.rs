use thiserror::Error;

/// Errors returned by the crate's fallible operations. The answer path
/// never surfaces these; it degrades internally instead.
#[derive(Error, Debug)]
pub enum MediqError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, MediqError>;
