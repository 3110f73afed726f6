//! Error types for the WGAN trainer

use thiserror::Error;

use crate::training::Phase;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Dataset identifier not present in the registry
    #[error("Unknown dataset '{name}' (known: {known})")]
    UnknownDataset { name: String, known: String },

    /// Model identifier not present in the registry
    #[error("Unknown model '{name}' (known: {known})")]
    UnknownModel { name: String, known: String },

    /// Model cannot be built for the selected dataset
    #[error("Model '{model}' cannot be used with dataset '{dataset}': {reason}")]
    IncompatibleModel {
        model: String,
        dataset: String,
        reason: String,
    },

    /// Shapes of collaborating components do not line up
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: i64,
        actual: i64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Loss diverged
    #[error("Non-finite {phase} loss ({value}) at iteration {iteration}")]
    NonFiniteLoss {
        phase: Phase,
        iteration: usize,
        value: f64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// libtorch error
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Array shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl Error {
    /// Whether the error stems from configuration rather than the run itself
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownDataset { .. }
                | Error::UnknownModel { .. }
                | Error::IncompatibleModel { .. }
                | Error::DimensionMismatch { .. }
                | Error::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::UnknownDataset {
            name: "cifar".to_string(),
            known: "mnist, toy".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown dataset 'cifar' (known: mnist, toy)");
        assert!(err.is_config_error());

        let err = Error::NonFiniteLoss {
            phase: Phase::Critic,
            iteration: 3,
            value: f64::NAN,
        };
        assert!(err.to_string().contains("critic"));
        assert!(!err.is_config_error());
    }
}
