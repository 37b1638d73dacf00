use thiserror::Error;

/// Main error type for the inference service
#[derive(Error, Debug)]
pub enum MpoxError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Artifact errors
    #[error("Artifact load failed: {path}: {reason}")]
    Artifact { path: String, reason: String },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // Inference errors
    #[error("Inference failed: {0}")]
    Inference(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MpoxError {
    pub fn artifact(path: impl AsRef<std::path::Path>, reason: impl std::fmt::Display) -> Self {
        MpoxError::Artifact {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for MpoxError
pub type Result<T> = std::result::Result<T, MpoxError>;

/// Failures of a single `/predict` request.
///
/// The first two variants are client errors (HTTP 400); everything else
/// takes the generic server-error path (HTTP 500).
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Missing symptoms data")]
    MissingSymptoms,

    #[error("Missing expected symptoms keys")]
    MissingSymptomKeys { missing: Vec<&'static str> },

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Invalid value for symptom '{field}': {reason}")]
    InvalidSymptomValue { field: &'static str, reason: String },

    #[error("{0}")]
    Inference(#[from] MpoxError),
}

impl PredictError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictError::MissingSymptoms | PredictError::MissingSymptomKeys { .. }
        )
    }

    /// Message safe to hand back to a caller without leaking internals.
    pub fn public_message(&self) -> String {
        match self {
            PredictError::MissingSymptoms | PredictError::MissingSymptomKeys { .. } => {
                self.to_string()
            }
            PredictError::MalformedRequest(_) => "Malformed request body".to_string(),
            PredictError::InvalidSymptomValue { field, .. } => {
                format!("Invalid value for symptom '{field}'")
            }
            PredictError::Inference(_) => "Prediction failed".to_string(),
        }
    }
}
