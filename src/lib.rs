pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ml;
pub mod services;

pub use config::AppConfig;
pub use domain::{Diagnosis, SymptomRecord, SymptomValue, EXPECTED_SYMPTOMS};
pub use error::{MpoxError, PredictError, Result};
pub use services::Predictor;
