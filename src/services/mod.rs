pub mod health;
pub mod metrics;
pub mod predictor;

pub use health::{HealthResponse, HealthState, HealthStatus};
pub use metrics::{Metrics, MetricsSnapshot};
pub use predictor::Predictor;
