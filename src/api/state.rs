use std::sync::Arc;

use crate::services::{HealthState, Metrics, Predictor};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct AppState {
    /// Loaded scaler + classifier, read-only after startup
    pub predictor: Arc<Predictor>,

    /// Request counters
    pub metrics: Arc<Metrics>,

    /// Liveness / readiness bookkeeping
    pub health: Arc<HealthState>,

    /// Return raw error messages on 500 responses
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(predictor: Arc<Predictor>, expose_error_details: bool) -> Self {
        let metrics = Arc::new(Metrics::new());
        let health = Arc::new(HealthState::new(&predictor, Arc::clone(&metrics)));
        Self {
            predictor,
            metrics,
            health,
            expose_error_details,
        }
    }
}
