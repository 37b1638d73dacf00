//! Health reporting for process supervision (systemd / k8s probes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::services::{Metrics, MetricsSnapshot, Predictor};

/// Health status for the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Shutdown has begun; stop routing new traffic here
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// Overall system health response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: &'static str,
    pub model: String,
    pub scaler: String,
    pub predictions: MetricsSnapshot,
}

/// Shared state behind the health endpoints
#[derive(Debug)]
pub struct HealthState {
    /// When the server started
    pub started_at: DateTime<Utc>,
    pub metrics: Arc<Metrics>,
    shutting_down: AtomicBool,
    model: String,
    scaler: String,
}

impl HealthState {
    pub fn new(predictor: &Predictor, metrics: Arc<Metrics>) -> Self {
        let scaler = predictor.scaler();
        Self {
            started_at: Utc::now(),
            metrics,
            shutting_down: AtomicBool::new(false),
            model: predictor.classifier().describe(),
            scaler: format!(
                "{:?}(categorical={})",
                scaler.kind,
                scaler.categories.len()
            )
            .to_lowercase(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Flip readiness off once a shutdown signal arrives.
    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        !self.shutting_down.load(Ordering::SeqCst)
    }

    /// Artifacts are loaded before the state exists, so a live process is
    /// healthy until shutdown begins.
    pub fn get_health(&self) -> HealthResponse {
        HealthResponse {
            status: if self.is_ready() {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            timestamp: Utc::now(),
            uptime_seconds: self.uptime_seconds(),
            version: env!("CARGO_PKG_VERSION"),
            model: self.model.clone(),
            scaler: self.scaler.clone(),
            predictions: self.metrics.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Diagnosis;
    use crate::ml::{Activation, DenseClassifier, DenseLayer, DenseNetwork, Scaler};

    fn predictor() -> Predictor {
        let network = DenseNetwork {
            input_dim: 9,
            layers: vec![DenseLayer {
                weights: vec![vec![0.1; 9]],
                bias: vec![0.0],
                activation: Activation::Sigmoid,
            }],
            classes: None,
            metadata: serde_json::Value::Null,
        };
        Predictor::new(
            Scaler::identity(),
            Arc::new(DenseClassifier::new(network, 0.5).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn reports_artifacts_and_counters() {
        let metrics = Arc::new(Metrics::new());
        let state = HealthState::new(&predictor(), Arc::clone(&metrics));

        metrics.record(&Ok(Diagnosis::Positive));
        let health = state.get_health();

        assert!(health.status.is_healthy());
        assert!(health.model.starts_with("dense("));
        assert_eq!(health.scaler, "identity(categorical=0)");
        assert_eq!(health.predictions.requests, 1);
        assert_eq!(health.predictions.positive, 1);
    }

    #[test]
    fn shutdown_marks_unready() {
        let state = HealthState::new(&predictor(), Arc::new(Metrics::new()));
        assert!(state.is_ready());
        state.begin_shutdown();
        assert!(!state.is_ready());
        assert_eq!(state.get_health().status, HealthStatus::Unhealthy);
    }
}
