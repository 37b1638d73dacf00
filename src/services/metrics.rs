use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::Diagnosis;
use crate::error::PredictError;

/// Prediction counters for observability
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total `/predict` requests handled
    pub requests: AtomicU64,
    /// Positive diagnoses returned
    pub positive: AtomicU64,
    /// Negative diagnoses returned
    pub negative: AtomicU64,
    /// Requests rejected with 400
    pub client_errors: AtomicU64,
    /// Requests that failed with 500
    pub server_errors: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub positive: u64,
    pub negative: u64,
    pub client_errors: u64,
    pub server_errors: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the outcome of one `/predict` request.
    pub fn record(&self, outcome: &Result<Diagnosis, PredictError>) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            Ok(Diagnosis::Positive) => &self.positive,
            Ok(Diagnosis::Negative) => &self.negative,
            Err(e) if e.is_client_error() => &self.client_errors,
            Err(_) => &self.server_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            positive: self.positive.load(Ordering::Relaxed),
            negative: self.negative.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format
    pub fn prometheus(&self, uptime_seconds: u64) -> String {
        let s = self.snapshot();
        format!(
            r#"# HELP mpox_up Service is up and artifacts are loaded
# TYPE mpox_up gauge
mpox_up 1

# HELP mpox_uptime_seconds Uptime in seconds
# TYPE mpox_uptime_seconds counter
mpox_uptime_seconds {}

# HELP mpox_predict_requests_total Total /predict requests
# TYPE mpox_predict_requests_total counter
mpox_predict_requests_total {}

# HELP mpox_predictions_total Predictions returned by diagnosis
# TYPE mpox_predictions_total counter
mpox_predictions_total{{result="positive"}} {}
mpox_predictions_total{{result="negative"}} {}

# HELP mpox_predict_errors_total Failed /predict requests by class
# TYPE mpox_predict_errors_total counter
mpox_predict_errors_total{{class="client"}} {}
mpox_predict_errors_total{{class="server"}} {}
"#,
            uptime_seconds,
            s.requests,
            s.positive,
            s.negative,
            s.client_errors,
            s.server_errors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_outcome_once() {
        let m = Metrics::new();
        m.record(&Ok(Diagnosis::Positive));
        m.record(&Ok(Diagnosis::Negative));
        m.record(&Ok(Diagnosis::Negative));
        m.record(&Err(PredictError::MissingSymptoms));
        m.record(&Err(PredictError::MalformedRequest("x".to_string())));

        assert_eq!(
            m.snapshot(),
            MetricsSnapshot {
                requests: 5,
                positive: 1,
                negative: 2,
                client_errors: 1,
                server_errors: 1,
            }
        );
    }

    #[test]
    fn prometheus_text() {
        let m = Metrics::new();
        m.record(&Ok(Diagnosis::Positive));
        let text = m.prometheus(42);
        assert!(text.contains("mpox_uptime_seconds 42"));
        assert!(text.contains("mpox_predict_requests_total 1"));
        assert!(text.contains(r#"mpox_predictions_total{result="positive"} 1"#));
        assert!(text.contains(r#"mpox_predict_errors_total{class="server"} 0"#));
    }
}
