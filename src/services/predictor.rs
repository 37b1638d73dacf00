//! Request pipeline: parse -> validate -> encode -> scale -> predict.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ArtifactConfig;
use crate::domain::{Diagnosis, SymptomRecord};
use crate::error::{MpoxError, PredictError, Result};
use crate::ml::{load_classifier, Classifier, Scaler};

/// Loaded scaler and classifier pair, shared read-only by every request.
#[derive(Debug)]
pub struct Predictor {
    scaler: Scaler,
    classifier: Arc<dyn Classifier>,
}

impl Predictor {
    pub fn new(scaler: Scaler, classifier: Arc<dyn Classifier>) -> Result<Self> {
        scaler.validate().map_err(MpoxError::Validation)?;
        if classifier.input_dim() != scaler.input_dim() {
            return Err(MpoxError::Validation(format!(
                "classifier input_dim {} != scaler output dim {}",
                classifier.input_dim(),
                scaler.input_dim()
            )));
        }
        Ok(Self { scaler, classifier })
    }

    /// Load both artifacts from disk. Any failure here is fatal to startup.
    pub fn load(cfg: &ArtifactConfig) -> Result<Self> {
        let scaler = Scaler::from_file(&cfg.scaler_path)?;
        info!(
            path = %cfg.scaler_path.display(),
            kind = ?scaler.kind,
            categorical = scaler.categories.len(),
            "Loaded scaler"
        );

        let classifier =
            load_classifier(&cfg.model_path, scaler.input_dim(), cfg.decision_threshold)?;
        info!(
            path = %cfg.model_path.display(),
            model = %classifier.describe(),
            "Loaded classifier"
        );

        Self::new(scaler, classifier)
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Run the pipeline on a raw request body.
    pub fn predict_body(&self, body: &[u8]) -> std::result::Result<Diagnosis, PredictError> {
        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| PredictError::MalformedRequest(format!("invalid JSON: {e}")))?;
        self.predict_payload(&payload)
    }

    /// Run the pipeline on a parsed `{"symptoms": {...}}` payload.
    ///
    /// Anything other than a JSON object at the top level is malformed, even a
    /// list or string that happens to lack a `symptoms` key.
    pub fn predict_payload(&self, payload: &Value) -> std::result::Result<Diagnosis, PredictError> {
        let obj = payload.as_object().ok_or_else(|| {
            PredictError::MalformedRequest("request body must be a JSON object".to_string())
        })?;
        let symptoms = obj.get("symptoms").ok_or(PredictError::MissingSymptoms)?;
        let record = SymptomRecord::from_json(symptoms)?;
        self.predict_record(&record)
    }

    pub fn predict_record(
        &self,
        record: &SymptomRecord,
    ) -> std::result::Result<Diagnosis, PredictError> {
        let raw = self.scaler.encode_record(record)?;
        let scaled = self.scaler.transform(&raw)?;
        let label = self.classifier.predict(&scaled)?;
        let diagnosis = Diagnosis::from_label(label);
        debug!(?raw, ?scaled, label, %diagnosis, "Prediction");
        Ok(diagnosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{Activation, DenseClassifier, DenseLayer, DenseNetwork, ScalerKind};
    use serde_json::json;

    /// Positive iff "Sore Throat" is set; everything else has zero weight.
    fn predictor() -> Predictor {
        let mut weights = vec![0.0; 9];
        weights[2] = 10.0;
        let network = DenseNetwork {
            input_dim: 9,
            layers: vec![DenseLayer {
                weights: vec![weights],
                bias: vec![-5.0],
                activation: Activation::Sigmoid,
            }],
            classes: None,
            metadata: Value::Null,
        };
        let scaler = Scaler::identity().with_categories(
            "Systemic Illness",
            [("None", 0.0), ("Fever", 1.0), ("Swollen Lymph Nodes", 2.0)],
        );
        Predictor::new(scaler, Arc::new(DenseClassifier::new(network, 0.5).unwrap())).unwrap()
    }

    fn payload(sore_throat: i64) -> Value {
        json!({"symptoms": {
            "Systemic Illness": "Fever",
            "Rectal Pain": 0,
            "Sore Throat": sore_throat,
            "Penile Oedema": 0,
            "Oral Lesions": 0,
            "Solitary Lesion": 0,
            "Swollen Tonsils": 0,
            "HIV Infection": 0,
            "Sexually Transmitted Infection": 0
        }})
    }

    #[test]
    fn predicts_both_labels() {
        let p = predictor();
        assert_eq!(p.predict_payload(&payload(1)).unwrap(), Diagnosis::Positive);
        assert_eq!(p.predict_payload(&payload(0)).unwrap(), Diagnosis::Negative);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let p = predictor();
        let first = p.predict_payload(&payload(1)).unwrap();
        for _ in 0..10 {
            assert_eq!(p.predict_payload(&payload(1)).unwrap(), first);
        }
    }

    #[test]
    fn classifies_failures() {
        let p = predictor();
        assert!(matches!(
            p.predict_payload(&json!({})),
            Err(PredictError::MissingSymptoms)
        ));
        assert!(matches!(
            p.predict_payload(&json!({"symptoms": {"Systemic Illness": "Fever"}})),
            Err(PredictError::MissingSymptomKeys { .. })
        ));
        assert!(matches!(
            p.predict_payload(&json!({"symptoms": "Fever"})),
            Err(PredictError::MalformedRequest(_))
        ));
        for top_level in [json!([1, 2]), json!([]), json!("x"), json!(null)] {
            assert!(matches!(
                p.predict_payload(&top_level),
                Err(PredictError::MalformedRequest(_))
            ));
        }
        assert!(matches!(
            p.predict_body(b"not json"),
            Err(PredictError::MalformedRequest(_))
        ));

        let mut bad = payload(1);
        bad["symptoms"]["Systemic Illness"] = json!("Headache");
        assert!(matches!(
            p.predict_payload(&bad),
            Err(PredictError::InvalidSymptomValue { field: "Systemic Illness", .. })
        ));
    }

    #[test]
    fn rejects_mismatched_artifacts() {
        let network = DenseNetwork {
            input_dim: 4,
            layers: vec![DenseLayer {
                weights: vec![vec![1.0; 4]],
                bias: vec![0.0],
                activation: Activation::Sigmoid,
            }],
            classes: None,
            metadata: Value::Null,
        };
        let clf = Arc::new(DenseClassifier::new(network, 0.5).unwrap());
        assert!(Predictor::new(Scaler::identity(), clf).is_err());
    }

    #[test]
    fn loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let scaler_path = dir.path().join("scaler.json");
        std::fs::write(
            &model_path,
            json!({
                "input_dim": 9,
                "layers": [{
                    "weights": [[0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]],
                    "bias": [-5.0],
                    "activation": "sigmoid"
                }]
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            &scaler_path,
            json!({
                "kind": "standard",
                "mean": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                "scale": [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
                "categories": {"Systemic Illness": {"None": 0, "Fever": 1}}
            })
            .to_string(),
        )
        .unwrap();

        let cfg = ArtifactConfig {
            model_path,
            scaler_path,
            decision_threshold: 0.5,
        };
        let p = Predictor::load(&cfg).unwrap();
        assert_eq!(p.scaler().kind, ScalerKind::Standard);
        assert_eq!(p.predict_payload(&payload(1)).unwrap(), Diagnosis::Positive);

        let missing = ArtifactConfig {
            scaler_path: dir.path().join("nope.json"),
            ..cfg
        };
        assert!(matches!(Predictor::load(&missing), Err(MpoxError::Artifact { .. })));
    }
}
