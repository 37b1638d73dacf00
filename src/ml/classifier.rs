//! Binary classifier abstraction over the supported model artifact formats.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{MpoxError, Result};
use crate::ml::DenseNetwork;

/// A loaded, immutable classifier.
pub trait Classifier: Send + Sync + fmt::Debug {
    fn input_dim(&self) -> usize;

    /// Predict the class label for one scaled feature vector.
    fn predict(&self, features: &[f64]) -> Result<i64>;

    /// Short human-readable description for logs and `/health`.
    fn describe(&self) -> String;
}

/// Turn raw model outputs into a class label.
///
/// A single output is read as the probability of the second class and
/// compared against `threshold`; wider outputs pick the argmax.
pub fn label_from_output(output: &[f64], threshold: f64, classes: Option<&[i64]>) -> Result<i64> {
    let idx = match output {
        [] => {
            return Err(MpoxError::Inference("model produced no outputs".to_string()));
        }
        [p] => {
            if !p.is_finite() {
                return Err(MpoxError::Inference(format!("non-finite model output {p}")));
            }
            usize::from(*p >= threshold)
        }
        many => {
            if many.iter().any(|v| !v.is_finite()) {
                return Err(MpoxError::Inference(
                    "model outputs contain non-finite values".to_string(),
                ));
            }
            many.iter()
                .enumerate()
                .fold((0usize, f64::NEG_INFINITY), |best, (i, v)| {
                    if *v > best.1 {
                        (i, *v)
                    } else {
                        best
                    }
                })
                .0
        }
    };

    match classes {
        Some(classes) => classes.get(idx).copied().ok_or_else(|| {
            MpoxError::Inference(format!("class index {idx} out of range ({})", classes.len()))
        }),
        None => Ok(idx as i64),
    }
}

/// First output of a model, as produced by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    /// Integer tensor holding class labels directly (skl2onnx `label` output).
    Labels(Vec<i64>),
    /// Probabilities or scores to threshold or argmax.
    Scores(Vec<f64>),
}

impl ModelOutput {
    /// Resolve to a class label. Label outputs are taken as-is, so neither the
    /// threshold nor `classes` applies to them.
    pub fn into_label(self, threshold: f64, classes: Option<&[i64]>) -> Result<i64> {
        match self {
            ModelOutput::Labels(labels) => labels
                .first()
                .copied()
                .ok_or_else(|| MpoxError::Inference("model produced no labels".to_string())),
            ModelOutput::Scores(scores) => label_from_output(&scores, threshold, classes),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DenseClassifier {
    network: DenseNetwork,
    threshold: f64,
}

impl DenseClassifier {
    pub fn new(network: DenseNetwork, threshold: f64) -> Result<Self> {
        network.validate().map_err(MpoxError::Validation)?;
        check_threshold(threshold)?;
        Ok(Self { network, threshold })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, threshold: f64) -> Result<Self> {
        let network = DenseNetwork::from_file(path)?;
        Self::new(network, threshold)
    }

    pub fn network(&self) -> &DenseNetwork {
        &self.network
    }
}

impl Classifier for DenseClassifier {
    fn input_dim(&self) -> usize {
        self.network.input_dim
    }

    fn predict(&self, features: &[f64]) -> Result<i64> {
        let out = self.network.forward(features)?;
        label_from_output(&out, self.threshold, self.network.classes.as_deref())
    }

    fn describe(&self) -> String {
        format!(
            "dense(layers={}, input_dim={}, output_dim={}, threshold={})",
            self.network.layers.len(),
            self.network.input_dim,
            self.network.output_dim(),
            self.threshold
        )
    }
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(MpoxError::Validation(format!(
            "decision threshold {threshold} must be within [0, 1]"
        )));
    }
    Ok(())
}

/// Load a classifier, choosing the backend from the file extension.
pub fn load_classifier<P: AsRef<Path>>(
    path: P,
    input_dim: usize,
    threshold: f64,
) -> Result<Arc<dyn Classifier>> {
    let path = path.as_ref();
    let is_onnx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("onnx"));

    let classifier: Arc<dyn Classifier> = if is_onnx {
        load_onnx(path, input_dim, threshold)?
    } else {
        Arc::new(DenseClassifier::from_file(path, threshold)?)
    };

    if classifier.input_dim() != input_dim {
        return Err(MpoxError::artifact(
            path,
            format!(
                "model input_dim {} != feature count {input_dim}",
                classifier.input_dim()
            ),
        ));
    }
    Ok(classifier)
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path, input_dim: usize, threshold: f64) -> Result<Arc<dyn Classifier>> {
    check_threshold(threshold)?;
    let model = crate::ml::OnnxModel::load_for_vec_input(path, input_dim)?;
    Ok(Arc::new(crate::ml::OnnxClassifier::new(model, threshold)))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path, _input_dim: usize, _threshold: f64) -> Result<Arc<dyn Classifier>> {
    Err(MpoxError::artifact(
        path,
        "ONNX models require building with the `onnx` feature",
    ))
}
