//! ONNX inference wrapper (pure Rust via `tract-onnx`).
//!
//! Lets a classifier exported with skl2onnx or torch.onnx be served without
//! Python. Only the first model output is read. Integer outputs are class
//! labels (skl2onnx `label`) and are returned unchanged; float outputs are
//! scores and go through the threshold / argmax rule.

use std::path::Path;

use crate::error::{MpoxError, Result};
use crate::ml::classifier::{Classifier, ModelOutput};

use tract_onnx::prelude::*;

#[derive(Clone)]
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: Vec<usize>,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_shape", &self.input_shape)
            .finish()
    }
}

impl OnnxModel {
    /// Load an ONNX model and specialize it to a fixed `[1, input_dim]` f32 input.
    pub fn load_for_vec_input(path: &Path, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(MpoxError::Validation("input_dim must be > 0".to_string()));
        }
        let input_shape = vec![1, input_dim];

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| MpoxError::artifact(path, format!("onnx load failed: {e}")))?;

        let model = model
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, input_dim)),
            )
            .map_err(|e| MpoxError::artifact(path, format!("onnx input fact failed: {e}")))?;

        let plan = model
            .into_optimized()
            .map_err(|e| MpoxError::artifact(path, format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| MpoxError::artifact(path, format!("onnx runnable failed: {e}")))?;

        let loaded = Self { plan, input_shape };

        // Dry run so shape problems surface at startup rather than per request.
        loaded
            .run(&vec![0.0; input_dim])
            .map_err(|e| MpoxError::artifact(path, e))?;

        Ok(loaded)
    }

    pub fn input_dim(&self) -> usize {
        self.input_shape.last().copied().unwrap_or(0)
    }

    /// Run inference on a single feature vector.
    pub fn run(&self, input: &[f64]) -> Result<ModelOutput> {
        if input.len() != self.input_dim() {
            return Err(MpoxError::Validation(format!(
                "onnx input dim mismatch: got {}, expected {} (shape={:?})",
                input.len(),
                self.input_dim(),
                self.input_shape
            )));
        }

        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&self.input_shape),
            input.iter().map(|v| *v as f32).collect(),
        )
        .map_err(|e| MpoxError::Inference(format!("onnx input reshape failed: {e}")))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| MpoxError::Inference(format!("onnx run failed: {e}")))?;
        let first = outputs
            .first()
            .ok_or_else(|| MpoxError::Inference("onnx produced no outputs".to_string()))?;

        decode_output(first)
    }
}

/// Split a raw output tensor into labels or scores by its datum type.
fn decode_output(tensor: &Tensor) -> Result<ModelOutput> {
    let is_label = matches!(
        tensor.datum_type(),
        DatumType::I8
            | DatumType::I16
            | DatumType::I32
            | DatumType::I64
            | DatumType::U8
            | DatumType::U16
            | DatumType::U32
            | DatumType::U64
    );
    if is_label {
        let cast = tensor
            .cast_to::<i64>()
            .map_err(|e| MpoxError::Inference(format!("onnx label cast failed: {e}")))?;
        let labels = cast
            .as_slice::<i64>()
            .map_err(|e| MpoxError::Inference(format!("onnx label decode failed: {e}")))?;
        return Ok(ModelOutput::Labels(labels.to_vec()));
    }

    let cast = tensor
        .cast_to::<f32>()
        .map_err(|e| MpoxError::Inference(format!("onnx output cast failed: {e}")))?;
    let values = cast
        .as_slice::<f32>()
        .map_err(|e| MpoxError::Inference(format!("onnx output decode failed: {e}")))?;
    Ok(ModelOutput::Scores(
        values.iter().map(|v| f64::from(*v)).collect(),
    ))
}

#[derive(Debug, Clone)]
pub struct OnnxClassifier {
    model: OnnxModel,
    threshold: f64,
}

impl OnnxClassifier {
    pub fn new(model: OnnxModel, threshold: f64) -> Self {
        Self { model, threshold }
    }
}

impl Classifier for OnnxClassifier {
    fn input_dim(&self) -> usize {
        self.model.input_dim()
    }

    fn predict(&self, features: &[f64]) -> Result<i64> {
        self.model.run(features)?.into_label(self.threshold, None)
    }

    fn describe(&self) -> String {
        format!(
            "onnx(input_shape={:?}, threshold={})",
            self.model.input_shape, self.threshold
        )
    }
}
