//! Model and scaler artifacts (deploy-safe inference).
//!
//! Everything here is loaded once at startup and read-only afterwards.

pub mod classifier;
pub mod dense;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod scaler;

pub use classifier::{
    label_from_output, load_classifier, Classifier, DenseClassifier, ModelOutput,
};
pub use dense::{Activation, DenseLayer, DenseNetwork};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxClassifier, OnnxModel};
pub use scaler::{Scaler, ScalerKind};
