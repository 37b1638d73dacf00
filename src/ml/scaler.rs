//! Pre-fitted input scaler.
//!
//! Loaded from JSON exported at training time. Besides the numeric transform
//! the artifact carries the categorical encodings used to turn string symptom
//! values into raw feature values, so the two stay in lockstep.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::domain::{SymptomRecord, SymptomValue, EXPECTED_SYMPTOMS, SYMPTOM_COUNT};
use crate::error::{MpoxError, PredictError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// `(x - mean) / scale`
    Standard,
    /// `(x - data_min) / (data_max - data_min)`
    MinMax,
    Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub kind: ScalerKind,

    /// Column names recorded at fit time. Must match the feature order if present.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,

    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,

    #[serde(default)]
    pub data_min: Option<Vec<f64>>,
    #[serde(default)]
    pub data_max: Option<Vec<f64>>,

    /// Per-attribute string -> code tables.
    #[serde(default)]
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,

    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Scaler {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| MpoxError::artifact(path, e))?;
        let scaler: Self =
            serde_json::from_str(&content).map_err(|e| MpoxError::artifact(path, e))?;
        scaler
            .validate()
            .map_err(|reason| MpoxError::artifact(path, reason))?;
        Ok(scaler)
    }

    pub fn identity() -> Self {
        Self {
            kind: ScalerKind::Identity,
            feature_names: None,
            mean: None,
            scale: None,
            data_min: None,
            data_max: None,
            categories: BTreeMap::new(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_categories(
        mut self,
        field: &str,
        table: impl IntoIterator<Item = (&'static str, f64)>,
    ) -> Self {
        self.categories.insert(
            field.to_string(),
            table.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        );
        self
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(names) = &self.feature_names {
            if names.iter().map(String::as_str).ne(EXPECTED_SYMPTOMS.iter().copied()) {
                return Err(format!(
                    "feature_names {names:?} do not match expected order {EXPECTED_SYMPTOMS:?}"
                ));
            }
        }

        match self.kind {
            ScalerKind::Standard => {
                check_vector("mean", self.mean.as_deref())?;
                let scale = check_vector("scale", self.scale.as_deref())?;
                if scale.iter().any(|v| *v < 0.0) {
                    return Err("scale must be >= 0".to_string());
                }
            }
            ScalerKind::MinMax => {
                let min = check_vector("data_min", self.data_min.as_deref())?;
                let max = check_vector("data_max", self.data_max.as_deref())?;
                if min.iter().zip(max).any(|(lo, hi)| hi < lo) {
                    return Err("data_max must be >= data_min".to_string());
                }
            }
            ScalerKind::Identity => {}
        }

        for (field, table) in &self.categories {
            if !EXPECTED_SYMPTOMS.contains(&field.as_str()) {
                return Err(format!("categories for unknown symptom '{field}'"));
            }
            if table.values().any(|v| !v.is_finite()) {
                return Err(format!("categories for '{field}' contain non-finite codes"));
            }
            // Keys must stay distinct under the case-insensitive fallback in `lookup_category`.
            let mut seen = BTreeMap::new();
            for name in table.keys() {
                let folded = name.trim().to_ascii_lowercase();
                if let Some(prev) = seen.insert(folded, name) {
                    return Err(format!(
                        "categories for '{field}' contain {prev:?} and {name:?}, which differ only by case or spacing"
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn input_dim(&self) -> usize {
        SYMPTOM_COUNT
    }

    /// Encode a single raw value into its numeric feature value.
    pub fn encode(&self, field: &str, value: &SymptomValue) -> std::result::Result<f64, String> {
        match value {
            SymptomValue::Flag(b) => Ok(if *b { 1.0 } else { 0.0 }),
            SymptomValue::Number(n) if n.is_finite() => Ok(*n),
            SymptomValue::Number(n) => Err(format!("non-finite number {n}")),
            SymptomValue::Category(raw) => {
                if let Some(table) = self.categories.get(field) {
                    return lookup_category(table, raw)
                        .ok_or_else(|| format!("unknown category {raw:?}"));
                }
                coerce_str(raw).ok_or_else(|| format!("cannot interpret {raw:?} as a number"))
            }
        }
    }

    /// Raw feature row for a record, in feature order.
    pub fn encode_record(
        &self,
        record: &SymptomRecord,
    ) -> std::result::Result<Vec<f64>, PredictError> {
        record
            .iter()
            .map(|(field, value)| {
                self.encode(field, value)
                    .map_err(|reason| PredictError::InvalidSymptomValue { field, reason })
            })
            .collect()
    }

    pub fn transform(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != SYMPTOM_COUNT {
            return Err(MpoxError::Validation(format!(
                "scaler input dim mismatch: got {}, expected {}",
                input.len(),
                SYMPTOM_COUNT
            )));
        }
        if input.iter().any(|v| !v.is_finite()) {
            return Err(MpoxError::Validation(
                "scaler input contains non-finite values".to_string(),
            ));
        }

        let out = match self.kind {
            ScalerKind::Identity => input.to_vec(),
            ScalerKind::Standard => {
                let mean = params(&self.mean, "mean")?;
                let scale = params(&self.scale, "scale")?;
                input
                    .iter()
                    .zip(mean.iter().zip(scale))
                    .map(|(x, (m, s))| (x - m) / nonzero(*s))
                    .collect()
            }
            ScalerKind::MinMax => {
                let min = params(&self.data_min, "data_min")?;
                let max = params(&self.data_max, "data_max")?;
                input
                    .iter()
                    .zip(min.iter().zip(max))
                    .map(|(x, (lo, hi))| (x - lo) / nonzero(hi - lo))
                    .collect()
            }
        };
        Ok(out)
    }
}

fn check_vector<'a>(name: &str, v: Option<&'a [f64]>) -> std::result::Result<&'a [f64], String> {
    let v = v.ok_or_else(|| format!("{name} is required"))?;
    if v.len() != SYMPTOM_COUNT {
        return Err(format!("{name} length {} != {}", v.len(), SYMPTOM_COUNT));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(format!("{name} contains non-finite values"));
    }
    Ok(v)
}

fn params<'a>(v: &'a Option<Vec<f64>>, name: &str) -> Result<&'a [f64]> {
    v.as_deref()
        .ok_or_else(|| MpoxError::Validation(format!("scaler is missing {name}")))
}

// Constant columns are left unscaled.
fn nonzero(d: f64) -> f64 {
    if d == 0.0 {
        1.0
    } else {
        d
    }
}

fn lookup_category(table: &BTreeMap<String, f64>, raw: &str) -> Option<f64> {
    if let Some(code) = table.get(raw) {
        return Some(*code);
    }
    let needle = raw.trim();
    table
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(needle))
        .map(|(_, v)| *v)
}

fn coerce_str(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if let Ok(n) = s.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(1.0),
        "false" | "no" => Some(0.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn standard() -> Scaler {
        serde_json::from_value(json!({
            "kind": "standard",
            "mean": [1.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5],
            "scale": [2.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.0],
            "categories": {
                "Systemic Illness": {"None": 0, "Fever": 1, "Swollen Lymph Nodes": 2}
            }
        }))
        .unwrap()
    }

    #[test]
    fn standard_transform() {
        let s = standard();
        s.validate().unwrap();
        let out = s
            .transform(&[3.0, 1.0, 0.0, 0.5, 1.0, 0.0, 1.0, 0.0, 2.0])
            .unwrap();
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[1] - 1.0).abs() < 1e-12);
        assert!((out[2] + 1.0).abs() < 1e-12);
        assert!(out[3].abs() < 1e-12);
        // zero scale leaves the centred value unscaled
        assert!((out[8] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn min_max_transform() {
        let s: Scaler = serde_json::from_value(json!({
            "kind": "min_max",
            "data_min": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            "data_max": [4.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]
        }))
        .unwrap();
        s.validate().unwrap();
        let out = s.transform(&[2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 3.0]).unwrap();
        assert!((out[0] - 0.5).abs() < 1e-12);
        assert!((out[1] - 1.0).abs() < 1e-12);
        assert!((out[8] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn transform_rejects_wrong_length() {
        assert!(standard().transform(&[0.0; 8]).is_err());
        assert!(Scaler::identity().transform(&[f64::NAN; 9]).is_err());
    }

    #[test]
    fn validate_catches_bad_artifacts() {
        let mut s = standard();
        s.scale = Some(vec![1.0; 8]);
        assert!(s.validate().is_err());

        let mut s = standard();
        s.mean = None;
        assert!(s.validate().is_err());

        let mut s = standard();
        s.feature_names = Some(vec!["Rectal Pain".to_string()]);
        assert!(s.validate().is_err());

        let s = Scaler::identity().with_categories("Rash", [("yes", 1.0)]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_case_colliding_categories() {
        let s = Scaler::identity()
            .with_categories("Systemic Illness", [("Fever", 1.0), ("fever", 2.0)]);
        let err = s.validate().unwrap_err();
        assert!(err.contains("Fever") && err.contains("fever"));

        let s = Scaler::identity()
            .with_categories("Systemic Illness", [("None", 0.0), (" none", 3.0)]);
        assert!(s.validate().is_err());

        let s = Scaler::identity()
            .with_categories("Systemic Illness", [("None", 0.0), ("Fever", 1.0)]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn feature_names_in_order_are_accepted() {
        let mut s = standard();
        s.feature_names = Some(EXPECTED_SYMPTOMS.iter().map(|k| k.to_string()).collect());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn encodes_categories_and_coerces_strings() {
        let s = standard();
        let cat = |v: &str| SymptomValue::Category(v.to_string());

        assert_eq!(s.encode("Systemic Illness", &cat("Fever")), Ok(1.0));
        assert_eq!(s.encode("Systemic Illness", &cat(" fever ")), Ok(1.0));
        assert!(s.encode("Systemic Illness", &cat("Headache")).is_err());
        assert_eq!(s.encode("Systemic Illness", &SymptomValue::Number(2.0)), Ok(2.0));

        assert_eq!(s.encode("Rectal Pain", &cat("1")), Ok(1.0));
        assert_eq!(s.encode("Rectal Pain", &cat("TRUE")), Ok(1.0));
        assert_eq!(s.encode("Rectal Pain", &cat("no")), Ok(0.0));
        assert_eq!(s.encode("Rectal Pain", &SymptomValue::Flag(true)), Ok(1.0));
        assert!(s.encode("Rectal Pain", &cat("sometimes")).is_err());
    }
}
