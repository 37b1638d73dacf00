use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::PredictError;

/// Symptom attributes in the column order the artifacts were fit with.
pub const EXPECTED_SYMPTOMS: [&str; 9] = [
    "Systemic Illness",
    "Rectal Pain",
    "Sore Throat",
    "Penile Oedema",
    "Oral Lesions",
    "Solitary Lesion",
    "Swollen Tonsils",
    "HIV Infection",
    "Sexually Transmitted Infection",
];

pub const SYMPTOM_COUNT: usize = EXPECTED_SYMPTOMS.len();

/// A single raw attribute value as it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymptomValue {
    Flag(bool),
    Number(f64),
    Category(String),
}

impl SymptomValue {
    pub fn from_json(field: &'static str, value: &Value) -> Result<Self, PredictError> {
        match value {
            Value::Bool(b) => Ok(Self::Flag(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                PredictError::InvalidSymptomValue {
                    field,
                    reason: format!("number {n} is not representable as f64"),
                }
            }),
            Value::String(s) => Ok(Self::Category(s.clone())),
            other => Err(PredictError::InvalidSymptomValue {
                field,
                reason: format!("unsupported JSON type: {}", json_type_name(other)),
            }),
        }
    }
}

impl fmt::Display for SymptomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymptomValue::Flag(b) => write!(f, "{b}"),
            SymptomValue::Number(n) => write!(f, "{n}"),
            SymptomValue::Category(s) => write!(f, "{s:?}"),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One patient's nine symptom attributes, held in feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct SymptomRecord {
    values: [SymptomValue; SYMPTOM_COUNT],
}

impl SymptomRecord {
    pub fn new(values: [SymptomValue; SYMPTOM_COUNT]) -> Self {
        Self { values }
    }

    /// Build a record from the `symptoms` mapping of a request.
    ///
    /// Every expected key must be present; extra keys are ignored.
    pub fn from_json(symptoms: &Value) -> Result<Self, PredictError> {
        let map = symptoms.as_object().ok_or_else(|| {
            PredictError::MalformedRequest(format!(
                "`symptoms` must be an object, got {}",
                json_type_name(symptoms)
            ))
        })?;
        Self::from_map(map)
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self, PredictError> {
        let missing: Vec<&'static str> = EXPECTED_SYMPTOMS
            .iter()
            .copied()
            .filter(|key| !map.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(PredictError::MissingSymptomKeys { missing });
        }

        let mut values = Vec::with_capacity(SYMPTOM_COUNT);
        for key in EXPECTED_SYMPTOMS {
            values.push(SymptomValue::from_json(key, &map[key])?);
        }
        let values: [SymptomValue; SYMPTOM_COUNT] = values
            .try_into()
            .map_err(|_| PredictError::MalformedRequest("symptom count mismatch".to_string()))?;

        Ok(Self { values })
    }

    pub fn get(&self, field: &str) -> Option<&SymptomValue> {
        EXPECTED_SYMPTOMS
            .iter()
            .position(|k| *k == field)
            .map(|idx| &self.values[idx])
    }

    /// `(attribute name, value)` pairs in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SymptomValue)> {
        EXPECTED_SYMPTOMS.iter().copied().zip(self.values.iter())
    }
}
