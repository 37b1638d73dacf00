use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary outcome of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Diagnosis {
    Positive,
    Negative,
}

impl Diagnosis {
    /// Label `1` is positive; every other label is negative.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Diagnosis::Positive
        } else {
            Diagnosis::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Positive => "Positive for monkeypox",
            Diagnosis::Negative => "Negative for monkeypox",
        }
    }

    pub fn is_positive(&self) -> bool {
        matches!(self, Diagnosis::Positive)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
