use serde::{Deserialize, Serialize};

/// Where in the domain the largest drift gap was found.
///
/// Numeric summaries report a value from the merged percentile domain,
/// categorical ones the category name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(untagged)]
pub enum DriftLocation {
    Value(f64),
    Category(String),
}

/// Outcome of comparing two distributions.
///
/// `drift` is a severity in `[0, 1]`: the largest gap between the confidence
/// envelopes of the two distributions. When the comparison cannot be made
/// (`valid == false`) both `drift` and `drift_idx` are `-1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub drift: f64,
    pub drift_idx: DriftLocation,
    pub alert: bool,
    pub valid: bool,
}

impl DriftReport {
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            drift: -1.0,
            drift_idx: DriftLocation::Value(-1.0),
            alert: false,
            valid: false,
        }
    }
}

/// Change in the fraction of invalid values between two summaries.
///
/// `invalids` is `other - self`; a positive value means the other sample had
/// more invalid values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidsReport {
    pub invalids: f64,
    pub alert: bool,
    pub valid: bool,
}

impl InvalidsReport {
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            invalids: -1.0,
            alert: false,
            valid: false,
        }
    }

    pub(crate) fn from_fractions(reference: f64, other: f64, threshold: f64) -> Self {
        let delta = other - reference;
        Self {
            invalids: delta,
            alert: delta > threshold,
            valid: true,
        }
    }
}
