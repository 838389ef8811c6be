//! Simple extractors over a classifier's probability vector.
//!
//! The record holds one probability (or unnormalized score) per class. Any
//! non-numeric or missing entry makes the result [`Scalar::Null`].

use crate::{
    extractor::{BoxedSimpleExtractor, SimpleExtractor},
    record::{Record, Scalar},
};

fn probabilities(record: &Record) -> Option<Vec<f64>> {
    record
        .iter()
        .map(|value| value.as_f64().filter(|v| v.is_finite()))
        .collect()
}

/// Shannon entropy (natural log) of the normalized probability vector.
///
/// ```
/// use driftwatch_extract::{
///     extractor::SimpleExtractor as _,
///     probability::ClassificationEntropy,
///     record::{Record, Scalar},
/// };
///
/// let certain = Record::values([1.0, 0.0, 0.0]);
/// assert_eq!(ClassificationEntropy.extract(&certain), Scalar::Float(0.0));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationEntropy;

impl ClassificationEntropy {
    pub const KIND: &'static str = "classification_entropy";

    fn entropy(probabilities: &[f64]) -> Option<f64> {
        if probabilities.iter().any(|p| *p < 0.0) {
            return None;
        }
        let total = probabilities.iter().sum::<f64>();
        if total <= 0.0 {
            return None;
        }
        let entropy = probabilities
            .iter()
            .map(|p| p / total)
            .filter(|p| *p > 0.0)
            .map(|p| -p * p.ln())
            .sum::<f64>();
        Some(entropy.max(0.0))
    }
}

impl SimpleExtractor for ClassificationEntropy {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn clone_boxed(&self) -> BoxedSimpleExtractor {
        Box::new(*self)
    }

    fn extract(&self, record: &Record) -> Scalar {
        probabilities(record)
            .and_then(|p| Self::entropy(&p))
            .map_or(Scalar::Null, Scalar::Float)
    }

    fn state(&self) -> serde_json::Value {
        serde_json::json!({})
    }
}

/// Squared complement of the gap between the two most likely classes:
/// `(1 - (p_max - p_second))^2`. Close to 0 for a confident prediction and
/// close to 1 for an undecided one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationMargin;

impl ClassificationMargin {
    pub const KIND: &'static str = "classification_margin";
}

impl SimpleExtractor for ClassificationMargin {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn clone_boxed(&self) -> BoxedSimpleExtractor {
        Box::new(*self)
    }

    fn extract(&self, record: &Record) -> Scalar {
        let Some(mut probabilities) = probabilities(record) else {
            return Scalar::Null;
        };
        if probabilities.len() < 2 {
            return Scalar::Null;
        }
        probabilities.sort_by(|a, b| b.total_cmp(a));
        let margin = probabilities[0] - probabilities[1];
        Scalar::Float((1.0 - margin).powi(2))
    }

    fn state(&self) -> serde_json::Value {
        serde_json::json!({})
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_of_uniform() {
        let value = ClassificationEntropy.extract(&Record::values([0.25; 4]));
        let Scalar::Float(entropy) = value else {
            panic!("expected a float, got {value:?}");
        };
        assert!((entropy - 4.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_normalizes_scores() {
        let a = ClassificationEntropy.extract(&Record::values([1.0, 3.0]));
        let b = ClassificationEntropy.extract(&Record::values([0.25, 0.75]));
        let (Scalar::Float(a), Scalar::Float(b)) = (a, b) else {
            panic!("expected floats");
        };
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_rejects_bad_vectors() {
        assert_eq!(
            ClassificationEntropy.extract(&Record::values([0.0, 0.0])),
            Scalar::Null
        );
        assert_eq!(
            ClassificationEntropy.extract(&Record::values([Scalar::from(0.5), Scalar::Null])),
            Scalar::Null
        );
    }

    #[test]
    fn test_margin() {
        assert_eq!(
            ClassificationMargin.extract(&Record::values([0.0, 1.0, 0.0])),
            Scalar::Float(0.0)
        );
        assert_eq!(
            ClassificationMargin.extract(&Record::values([0.5, 0.5])),
            Scalar::Float(1.0)
        );
        assert_eq!(
            ClassificationMargin.extract(&Record::values([1.0])),
            Scalar::Null
        );
    }
}
