//! Eval extractors comparing a model output with its ground truth.
//!
//! Each side is read through [`Record::first`], so a record may be a
//! one-element vector or a row with a single field.

use serde::{Deserialize, Serialize};

use crate::{
    extractor::{BoxedEvalExtractor, EvalExtractor},
    record::{Record, Scalar},
};

fn numeric_pair(output: &Record, actual: &Record) -> Option<(f64, f64)> {
    let output = output.first()?.as_f64()?;
    let actual = actual.first()?.as_f64()?;
    Some((output, actual))
}

macro_rules! regression_extractor {
    ($(#[$meta:meta])* $name:ident, $kind:literal, |$diff:ident| $body:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl $name {
            pub const KIND: &'static str = $kind;
        }

        impl EvalExtractor for $name {
            fn kind(&self) -> &'static str {
                Self::KIND
            }

            fn clone_boxed(&self) -> BoxedEvalExtractor {
                Box::new(*self)
            }

            fn extract(&self, output: &Record, actual: &Record) -> Scalar {
                numeric_pair(output, actual)
                    .map_or(Scalar::Null, |(output, actual)| {
                        let $diff = output - actual;
                        Scalar::Float($body)
                    })
            }

            fn state(&self) -> serde_json::Value {
                serde_json::json!({})
            }
        }
    };
}

regression_extractor!(
    /// Signed error `output - actual`.
    RegressionError,
    "regression_error",
    |diff| diff
);

regression_extractor!(
    /// Absolute error `|output - actual|`.
    AbsoluteRegressionError,
    "absolute_regression_error",
    |diff| diff.abs()
);

regression_extractor!(
    /// Squared error `(output - actual)^2`.
    SquaredRegressionError,
    "squared_regression_error",
    |diff| diff.powi(2)
);

/// Outcome of a binary classification, as emitted by [`ClassificationErrorType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ErrorType {
    #[display("TP")]
    TruePositive,
    #[display("FP")]
    FalsePositive,
    #[display("TN")]
    TrueNegative,
    #[display("FN")]
    FalseNegative,
}

/// Labels each prediction as `TP`, `FP`, `TN` or `FN` relative to the
/// `positive` label.
///
/// ```
/// use driftwatch_extract::{
///     extractor::EvalExtractor as _,
///     record::{Record, Scalar},
///     scoring::ClassificationErrorType,
/// };
///
/// let extractor = ClassificationErrorType::new("spam");
/// let spam = Record::values(["spam"]);
/// let ham = Record::values(["ham"]);
/// assert_eq!(extractor.extract(&spam, &ham), Scalar::from("FP"));
/// assert_eq!(extractor.extract(&ham, &ham), Scalar::from("TN"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationErrorType {
    pub positive: Scalar,
}

impl Default for ClassificationErrorType {
    fn default() -> Self {
        Self::new(1_i64)
    }
}

impl ClassificationErrorType {
    pub const KIND: &'static str = "classification_error_type";

    pub fn new(positive: impl Into<Scalar>) -> Self {
        Self {
            positive: positive.into(),
        }
    }

    #[must_use]
    pub fn classify(&self, output: &Scalar, actual: &Scalar) -> ErrorType {
        let predicted = output.same_label(&self.positive);
        let expected = actual.same_label(&self.positive);
        match (expected, predicted) {
            (true, true) => ErrorType::TruePositive,
            (true, false) => ErrorType::FalseNegative,
            (false, true) => ErrorType::FalsePositive,
            (false, false) => ErrorType::TrueNegative,
        }
    }
}

impl EvalExtractor for ClassificationErrorType {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn clone_boxed(&self) -> BoxedEvalExtractor {
        Box::new(self.clone())
    }

    fn extract(&self, output: &Record, actual: &Record) -> Scalar {
        match (output.first(), actual.first()) {
            (Some(output), Some(actual)) if !output.is_missing() && !actual.is_missing() => {
                Scalar::Cat(self.classify(output, actual).to_string())
            }
            _ => Scalar::Null,
        }
    }

    fn state(&self) -> serde_json::Value {
        serde_json::json!({ "positive": self.positive })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(value: f64) -> Record {
        Record::values([value])
    }

    #[test]
    fn test_regression_errors() {
        assert_eq!(RegressionError.extract(&one(1.0), &one(3.0)), Scalar::Float(-2.0));
        assert_eq!(
            AbsoluteRegressionError.extract(&one(1.0), &one(3.0)),
            Scalar::Float(2.0)
        );
        assert_eq!(
            SquaredRegressionError.extract(&one(1.0), &one(3.0)),
            Scalar::Float(4.0)
        );
    }

    #[test]
    fn test_regression_on_non_numeric_is_null() {
        let cat = Record::values(["x"]);
        assert_eq!(RegressionError.extract(&cat, &one(1.0)), Scalar::Null);
        assert_eq!(RegressionError.extract(&Record::values(Vec::<f64>::new()), &one(1.0)), Scalar::Null);
    }

    #[test]
    fn test_keyed_rows_use_first_field() {
        let output = Record::fields([("pred", 5_i64)]);
        let actual = Record::fields([("label", 2_i64)]);
        assert_eq!(RegressionError.extract(&output, &actual), Scalar::Float(3.0));
    }

    #[test]
    fn test_classification_error_types() {
        let extractor = ClassificationErrorType::default();
        let labels = |output: i64, actual: i64| {
            extractor.extract(&Record::values([output]), &Record::values([actual]))
        };
        assert_eq!(labels(1, 1), Scalar::from("TP"));
        assert_eq!(labels(1, 0), Scalar::from("FP"));
        assert_eq!(labels(0, 0), Scalar::from("TN"));
        assert_eq!(labels(0, 1), Scalar::from("FN"));
    }

    #[test]
    fn test_classification_positive_matches_float_label() {
        let extractor = ClassificationErrorType::default();
        assert_eq!(
            extractor.extract(&one(1.0), &one(1.0)),
            Scalar::from("TP")
        );
    }

    #[test]
    fn test_classification_state_roundtrip() {
        let extractor = ClassificationErrorType::new("cat");
        let decoded: ClassificationErrorType = serde_json::from_value(extractor.state()).unwrap();
        assert_eq!(decoded, extractor);
    }
}
