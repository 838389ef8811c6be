//! Scores: aggregate metrics over the values of one or more components.

use std::collections::BTreeMap;

use driftwatch_extract::record::Scalar;
use driftwatch_stats::DataError;
use serde::{Deserialize, Serialize};

use crate::{
    DefinitionError,
    contrast::ScoreReport,
    name::{normalize_name, normalize_score_name},
};

/// How a score reduces its input values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ScoreKind {
    /// Mean of the numeric values.
    #[display("mean")]
    Mean,
    /// `TP / (TP + FP)` over classification error labels.
    #[display("precision")]
    Precision,
    /// `TP / (TP + FN)` over classification error labels.
    #[display("recall")]
    Recall,
    /// Harmonic mean of precision and recall.
    #[display("f1")]
    F1,
}

impl ScoreKind {
    pub const ALL: [Self; 4] = [Self::Mean, Self::Precision, Self::Recall, Self::F1];

    /// Class tag of scores of this kind in persisted documents.
    #[must_use]
    pub fn class_tag(self) -> &'static str {
        match self {
            Self::Mean => "mean_score",
            Self::Precision => "precision_score",
            Self::Recall => "recall_score",
            Self::F1 => "f1_score",
        }
    }

    #[must_use]
    pub fn from_class_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.class_tag() == tag)
    }

    /// Reduces `values`; `None` when the result is undefined.
    #[must_use]
    pub fn reduce(self, values: &[Scalar]) -> Option<f64> {
        match self {
            Self::Mean => mean(values),
            Self::Precision => Confusion::count(values).precision(),
            Self::Recall => Confusion::count(values).recall(),
            Self::F1 => Confusion::count(values).f1(),
        }
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean(values: &[Scalar]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter_map(Scalar::as_f64)
        .filter(|v| v.is_finite())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[derive(Debug, Default, Clone, Copy)]
struct Confusion {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl Confusion {
    fn count(values: &[Scalar]) -> Self {
        let mut counts = Self::default();
        for label in values.iter().filter_map(Scalar::as_category) {
            match label {
                "TP" => counts.tp += 1,
                "FP" => counts.fp += 1,
                "FN" => counts.fn_ += 1,
                _ => {}
            }
        }
        counts
    }

    #[expect(clippy::cast_precision_loss)]
    fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
        (denominator > 0).then(|| numerator as f64 / denominator as f64)
    }

    fn precision(self) -> Option<f64> {
        Self::ratio(self.tp, self.tp + self.fp)
    }

    fn recall(self) -> Option<f64> {
        Self::ratio(self.tp, self.tp + self.fn_)
    }

    fn f1(self) -> Option<f64> {
        let (p, r) = (self.precision()?, self.recall()?);
        if p + r == 0.0 {
            return Some(0.0);
        }
        Some(2.0 * p * r / (p + r))
    }
}

/// Which direction of change is an improvement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[display("high")]
    High,
    #[display("low")]
    Low,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    name: String,
    kind: ScoreKind,
    inputs: Vec<String>,
    preference: Preference,
    result: Option<f64>,
}

impl Score {
    /// Defines an unbuilt score reading the values of the `inputs` components.
    ///
    /// Only the first input is reduced; the rest document which components
    /// the score depends on.
    pub fn new<I, S>(
        name: &str,
        kind: ScoreKind,
        inputs: I,
        preference: Preference,
    ) -> Result<Self, DefinitionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = normalize_score_name(name)?;
        let inputs = inputs
            .into_iter()
            .map(|input| normalize_name(input.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if inputs.is_empty() {
            return Err(DefinitionError::NoScoreInputs { score: name });
        }
        Ok(Self {
            name,
            kind,
            inputs,
            preference,
            result: None,
        })
    }

    pub fn mean(name: &str, input: &str, preference: Preference) -> Result<Self, DefinitionError> {
        Self::new(name, ScoreKind::Mean, [input], preference)
    }

    pub fn precision(name: &str, input: &str) -> Result<Self, DefinitionError> {
        Self::new(name, ScoreKind::Precision, [input], Preference::High)
    }

    pub fn recall(name: &str, input: &str) -> Result<Self, DefinitionError> {
        Self::new(name, ScoreKind::Recall, [input], Preference::High)
    }

    pub fn f1(name: &str, input: &str) -> Result<Self, DefinitionError> {
        Self::new(name, ScoreKind::F1, [input], Preference::High)
    }

    pub(crate) fn with_result(mut self, result: Option<f64>) -> Self {
        self.result = result;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ScoreKind {
        self.kind
    }

    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    #[must_use]
    pub fn preference(&self) -> Preference {
        self.preference
    }

    #[must_use]
    pub fn result(&self) -> Option<f64> {
        self.result
    }

    /// The component whose value range normalizes differences of this score.
    #[must_use]
    pub fn primary_input(&self) -> &str {
        &self.inputs[0]
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.result.is_some()
    }

    /// Computes the result from per-component values.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingScoreInput`] if `values` has no entry for
    /// the primary input.
    pub fn build(&mut self, values: &BTreeMap<String, Vec<Scalar>>) -> Result<(), DataError> {
        let input = self.primary_input();
        let values = values.get(input).ok_or_else(|| DataError::MissingScoreInput {
            score: self.name.clone(),
            component: input.to_owned(),
        })?;
        self.result = self.kind.reduce(values);
        tracing::debug!(score = %self.name, kind = %self.kind, result = ?self.result, "built score");
        Ok(())
    }

    /// Compares this score's result with `other`'s.
    ///
    /// The difference is normalized by `range`; a range that is not a positive
    /// finite number counts as 1. An alert is raised when the change goes
    /// against the preference by more than `threshold`.
    #[must_use]
    pub fn contrast(&self, other: &Self, range: f64, threshold: f64) -> ScoreReport {
        let (Some(this), Some(that)) = (self.result, other.result) else {
            return ScoreReport::invalid();
        };
        let range = if range.is_finite() && range > 0.0 { range } else { 1.0 };
        let diff = (that - this).abs() / range;
        let regressed = match self.preference {
            Preference::High => that < this,
            Preference::Low => that > this,
        };
        ScoreReport {
            diff: Some(diff),
            alert: regressed && diff > threshold,
            valid: true,
        }
    }
}
