//! Contrast reports and their alert thresholds.

use std::collections::BTreeMap;

use driftwatch_stats::report::{DriftReport, InvalidsReport};
use serde::{Deserialize, Serialize};

use crate::document::ProfileDocument;

pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.05;
pub const DEFAULT_INVALIDS_THRESHOLD: f64 = 0.01;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.05;

/// Effective thresholds of one component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentThresholds {
    pub drift: f64,
    pub invalids: f64,
}

impl Default for ComponentThresholds {
    fn default() -> Self {
        Self {
            drift: DEFAULT_DRIFT_THRESHOLD,
            invalids: DEFAULT_INVALIDS_THRESHOLD,
        }
    }
}

/// Per-component override; unset fields fall back to the profile-wide default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentThresholdOverride {
    pub drift: Option<f64>,
    pub invalids: Option<f64>,
}

/// Alert thresholds for [`Profile::contrast`](crate::profile::Profile::contrast).
///
/// Every field is optional in JSON:
///
/// ```
/// use driftwatch_profile::contrast::ContrastThresholds;
///
/// let thresholds: ContrastThresholds = serde_json::from_str(
///     r#"{ "components": { "lot_area": { "drift": 0.2 } }, "scores": { "mae": 0.1 } }"#,
/// )
/// .unwrap();
/// assert_eq!(thresholds.component("lot_area").drift, 0.2);
/// assert_eq!(thresholds.component("lot_area").invalids, 0.01);
/// assert_eq!(thresholds.component("other").drift, 0.05);
/// assert_eq!(thresholds.score("mae"), 0.1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastThresholds {
    pub default_drift: f64,
    pub default_invalids: f64,
    pub default_score: f64,
    pub components: BTreeMap<String, ComponentThresholdOverride>,
    pub scores: BTreeMap<String, f64>,
}

impl Default for ContrastThresholds {
    fn default() -> Self {
        Self {
            default_drift: DEFAULT_DRIFT_THRESHOLD,
            default_invalids: DEFAULT_INVALIDS_THRESHOLD,
            default_score: DEFAULT_SCORE_THRESHOLD,
            components: BTreeMap::new(),
            scores: BTreeMap::new(),
        }
    }
}

impl ContrastThresholds {
    #[must_use]
    pub fn component(&self, name: &str) -> ComponentThresholds {
        let overrides = self.components.get(name).copied().unwrap_or_default();
        ComponentThresholds {
            drift: overrides.drift.unwrap_or(self.default_drift),
            invalids: overrides.invalids.unwrap_or(self.default_invalids),
        }
    }

    #[must_use]
    pub fn score(&self, name: &str) -> f64 {
        self.scores.get(name).copied().unwrap_or(self.default_score)
    }
}

/// Whether the valid values of the other side collapsed to a single value.
///
/// Alerts when that happens on the other side only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingletonReport {
    pub is_singleton: bool,
    pub alert: bool,
    pub valid: bool,
}

impl SingletonReport {
    #[must_use]
    pub fn new(reference_singleton: bool, other_singleton: bool) -> Self {
        Self {
            is_singleton: other_singleton,
            alert: other_singleton && !reference_singleton,
            valid: true,
        }
    }
}

/// Health of one component relative to the reference.
///
/// All parts are absent when the component could not be compared, e.g.
/// because one side is unbuilt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drift: Option<DriftReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalids: Option<InvalidsReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singleton: Option<SingletonReport>,
}

impl HealthReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drift.is_none() && self.invalids.is_none() && self.singleton.is_none()
    }
}

/// Change of one score relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// `|other - reference| / range`; `None` if either result is undefined.
    pub diff: Option<f64>,
    pub alert: bool,
    pub valid: bool,
}

impl ScoreReport {
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            diff: None,
            alert: false,
            valid: false,
        }
    }
}

/// Result of contrasting a reference profile with one alternative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastReport {
    pub reference: ProfileDocument,
    #[serde(rename = "alternativeA")]
    pub alternative_a: ProfileDocument,
    pub health_reports: BTreeMap<String, HealthReport>,
    pub score_reports: BTreeMap<String, ScoreReport>,
}

/// Reports of one component or score against both alternatives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternativeReports<T> {
    #[serde(rename = "alternativeA")]
    pub alternative_a: Option<T>,
    #[serde(rename = "alternativeB")]
    pub alternative_b: Option<T>,
}

/// Result of contrasting a reference profile with two alternatives.
///
/// A name missing from one alternative has `None` on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativesReport {
    pub reference: ProfileDocument,
    #[serde(rename = "alternativeA")]
    pub alternative_a: ProfileDocument,
    #[serde(rename = "alternativeB")]
    pub alternative_b: ProfileDocument,
    pub health_reports: BTreeMap<String, AlternativeReports<HealthReport>>,
    pub score_reports: BTreeMap<String, AlternativeReports<ScoreReport>>,
}

impl AlternativesReport {
    pub(crate) fn merge(a: ContrastReport, b: ContrastReport) -> Self {
        fn zip<T>(
            a: BTreeMap<String, T>,
            b: BTreeMap<String, T>,
        ) -> BTreeMap<String, AlternativeReports<T>> {
            let mut merged = BTreeMap::<String, AlternativeReports<T>>::new();
            for (name, report) in a {
                merged.entry(name).or_insert_with(AlternativeReports::empty).alternative_a = Some(report);
            }
            for (name, report) in b {
                merged.entry(name).or_insert_with(AlternativeReports::empty).alternative_b = Some(report);
            }
            merged
        }

        Self {
            reference: a.reference,
            alternative_a: a.alternative_a,
            alternative_b: b.alternative_a,
            health_reports: zip(a.health_reports, b.health_reports),
            score_reports: zip(a.score_reports, b.score_reports),
        }
    }
}

impl<T> AlternativeReports<T> {
    fn empty() -> Self {
        Self {
            alternative_a: None,
            alternative_b: None,
        }
    }
}
