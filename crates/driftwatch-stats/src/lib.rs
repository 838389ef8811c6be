//! Distribution summaries for monitoring machine learning data.
//!
//! This crate turns a sample of feature values into a compact summary that can
//! be persisted as JSON and later compared against a summary of fresh data:
//!
//! - **Numeric summaries**: descriptive statistics, a 101-point percentile
//!   ladder and a DKW confidence band around it
//! - **Categorical summaries**: a frequency table with binomial confidence
//!   intervals per category
//! - **Reports**: how much two summaries drift apart and how their fraction of
//!   invalid values changed
//!
//! # Modules
//!
//! - [`numeric`]: [`NumericStats`](numeric::NumericStats) and its domain
//! - [`categoric`]: [`CategoricStats`](categoric::CategoricStats)
//! - [`percentiles`]: the percentile ladder and its CDF lookup
//! - [`descriptive`]: min, max, mean and standard deviation
//! - [`report`]: drift and invalid-fraction reports
//!
//! # Examples
//!
//! ## Summarizing a numeric sample
//!
//! ```
//! use driftwatch_stats::numeric::NumericStats;
//!
//! let sample = (0..10).map(f64::from).collect::<Vec<_>>();
//! let stats = NumericStats::build(&sample, None).unwrap();
//! assert_eq!(stats.min, 0.0);
//! assert_eq!(stats.max, 9.0);
//! assert_eq!(stats.mean, 4.5);
//! assert_eq!(stats.invalid_fraction, 0.0);
//! ```
//!
//! ## Detecting drift
//!
//! ```
//! use driftwatch_stats::numeric::NumericStats;
//!
//! let reference = (0..100).map(f64::from).collect::<Vec<_>>();
//! let shifted = (1000..1100).map(f64::from).collect::<Vec<_>>();
//! let reference = NumericStats::build(&reference, None).unwrap();
//! let shifted = NumericStats::build(&shifted, None).unwrap();
//!
//! let report = reference.report_drift(&shifted, 0.05);
//! assert!(report.valid);
//! assert!(report.alert);
//! assert_eq!(report.drift, 1.0);
//! ```
//!
//! ## Summarizing categories
//!
//! ```
//! use driftwatch_stats::categoric::CategoricStats;
//!
//! let sample = [Some("red"), Some("blue"), None, Some("red")];
//! let stats = CategoricStats::build(sample, None).unwrap();
//! assert_eq!(stats.invalid_fraction, 0.25);
//! assert!(stats.contains("blue"));
//! ```

pub mod categoric;
pub mod descriptive;
pub mod numeric;
pub mod percentiles;
pub mod report;

/// Problems with the data handed to a build or extraction step.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum DataError {
    #[display("sample is empty")]
    EmptySample,
    #[display("sample contains no valid values")]
    NoValidValues,
    #[display("invalid domain: {reason}")]
    InvalidDomain { reason: String },
    #[display("length mismatch: {output} outputs but {actual} actuals")]
    LengthMismatch { output: usize, actual: usize },
    #[display("record has no {role} data")]
    MissingSource { role: String },
    #[display("score '{score}' requires component '{component}'")]
    MissingScoreInput { score: String, component: String },
}

/// A summary whose fields contradict each other, typically one loaded from
/// a damaged or hand-edited document.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum InvariantError {
    #[display("sample size must be positive")]
    EmptySample,
    #[display("field '{field}' is not finite")]
    NonFinite { field: &'static str },
    #[display("invalid fraction {value} is outside [0, 1]")]
    InvalidFraction { value: f64 },
    #[display("range is reversed: min {min} > max {max}")]
    Range { min: f64, max: f64 },
    #[display("confidence bands of {what} do not bracket the estimate")]
    Bands { what: &'static str },
    #[display("frequencies sum to {sum}, expected 1")]
    FrequencySum { sum: f64 },
    #[display("frequency of category '{category}' is outside [0, 1]")]
    Frequency { category: String },
}
