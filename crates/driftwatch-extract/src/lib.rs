//! Feature extraction for profiling.
//!
//! An extractor reduces one record (or one output/actual pair) to a single
//! [`Scalar`](record::Scalar), which a profile component then summarizes.
//!
//! # Modules
//!
//! - [`record`]: the record model, [`Record`](record::Record) and [`Scalar`](record::Scalar)
//! - [`extractor`]: the [`SimpleExtractor`](extractor::SimpleExtractor) and
//!   [`EvalExtractor`](extractor::EvalExtractor) contracts
//! - [`element`]: reading a single field or position
//! - [`scoring`]: regression errors and classification outcome labels
//! - [`probability`]: entropy and margin of a probability vector
//! - [`registry`]: decoding persisted extractors by kind
//!
//! # Examples
//!
//! ```
//! use driftwatch_extract::{
//!     element::ElementExtractor,
//!     extractor::{EvalExtractor as _, SimpleExtractor as _},
//!     record::{Record, Scalar},
//!     scoring::AbsoluteRegressionError,
//! };
//!
//! let rows = [
//!     Record::fields([("price", 10.0)]),
//!     Record::fields([("price", 12.5)]),
//! ];
//! let prices = ElementExtractor::new("price").extract_multiple(&rows);
//! assert_eq!(prices, [Scalar::Float(10.0), Scalar::Float(12.5)]);
//!
//! let outputs = [Record::values([3.0]), Record::values([5.0])];
//! let actuals = [Record::values([4.0]), Record::values([5.0])];
//! let errors = AbsoluteRegressionError.extract_multiple(&outputs, &actuals).unwrap();
//! assert_eq!(errors, [Scalar::Float(1.0), Scalar::Float(0.0)]);
//! ```

pub mod element;
pub mod extractor;
pub mod probability;
pub mod record;
pub mod registry;
pub mod scoring;

/// A persisted document that cannot be mapped back to known types.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum SchemaError {
    #[display("unknown {what} class '{class}'")]
    UnknownClass { what: &'static str, class: String },
    #[display("unsupported schema version '{version}'")]
    UnsupportedVersion { version: String },
    #[display("malformed {what} state: {reason}")]
    MalformedState { what: &'static str, reason: String },
    #[display("inconsistent document: {reason}")]
    Inconsistent { reason: String },
}
