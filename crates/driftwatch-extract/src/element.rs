use serde::{Deserialize, Serialize};

use crate::{
    extractor::{BoxedSimpleExtractor, SimpleExtractor},
    record::{Record, Scalar},
};

/// Which element of a record to read: a field name or a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(untagged)]
pub enum Element {
    Index(usize),
    Key(String),
}

impl From<&str> for Element {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<usize> for Element {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Reads one element of a record as is.
///
/// A missing field, an out-of-range index or a key used on a positional record
/// all yield [`Scalar::Null`], which validation reports as a missing value.
///
/// # Examples
///
/// ```
/// use driftwatch_extract::{
///     element::ElementExtractor,
///     extractor::SimpleExtractor as _,
///     record::{Record, Scalar},
/// };
///
/// let extractor = ElementExtractor::new("temperature");
/// let record = Record::fields([("temperature", 21.5)]);
/// assert_eq!(extractor.extract(&record), Scalar::Float(21.5));
///
/// let by_index = ElementExtractor::new(1_usize);
/// assert_eq!(by_index.extract(&Record::values([0.1, 0.9])), Scalar::Float(0.9));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementExtractor {
    pub element: Element,
}

impl ElementExtractor {
    pub const KIND: &'static str = "element";

    pub fn new(element: impl Into<Element>) -> Self {
        Self {
            element: element.into(),
        }
    }
}

impl SimpleExtractor for ElementExtractor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn clone_boxed(&self) -> BoxedSimpleExtractor {
        Box::new(self.clone())
    }

    fn extract(&self, record: &Record) -> Scalar {
        let value = match &self.element {
            Element::Key(key) => record.field(key),
            Element::Index(index) => record.index(*index),
        };
        value.cloned().unwrap_or_default()
    }

    fn state(&self) -> serde_json::Value {
        serde_json::json!({ "element": self.element })
    }
}
