use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single extracted value.
///
/// The JSON form is untagged: `null`, an integer, a float or a string.
/// `Float(NaN)` exists in memory but is written as `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(untagged)]
pub enum Scalar {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Cat(String),
}

impl Scalar {
    /// Numeric view of the value; `None` for nulls and categories.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Null | Self::Cat(_) => None,
        }
    }

    #[must_use]
    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::Cat(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Float(v) if v.is_nan())
    }

    /// Null or NaN.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.is_null() || self.is_nan()
    }

    /// Equality that treats `Int(1)` and `Float(1.0)` as the same label.
    #[must_use]
    pub fn same_label(&self, other: &Self) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Cat(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Cat(value)
    }
}

impl<T> From<Option<T>> for Scalar
where
    T: Into<Scalar>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One row of data handed to extractors.
///
/// A row is either keyed by field name (a table row) or positional (a vector,
/// e.g. a model's class probabilities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(untagged)]
pub enum Record {
    Fields(BTreeMap<String, Scalar>),
    Values(Vec<Scalar>),
}

impl Record {
    /// Builds a keyed row.
    ///
    /// ```
    /// use driftwatch_extract::record::{Record, Scalar};
    ///
    /// let record = Record::fields([("age", Scalar::Int(41)), ("city", "Ghent".into())]);
    /// assert_eq!(record.field("age"), Some(&Scalar::Int(41)));
    /// assert_eq!(record.field("zip"), None);
    /// ```
    pub fn fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Scalar>,
    {
        Self::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a positional row.
    pub fn values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self::Values(values.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Scalar> {
        match self {
            Self::Fields(fields) => fields.get(key),
            Self::Values(_) => None,
        }
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Option<&Scalar> {
        match self {
            Self::Values(values) => values.get(index),
            Self::Fields(_) => None,
        }
    }

    /// First value of the row: element 0 of a positional row, or the value of
    /// the smallest key of a keyed row.
    #[must_use]
    pub fn first(&self) -> Option<&Scalar> {
        match self {
            Self::Values(values) => values.first(),
            Self::Fields(fields) => fields.values().next(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &Scalar> + '_> {
        match self {
            Self::Values(values) => Box::new(values.iter()),
            Self::Fields(fields) => Box::new(fields.values()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Values(values) => values.len(),
            Self::Fields(fields) => fields.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Scalar> for Record {
    fn from(value: Scalar) -> Self {
        Self::Values(vec![value])
    }
}
