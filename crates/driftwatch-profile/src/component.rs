//! Components: one feature of the profiled data.
//!
//! A [`Component`] pairs an extractor with the distribution summary of the
//! values it extracts. Its [`Role`] says which data it reads; its [`DataType`]
//! decides between a numeric and a categorical summary.

use std::collections::BTreeSet;

use driftwatch_extract::{
    element::ElementExtractor,
    extractor::{BoxedSimpleExtractor, EvalExtractor as _, Extractor, SimpleExtractor as _},
    record::{Record, Scalar},
};
use driftwatch_stats::{
    DataError, InvariantError,
    categoric::CategoricStats,
    numeric::{NumericDomain, NumericStats},
    report::{DriftReport, InvalidsReport},
};
use serde::{Deserialize, Serialize};

use crate::{
    ComponentStateError, DefinitionError, ProfileError,
    contrast::{ComponentThresholds, HealthReport, SingletonReport},
    name::normalize_name,
    tag::{Tag, TagType, TagValue},
};

/// Which data a component reads.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[display("input")]
    Input,
    #[display("output")]
    Output,
    #[display("actual")]
    Actual,
    /// Reads an `(output, actual)` pair.
    #[display("eval")]
    Eval,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Input, Self::Output, Self::Actual, Self::Eval];

    /// Class tag of components of this role in persisted documents.
    #[must_use]
    pub fn class_tag(self) -> &'static str {
        match self {
            Self::Input => "input_component",
            Self::Output => "output_component",
            Self::Actual => "actual_component",
            Self::Eval => "eval_component",
        }
    }

    #[must_use]
    pub fn from_class_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.class_tag() == tag)
    }

    /// Rank used when reporting issues; evaluation data comes first.
    #[must_use]
    pub fn priority(self) -> usize {
        match self {
            Self::Eval => 0,
            Self::Actual => 1,
            Self::Output => 2,
            Self::Input => 3,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum DataType {
    #[serde(rename = "FLOAT")]
    #[display("FLOAT")]
    Float,
    #[serde(rename = "INT")]
    #[display("INT")]
    Int,
    #[serde(rename = "CAT")]
    #[display("CAT")]
    Cat,
}

impl DataType {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Float | Self::Int)
    }
}

/// Allowed values of a component, fixed before building.
///
/// In JSON a numeric domain is an object (`{"lower": 0, "upper": 10}`) and a
/// categorical domain a list of categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum Domain {
    Numeric(NumericDomain),
    Categoric(BTreeSet<String>),
}

/// Distribution summary held by a built component.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From, derive_more::IsVariant,
)]
#[serde(untagged)]
pub enum Stats {
    Numeric(NumericStats),
    Categoric(CategoricStats),
}

impl Stats {
    #[must_use]
    pub fn is_built(&self) -> bool {
        match self {
            Self::Numeric(stats) => stats.is_built(),
            Self::Categoric(stats) => stats.is_built(),
        }
    }

    #[must_use]
    pub fn sample_size(&self) -> usize {
        match self {
            Self::Numeric(stats) => stats.sample_size,
            Self::Categoric(stats) => stats.sample_size,
        }
    }

    #[must_use]
    pub fn invalid_fraction(&self) -> f64 {
        match self {
            Self::Numeric(stats) => stats.invalid_fraction,
            Self::Categoric(stats) => stats.invalid_fraction,
        }
    }

    /// Whether every valid value is the same.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        match self {
            Self::Numeric(stats) => {
                stats.percentile_ladder.last() - stats.percentile_ladder.first() == 0.0
            }
            Self::Categoric(stats) => stats.frequency_table.len() == 1,
        }
    }

    pub fn validate(&self) -> Result<(), InvariantError> {
        match self {
            Self::Numeric(stats) => stats.validate(),
            Self::Categoric(stats) => stats.validate(),
        }
    }

    /// Scale used to normalize score differences: `max - min` for numeric
    /// summaries, 1 for categorical ones.
    #[must_use]
    pub fn value_range(&self) -> f64 {
        match self {
            Self::Numeric(stats) => stats.range(),
            Self::Categoric(_) => 1.0,
        }
    }

    fn reports(
        &self,
        other: &Self,
        thresholds: ComponentThresholds,
    ) -> Option<(DriftReport, InvalidsReport)> {
        match (self, other) {
            (Self::Numeric(this), Self::Numeric(other)) => Some((
                this.report_drift(other, thresholds.drift),
                this.report_invalid_diff(other, thresholds.invalids),
            )),
            (Self::Categoric(this), Self::Categoric(other)) => Some((
                this.report_drift(other, thresholds.drift),
                this.report_invalid_diff(other, thresholds.invalids),
            )),
            _ => None,
        }
    }
}

/// Data for a single validation call.
#[derive(Debug, Clone, Copy)]
pub enum Observation<'a> {
    Single(&'a Record),
    Pair {
        output: &'a Record,
        actual: &'a Record,
    },
}

/// Data for a build call.
#[derive(Debug, Clone, Copy)]
pub enum Batch<'a> {
    Single(&'a [Record]),
    Pair {
        output: &'a [Record],
        actual: &'a [Record],
    },
}

/// Category label of a scalar. Numbers are used through their decimal form so
/// integer-coded categories work; nulls and NaN have none.
fn category_of(value: &Scalar) -> Option<String> {
    match value {
        Scalar::Cat(v) => Some(v.clone()),
        Scalar::Int(v) => Some(v.to_string()),
        Scalar::Float(v) if v.is_finite() => Some(v.to_string()),
        Scalar::Float(_) | Scalar::Null => None,
    }
}

#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    role: Role,
    dtype: DataType,
    extractor: Extractor,
    stats: Option<Stats>,
}

impl Component {
    /// Defines an unbuilt component.
    ///
    /// The name is normalized with [`normalize_name`]. Eval components need an
    /// eval extractor; every other role needs a simple one.
    pub fn new(
        name: &str,
        role: Role,
        dtype: DataType,
        extractor: impl Into<Extractor>,
    ) -> Result<Self, DefinitionError> {
        let name = normalize_name(name)?;
        let extractor = extractor.into();
        let expected = if role == Role::Eval { "an eval" } else { "a simple" };
        if extractor.is_eval() != (role == Role::Eval) {
            return Err(DefinitionError::ExtractorRole {
                component: name,
                role,
                expected,
            });
        }
        Ok(Self {
            name,
            role,
            dtype,
            extractor,
            stats: None,
        })
    }

    /// One component per `(field, dtype)`, each reading its field with an
    /// [`ElementExtractor`].
    pub fn from_fields<I, K>(role: Role, fields: I) -> Result<Vec<Self>, DefinitionError>
    where
        I: IntoIterator<Item = (K, DataType)>,
        K: AsRef<str>,
    {
        fields
            .into_iter()
            .map(|(field, dtype)| {
                let field = field.as_ref();
                let extractor: BoxedSimpleExtractor = Box::new(ElementExtractor::new(field));
                Self::new(field, role, dtype, extractor)
            })
            .collect()
    }

    /// Reassembles a component from persisted parts.
    pub(crate) fn restore(
        name: &str,
        role: Role,
        dtype: DataType,
        extractor: Extractor,
        stats: Option<Stats>,
    ) -> Result<Self, DefinitionError> {
        let mut component = Self::new(name, role, dtype, extractor)?;
        component.stats = stats;
        Ok(component)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    #[must_use]
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    #[must_use]
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.extractor.is_built() && self.stats.as_ref().is_some_and(Stats::is_built)
    }

    /// The summary, provided both it and the extractor are built.
    fn built_stats(&self) -> Option<&Stats> {
        self.stats.as_ref().filter(|_| self.is_built())
    }

    /// Range used to normalize score differences; `None` while unbuilt.
    #[must_use]
    pub fn value_range(&self) -> Option<f64> {
        self.stats.as_ref().map(Stats::value_range)
    }

    fn missing_source(&self) -> DataError {
        DataError::MissingSource {
            role: self.role.to_string(),
        }
    }

    fn extract(&self, observation: Observation<'_>) -> Result<Scalar, DataError> {
        match (&self.extractor, observation) {
            (Extractor::Simple(extractor), Observation::Single(record)) => {
                Ok(extractor.extract(record))
            }
            (Extractor::Eval(extractor), Observation::Pair { output, actual }) => {
                Ok(extractor.extract(output, actual))
            }
            _ => Err(self.missing_source()),
        }
    }

    /// Validates one observation.
    ///
    /// Returns at most one feature tag, carrying the extracted value, and at
    /// most one error tag named `{name}-error`. A value that fails validation
    /// never produces a feature tag.
    pub fn validate(&self, observation: Observation<'_>) -> Result<Vec<Tag>, ProfileError> {
        let stats = self.built_stats().ok_or_else(|| ComponentStateError::Unbuilt {
            component: self.name.clone(),
        })?;
        let value = self.extract(observation)?;
        let tag = match self.check_value(stats, &value) {
            Ok(feature) => Tag::new(&self.name, feature, TagType::feature(self.role)),
            Err(reason) => Tag::new(
                format!("{}-error", self.name),
                reason,
                TagType::error(self.role),
            ),
        };
        Ok(vec![tag])
    }

    #[expect(clippy::cast_possible_truncation)]
    fn check_value(&self, stats: &Stats, value: &Scalar) -> Result<TagValue, &'static str> {
        match value {
            Scalar::Null => return Err("Value None"),
            Scalar::Float(v) if v.is_nan() => return Err("Value NaN"),
            _ => {}
        }
        match stats {
            Stats::Numeric(stats) => {
                let Some(v) = value.as_f64() else {
                    return Err("Type Error");
                };
                if v > stats.max {
                    return Err("UpperBoundError");
                }
                if v < stats.min {
                    return Err("LowerBoundError");
                }
                Ok(match (self.dtype, value) {
                    (DataType::Int, Scalar::Int(i)) => (*i).into(),
                    (DataType::Int, _) if v.fract() != 0.0 => return Err("Type Error"),
                    (DataType::Int, _) => (v as i64).into(),
                    _ => v.into(),
                })
            }
            Stats::Categoric(stats) => {
                let category = category_of(value).ok_or("Value None")?;
                if stats.contains(&category) {
                    Ok(category.into())
                } else {
                    Err("Domain Error")
                }
            }
        }
    }

    /// Fits the extractor (when `build_extractor` is set), extracts every
    /// record and builds the summary.
    ///
    /// Returns the extracted values in record order, invalid ones included.
    pub fn build(
        &mut self,
        data: Batch<'_>,
        domain: Option<&Domain>,
        build_extractor: bool,
    ) -> Result<Vec<Scalar>, ProfileError> {
        let values = match (&mut self.extractor, data) {
            (Extractor::Simple(extractor), Batch::Single(records)) => {
                if build_extractor {
                    extractor.build(records)?;
                }
                extractor.extract_multiple(records)
            }
            (Extractor::Eval(extractor), Batch::Pair { output, actual }) => {
                if build_extractor {
                    extractor.build(output, actual)?;
                }
                extractor.extract_multiple(output, actual)?
            }
            _ => {
                return Err(DataError::MissingSource {
                    role: self.role.to_string(),
                }
                .into());
            }
        };

        let stats = if self.dtype.is_numeric() {
            let domain = match domain {
                None => None,
                Some(Domain::Numeric(domain)) => Some(*domain),
                Some(Domain::Categoric(_)) => {
                    return Err(DataError::InvalidDomain {
                        reason: format!("component '{}' is numeric but got a category set", self.name),
                    }
                    .into());
                }
            };
            let sample = values
                .iter()
                .map(|v| v.as_f64().unwrap_or(f64::NAN))
                .collect::<Vec<_>>();
            Stats::Numeric(NumericStats::build(&sample, domain)?)
        } else {
            let domain = match domain {
                None => None,
                Some(Domain::Categoric(domain)) => Some(domain),
                Some(Domain::Numeric(_)) => {
                    return Err(DataError::InvalidDomain {
                        reason: format!("component '{}' is categorical but got a numeric range", self.name),
                    }
                    .into());
                }
            };
            Stats::Categoric(CategoricStats::build(values.iter().map(category_of), domain)?)
        };

        tracing::debug!(
            component = %self.name,
            role = %self.role,
            sample_size = stats.sample_size(),
            invalid_fraction = stats.invalid_fraction(),
            "built component"
        );
        self.stats = Some(stats);
        Ok(values)
    }

    /// Compares this component's summary with `other`'s.
    pub fn contrast(
        &self,
        other: &Self,
        thresholds: ComponentThresholds,
    ) -> Result<HealthReport, ComponentStateError> {
        let unbuilt = || ComponentStateError::Unbuilt {
            component: self.name.clone(),
        };
        let this = self.built_stats().ok_or_else(unbuilt)?;
        let that = other.built_stats().ok_or_else(unbuilt)?;
        let (drift, invalids) =
            this.reports(that, thresholds)
                .ok_or_else(|| ComponentStateError::Incompatible {
                    component: self.name.clone(),
                })?;
        Ok(HealthReport {
            drift: Some(drift),
            invalids: Some(invalids),
            singleton: Some(SingletonReport::new(this.is_singleton(), that.is_singleton())),
        })
    }
}
