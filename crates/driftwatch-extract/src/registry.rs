use std::collections::BTreeMap;

use serde::de::DeserializeOwned;

use crate::{
    SchemaError,
    element::ElementExtractor,
    extractor::{BoxedEvalExtractor, BoxedSimpleExtractor, EvalExtractor, SimpleExtractor},
    probability::{ClassificationEntropy, ClassificationMargin},
    scoring::{
        AbsoluteRegressionError, ClassificationErrorType, RegressionError, SquaredRegressionError,
    },
};

pub type SimpleDecoder = fn(serde_json::Value) -> Result<BoxedSimpleExtractor, SchemaError>;
pub type EvalDecoder = fn(serde_json::Value) -> Result<BoxedEvalExtractor, SchemaError>;

/// Explicit table from extractor kind to state decoder.
///
/// Persisted documents name extractors by their [`kind`](SimpleExtractor::kind);
/// decoding looks the kind up here and fails with
/// [`SchemaError::UnknownClass`] rather than guessing.
///
/// # Examples
///
/// ```
/// use driftwatch_extract::{
///     element::ElementExtractor,
///     extractor::SimpleExtractor as _,
///     registry::ExtractorRegistry,
/// };
///
/// let registry = ExtractorRegistry::with_builtins();
/// let extractor = ElementExtractor::new("age");
/// let decoded = registry.decode_simple("element", extractor.state()).unwrap();
/// assert_eq!(decoded.kind(), "element");
///
/// assert!(registry.decode_simple("kmeans_outlier", serde_json::json!({})).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtractorRegistry {
    simple: BTreeMap<String, SimpleDecoder>,
    eval: BTreeMap<String, EvalDecoder>,
}

impl ExtractorRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry knowing every extractor shipped with this crate.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_simple(ElementExtractor::KIND, decode_serde::<ElementExtractor>)
            .register_simple(ClassificationEntropy::KIND, decode_unit_simple::<ClassificationEntropy>)
            .register_simple(ClassificationMargin::KIND, decode_unit_simple::<ClassificationMargin>)
            .register_eval(RegressionError::KIND, decode_unit_eval::<RegressionError>)
            .register_eval(
                AbsoluteRegressionError::KIND,
                decode_unit_eval::<AbsoluteRegressionError>,
            )
            .register_eval(
                SquaredRegressionError::KIND,
                decode_unit_eval::<SquaredRegressionError>,
            )
            .register_eval(
                ClassificationErrorType::KIND,
                decode_serde_eval::<ClassificationErrorType>,
            );
        registry
    }

    /// Registers (or replaces) the decoder for a simple extractor kind.
    pub fn register_simple(&mut self, kind: impl Into<String>, decoder: SimpleDecoder) -> &mut Self {
        self.simple.insert(kind.into(), decoder);
        self
    }

    /// Registers (or replaces) the decoder for an eval extractor kind.
    pub fn register_eval(&mut self, kind: impl Into<String>, decoder: EvalDecoder) -> &mut Self {
        self.eval.insert(kind.into(), decoder);
        self
    }

    #[must_use]
    pub fn is_simple(&self, kind: &str) -> bool {
        self.simple.contains_key(kind)
    }

    #[must_use]
    pub fn is_eval(&self, kind: &str) -> bool {
        self.eval.contains_key(kind)
    }

    pub fn decode_simple(
        &self,
        kind: &str,
        state: serde_json::Value,
    ) -> Result<BoxedSimpleExtractor, SchemaError> {
        let decoder = self.simple.get(kind).ok_or_else(|| SchemaError::UnknownClass {
            what: "simple extractor",
            class: kind.to_owned(),
        })?;
        decoder(state)
    }

    pub fn decode_eval(
        &self,
        kind: &str,
        state: serde_json::Value,
    ) -> Result<BoxedEvalExtractor, SchemaError> {
        let decoder = self.eval.get(kind).ok_or_else(|| SchemaError::UnknownClass {
            what: "eval extractor",
            class: kind.to_owned(),
        })?;
        decoder(state)
    }
}

fn malformed(error: &serde_json::Error) -> SchemaError {
    SchemaError::MalformedState {
        what: "extractor",
        reason: error.to_string(),
    }
}

/// Decoder for simple extractors whose state is their serde form.
pub fn decode_serde<T>(state: serde_json::Value) -> Result<BoxedSimpleExtractor, SchemaError>
where
    T: SimpleExtractor + DeserializeOwned + 'static,
{
    let extractor = serde_json::from_value::<T>(state).map_err(|e| malformed(&e))?;
    Ok(Box::new(extractor))
}

/// Decoder for eval extractors whose state is their serde form.
pub fn decode_serde_eval<T>(state: serde_json::Value) -> Result<BoxedEvalExtractor, SchemaError>
where
    T: EvalExtractor + DeserializeOwned + 'static,
{
    let extractor = serde_json::from_value::<T>(state).map_err(|e| malformed(&e))?;
    Ok(Box::new(extractor))
}

fn check_stateless(state: &serde_json::Value) -> Result<(), SchemaError> {
    match state {
        serde_json::Value::Null => Ok(()),
        serde_json::Value::Object(map) if map.is_empty() => Ok(()),
        _ => Err(SchemaError::MalformedState {
            what: "extractor",
            reason: format!("expected empty state, got {state}"),
        }),
    }
}

fn decode_unit_simple<T>(state: serde_json::Value) -> Result<BoxedSimpleExtractor, SchemaError>
where
    T: SimpleExtractor + Default + 'static,
{
    check_stateless(&state)?;
    Ok(Box::new(T::default()))
}

fn decode_unit_eval<T>(state: serde_json::Value) -> Result<BoxedEvalExtractor, SchemaError>
where
    T: EvalExtractor + Default + 'static,
{
    check_stateless(&state)?;
    Ok(Box::new(T::default()))
}
