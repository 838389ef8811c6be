//! Extractor contracts.
//!
//! An extractor turns a record into one [`Scalar`] per record. Simple
//! extractors read a single record; eval extractors compare a model output
//! record with the matching ground-truth record.
//!
//! Both traits are object safe and are stored as boxed trait objects
//! ([`BoxedSimpleExtractor`], [`BoxedEvalExtractor`]). Persistence goes through
//! [`kind`](SimpleExtractor::kind) and [`state`](SimpleExtractor::state); the
//! [`ExtractorRegistry`](crate::registry::ExtractorRegistry) maps a kind back to
//! a decoder.

use std::fmt;

use driftwatch_stats::DataError;

use crate::record::{Record, Scalar};

pub trait SimpleExtractor: fmt::Debug + Send + Sync {
    /// Registry tag identifying the extractor type in persisted documents.
    #[must_use]
    fn kind(&self) -> &str;

    #[must_use]
    fn clone_boxed(&self) -> BoxedSimpleExtractor;

    /// Fits any learned reference from the data.
    fn build(&mut self, data: &[Record]) -> Result<(), DataError> {
        let _ = data;
        Ok(())
    }

    #[must_use]
    fn is_built(&self) -> bool {
        true
    }

    #[must_use]
    fn extract(&self, record: &Record) -> Scalar;

    #[must_use]
    fn extract_multiple(&self, data: &[Record]) -> Vec<Scalar> {
        data.iter().map(|record| self.extract(record)).collect()
    }

    /// Serializable state, decoded again by the registered decoder for
    /// [`kind`](Self::kind).
    #[must_use]
    fn state(&self) -> serde_json::Value;
}

pub type BoxedSimpleExtractor = Box<dyn SimpleExtractor>;

impl Clone for BoxedSimpleExtractor {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl SimpleExtractor for BoxedSimpleExtractor {
    fn kind(&self) -> &str {
        self.as_ref().kind()
    }

    fn clone_boxed(&self) -> BoxedSimpleExtractor {
        self.as_ref().clone_boxed()
    }

    fn build(&mut self, data: &[Record]) -> Result<(), DataError> {
        self.as_mut().build(data)
    }

    fn is_built(&self) -> bool {
        self.as_ref().is_built()
    }

    fn extract(&self, record: &Record) -> Scalar {
        self.as_ref().extract(record)
    }

    fn extract_multiple(&self, data: &[Record]) -> Vec<Scalar> {
        self.as_ref().extract_multiple(data)
    }

    fn state(&self) -> serde_json::Value {
        self.as_ref().state()
    }
}

pub trait EvalExtractor: fmt::Debug + Send + Sync {
    #[must_use]
    fn kind(&self) -> &str;

    #[must_use]
    fn clone_boxed(&self) -> BoxedEvalExtractor;

    fn build(&mut self, output: &[Record], actual: &[Record]) -> Result<(), DataError> {
        let _ = (output, actual);
        Ok(())
    }

    #[must_use]
    fn is_built(&self) -> bool {
        true
    }

    #[must_use]
    fn extract(&self, output: &Record, actual: &Record) -> Scalar;

    /// Extracts one value per `(output, actual)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::LengthMismatch`] if the two sides differ in length.
    fn extract_multiple(&self, output: &[Record], actual: &[Record]) -> Result<Vec<Scalar>, DataError> {
        check_pairing(output, actual)?;
        Ok(output
            .iter()
            .zip(actual)
            .map(|(output, actual)| self.extract(output, actual))
            .collect())
    }

    #[must_use]
    fn state(&self) -> serde_json::Value;
}

pub type BoxedEvalExtractor = Box<dyn EvalExtractor>;

impl Clone for BoxedEvalExtractor {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

impl EvalExtractor for BoxedEvalExtractor {
    fn kind(&self) -> &str {
        self.as_ref().kind()
    }

    fn clone_boxed(&self) -> BoxedEvalExtractor {
        self.as_ref().clone_boxed()
    }

    fn build(&mut self, output: &[Record], actual: &[Record]) -> Result<(), DataError> {
        self.as_mut().build(output, actual)
    }

    fn is_built(&self) -> bool {
        self.as_ref().is_built()
    }

    fn extract(&self, output: &Record, actual: &Record) -> Scalar {
        self.as_ref().extract(output, actual)
    }

    fn extract_multiple(&self, output: &[Record], actual: &[Record]) -> Result<Vec<Scalar>, DataError> {
        self.as_ref().extract_multiple(output, actual)
    }

    fn state(&self) -> serde_json::Value {
        self.as_ref().state()
    }
}

/// Fails with [`DataError::LengthMismatch`] unless both sides have the same length.
pub fn check_pairing(output: &[Record], actual: &[Record]) -> Result<(), DataError> {
    if output.len() == actual.len() {
        Ok(())
    } else {
        Err(DataError::LengthMismatch {
            output: output.len(),
            actual: actual.len(),
        })
    }
}

/// Either kind of extractor, as held by a component.
#[derive(Debug, Clone, derive_more::From, derive_more::IsVariant)]
pub enum Extractor {
    Simple(BoxedSimpleExtractor),
    Eval(BoxedEvalExtractor),
}

impl Extractor {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Simple(extractor) => extractor.kind(),
            Self::Eval(extractor) => extractor.kind(),
        }
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        match self {
            Self::Simple(extractor) => extractor.is_built(),
            Self::Eval(extractor) => extractor.is_built(),
        }
    }

    #[must_use]
    pub fn state(&self) -> serde_json::Value {
        match self {
            Self::Simple(extractor) => extractor.state(),
            Self::Eval(extractor) => extractor.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Constant;

    impl EvalExtractor for Constant {
        fn kind(&self) -> &'static str {
            "constant"
        }
        fn clone_boxed(&self) -> BoxedEvalExtractor {
            Box::new(self.clone())
        }
        fn extract(&self, _output: &Record, _actual: &Record) -> Scalar {
            Scalar::Int(0)
        }
        fn state(&self) -> serde_json::Value {
            serde_json::json!({})
        }
    }

    #[test]
    fn test_eval_extract_multiple_rejects_mismatch() {
        let extractor: BoxedEvalExtractor = Box::new(Constant);
        let output = vec![Record::values([1.0]); 3];
        let actual = vec![Record::values([1.0]); 2];
        assert_eq!(
            extractor.extract_multiple(&output, &actual),
            Err(DataError::LengthMismatch { output: 3, actual: 2 })
        );
        assert_eq!(
            extractor.extract_multiple(&output, &output).unwrap(),
            vec![Scalar::Int(0); 3]
        );
    }

    #[test]
    fn test_boxed_clone_keeps_kind() {
        let extractor = Extractor::from(Box::new(Constant) as BoxedEvalExtractor);
        let cloned = extractor.clone();
        assert!(cloned.is_eval());
        assert_eq!(cloned.kind(), "constant");
    }
}
