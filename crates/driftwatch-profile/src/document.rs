//! The persisted form of a profile.
//!
//! A [`ProfileDocument`] is plain data: every polymorphic part (components,
//! summaries, extractors, scores) is stored as a `{"class", "state"}` pair. The
//! class names a known kind; [`Profile::from_document`] resolves it through
//! closed tables, and extractor classes through an [`ExtractorRegistry`].
//!
//! ```
//! use driftwatch_extract::{
//!     record::{Record, Scalar},
//!     registry::ExtractorRegistry,
//! };
//! use driftwatch_profile::{
//!     component::{Component, DataType, Role},
//!     profile::{BuildData, Domains, Profile},
//! };
//!
//! let components = Component::from_fields(Role::Input, [("age", DataType::Int)]).unwrap();
//! let mut profile = Profile::new("people", "2", components, vec![]).unwrap();
//! let rows = (18..60_i64).map(|age| Record::fields([("age", Scalar::Int(age))])).collect::<Vec<_>>();
//! profile.build(BuildData::new().input(&rows), &Domains::default(), true).unwrap();
//!
//! let json = profile.to_json().unwrap();
//! let restored = Profile::from_json(&json, &ExtractorRegistry::with_builtins()).unwrap();
//! assert!(restored.is_built());
//! assert_eq!(restored.to_document().unwrap(), profile.to_document().unwrap());
//! ```

use std::{fmt, io, marker::PhantomData};

use driftwatch_extract::{SchemaError, extractor::Extractor, registry::ExtractorRegistry};
use driftwatch_stats::{categoric::CategoricStats, numeric::NumericStats};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap as _,
};

use crate::{
    ProfileError,
    component::{Component, DataType, Role, Stats},
    profile::Profile,
    score::{Preference, Score, ScoreKind},
};

pub const SCHEMA_VERSION: &str = "1";

const NUMERIC_STATS_CLASS: &str = "numeric_stats";
const CATEGORIC_STATS_CLASS: &str = "categoric_stats";

/// Entries keyed by name, kept in insertion order.
///
/// Encoded as a JSON object. Decoding keeps the document order and rejects
/// repeated keys.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedMap<T>(Vec<(String, T)>);

impl<T> NamedMap<T> {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an entry. Returns `false`, leaving the map unchanged, if `name`
    /// is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: T) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.0.push((name, value));
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, value)| value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(key, _)| key.as_str())
    }
}

impl<T> Default for NamedMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for NamedMap<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T: Serialize> Serialize for NamedMap<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct NamedMapVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for NamedMapVisitor<T> {
    type Value = NamedMap<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object of uniquely named entries")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = NamedMap::new();
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            if map.get(&key).is_some() {
                return Err(serde::de::Error::custom(format!("duplicate entry '{key}'")));
            }
            map.0.push((key, value));
        }
        Ok(map)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NamedMap<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(NamedMapVisitor(PhantomData))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassState<T> {
    pub class: String,
    pub state: T,
}

impl<T> ClassState<T> {
    fn new(class: impl Into<String>, state: T) -> Self {
        Self {
            class: class.into(),
            state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentState {
    pub name: String,
    pub dtype: DataType,
    /// `None` while the component is unbuilt.
    pub stats: Option<ClassState<serde_json::Value>>,
    pub extractor: ClassState<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub name: String,
    pub inputs: Vec<String>,
    pub preference: Preference,
    pub result: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub name: String,
    pub version: String,
    pub schema_version: String,
    pub components: NamedMap<ClassState<ComponentState>>,
    pub scores: NamedMap<ClassState<ScoreState>>,
}

fn malformed(what: &'static str, error: &serde_json::Error) -> SchemaError {
    SchemaError::MalformedState {
        what,
        reason: error.to_string(),
    }
}

fn encode_stats(
    component: &str,
    stats: &Stats,
) -> Result<ClassState<serde_json::Value>, ProfileError> {
    stats.validate().map_err(|e| SchemaError::MalformedState {
        what: "stats",
        reason: format!("component '{component}': {e}"),
    })?;
    Ok(match stats {
        Stats::Numeric(stats) => ClassState::new(NUMERIC_STATS_CLASS, serde_json::to_value(stats)?),
        Stats::Categoric(stats) => {
            ClassState::new(CATEGORIC_STATS_CLASS, serde_json::to_value(stats)?)
        }
    })
}

fn decode_stats(
    component: &str,
    dtype: DataType,
    stats: ClassState<serde_json::Value>,
) -> Result<Stats, SchemaError> {
    let decoded = match stats.class.as_str() {
        NUMERIC_STATS_CLASS => Stats::Numeric(
            serde_json::from_value::<NumericStats>(stats.state).map_err(|e| malformed("stats", &e))?,
        ),
        CATEGORIC_STATS_CLASS => Stats::Categoric(
            serde_json::from_value::<CategoricStats>(stats.state)
                .map_err(|e| malformed("stats", &e))?,
        ),
        _ => {
            return Err(SchemaError::UnknownClass {
                what: "stats",
                class: stats.class,
            });
        }
    };
    if decoded.is_numeric() != dtype.is_numeric() {
        return Err(SchemaError::Inconsistent {
            reason: format!("component '{component}' has dtype {dtype} but {} stats", stats.class),
        });
    }
    Ok(decoded)
}

fn decode_component(
    key: &str,
    entry: ClassState<ComponentState>,
    registry: &ExtractorRegistry,
) -> Result<Component, ProfileError> {
    let role = Role::from_class_tag(&entry.class).ok_or_else(|| SchemaError::UnknownClass {
        what: "component",
        class: entry.class.clone(),
    })?;
    let state = entry.state;
    if state.name != key {
        return Err(SchemaError::Inconsistent {
            reason: format!("component stored under '{key}' is named '{}'", state.name),
        }
        .into());
    }
    let ClassState { class, state: extractor_state } = state.extractor;
    let registered_for_other_role = if role == Role::Eval {
        !registry.is_eval(&class) && registry.is_simple(&class)
    } else {
        !registry.is_simple(&class) && registry.is_eval(&class)
    };
    if registered_for_other_role {
        return Err(SchemaError::Inconsistent {
            reason: format!("{role} component '{key}' uses extractor '{class}' of the other kind"),
        }
        .into());
    }
    let extractor = if role == Role::Eval {
        Extractor::Eval(registry.decode_eval(&class, extractor_state)?)
    } else {
        Extractor::Simple(registry.decode_simple(&class, extractor_state)?)
    };
    let stats = state
        .stats
        .map(|stats| decode_stats(&state.name, state.dtype, stats))
        .transpose()?;
    Ok(Component::restore(&state.name, role, state.dtype, extractor, stats)?)
}

fn decode_score(key: &str, entry: ClassState<ScoreState>) -> Result<Score, ProfileError> {
    let kind = ScoreKind::from_class_tag(&entry.class).ok_or_else(|| SchemaError::UnknownClass {
        what: "score",
        class: entry.class.clone(),
    })?;
    let state = entry.state;
    if state.name != key {
        return Err(SchemaError::Inconsistent {
            reason: format!("score stored under '{key}' is named '{}'", state.name),
        }
        .into());
    }
    Ok(Score::new(&state.name, kind, &state.inputs, state.preference)?.with_result(state.result))
}

impl Profile {
    /// Captures the full profile state, built summaries and extractor state
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MalformedState`] if a summary breaks its
    /// invariants and could not be restored again.
    pub fn to_document(&self) -> Result<ProfileDocument, ProfileError> {
        let mut components = NamedMap::new();
        for component in self.components() {
            let extractor = component.extractor();
            let state = ComponentState {
                name: component.name().to_owned(),
                dtype: component.dtype(),
                stats: component
                    .stats()
                    .map(|stats| encode_stats(component.name(), stats))
                    .transpose()?,
                extractor: ClassState::new(extractor.kind(), extractor.state()),
            };
            components.insert(
                component.name(),
                ClassState::new(component.role().class_tag(), state),
            );
        }

        let mut scores = NamedMap::new();
        for score in self.scores() {
            let state = ScoreState {
                name: score.name().to_owned(),
                inputs: score.inputs().to_vec(),
                preference: score.preference(),
                result: score.result(),
            };
            scores.insert(score.name(), ClassState::new(score.kind().class_tag(), state));
        }

        Ok(ProfileDocument {
            name: self.name().to_owned(),
            version: self.version().to_owned(),
            schema_version: SCHEMA_VERSION.to_owned(),
            components,
            scores,
        })
    }

    /// Restores a profile from its document.
    ///
    /// # Errors
    ///
    /// * [`SchemaError`] - unsupported schema version, unknown class,
    ///   malformed state or parts that contradict each other
    /// * [`DefinitionError`](crate::DefinitionError) - the restored definition
    ///   is invalid, e.g. a score reads a missing component
    pub fn from_document(
        document: ProfileDocument,
        registry: &ExtractorRegistry,
    ) -> Result<Self, ProfileError> {
        if document.schema_version != SCHEMA_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                version: document.schema_version,
            }
            .into());
        }
        let components = document
            .components
            .into_iter()
            .map(|(key, entry)| decode_component(&key, entry, registry))
            .collect::<Result<Vec<_>, _>>()?;
        let scores = document
            .scores
            .into_iter()
            .map(|(key, entry)| decode_score(&key, entry))
            .collect::<Result<Vec<_>, _>>()?;
        let profile = Self::new(document.name, document.version, components, scores)?;
        tracing::debug!(
            profile = %profile.group_idfr(),
            built = profile.is_built(),
            "restored profile"
        );
        Ok(profile)
    }

    pub fn to_json(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(&self.to_document()?)?)
    }

    pub fn from_json(json: &str, registry: &ExtractorRegistry) -> Result<Self, ProfileError> {
        let document = serde_json::from_str::<ProfileDocument>(json)?;
        Self::from_document(document, registry)
    }

    /// Writes the document as pretty-printed JSON, e.g. to a file.
    pub fn write_json<W: io::Write>(&self, writer: W) -> Result<(), ProfileError> {
        serde_json::to_writer_pretty(writer, &self.to_document()?)?;
        Ok(())
    }

    pub fn read_json<R: io::Read>(reader: R, registry: &ExtractorRegistry) -> Result<Self, ProfileError> {
        let document = serde_json::from_reader::<_, ProfileDocument>(reader)?;
        Self::from_document(document, registry)
    }
}

#[cfg(test)]
mod tests {
    use driftwatch_extract::{
        extractor::{BoxedEvalExtractor, BoxedSimpleExtractor, SimpleExtractor},
        record::{Record, Scalar},
        scoring::AbsoluteRegressionError,
    };
    use driftwatch_stats::DataError;

    use super::*;
    use crate::profile::{BuildData, Domains};

    fn profile() -> Profile {
        let mut components = Component::from_fields(
            Role::Input,
            [("height", DataType::Float), ("color", DataType::Cat)],
        )
        .unwrap();
        components.extend(Component::from_fields(Role::Output, [("pred", DataType::Float)]).unwrap());
        components.extend(Component::from_fields(Role::Actual, [("truth", DataType::Float)]).unwrap());
        let eval: BoxedEvalExtractor = Box::new(AbsoluteRegressionError);
        components.push(Component::new("err", Role::Eval, DataType::Float, eval).unwrap());
        let scores = vec![Score::mean("mae", "err", Preference::Low).unwrap()];
        Profile::new("model", "3.1", components, scores).unwrap()
    }

    fn built_profile() -> Profile {
        let input = (0..40)
            .map(|i| {
                let color = match i % 3 {
                    0 => "red",
                    1 => "green",
                    _ => "blue",
                };
                Record::fields([
                    ("height", Scalar::Float(150.0 + f64::from(i) * 0.7)),
                    ("color", Scalar::from(color)),
                ])
            })
            .collect::<Vec<_>>();
        let output = (0..40).map(|i| Record::values([f64::from(i) / 3.0])).collect::<Vec<_>>();
        let actual = (0..40).map(|i| Record::values([f64::from(i / 3)])).collect::<Vec<_>>();
        let mut profile = profile();
        profile
            .build(
                BuildData::new().input(&input).output(&output).actual(&actual),
                &Domains::default(),
                true,
            )
            .unwrap();
        profile
    }

    fn registry() -> ExtractorRegistry {
        ExtractorRegistry::with_builtins()
    }

    #[test]
    fn test_document_layout() {
        let json = serde_json::to_value(built_profile().to_document().unwrap()).unwrap();
        assert_eq!(json["schema_version"], "1");
        assert_eq!(json["components"]["height"]["class"], "input_component");
        assert_eq!(json["components"]["err"]["class"], "eval_component");
        let state = &json["components"]["color"]["state"];
        assert_eq!(state["dtype"], "CAT");
        assert_eq!(state["stats"]["class"], "categoric_stats");
        assert_eq!(state["extractor"]["class"], "element");
        assert_eq!(state["extractor"]["state"]["element"], "color");
        assert_eq!(json["scores"]["mae"]["class"], "mean_score");
        assert_eq!(json["scores"]["mae"]["state"]["preference"], "low");
        assert_eq!(json["components"]["height"]["state"]["stats"]["state"]["samplesize"], 40);
    }

    #[test]
    fn test_round_trip_built() {
        let profile = built_profile();
        let json = profile.to_json().unwrap();
        let restored = Profile::from_json(&json, &registry()).unwrap();
        assert!(restored.is_built());
        assert_eq!(restored.to_document().unwrap(), profile.to_document().unwrap());
        assert_eq!(
            restored.components().iter().map(Component::name).collect::<Vec<_>>(),
            ["height", "color", "pred", "truth", "err"]
        );

        let record = Record::fields([("height", Scalar::Float(160.0)), ("color", Scalar::from("red"))]);
        assert_eq!(
            restored.validate_input(&record).unwrap(),
            profile.validate_input(&record).unwrap()
        );
    }

    #[test]
    fn test_reader_writer() {
        let profile = built_profile();
        let mut buffer = Vec::new();
        profile.write_json(&mut buffer).unwrap();
        let restored = Profile::read_json(buffer.as_slice(), &registry()).unwrap();
        assert_eq!(restored.to_document().unwrap(), profile.to_document().unwrap());
    }

    #[test]
    fn test_round_trip_unbuilt() {
        let profile = profile();
        let document = profile.to_document().unwrap();
        let json = serde_json::to_value(&document).unwrap();
        assert!(json["components"]["height"]["state"]["stats"].is_null());
        assert!(json["scores"]["mae"]["state"]["result"].is_null());

        let restored = Profile::from_document(document.clone(), &registry()).unwrap();
        assert!(!restored.is_built());
        assert_eq!(restored.to_document().unwrap(), document);
    }

    #[test]
    fn test_unknown_component_class() {
        let mut json = serde_json::to_value(built_profile().to_document().unwrap()).unwrap();
        json["components"]["pred"]["class"] = "forecast_component".into();
        let err = Profile::from_json(&json.to_string(), &registry()).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Schema(SchemaError::UnknownClass { what: "component", .. })
        ));
    }

    #[test]
    fn test_unknown_extractor_class() {
        let mut json = serde_json::to_value(built_profile().to_document().unwrap()).unwrap();
        json["components"]["height"]["state"]["extractor"]["class"] = "isolation_forest".into();
        let err = Profile::from_json(&json.to_string(), &registry()).unwrap_err();
        assert!(matches!(err, ProfileError::Schema(SchemaError::UnknownClass { .. })));
        assert!(Profile::from_json(&json.to_string(), &ExtractorRegistry::new()).is_err());
    }

    #[test]
    fn test_extractor_of_wrong_kind() {
        let mut json = serde_json::to_value(built_profile().to_document().unwrap()).unwrap();
        let eval_class = json["components"]["err"]["state"]["extractor"]["class"].clone();
        json["components"]["height"]["state"]["extractor"]["class"] = eval_class;
        let err = Profile::from_json(&json.to_string(), &registry()).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Schema(SchemaError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_broken_stats_are_not_saved() {
        let profile = built_profile();
        let height = profile.component("height").unwrap();
        let Some(Stats::Numeric(stats)) = height.stats() else {
            panic!("expected numeric stats");
        };
        let broken = NumericStats {
            invalid_fraction: 1.5,
            ..stats.clone()
        };
        let component = Component::restore(
            "height",
            Role::Input,
            DataType::Float,
            height.extractor().clone(),
            Some(Stats::Numeric(broken)),
        )
        .unwrap();
        let profile = Profile::new("p", "1", vec![component], vec![]).unwrap();
        assert!(matches!(
            profile.to_document(),
            Err(ProfileError::Schema(SchemaError::MalformedState { what: "stats", .. }))
        ));
        assert!(profile.to_json().is_err());
        assert!(profile.write_json(Vec::<u8>::new()).is_err());
    }

    #[test]
    fn test_unknown_score_class() {
        let mut json = serde_json::to_value(built_profile().to_document().unwrap()).unwrap();
        json["scores"]["mae"]["class"] = "median_score".into();
        let err = Profile::from_json(&json.to_string(), &registry()).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Schema(SchemaError::UnknownClass { what: "score", .. })
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut document = built_profile().to_document().unwrap();
        document.schema_version = "0".to_owned();
        let err = Profile::from_document(document, &registry()).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Schema(SchemaError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_stats_dtype_mismatch() {
        let mut json = serde_json::to_value(built_profile().to_document().unwrap()).unwrap();
        let categoric = json["components"]["color"]["state"]["stats"].clone();
        json["components"]["height"]["state"]["stats"] = categoric;
        let err = Profile::from_json(&json.to_string(), &registry()).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Schema(SchemaError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_corrupted_stats_rejected() {
        let mut json = serde_json::to_value(built_profile().to_document().unwrap()).unwrap();
        json["components"]["height"]["state"]["stats"]["state"]["percentiles"] =
            serde_json::json!([1.0, 2.0]);
        let err = Profile::from_json(&json.to_string(), &registry()).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Schema(SchemaError::MalformedState { what: "stats", .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{
            "name": "p", "version": "1", "schema_version": "1",
            "components": {},
            "scores": {
                "a": { "class": "mean_score", "state": { "name": "a", "inputs": ["x"], "preference": "low", "result": null } },
                "a": { "class": "mean_score", "state": { "name": "a", "inputs": ["x"], "preference": "low", "result": null } }
            }
        }"#;
        let err = serde_json::from_str::<ProfileDocument>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate entry 'a'"), "{err}");
        assert!(matches!(
            Profile::from_json(json, &registry()),
            Err(ProfileError::Json(_))
        ));
    }

    #[test]
    fn test_mismatched_entry_name() {
        let mut document = profile().to_document().unwrap();
        document.scores = NamedMap::new();
        let mut state = ScoreState {
            name: "b".to_owned(),
            inputs: vec!["err".to_owned()],
            preference: Preference::Low,
            result: None,
        };
        document
            .scores
            .insert("a", ClassState::new("mean_score", state.clone()));
        assert!(matches!(
            Profile::from_document(document.clone(), &registry()),
            Err(ProfileError::Schema(SchemaError::Inconsistent { .. }))
        ));

        state.name = "a".to_owned();
        state.inputs = vec!["nope".to_owned()];
        document.scores = NamedMap::new();
        document.scores.insert("a", ClassState::new("mean_score", state));
        assert!(matches!(
            Profile::from_document(document, &registry()),
            Err(ProfileError::Definition(_))
        ));
    }

    #[derive(Debug, Clone)]
    struct Scaled {
        field: String,
        factor: Option<f64>,
    }

    impl SimpleExtractor for Scaled {
        fn kind(&self) -> &str {
            "scaled"
        }

        fn clone_boxed(&self) -> BoxedSimpleExtractor {
            Box::new(self.clone())
        }

        fn build(&mut self, records: &[Record]) -> Result<(), DataError> {
            let max = records
                .iter()
                .filter_map(|r| r.field(&self.field).and_then(Scalar::as_f64))
                .fold(f64::NEG_INFINITY, f64::max);
            if !max.is_finite() {
                return Err(DataError::NoValidValues);
            }
            self.factor = Some(max);
            Ok(())
        }

        fn is_built(&self) -> bool {
            self.factor.is_some()
        }

        fn extract(&self, record: &Record) -> Scalar {
            match (record.field(&self.field).and_then(Scalar::as_f64), self.factor) {
                (Some(v), Some(factor)) => Scalar::Float(v / factor),
                _ => Scalar::Null,
            }
        }

        fn state(&self) -> serde_json::Value {
            serde_json::json!({ "field": self.field, "factor": self.factor })
        }
    }

    fn decode_scaled(state: serde_json::Value) -> Result<BoxedSimpleExtractor, SchemaError> {
        let field = state["field"].as_str().ok_or_else(|| SchemaError::MalformedState {
            what: "extractor",
            reason: "missing field".to_owned(),
        })?;
        Ok(Box::new(Scaled {
            field: field.to_owned(),
            factor: state["factor"].as_f64(),
        }))
    }

    #[test]
    fn test_user_extractor_state_survives() {
        let extractor: BoxedSimpleExtractor = Box::new(Scaled {
            field: "x".to_owned(),
            factor: None,
        });
        let component = Component::new("x_scaled", Role::Input, DataType::Float, extractor).unwrap();
        let mut profile = Profile::new("p", "1", vec![component], vec![]).unwrap();
        let rows = (1..=4).map(|i| Record::fields([("x", Scalar::Float(f64::from(i)))])).collect::<Vec<_>>();
        profile
            .build(BuildData::new().input(&rows), &Domains::default(), true)
            .unwrap();

        let json = profile.to_json().unwrap();
        assert!(Profile::from_json(&json, &registry()).is_err());

        let mut registry = registry();
        registry.register_simple("scaled", decode_scaled);
        let restored = Profile::from_json(&json, &registry).unwrap();
        assert!(restored.is_built());
        let tags = restored
            .validate_input(&Record::fields([("x", Scalar::Float(2.0))]))
            .unwrap();
        assert_eq!(tags.as_slice()[0].value, crate::tag::TagValue::Float(0.5));
    }
}
