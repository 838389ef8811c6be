//! Profiles: named, versioned bundles of components and scores.

use std::collections::{BTreeMap, BTreeSet};

use driftwatch_extract::record::{Record, Scalar};
use driftwatch_stats::DataError;
use serde::{Deserialize, Serialize};

use crate::{
    DefinitionError, ProfileError, ProfileStateError,
    component::{Batch, Component, Domain, Observation, Role},
    contrast::{AlternativesReport, ContrastReport, ContrastThresholds, HealthReport},
    score::Score,
    tag::Tags,
};

pub const DEFAULT_NAME: &str = "default";
pub const DEFAULT_VERSION: &str = "0.0.0";

/// Reference data handed to [`Profile::build`], one optional batch per role.
///
/// Eval components read `output` and `actual` pairwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildData<'a> {
    pub input: Option<&'a [Record]>,
    pub output: Option<&'a [Record]>,
    pub actual: Option<&'a [Record]>,
}

impl<'a> BuildData<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn input(mut self, records: &'a [Record]) -> Self {
        self.input = Some(records);
        self
    }

    #[must_use]
    pub fn output(mut self, records: &'a [Record]) -> Self {
        self.output = Some(records);
        self
    }

    #[must_use]
    pub fn actual(mut self, records: &'a [Record]) -> Self {
        self.actual = Some(records);
        self
    }

    fn batch(&self, role: Role) -> Result<Batch<'a>, DataError> {
        let batch = match role {
            Role::Input => self.input.map(Batch::Single),
            Role::Output => self.output.map(Batch::Single),
            Role::Actual => self.actual.map(Batch::Single),
            Role::Eval => self
                .output
                .zip(self.actual)
                .map(|(output, actual)| Batch::Pair { output, actual }),
        };
        batch.ok_or_else(|| DataError::MissingSource {
            role: role.to_string(),
        })
    }
}

/// Allowed values per component name, applied while building.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domains(BTreeMap<String, Domain>);

impl Domains {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, component: impl Into<String>, domain: impl Into<Domain>) -> Self {
        self.0.insert(component.into(), domain.into());
        self
    }

    #[must_use]
    pub fn get(&self, component: &str) -> Option<&Domain> {
        self.0.get(component)
    }
}

impl From<BTreeMap<String, Domain>> for Domains {
    fn from(domains: BTreeMap<String, Domain>) -> Self {
        Self(domains)
    }
}

/// Expected behavior of one model version's data.
///
/// Components and scores keep their definition order, which is also the order
/// of validation tags and persisted entries. Names are unique per collection.
#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    version: String,
    components: Vec<Component>,
    scores: Vec<Score>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            components: Vec::new(),
            scores: Vec::new(),
        }
    }
}

fn check_unique<'a>(
    what: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<BTreeSet<&'a str>, DefinitionError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(DefinitionError::DuplicateName {
                what,
                name: name.to_owned(),
            });
        }
    }
    Ok(seen)
}

impl Profile {
    /// Defines an unbuilt profile.
    ///
    /// # Errors
    ///
    /// * [`DefinitionError::DuplicateName`] - two components or two scores
    ///   share a name
    /// * [`DefinitionError::UnknownScoreInput`] - a score reads a component
    ///   the profile does not have
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        components: Vec<Component>,
        scores: Vec<Score>,
    ) -> Result<Self, DefinitionError> {
        let component_names = check_unique("component", components.iter().map(Component::name))?;
        check_unique("score", scores.iter().map(Score::name))?;
        for score in &scores {
            if let Some(missing) = score
                .inputs()
                .iter()
                .find(|input| !component_names.contains(input.as_str()))
            {
                return Err(DefinitionError::UnknownScoreInput {
                    score: score.name().to_owned(),
                    component: missing.clone(),
                });
            }
        }
        Ok(Self {
            name: name.into(),
            version: version.into(),
            components,
            scores,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Group stamped on every tag this profile emits: `{name}@{version}`.
    #[must_use]
    pub fn group_idfr(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    #[must_use]
    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn score(&self, name: &str) -> Option<&Score> {
        self.scores.iter().find(|s| s.name() == name)
    }

    pub fn components_with_role(&self, role: Role) -> impl Iterator<Item = &Component> + '_ {
        self.components.iter().filter(move |c| c.role() == role)
    }

    /// True once every component is built. Scores with an undefined result
    /// do not count.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.components.iter().all(Component::is_built)
    }

    /// Builds every component on the data of its role, then every score on
    /// the component values.
    ///
    /// Missing values are left out of the values handed to scores. The
    /// profile is only updated when everything succeeds; rebuilding a built
    /// profile refits it.
    ///
    /// # Errors
    ///
    /// * [`DataError::MissingSource`] - `data` lacks the batch of a role that
    ///   has components
    /// * any [`DataError`] raised while building a component or score
    pub fn build(
        &mut self,
        data: BuildData<'_>,
        domains: &Domains,
        build_extractors: bool,
    ) -> Result<(), ProfileError> {
        let mut components = self.components.clone();
        let mut values = BTreeMap::<String, Vec<Scalar>>::new();
        for component in &mut components {
            let batch = data.batch(component.role())?;
            let domain = domains.get(component.name());
            let sample = component.build(batch, domain, build_extractors)?;
            let sample = sample.into_iter().filter(|v| !v.is_missing()).collect();
            values.insert(component.name().to_owned(), sample);
        }

        let mut scores = self.scores.clone();
        for score in &mut scores {
            score.build(&values)?;
        }

        self.components = components;
        self.scores = scores;
        tracing::debug!(
            profile = %self.group_idfr(),
            components = self.components.len(),
            scores = self.scores.len(),
            "built profile"
        );
        Ok(())
    }

    fn ensure_built(&self) -> Result<(), ProfileStateError> {
        if self.is_built() {
            Ok(())
        } else {
            Err(ProfileStateError {
                profile: self.group_idfr(),
            })
        }
    }

    fn validate_role(&self, role: Role, observation: Observation<'_>) -> Result<Tags, ProfileError> {
        self.ensure_built()?;
        let mut tags = Tags::new();
        for component in self.components_with_role(role) {
            tags.extend(component.validate(observation)?);
        }
        tags.set_group(&self.group_idfr());
        Ok(tags)
    }

    /// Validates one input record against the input components.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileStateError`] if the profile is not built.
    pub fn validate_input(&self, record: &Record) -> Result<Tags, ProfileError> {
        self.validate_role(Role::Input, Observation::Single(record))
    }

    pub fn validate_output(&self, record: &Record) -> Result<Tags, ProfileError> {
        self.validate_role(Role::Output, Observation::Single(record))
    }

    pub fn validate_actual(&self, record: &Record) -> Result<Tags, ProfileError> {
        self.validate_role(Role::Actual, Observation::Single(record))
    }

    /// Validates an `(output, actual)` pair against the eval components.
    pub fn validate_eval(&self, output: &Record, actual: &Record) -> Result<Tags, ProfileError> {
        self.validate_role(Role::Eval, Observation::Pair { output, actual })
    }

    /// Compares this profile with `other`.
    ///
    /// Only components and scores present in both profiles are compared; the
    /// others are skipped with a warning. A component that cannot be compared
    /// (unbuilt on the other side, or of another data type) gets an empty
    /// report.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileStateError`] if this profile is not built.
    pub fn contrast(
        &self,
        other: &Self,
        thresholds: &ContrastThresholds,
    ) -> Result<ContrastReport, ProfileError> {
        self.ensure_built()?;

        let mut health_reports = BTreeMap::new();
        for component in &self.components {
            let name = component.name();
            let Some(counterpart) = other.component(name) else {
                tracing::warn!(component = %name, other = %other.group_idfr(), "component missing in other profile; skipped");
                continue;
            };
            let report = component
                .contrast(counterpart, thresholds.component(name))
                .unwrap_or_else(|err| {
                    tracing::warn!(error = %err, "component not compared");
                    HealthReport::default()
                });
            health_reports.insert(name.to_owned(), report);
        }

        let mut score_reports = BTreeMap::new();
        for score in &self.scores {
            let name = score.name();
            let Some(counterpart) = other.score(name) else {
                tracing::warn!(score = %name, other = %other.group_idfr(), "score missing in other profile; skipped");
                continue;
            };
            let range = self
                .component(score.primary_input())
                .and_then(Component::value_range)
                .unwrap_or(1.0);
            let report = score.contrast(counterpart, range, thresholds.score(name));
            score_reports.insert(name.to_owned(), report);
        }

        Ok(ContrastReport {
            reference: self.to_document()?,
            alternative_a: other.to_document()?,
            health_reports,
            score_reports,
        })
    }

    /// Compares this profile with two alternatives at once, e.g. the current
    /// production data and a candidate model.
    pub fn contrast_alternatives(
        &self,
        alternative_a: &Self,
        alternative_b: &Self,
        thresholds: &ContrastThresholds,
    ) -> Result<AlternativesReport, ProfileError> {
        let a = self.contrast(alternative_a, thresholds)?;
        let b = self.contrast(alternative_b, thresholds)?;
        Ok(AlternativesReport::merge(a, b))
    }
}
