//! Flattening contrast reports into a prioritized list of issues.

use serde::{Deserialize, Serialize};

use crate::{
    component::{Component, Role, Stats},
    contrast::{ContrastReport, HealthReport},
    profile::Profile,
    score::{Preference, Score},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    #[display("score_regression")]
    ScoreRegression,
    #[display("integrity_regression")]
    IntegrityRegression,
    #[display("singleton_domain")]
    SingletonDomain,
    #[display("component_drift")]
    ComponentDrift,
}

/// Both sides of an issue, for display next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssueExtra {
    Score {
        #[serde(rename = "ref")]
        reference: Option<f64>,
        #[serde(rename = "obs")]
        observed: Option<f64>,
        preference: Preference,
    },
    Component {
        #[serde(rename = "ref")]
        reference: Option<Stats>,
        #[serde(rename = "obs")]
        observed: Option<Stats>,
    },
}

/// One finding of a contrast, alerting or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Role of the component, or for scores the most important role among
    /// the score's inputs.
    pub component_type: Role,
    /// Component name; `None` for score issues.
    pub tag: Option<String>,
    pub score: Option<String>,
    pub score_inputs: Option<Vec<String>>,
    pub issue_type: IssueType,
    pub valid: bool,
    pub alert: bool,
    /// Score difference, invalids increase, 1 for a singleton, or drift.
    pub value: Option<f64>,
    pub extra: IssueExtra,
}

impl Issue {
    fn component(
        role: Role,
        component: &Component,
        observed: &Profile,
        issue_type: IssueType,
    ) -> Self {
        Self {
            component_type: role,
            tag: Some(component.name().to_owned()),
            score: None,
            score_inputs: None,
            issue_type,
            valid: false,
            alert: false,
            value: None,
            extra: IssueExtra::Component {
                reference: component.stats().cloned(),
                observed: observed
                    .component(component.name())
                    .and_then(Component::stats)
                    .cloned(),
            },
        }
    }
}

fn roles_by_priority() -> [Role; 4] {
    let mut roles = Role::ALL;
    roles.sort_by_key(|role| role.priority());
    roles
}

/// Most important role among the components a score reads.
fn score_role(profile: &Profile, score: &Score) -> Option<Role> {
    score
        .inputs()
        .iter()
        .filter_map(|input| profile.component(input))
        .map(|component| component.role())
        .min_by_key(|role| role.priority())
}

/// Appends one issue per component that has the report part `pick` selects,
/// in role priority order.
fn component_issues(
    issues: &mut Vec<Issue>,
    reference: &Profile,
    observed: &Profile,
    report: &ContrastReport,
    issue_type: IssueType,
    pick: fn(&HealthReport) -> Option<(bool, bool, f64)>,
) {
    for role in roles_by_priority() {
        for component in reference.components_with_role(role) {
            let Some((valid, alert, value)) =
                report.health_reports.get(component.name()).and_then(pick)
            else {
                continue;
            };
            issues.push(Issue {
                valid,
                alert,
                value: Some(value),
                ..Issue::component(role, component, observed, issue_type)
            });
        }
    }
}

/// Lists the issues of `report`, the contrast of `reference` with `observed`.
///
/// Score regressions come first, then integrity regressions, singleton
/// domains and component drift. Within each group entries follow the role
/// priority (eval, actual, output, input) and then definition order.
/// Components and scores the report has no entry for are left out.
#[must_use]
pub fn collect(reference: &Profile, observed: &Profile, report: &ContrastReport) -> Vec<Issue> {
    let mut issues = Vec::new();

    for role in roles_by_priority() {
        for score in reference.scores() {
            if score_role(reference, score) != Some(role) {
                continue;
            }
            let Some(metrics) = report.score_reports.get(score.name()) else {
                continue;
            };
            issues.push(Issue {
                component_type: role,
                tag: None,
                score: Some(score.name().to_owned()),
                score_inputs: Some(score.inputs().to_vec()),
                issue_type: IssueType::ScoreRegression,
                valid: metrics.valid,
                alert: metrics.alert,
                value: metrics.diff,
                extra: IssueExtra::Score {
                    reference: score.result(),
                    observed: observed.score(score.name()).and_then(Score::result),
                    preference: score.preference(),
                },
            });
        }
    }

    component_issues(
        &mut issues,
        reference,
        observed,
        report,
        IssueType::IntegrityRegression,
        |health| {
            let invalids = health.invalids.as_ref()?;
            Some((invalids.valid, invalids.alert, invalids.invalids))
        },
    );
    component_issues(
        &mut issues,
        reference,
        observed,
        report,
        IssueType::SingletonDomain,
        |health| {
            let singleton = health.singleton?;
            let value = if singleton.is_singleton { 1.0 } else { 0.0 };
            Some((singleton.valid, singleton.alert, value))
        },
    );
    component_issues(
        &mut issues,
        reference,
        observed,
        report,
        IssueType::ComponentDrift,
        |health| {
            let drift = health.drift.as_ref()?;
            Some((drift.valid, drift.alert, drift.drift))
        },
    );

    issues
}

#[cfg(test)]
mod tests {
    use driftwatch_extract::{
        extractor::BoxedEvalExtractor,
        record::{Record, Scalar},
        scoring::AbsoluteRegressionError,
    };

    use super::*;
    use crate::{
        component::{Component, DataType},
        contrast::ContrastThresholds,
        profile::{BuildData, Domains},
    };

    fn profile() -> Profile {
        let mut components = Component::from_fields(Role::Input, [("x", DataType::Float)]).unwrap();
        components.extend(Component::from_fields(Role::Output, [("pred", DataType::Float)]).unwrap());
        components.extend(Component::from_fields(Role::Actual, [("truth", DataType::Float)]).unwrap());
        let eval: BoxedEvalExtractor = Box::new(AbsoluteRegressionError);
        components.push(Component::new("err", Role::Eval, DataType::Float, eval).unwrap());
        let scores = vec![
            Score::mean("mean_pred", "pred", Preference::High).unwrap(),
            Score::mean("mae", "err", Preference::Low).unwrap(),
        ];
        Profile::new("m", "1", components, scores).unwrap()
    }

    fn built(offset: f64) -> Profile {
        let input = (0..50)
            .map(|i| Record::fields([("x", Scalar::Float(f64::from(i)))]))
            .collect::<Vec<_>>();
        let output = (0..50)
            .map(|i| Record::values([f64::from(i % 10) + offset]))
            .collect::<Vec<_>>();
        let actual = (0..50)
            .map(|i| Record::values([f64::from(i % 10)]))
            .collect::<Vec<_>>();
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

    #[test]
    fn test_issue_order() {
        let reference = built(0.5);
        let observed = built(3.0);
        let report = reference
            .contrast(&observed, &ContrastThresholds::default())
            .unwrap();
        let issues = collect(&reference, &observed, &report);

        let summary = issues
            .iter()
            .map(|issue| {
                (
                    issue.issue_type,
                    issue.component_type,
                    issue.tag.clone().or_else(|| issue.score.clone()).unwrap(),
                )
            })
            .collect::<Vec<_>>();
        let expected = [
            (IssueType::ScoreRegression, Role::Eval, "mae"),
            (IssueType::ScoreRegression, Role::Output, "mean_pred"),
            (IssueType::IntegrityRegression, Role::Eval, "err"),
            (IssueType::IntegrityRegression, Role::Actual, "truth"),
            (IssueType::IntegrityRegression, Role::Output, "pred"),
            (IssueType::IntegrityRegression, Role::Input, "x"),
            (IssueType::SingletonDomain, Role::Eval, "err"),
            (IssueType::SingletonDomain, Role::Actual, "truth"),
            (IssueType::SingletonDomain, Role::Output, "pred"),
            (IssueType::SingletonDomain, Role::Input, "x"),
            (IssueType::ComponentDrift, Role::Eval, "err"),
            (IssueType::ComponentDrift, Role::Actual, "truth"),
            (IssueType::ComponentDrift, Role::Output, "pred"),
            (IssueType::ComponentDrift, Role::Input, "x"),
        ]
        .map(|(t, r, n)| (t, r, n.to_owned()));
        assert_eq!(summary, expected);
    }

    #[test]
    fn test_issue_values() {
        let reference = built(0.5);
        let observed = built(3.0);
        let report = reference
            .contrast(&observed, &ContrastThresholds::default())
            .unwrap();
        let issues = collect(&reference, &observed, &report);

        let mae = &issues[0];
        assert!(mae.valid);
        assert!(mae.alert);
        assert_eq!(
            mae.extra,
            IssueExtra::Score {
                reference: Some(0.5),
                observed: Some(3.0),
                preference: Preference::Low,
            }
        );
        assert_eq!(mae.score_inputs.as_deref(), Some(&["err".to_owned()][..]));

        let mean_pred = &issues[1];
        assert!(!mean_pred.alert, "higher predictions are preferred");

        let x_drift = issues
            .iter()
            .find(|i| i.issue_type == IssueType::ComponentDrift && i.tag.as_deref() == Some("x"))
            .unwrap();
        assert_eq!(x_drift.value, Some(0.0));
        assert!(!x_drift.alert);
        let IssueExtra::Component { reference: Some(ref_stats), observed: Some(obs_stats) } =
            &x_drift.extra
        else {
            panic!("expected both summaries");
        };
        assert_eq!(Some(ref_stats), reference.component("x").unwrap().stats());
        assert_eq!(Some(obs_stats), observed.component("x").unwrap().stats());

        let json = serde_json::to_value(mae).unwrap();
        assert_eq!(json["issue_type"], "score_regression");
        assert_eq!(json["component_type"], "eval");
        assert!(json["tag"].is_null());
        assert_eq!(json["extra"]["ref"], 0.5);
        assert_eq!(json["extra"]["obs"], 3.0);
        assert_eq!(json["extra"]["preference"], "low");

        let json = serde_json::to_value(x_drift).unwrap();
        assert_eq!(json["issue_type"], "component_drift");
        assert_eq!(json["extra"]["ref"]["samplesize"], 50);
        let decoded: Issue = serde_json::from_value(json).unwrap();
        assert_eq!(&decoded, x_drift);
    }

    #[test]
    fn test_missing_entries_skipped() {
        let reference = built(0.5);
        let mut partial = Profile::new(
            "m",
            "2",
            Component::from_fields(Role::Input, [("x", DataType::Float)]).unwrap(),
            vec![],
        )
        .unwrap();
        let input = (0..50)
            .map(|i| Record::fields([("x", Scalar::Float(f64::from(i)))]))
            .collect::<Vec<_>>();
        partial
            .build(BuildData::new().input(&input), &Domains::default(), true)
            .unwrap();
        let report = reference
            .contrast(&partial, &ContrastThresholds::default())
            .unwrap();
        let issues = collect(&reference, &partial, &report);
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(|i| i.tag.as_deref() == Some("x")));
    }

    #[test]
    fn test_singleton_domain() {
        let reference = built(0.5);
        let mut observed = profile();
        let input = (0..50)
            .map(|_| Record::fields([("x", Scalar::Float(7.0))]))
            .collect::<Vec<_>>();
        let output = (0..50).map(|i| Record::values([f64::from(i % 10)])).collect::<Vec<_>>();
        observed
            .build(
                BuildData::new().input(&input).output(&output).actual(&output),
                &Domains::default(),
                true,
            )
            .unwrap();
        let report = reference
            .contrast(&observed, &ContrastThresholds::default())
            .unwrap();
        let singletons = collect(&reference, &observed, &report)
            .into_iter()
            .filter(|i| i.issue_type == IssueType::SingletonDomain)
            .map(|i| (i.tag.unwrap(), i.alert, i.value))
            .collect::<Vec<_>>();
        assert_eq!(
            singletons,
            [
                ("err".to_owned(), false, Some(1.0)),
                ("truth".to_owned(), false, Some(0.0)),
                ("pred".to_owned(), false, Some(0.0)),
                ("x".to_owned(), true, Some(1.0)),
            ]
        );
    }
}
