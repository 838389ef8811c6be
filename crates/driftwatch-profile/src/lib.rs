//! Model profiles: named, versioned bundles of feature summaries.
//!
//! A [`Profile`](profile::Profile) describes how a model's data is expected to
//! behave. It is made of:
//!
//! - **Components** ([`component::Component`]): one extractor plus one
//!   distribution summary per feature, tagged with the role of the data it
//!   reads (input, output, actual or eval)
//! - **Scores** ([`score::Score`]): aggregate metrics over component values,
//!   such as a mean absolute error or a precision
//!
//! # Workflow
//!
//! 1. **Define** a profile from components and scores
//! 2. **Build** it on reference data ([`Profile::build`](profile::Profile::build))
//! 3. **Validate** live records against it, getting feature and error
//!    [`Tag`](tag::Tag)s back
//! 4. **Contrast** it with a profile built on fresh data to detect drift and
//!    score regressions ([`Profile::contrast`](profile::Profile::contrast))
//! 5. **Persist** it as JSON ([`document`]) and reload it without rebuilding
//!
//! # Examples
//!
//! ```
//! use driftwatch_extract::record::{Record, Scalar};
//! use driftwatch_profile::{
//!     component::{Component, DataType, Role},
//!     profile::{BuildData, Domains, Profile},
//!     tag::TagValue,
//! };
//!
//! let components =
//!     Component::from_fields(Role::Input, [("num1", DataType::Float), ("cat1", DataType::Cat)])
//!         .unwrap();
//! let mut profile = Profile::new("houses", "1.0.0", components, vec![]).unwrap();
//!
//! let rows = (0..10)
//!     .map(|i| {
//!         Record::fields([
//!             ("num1", Scalar::Float(f64::from(i))),
//!             ("cat1", Scalar::from(if i < 5 { "a" } else { "b" })),
//!         ])
//!     })
//!     .collect::<Vec<_>>();
//! profile
//!     .build(BuildData::new().input(&rows), &Domains::default(), true)
//!     .unwrap();
//!
//! let live = Record::fields([("num1", Scalar::Float(3.0)), ("cat1", Scalar::from("z"))]);
//! let values = profile.validate_input(&live).unwrap().to_value_map();
//! assert_eq!(values["num1"], TagValue::Float(3.0));
//! assert_eq!(values["cat1-error"], TagValue::from("Domain Error"));
//! ```

use driftwatch_extract::SchemaError;
use driftwatch_stats::DataError;

pub mod component;
pub mod contrast;
pub mod document;
pub mod issues;
pub mod name;
pub mod profile;
pub mod score;
pub mod tag;

/// An operation needed a built profile.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("profile '{profile}' is not built; build it before validating or contrasting")]
pub struct ProfileStateError {
    pub profile: String,
}

/// A component cannot be contrasted with its counterpart.
///
/// [`Profile::contrast`](profile::Profile::contrast) downgrades this to an
/// empty report for the component.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ComponentStateError {
    #[display("component '{component}' is not built")]
    Unbuilt { component: String },
    #[display("component '{component}' has a different data type on each side")]
    Incompatible { component: String },
}

/// A profile, component or score definition is invalid.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DefinitionError {
    #[display("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[display("duplicate {what} name '{name}'")]
    DuplicateName { what: &'static str, name: String },
    #[display("component '{component}' with role {role} needs {expected} extractor")]
    ExtractorRole {
        component: String,
        role: component::Role,
        expected: &'static str,
    },
    #[display("score '{score}' has no inputs")]
    NoScoreInputs { score: String },
    #[display("score '{score}' reads unknown component '{component}'")]
    UnknownScoreInput { score: String, component: String },
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ProfileError {
    #[display("invalid data: {_0}")]
    Data(DataError),
    #[display("{_0}")]
    ProfileState(ProfileStateError),
    #[display("{_0}")]
    ComponentState(ComponentStateError),
    #[display("cannot resolve profile document: {_0}")]
    Schema(SchemaError),
    #[display("invalid definition: {_0}")]
    Definition(DefinitionError),
    #[display("malformed JSON: {_0}")]
    Json(serde_json::Error),
}
