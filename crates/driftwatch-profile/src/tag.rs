//! Tags emitted by validation.
//!
//! A [`Tag`] is one observation (the extracted feature value) or one violation
//! (why the value is unusable) for one component, attributed to a profile via
//! its `group`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::Role;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum TagType {
    #[serde(rename = "profile-input")]
    #[display("profile-input")]
    ProfileInput,
    #[serde(rename = "profile-input-error")]
    #[display("profile-input-error")]
    ProfileInputError,
    #[serde(rename = "profile-output")]
    #[display("profile-output")]
    ProfileOutput,
    #[serde(rename = "profile-output-error")]
    #[display("profile-output-error")]
    ProfileOutputError,
    #[serde(rename = "profile-actual")]
    #[display("profile-actual")]
    ProfileActual,
    #[serde(rename = "profile-actual-error")]
    #[display("profile-actual-error")]
    ProfileActualError,
    #[serde(rename = "profile-score")]
    #[display("profile-score")]
    ProfileScore,
    #[serde(rename = "profile-score-error")]
    #[display("profile-score-error")]
    ProfileScoreError,
}

impl TagType {
    /// Type of the feature tags emitted by components of `role`.
    #[must_use]
    pub fn feature(role: Role) -> Self {
        match role {
            Role::Input => Self::ProfileInput,
            Role::Output => Self::ProfileOutput,
            Role::Actual => Self::ProfileActual,
            Role::Eval => Self::ProfileScore,
        }
    }

    /// Type of the error tags emitted by components of `role`.
    #[must_use]
    pub fn error(role: Role) -> Self {
        match role {
            Role::Input => Self::ProfileInputError,
            Role::Output => Self::ProfileOutputError,
            Role::Actual => Self::ProfileActualError,
            Role::Eval => Self::ProfileScoreError,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::ProfileInputError
                | Self::ProfileOutputError
                | Self::ProfileActualError
                | Self::ProfileScoreError
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::IsVariant)]
#[serde(untagged)]
pub enum TagValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "type")]
    pub tag_type: TagType,
    pub name: String,
    pub value: TagValue,
    pub group: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<TagValue>, tag_type: TagType) -> Self {
        Self {
            tag_type,
            name: name.into(),
            value: value.into(),
            group: None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.tag_type.is_error()
    }
}

/// Tags returned by a validation call, in component order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<Tag>);

impl Tags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tag: Tag) {
        self.0.push(tag);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Tag] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Tag> {
        self.0
    }

    /// Sets the group of every tag.
    pub fn set_group(&mut self, group: &str) {
        for tag in &mut self.0 {
            tag.group = Some(group.to_owned());
        }
    }

    /// Tags as JSON records in the wire format.
    #[must_use]
    pub fn to_json_records(&self) -> Vec<serde_json::Value> {
        self.0
            .iter()
            .map(|tag| {
                serde_json::json!({
                    "type": tag.tag_type,
                    "name": tag.name,
                    "value": tag.value,
                    "group": tag.group,
                })
            })
            .collect()
    }

    /// Tag values keyed by tag name. A later tag with the same name wins.
    #[must_use]
    pub fn to_value_map(&self) -> BTreeMap<String, TagValue> {
        self.0
            .iter()
            .map(|tag| (tag.name.clone(), tag.value.clone()))
            .collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Tag> + '_ {
        self.0.iter().filter(|tag| tag.is_error())
    }
}

impl Extend<Tag> for Tags {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Tag> for Tags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Tags {
    type Item = Tag;
    type IntoIter = std::vec::IntoIter<Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
