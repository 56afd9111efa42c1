//! Raw wire shapes and their conversion into the canonical model.
//!
//! The server wraps every list in an envelope object named after its
//! element (`{"property": [...]}`, `{"change": [...]}`), sends `null` or
//! nothing at all for empty envelopes, and is not consistent about whether
//! IDs and flags are JSON numbers/booleans or strings. Each envelope has its
//! own type here, and [`Normalize`] turns a decoded wire value into its
//! canonical form in one pass after decoding.

use crate::decode::Normalize;
use crate::model::{Build, Change, ProblemOccurrence, Property, Tag, TestOccurrence, Triggered};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A value the server sends either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumberOrString {
    /// Canonical integer value.
    ///
    /// Numbers are taken as is (floats truncated), numeric strings are
    /// parsed after trimming whitespace, anything else yields 0.
    pub fn to_i64(&self) -> i64 {
        match self {
            NumberOrString::Integer(n) => *n,
            NumberOrString::Float(f) => *f as i64,
            NumberOrString::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    /// Canonical string value; numbers are formatted in decimal.
    pub fn to_text(&self) -> String {
        match self {
            NumberOrString::Integer(n) => n.to_string(),
            NumberOrString::Float(f) => f.to_string(),
            NumberOrString::Text(s) => s.clone(),
        }
    }
}

/// A flag the server sends either as a JSON boolean or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoolOrString {
    Bool(bool),
    Text(String),
}

impl BoolOrString {
    /// `true` for a JSON `true` or the string `"true"` in any case.
    pub fn to_bool(&self) -> bool {
        match self {
            BoolOrString::Bool(b) => *b,
            BoolOrString::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }
}

fn to_i64(value: Option<NumberOrString>) -> i64 {
    value.as_ref().map_or(0, NumberOrString::to_i64)
}

fn to_bool(value: Option<BoolOrString>) -> bool {
    value.as_ref().is_some_and(BoolOrString::to_bool)
}

/// `{"property": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertiesWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<Vec<Property>>,
}

impl PropertiesWire {
    /// Wraps a map for sending, sorted by name. An empty map becomes an
    /// empty envelope (`{}`).
    pub fn from_map(properties: &HashMap<String, String>) -> Self {
        if properties.is_empty() {
            return Self::default();
        }
        let mut property: Vec<Property> = properties
            .iter()
            .map(|(name, value)| Property::new(name.clone(), value.clone()))
            .collect();
        property.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            property: Some(property),
        }
    }
}

impl Normalize for PropertiesWire {
    type Output = Option<Vec<Property>>;

    fn normalize(self) -> Self::Output {
        self.property
    }
}

/// `{"tag": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagsWire {
    #[serde(default)]
    pub tag: Option<Vec<Tag>>,
}

/// `{"change": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangesWire {
    #[serde(default)]
    pub change: Option<Vec<Change>>,
}

impl Normalize for ChangesWire {
    type Output = Option<Vec<Change>>;

    fn normalize(self) -> Self::Output {
        self.change
    }
}

/// `{"count": .., "default": .., "problemOccurrence": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemOccurrencesWire {
    #[serde(default)]
    pub count: Option<NumberOrString>,
    #[serde(default)]
    pub default: Option<BoolOrString>,
    #[serde(default)]
    pub problem_occurrence: Option<Vec<ProblemOccurrence>>,
}

impl Normalize for ProblemOccurrencesWire {
    type Output = Option<Vec<ProblemOccurrence>>;

    fn normalize(self) -> Self::Output {
        self.problem_occurrence
    }
}

/// `{"count": .., "href": .., "testOccurrence": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOccurrencesWire {
    #[serde(default)]
    pub count: Option<NumberOrString>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub test_occurrence: Option<Vec<TestOccurrence>>,
}

impl Normalize for TestOccurrencesWire {
    type Output = Option<Vec<TestOccurrence>>;

    fn normalize(self) -> Self::Output {
        self.test_occurrence
    }
}

/// A build as the server sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildWire {
    #[serde(default)]
    pub id: Option<NumberOrString>,
    #[serde(default)]
    pub build_type_id: Option<String>,
    #[serde(default)]
    pub number: Option<NumberOrString>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub queued_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub finish_date: Option<String>,
    #[serde(default)]
    pub personal: Option<BoolOrString>,
    #[serde(default)]
    pub default_branch: Option<BoolOrString>,
    #[serde(default)]
    pub composite: Option<BoolOrString>,
    #[serde(default)]
    pub tags: Option<TagsWire>,
    #[serde(default)]
    pub triggered: Option<Triggered>,
    #[serde(default)]
    pub properties: Option<PropertiesWire>,
    #[serde(default)]
    pub problem_occurrences: Option<ProblemOccurrencesWire>,
    #[serde(default)]
    pub test_occurrences: Option<TestOccurrencesWire>,
    #[serde(default)]
    pub changes: Option<ChangesWire>,
}

impl Normalize for BuildWire {
    type Output = Build;

    fn normalize(self) -> Build {
        Build {
            id: to_i64(self.id),
            build_type_id: self.build_type_id.unwrap_or_default(),
            number: self
                .number
                .as_ref()
                .map(NumberOrString::to_text)
                .unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            status_text: self.status_text.unwrap_or_default(),
            branch_name: self.branch_name.unwrap_or_default(),
            href: self.href.unwrap_or_default(),
            web_url: self.web_url.unwrap_or_default(),
            queued_date: self.queued_date.unwrap_or_default(),
            start_date: self.start_date.unwrap_or_default(),
            finish_date: self.finish_date.unwrap_or_default(),
            personal: to_bool(self.personal),
            default_branch: to_bool(self.default_branch),
            composite: to_bool(self.composite),
            tags: self.tags.and_then(|t| t.tag).unwrap_or_default(),
            triggered: self.triggered,
            properties: self.properties.and_then(|p| p.property).unwrap_or_default(),
            problem_occurrences: self
                .problem_occurrences
                .and_then(|p| p.problem_occurrence)
                .unwrap_or_default(),
            test_occurrences: self
                .test_occurrences
                .and_then(|t| t.test_occurrence)
                .unwrap_or_default(),
            changes: self.changes.and_then(|c| c.change).unwrap_or_default(),
        }
    }
}

/// `{"count": .., "href": .., "nextHref": .., "build": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildsWire {
    #[serde(default)]
    pub count: Option<NumberOrString>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub next_href: Option<String>,
    #[serde(default)]
    pub build: Option<Vec<BuildWire>>,
}

impl Normalize for BuildsWire {
    type Output = Vec<Build>;

    fn normalize(self) -> Vec<Build> {
        self.build
            .unwrap_or_default()
            .into_iter()
            .map(Normalize::normalize)
            .collect()
    }
}

/// Body of a queue-build request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueBuildRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub build_type_id: String,
    pub properties: PropertiesWire,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    pub personal: String,
}

impl QueueBuildRequest {
    /// Builds a personal build request. The branch name is sent verbatim and
    /// omitted when empty.
    pub fn new(
        build_type_id: &str,
        branch_name: &str,
        properties: &HashMap<String, String>,
    ) -> Self {
        Self {
            build_type_id: build_type_id.to_string(),
            properties: PropertiesWire::from_map(properties),
            branch_name: (!branch_name.is_empty()).then(|| branch_name.to_string()),
            personal: "true".to_string(),
        }
    }
}

/// Body of a cancel request: `{"buildCancelRequest": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBuildRequest {
    pub build_cancel_request: CancelDetails,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelDetails {
    pub comment: String,
    pub read_into_queue: bool,
}

impl CancelBuildRequest {
    /// Cancels and puts the build back into the queue.
    pub fn new(comment: &str) -> Self {
        Self {
            build_cancel_request: CancelDetails {
                comment: comment.to_string(),
                read_into_queue: true,
            },
        }
    }
}
