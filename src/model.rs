//! Typed entities returned by the client.
//!
//! These are the canonical shapes: every field is populated (zero value or
//! empty collection when the server left it out), whatever wire shape the
//! server used. See [`wire`](crate::wire) for the raw shapes and the
//! conversions between the two.

use crate::wire::NumberOrString;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A build, queued, running or finished.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    /// Numeric build ID; 0 when the server sent none or an unparsable one.
    pub id: i64,
    pub build_type_id: String,
    /// Build number as displayed by the server (not necessarily numeric).
    pub number: String,
    /// `SUCCESS`, `FAILURE`, `UNKNOWN`, or empty while queued.
    pub status: String,
    /// `queued`, `running` or `finished`.
    pub state: String,
    pub status_text: String,
    pub branch_name: String,
    pub href: String,
    pub web_url: String,
    pub queued_date: String,
    pub start_date: String,
    pub finish_date: String,
    pub personal: bool,
    pub default_branch: bool,
    pub composite: bool,
    pub tags: Vec<Tag>,
    pub triggered: Option<Triggered>,
    pub properties: Vec<Property>,
    pub problem_occurrences: Vec<ProblemOccurrence>,
    pub test_occurrences: Vec<TestOccurrence>,
    pub changes: Vec<Change>,
}

impl Build {
    /// Returns the build's properties as a name to value map.
    ///
    /// When a name appears more than once the last value wins.
    pub fn properties_map(&self) -> HashMap<String, String> {
        property_map(self.properties.iter().cloned())
    }

    /// `true` when the record carries neither an ID nor a build type.
    pub(crate) fn is_blank(&self) -> bool {
        self.id == 0 && self.build_type_id.is_empty()
    }
}

/// A name/value pair, as used for build parameters.
///
/// A missing or `null` name or value is read as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub value: String,
}

impl Property {
    /// Creates a property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Collects properties into a map, later duplicates overwriting earlier
/// ones.
pub fn property_map(properties: impl IntoIterator<Item = Property>) -> HashMap<String, String> {
    properties
        .into_iter()
        .map(|p| (p.name, p.value))
        .collect()
}

/// A build tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Who or what started a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggered {
    /// `user`, `vcs`, `schedule`, `buildType`, ...
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A VCS change included in a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NumberOrString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    /// Every other field, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A build problem (compilation error, non-zero exit code, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemOccurrence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    /// Full problem text; only present when requested in the field projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The result of a single test in a build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOccurrence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `SUCCESS`, `FAILURE` or `UNKNOWN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Milliseconds, sent as a number or a string depending on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<NumberOrString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_map_last_write_wins() {
        let map = property_map(vec![
            Property::new("a", "1"),
            Property::new("b", "x"),
            Property::new("a", "2"),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], "2");
        assert_eq!(map["b"], "x");
    }

    #[test]
    fn test_property_null_value_is_empty() {
        let property: Property =
            serde_json::from_value(json!({"name": "env.A", "value": null})).unwrap();
        assert_eq!(property, Property::new("env.A", ""));
    }

    #[test]
    fn test_property_missing_or_null_name_is_empty() {
        let missing: Property = serde_json::from_value(json!({"value": "1"})).unwrap();
        assert_eq!(missing, Property::new("", "1"));

        let null: Property = serde_json::from_value(json!({"name": null})).unwrap();
        assert_eq!(null, Property::new("", ""));
    }

    #[test]
    fn test_tag_null_name_is_empty() {
        let tag: Tag = serde_json::from_value(json!({"name": null})).unwrap();
        assert!(tag.name.is_empty());
    }

    #[test]
    fn test_change_keeps_unknown_fields() {
        let change: Change = serde_json::from_value(json!({
            "id": 4711,
            "version": "abc123",
            "username": "jdoe",
            "files": {"count": 2}
        }))
        .unwrap();

        assert_eq!(change.id.as_ref().map(NumberOrString::to_i64), Some(4711));
        assert_eq!(change.version.as_deref(), Some("abc123"));
        assert_eq!(change.extra["files"], json!({"count": 2}));
    }

    #[test]
    fn test_test_occurrence_duration_as_string() {
        let test: TestOccurrence = serde_json::from_value(json!({
            "id": "build:(id:1),id:2000",
            "name": "suite: test_login",
            "status": "FAILURE",
            "duration": "125",
            "muted": false
        }))
        .unwrap();

        assert_eq!(test.duration.map(|d| d.to_i64()), Some(125));
        assert_eq!(test.extra["muted"], json!(false));
    }

    #[test]
    fn test_triggered_type_field() {
        let triggered: Triggered = serde_json::from_value(json!({
            "type": "user",
            "date": "20240101T120000+0000",
            "user": {"username": "jdoe"}
        }))
        .unwrap();

        assert_eq!(triggered.kind.as_deref(), Some("user"));
        assert!(triggered.extra.is_empty());
    }
}
