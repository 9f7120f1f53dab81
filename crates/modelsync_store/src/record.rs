//! Attribute records.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the identifier attribute.
pub const ID_FIELD: &str = "id";

/// A mapping from attribute name to value.
///
/// A record carries an `"id"` attribute once the store has persisted it.
/// Attribute order is preserved as inserted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record from a JSON object map.
    #[must_use]
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Returns the identifier, if the record has one.
    ///
    /// String and integer ids are accepted; anything else is treated as
    /// absent.
    #[must_use]
    pub fn id(&self) -> Option<RecordId> {
        match self.0.get(ID_FIELD)? {
            Value::String(id) if !id.is_empty() => Some(RecordId::new(id.clone())),
            Value::Number(n) => Some(RecordId::new(n.to_string())),
            _ => None,
        }
    }

    /// Sets the identifier attribute.
    pub fn set_id(&mut self, id: &RecordId) {
        self.0
            .insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));
    }

    /// Gets an attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Sets an attribute, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes an attribute.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Overlays `other` onto this record.
    pub fn merge(&mut self, other: &Record) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Returns the attributes of `updates` whose values differ from this
    /// record's.
    #[must_use]
    pub fn diff(&self, updates: &Record) -> Record {
        updates
            .iter()
            .filter(|(key, value)| self.0.get(key.as_str()) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns true if every attribute of `filter` is present here with an
    /// equal value.
    #[must_use]
    pub fn matches(&self, filter: &Record) -> bool {
        filter
            .iter()
            .all(|(key, value)| self.0.get(key.as_str()) == Some(value))
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the record, returning the underlying map.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.0)
    }
}

/// Only JSON objects convert; any other value is handed back.
impl TryFrom<Value> for Record {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::try_from(value).unwrap()
    }

    #[test]
    fn id_is_read_from_id_attribute() {
        assert_eq!(
            record(json!({"id": "juyc3ej"})).id(),
            Some(RecordId::new("juyc3ej"))
        );
        assert_eq!(record(json!({"id": 7})).id(), Some(RecordId::new("7")));
        assert_eq!(record(json!({"id": ""})).id(), None);
        assert_eq!(record(json!({"id": null})).id(), None);
        assert_eq!(record(json!({"name": "x"})).id(), None);
    }

    #[test]
    fn set_id_overwrites() {
        let mut r = record(json!({"id": "old", "name": "x"}));
        r.set_id(&RecordId::new("new"));
        assert_eq!(r.id(), Some(RecordId::new("new")));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn diff_keeps_only_changed_values() {
        let current = record(json!({"id": "a", "name": "Old", "done": false}));
        let updates = record(json!({"name": "New", "done": false, "tags": "x"}));

        assert_eq!(current.diff(&updates), record(json!({"name": "New", "tags": "x"})));
    }

    #[test]
    fn matches_is_containment() {
        let r = record(json!({"id": "a", "foo": "bar", "n": 1}));
        assert!(r.matches(&record(json!({"foo": "bar"}))));
        assert!(r.matches(&Record::new()));
        assert!(!r.matches(&record(json!({"foo": "baz"}))));
        assert!(!r.matches(&record(json!({"missing": 1}))));
    }

    #[test]
    fn merge_overlays() {
        let mut r = record(json!({"id": "a", "name": "Old"}));
        r.merge(&record(json!({"name": "New", "done": true})));
        assert_eq!(r, record(json!({"id": "a", "name": "New", "done": true})));
    }

    #[test]
    fn non_objects_are_rejected() {
        assert_eq!(Record::try_from(json!([1, 2])), Err(json!([1, 2])));
    }

    fn attributes() -> impl Strategy<Value = Record> {
        let value = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::from(n)),
            "[a-z ]{0,8}".prop_map(Value::String),
        ];
        prop::collection::btree_map("[a-c]{1,2}", value, 0..6)
            .prop_map(|map| map.into_iter().collect::<Record>())
    }

    proptest! {
        #[test]
        fn merged_record_has_nothing_left_to_diff(base in attributes(), updates in attributes()) {
            let mut merged = base;
            merged.merge(&updates);

            prop_assert!(merged.diff(&updates).is_empty());
            prop_assert!(merged.matches(&updates));
        }

        #[test]
        fn merging_the_diff_equals_merging_everything(base in attributes(), updates in attributes()) {
            let mut by_diff = base.clone();
            by_diff.merge(&base.diff(&updates));
            let mut full = base;
            full.merge(&updates);

            prop_assert_eq!(by_diff, full);
        }

        #[test]
        fn every_record_matches_itself_and_the_empty_filter(r in attributes()) {
            prop_assert!(r.matches(&r));
            prop_assert!(r.matches(&Record::new()));
            prop_assert!(r.diff(&r).is_empty());
        }
    }
}
