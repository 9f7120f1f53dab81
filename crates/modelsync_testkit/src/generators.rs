//! Property-based test generators using proptest.

use modelsync_store::{Record, RecordId, ID_FIELD};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating record ids in the store's short format.
pub fn record_id_strategy() -> impl Strategy<Value = RecordId> {
    "[a-z0-9]{7}".prop_map(|id: String| RecordId::new(id))
}

/// Strategy for generating attribute names other than the id field.
pub fn attribute_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z]{0,11}".prop_filter("the id field is generated separately", |name| {
        name != ID_FIELD
    })
}

/// Strategy for generating scalar attribute values.
pub fn attribute_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,24}".prop_map(Value::from),
    ]
}

/// Strategy for generating records without an id.
pub fn attributes_strategy() -> impl Strategy<Value = Record> {
    prop::collection::btree_map(attribute_name_strategy(), attribute_value_strategy(), 0..6)
        .prop_map(|attrs| attrs.into_iter().collect::<Record>())
}

/// Strategy for generating records with an id.
pub fn persisted_record_strategy() -> impl Strategy<Value = Record> {
    (record_id_strategy(), attributes_strategy()).prop_map(|(id, mut record)| {
        record.set_id(&id);
        record
    })
}
