//! Shared fixtures.
//!
//! The attribute sets mirror a task going through its life: created
//! without an id, persisted under `juyc3ej` by owner `pe3vv6m`, then
//! renamed.

use modelsync_store::{EntityType, Record, RecordId};
use serde_json::{json, Value};

/// Type tag used by the fixtures.
pub const TASK: &str = "task";

/// Id of the persisted task.
pub const TASK_ID: &str = "juyc3ej";

/// Owner recorded on the persisted task.
pub const OWNER: &str = "pe3vv6m";

/// Builds a record from a JSON object.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn record(value: Value) -> Record {
    match Record::try_from(value) {
        Ok(record) => record,
        Err(other) => panic!("fixture is not a JSON object: {other}"),
    }
}

/// The `task` type tag.
pub fn task_type() -> EntityType {
    EntityType::new(TASK).expect("fixture type tag is valid")
}

/// Id of the persisted task.
pub fn task_id() -> RecordId {
    RecordId::new(TASK_ID)
}

/// Attributes of a task that was never saved.
pub fn new_task_attributes() -> Record {
    record(json!({
        "name": "New Task",
    }))
}

/// Attributes of the task as stored.
pub fn persisted_task_attributes() -> Record {
    record(json!({
        "id": TASK_ID,
        "name": "New Task",
        "createdBy": OWNER,
        "tags": "foo, bar, baz",
    }))
}

/// The rename applied to the persisted task.
pub fn changed_task_attributes() -> Record {
    record(json!({
        "name": "Updated Name",
    }))
}

/// Installs a `tracing` subscriber writing to the test output.
///
/// Filtered by `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
