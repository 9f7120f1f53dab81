//! # modelsync core
//!
//! Binds in-memory models and collections to a local-first store.
//!
//! The adapter does two things:
//!
//! - **Dispatch**: every `save`, `fetch` and `destroy` is turned into one
//!   store call by the [`Dispatcher`], and the stored result is copied back
//!   onto the model or collection.
//! - **Bridge**: every collection subscribes to its type's store events and
//!   mirrors remote changes, while changes caused by its own writes are
//!   recognised by their [`Origin`] and dropped.
//!
//! ## Design Principles
//!
//! - The store is injected through a [`StoreHandle`], never ambient
//! - Every change carries an explicit [`Origin`]
//! - A schema without a type tag is rejected when it is declared
//! - Store errors reach callers unchanged
//!
//! ## Example
//!
//! ```rust
//! use modelsync_core::{Adapter, CollectionOptions, ModelSchema, SyncOptions};
//! use modelsync_store::Record;
//! use serde_json::json;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let adapter = Adapter::connect("http://example.com");
//! let task = ModelSchema::new("task").unwrap();
//! let tasks = adapter.collection(&task, CollectionOptions::new());
//!
//! let attrs = Record::try_from(json!({"name": "New Task"})).unwrap();
//! let (model, saved) = tasks.create(attrs, SyncOptions::new());
//! saved.await.unwrap();
//!
//! assert!(!model.is_new());
//! assert_eq!(tasks.len(), 1);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bridge;
mod collection;
mod config;
mod connection;
mod deferred;
mod dispatcher;
mod error;
mod events;
mod model;
mod schema;

pub use bridge::Bridge;
pub use collection::{BindingState, Collection, CollectionOptions, StoreFilter};
pub use config::AdapterConfig;
pub use connection::{Adapter, StoreHandle, StoreSource};
pub use deferred::{Continuation, Deferred};
pub use dispatcher::{
    Dispatcher, ErrorCallback, Method, Operation, SuccessCallback, SyncOptions, SyncOutcome,
    SyncTarget,
};
pub use error::{SyncError, SyncResult};
pub use events::{CollectionEvent, ListenerId, ModelEvent, Observers};
pub use model::Model;
pub use schema::ModelSchema;

pub use modelsync_store::Origin;
