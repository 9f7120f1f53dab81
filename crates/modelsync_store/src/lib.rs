//! # modelsync store
//!
//! Store client contract for modelsync.
//!
//! A store is the local-first persistence client that durably holds records
//! and announces every change. This crate defines what the adapter consumes
//! from it and nothing about how it persists.
//!
//! ## Design Principles
//!
//! - Records are attribute maps; the store assigns ids
//! - Every write carries an [`Origin`] and echoes it on its change event
//! - Change events are keyed by `(ChangeKind, EntityType)` and nothing else
//! - Store errors are plain values handed to callers unchanged
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - In-memory local-first store
//! - [`MockStore`] - Scripted store for tests
//!
//! ## Example
//!
//! ```rust
//! use modelsync_store::{ChangeKind, EntityType, MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let task = EntityType::new("task").unwrap();
//!
//! store.events().subscribe(ChangeKind::Add, task, |event| {
//!     println!("{} added by {}", event.entity_type, event.origin);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod event;
mod memory;
mod mock;
mod record;
mod store;
mod types;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use event::{ChangeKind, EventBus, StoreEvent, SubscriptionId};
pub use memory::{MemoryStore, CREATED_AT_FIELD, CREATED_BY_FIELD, UPDATED_AT_FIELD};
pub use mock::{MockStore, Reply, ReplyGate, StoreCall, StoreMethod};
pub use record::{Record, ID_FIELD};
pub use store::{FindAll, Store, WriteOptions};
pub use types::{EntityType, Origin, RecordId};
