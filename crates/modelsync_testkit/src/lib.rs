//! # modelsync testkit
//!
//! Test utilities for modelsync.
//!
//! This crate provides:
//! - Fixtures for the `task` type used throughout the test suites
//! - Property-based test generators using proptest
//! - Callback probes that count how often success and error callbacks fire
//!
//! ## Usage
//!
//! ```rust
//! use modelsync_testkit::prelude::*;
//!
//! let probe = CallbackProbe::new();
//! let on_success = probe.success::<u32>();
//! on_success(&7);
//!
//! assert_eq!(probe.successes(), 1);
//! assert_eq!(probe.errors(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod probe;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::probe::*;
}

pub use fixtures::*;
pub use generators::*;
pub use probe::*;
