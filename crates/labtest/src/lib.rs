//! `labtest` - Derived measurements and test records for a materials testing lab
//!
//! This library turns raw field and laboratory readings (sand cone densities,
//! sieve weights, breaking loads) into derived engineering values, and keeps
//! the register of concrete and soil tests with ids that are unique across
//! both collections.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod calc;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod records;
pub mod storage;

pub use calc::{calculate, DerivedResult, Fields, SampleInput, TestType};
pub use config::Config;
pub use error::{Error, Result, StorageError, ValidationError};
pub use logging::init_logging;
pub use records::{Collection, IdRange, RecordSequencer, TestRecord};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
