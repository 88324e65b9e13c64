//! Test records and their numbering.
//!
//! Concrete and soil records live in two separately stored collections but
//! draw their ids from one shared sequence. See [`RecordSequencer`].

pub mod report;
pub mod sequencer;
pub mod validate;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calc::Fields;

pub use sequencer::RecordSequencer;

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Concrete specimen tests.
    Concrete,
    /// Soil sample tests.
    Soil,
}

impl Collection {
    /// Both collections, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Concrete, Self::Soil];

    /// Store key holding the JSON array of records.
    #[must_use]
    pub fn records_key(self) -> &'static str {
        match self {
            Self::Concrete => "EnsayesConcreto",
            Self::Soil => "EnsayesSuelos",
        }
    }

    /// Store key holding the last assigned id as a decimal string.
    #[must_use]
    pub fn counter_key(self) -> &'static str {
        match self {
            Self::Concrete => "EnsayesConcreto_lastId",
            Self::Soil => "EnsayesSuelos_lastId",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete => write!(f, "concrete"),
            Self::Soil => write!(f, "soil"),
        }
    }
}

/// A registered test ("ensaye").
///
/// Serialized flat, with `id` next to the form fields:
/// `{"id": 8, "obra": "Torre B", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Unique across both collections.
    pub id: u64,
    /// Form fields as entered.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl TestRecord {
    /// Create a record from raw form fields.
    #[must_use]
    pub fn new(id: u64, fields: &Fields) -> Self {
        Self {
            id,
            fields: fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        }
    }

    /// A field rendered as text, if present and not null.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// The record's date field (`fecha`).
    #[must_use]
    pub fn date(&self) -> Option<String> {
        self.field("fecha")
    }
}

/// A block of consecutive ids handed out by one allocation.
///
/// Always holds at least one id and never extends past `u64::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdRange {
    start: u64,
    count: u64,
}

impl IdRange {
    /// A block of `count` ids beginning at `start`.
    ///
    /// Returns `None` when `count` is zero or the block would run past `u64::MAX`.
    #[must_use]
    pub fn new(start: u64, count: u64) -> Option<Self> {
        let last = count.checked_sub(1)?;
        start.checked_add(last)?;
        Some(Self { start, count })
    }

    /// First id in the block.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of ids in the block, at least one.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Last id in the block.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start + (self.count - 1)
    }

    /// The ids as an inclusive range.
    #[must_use]
    pub fn ids(&self) -> RangeInclusive<u64> {
        self.start..=self.end()
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 1 {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{} to {}", self.start, self.end())
        }
    }
}
