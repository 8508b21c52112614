//! Core types for Recipebook
//!
//! Records are plain values: an unsaved payload, or a payload paired with the
//! id the backend assigned to it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-assigned record identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn new(value: u64) -> Self {
        RecordId(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The following id, `None` once the id space is exhausted
    pub fn next(&self) -> Option<RecordId> {
        self.0.checked_add(1).map(RecordId)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(RecordId)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        RecordId(value)
    }
}

/// A record the backend has assigned an id to.
///
/// On the wire the payload fields sit next to `id` in one flat object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecord<P> {
    pub id: RecordId,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> SavedRecord<P> {
    pub fn new(id: impl Into<RecordId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// A record before or after the backend has seen it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record<P> {
    Saved(SavedRecord<P>),
    Unsaved(P),
}

impl<P> Record<P> {
    pub fn unsaved(payload: P) -> Self {
        Record::Unsaved(payload)
    }

    pub fn saved(id: impl Into<RecordId>, payload: P) -> Self {
        Record::Saved(SavedRecord::new(id, payload))
    }

    pub fn id(&self) -> Option<RecordId> {
        match self {
            Record::Saved(saved) => Some(saved.id),
            Record::Unsaved(_) => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, Record::Saved(_))
    }

    pub fn payload(&self) -> &P {
        match self {
            Record::Saved(saved) => &saved.payload,
            Record::Unsaved(payload) => payload,
        }
    }

    pub fn into_payload(self) -> P {
        match self {
            Record::Saved(saved) => saved.payload,
            Record::Unsaved(payload) => payload,
        }
    }
}

impl<P> From<P> for Record<P> {
    fn from(payload: P) -> Self {
        Record::Unsaved(payload)
    }
}

/// Recipe payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Recipe {
    pub recipe: String,
}

impl Recipe {
    pub fn new(recipe: impl Into<String>) -> Self {
        Self {
            recipe: recipe.into(),
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.recipe)
    }
}

/// A saved recipe as held by the store
pub type SavedRecipe = SavedRecord<Recipe>;
