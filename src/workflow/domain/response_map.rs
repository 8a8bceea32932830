//! Answers accumulated over one workflow run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Item identifier to answer, submitted wholesale with each resubmission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseMap(BTreeMap<String, Value>);

impl ResponseMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records an answer, replacing any earlier one for the same item.
    pub fn insert(&mut self, item_id: impl Into<String>, value: Value) {
        self.0.insert(item_id.into(), value);
    }

    /// Returns the answer recorded for an item.
    #[must_use]
    pub fn get(&self, item_id: &str) -> Option<&Value> {
        self.0.get(item_id)
    }

    /// Returns whether an answer exists for an item.
    #[must_use]
    pub fn contains(&self, item_id: &str) -> bool {
        self.0.contains_key(item_id)
    }

    /// Returns the number of recorded answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no answers are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates answers in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl FromIterator<(String, Value)> for ResponseMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
