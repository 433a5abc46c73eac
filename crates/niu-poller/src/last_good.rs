//! Process-lifetime memo of the last non-null value per field.

use std::collections::HashMap;

use niu_core::{Field, NormalizedSnapshot};
use serde_json::Value;

/// Per-field last-known-good store.
///
/// Owned by the refresh cycle. Lives exactly as long as the process and is
/// never persisted, so a restart starts from a clean slate.
#[derive(Debug, Default)]
pub struct LastGoodStore {
    values: HashMap<Field, Value>,
}

impl LastGoodStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a freshly mapped snapshot through the store.
    ///
    /// Non-null values refresh the memo; null values are substituted with
    /// the memoized value when one exists.
    pub fn apply(&mut self, snapshot: &mut NormalizedSnapshot) {
        for field in Field::ALL {
            let current = snapshot.get(field).clone();
            if current.is_null() {
                if let Some(previous) = self.values.get(&field) {
                    snapshot.set(field, previous.clone());
                }
            } else {
                self.values.insert(field, current);
            }
        }
    }

    /// Memoized value for a field, if one was ever observed.
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }
}
