//! The normalized snapshot produced by each refresh cycle.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::fields::{Field, FieldGroup};

/// Flat mapping from declared field to scalar value.
///
/// Every declared [`Field`] always has an entry, regardless of fetch
/// outcome; missing data surfaces as `Value::Null`, never as a missing key.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSnapshot {
    values: BTreeMap<Field, Value>,
    taken_at: DateTime<Utc>,
}

impl NormalizedSnapshot {
    /// Snapshot with every declared field set to null, stamped now.
    pub fn empty() -> Self {
        let values = Field::ALL.into_iter().map(|f| (f, Value::Null)).collect();
        Self {
            values,
            taken_at: Utc::now(),
        }
    }

    /// When this snapshot was produced.
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Value for `field`. Declared fields are always present.
    pub fn get(&self, field: Field) -> &Value {
        self.values.get(&field).unwrap_or(&Value::Null)
    }

    /// Replace the value for `field`.
    pub fn set(&mut self, field: Field, value: Value) {
        self.values.insert(field, value);
    }

    /// Fields of one group, in declaration order.
    pub fn group(&self, group: FieldGroup) -> impl Iterator<Item = (Field, &Value)> {
        Field::ALL
            .into_iter()
            .filter(move |f| f.group() == group)
            .map(|f| (f, self.get(f)))
    }

    /// Iterate all fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &Value)> {
        Field::ALL.into_iter().map(|f| (f, self.get(f)))
    }

    /// Nested `{group: {field: value}}` object for the snapshot file.
    pub fn to_parsed_json(&self) -> Value {
        let mut parsed = Map::new();
        for group in FieldGroup::ALL {
            let mut entries = Map::new();
            for (field, value) in self.group(group) {
                entries.insert(field.name().to_string(), value.clone());
            }
            parsed.insert(group.as_str().to_string(), Value::Object(entries));
        }
        Value::Object(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_snapshot_has_every_declared_field() {
        let snapshot = NormalizedSnapshot::empty();
        assert_eq!(snapshot.iter().count(), Field::ALL.len());
        for (_, value) in snapshot.iter() {
            assert_eq!(value, &Value::Null);
        }
    }

    #[test]
    fn parsed_json_nests_by_group_with_all_keys() {
        let mut snapshot = NormalizedSnapshot::empty();
        snapshot.set(Field::Temperature, json!(28));
        snapshot.set(Field::NowSpeed, json!(0));

        let parsed = snapshot.to_parsed_json();
        assert_eq!(parsed["battery"]["temperature"], json!(28));
        assert_eq!(parsed["motor"]["nowSpeed"], json!(0));
        // Unset fields are present as null, not absent.
        assert_eq!(parsed["position"]["lat"], Value::Null);
        assert_eq!(parsed["last_track"]["track_thumb"], Value::Null);

        for group in FieldGroup::ALL {
            let entries = parsed[group.as_str()].as_object().unwrap();
            let declared = Field::ALL.iter().filter(|f| f.group() == group).count();
            assert_eq!(entries.len(), declared, "group {group}");
        }
    }

    #[test]
    fn same_wire_name_in_different_groups_does_not_collide() {
        let mut snapshot = NormalizedSnapshot::empty();
        snapshot.set(Field::BatteryConnected, json!(true));
        snapshot.set(Field::MotorConnected, json!(false));

        let parsed = snapshot.to_parsed_json();
        assert_eq!(parsed["battery"]["isConnected"], json!(true));
        assert_eq!(parsed["motor"]["isConnected"], json!(false));
    }
}
