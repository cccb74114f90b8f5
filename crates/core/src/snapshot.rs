//! Field snapshots and structural diffs.
//!
//! A snapshot is the baseline used for dirty checking: the field values of an object at
//! registration (or at its last successful commit). Comparing a fresh capture against
//! the baseline yields the set of changed fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{EntityError, EntityResult};

/// Field name used when an entity does not serialize to a JSON object.
pub const SCALAR_FIELD: &str = "value";

/// Immutable mapping from field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<String, JsonValue>,
}

/// A single field whose value differs between two snapshots.
///
/// `old` is `None` when the field did not exist in the baseline, `new` is `None` when it
/// no longer exists in the current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<JsonValue>,
    pub new: Option<JsonValue>,
}

impl Snapshot {
    pub fn new(fields: BTreeMap<String, JsonValue>) -> Self {
        Self { fields }
    }

    /// Capture the serialized fields of `value`.
    pub fn capture<T: Serialize + ?Sized>(
        entity_type: &'static str,
        value: &T,
    ) -> EntityResult<Self> {
        let json = serde_json::to_value(value).map_err(|e| EntityError::snapshot(entity_type, e))?;
        Ok(Self::from_value(json))
    }

    pub fn from_value(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => Self {
                fields: map.into_iter().collect(),
            },
            other => {
                let mut fields = BTreeMap::new();
                fields.insert(SCALAR_FIELD.to_string(), other);
                Self { fields }
            }
        }
    }

    pub fn into_value(self) -> JsonValue {
        JsonValue::Object(self.fields.into_iter().collect())
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compare `current` against this baseline, field by field.
    ///
    /// Changes are reported in field-name order.
    pub fn diff(&self, current: &Snapshot) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        for (field, old) in &self.fields {
            match current.fields.get(field) {
                Some(new) if new == old => {}
                new => changes.push(FieldChange {
                    field: field.clone(),
                    old: Some(old.clone()),
                    new: new.cloned(),
                }),
            }
        }

        for (field, new) in &current.fields {
            if !self.fields.contains_key(field) {
                changes.push(FieldChange {
                    field: field.clone(),
                    old: None,
                    new: Some(new.clone()),
                });
            }
        }

        changes.sort_by(|a, b| a.field.cmp(&b.field));
        changes
    }

    pub fn differs_from(&self, current: &Snapshot) -> bool {
        self != current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Account {
        id: i64,
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn captures_struct_fields() {
        let snap = Snapshot::capture(
            "account",
            &Account {
                id: 1,
                name: "ops".to_string(),
                tags: vec![],
            },
        )
        .unwrap();

        assert_eq!(snap.len(), 3);
        assert_eq!(snap.get("name"), Some(&json!("ops")));
    }

    #[test]
    fn scalars_land_under_a_single_field() {
        let snap = Snapshot::from_value(json!(42));
        assert_eq!(snap.get(SCALAR_FIELD), Some(&json!(42)));
    }

    #[test]
    fn diff_reports_changed_added_and_removed_fields() {
        let before = Snapshot::from_value(json!({"a": 1, "b": "x", "c": true}));
        let after = Snapshot::from_value(json!({"a": 1, "b": "y", "d": null}));

        let changes = before.diff(&after);
        let fields: Vec<_> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["b", "c", "d"]);

        assert_eq!(changes[0].old, Some(json!("x")));
        assert_eq!(changes[0].new, Some(json!("y")));
        assert_eq!(changes[1].new, None);
        assert_eq!(changes[2].old, None);
    }

    #[test]
    fn nested_values_compare_structurally() {
        let before = Snapshot::from_value(json!({"tags": ["a", "b"]}));
        let same = Snapshot::from_value(json!({"tags": ["a", "b"]}));
        let reordered = Snapshot::from_value(json!({"tags": ["b", "a"]}));

        assert!(before.diff(&same).is_empty());
        assert_eq!(before.diff(&reordered).len(), 1);
    }

    proptest! {
        #[test]
        fn diff_is_empty_iff_snapshots_are_equal(
            a in proptest::collection::btree_map("[a-d]", 0i64..4, 0..4),
            b in proptest::collection::btree_map("[a-d]", 0i64..4, 0..4),
        ) {
            let to_snapshot = |m: &BTreeMap<String, i64>| {
                Snapshot::new(m.iter().map(|(k, v)| (k.clone(), json!(v))).collect())
            };
            let sa = to_snapshot(&a);
            let sb = to_snapshot(&b);

            prop_assert_eq!(sa.diff(&sb).is_empty(), sa == sb);
            prop_assert!(sa.diff(&sa).is_empty());
        }
    }
}
