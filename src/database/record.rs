use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::filter::ColumnValue;

/// Field change information for diff tracking
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Field-level diff between two snapshots of the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordDiff {
    pub modified: BTreeMap<String, FieldChange>,
}

impl RecordDiff {
    /// Compares the serialized forms of `before` and `after`. Fields present on
    /// only one side count as modified against `null`.
    pub fn between<T: Serialize>(before: &T, after: &T) -> Self {
        let old = to_object(before);
        let new = to_object(after);

        let mut modified = BTreeMap::new();
        for (key, new_value) in &new {
            let old_value = old.get(key).cloned().unwrap_or(Value::Null);
            if &old_value != new_value {
                modified.insert(
                    key.clone(),
                    FieldChange { field: key.clone(), old_value, new_value: new_value.clone() },
                );
            }
        }
        for (key, old_value) in &old {
            if !new.contains_key(key) && !old_value.is_null() {
                modified.insert(
                    key.clone(),
                    FieldChange { field: key.clone(), old_value: old_value.clone(), new_value: Value::Null },
                );
            }
        }

        Self { modified }
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty()
    }

    pub fn changed(&self, field: &str) -> bool {
        self.modified.contains_key(field)
    }

    /// Keeps only the assignments whose column actually changed.
    pub fn select_columns(&self, columns: Vec<ColumnValue>) -> Vec<ColumnValue> {
        columns.into_iter().filter(|c| self.changed(c.column)).collect()
    }

    pub fn fields(&self) -> Vec<&str> {
        self.modified.keys().map(String::as_str).collect()
    }
}

fn to_object<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_only_changed_fields() {
        let before = json!({"title": "Hat", "price": "10.00", "sku": null});
        let after = json!({"title": "Cap", "price": "10.00", "sku": "CAP-1"});
        let diff = RecordDiff::between(&before, &after);

        assert!(diff.changed("title"));
        assert!(diff.changed("sku"));
        assert!(!diff.changed("price"));
        assert_eq!(diff.fields(), vec!["sku", "title"]);
        assert_eq!(diff.modified["sku"].old_value, serde_json::Value::Null);
    }

    #[test]
    fn selects_changed_columns() {
        let diff = RecordDiff::between(&json!({"title": "Hat", "slug": "hat"}), &json!({"title": "Hat", "slug": "cap"}));
        let columns = diff.select_columns(vec![ColumnValue::new("title", "Hat"), ColumnValue::new("slug", "cap")]);
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].column, "slug");
    }

    #[test]
    fn identical_snapshots_produce_empty_diff() {
        let value = json!({"title": "Hat"});
        assert!(RecordDiff::between(&value, &value).is_empty());
    }
}
