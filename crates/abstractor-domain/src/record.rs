//! Record merging - folding per-chunk partial records into one

use serde_json::Value;

/// Fold an ordered list of per-chunk partial records into one merged record.
///
/// Records must be supplied in chunk-index order. For any field present as
/// non-null in more than one record, the value from the latest record wins.
/// A later null never overwrites an earlier non-null value. Nested mappings
/// are merged key-by-key recursively; lists and scalars are replaced
/// wholesale.
///
/// Non-object records (a backend returning a bare list or scalar) are
/// skipped rather than merged.
pub fn merge_records(records: &[Value]) -> Value {
    let mut merged = Value::Object(serde_json::Map::new());
    for record in records {
        if record.is_object() {
            merge_into(&mut merged, record);
        }
    }
    merged
}

/// Merge `incoming` into `base`, branching on the value tag.
fn merge_into(base: &mut Value, incoming: &Value) {
    let (Value::Object(base_map), Value::Object(incoming_map)) = (base, incoming) else {
        return;
    };

    for (key, incoming_value) in incoming_map {
        match incoming_value {
            // Null never displaces an earlier value.
            Value::Null => {
                base_map.entry(key.clone()).or_insert(Value::Null);
            }
            // Mappings merge field-by-field, not wholesale.
            Value::Object(_) => {
                let slot = base_map
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(serde_json::Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(serde_json::Map::new());
                }
                merge_into(slot, incoming_value);
            }
            // Scalars and lists: latest non-null occurrence wins.
            _ => {
                base_map.insert(key.clone(), incoming_value.clone());
            }
        }
    }
}
