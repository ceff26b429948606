use serde::Serialize;
use serde_json::{Map, Value};

pub fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_value(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch,
    }
}

pub fn merge_patch<P: Serialize>(document: &mut Value, patch: &P) -> Result<(), serde_json::Error> {
    let patch = serde_json::to_value(patch)?;
    if !document.is_object() {
        *document = Value::Object(Map::new());
    }
    merge_value(document, patch);
    Ok(())
}
