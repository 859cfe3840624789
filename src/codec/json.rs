//! Plain JSON documents: a pretty-printed array of nodes.

use serde_json::Value;

use super::CodecError;
use crate::model::KpiNode;

pub fn serialize(forest: &[KpiNode]) -> Result<String, CodecError> {
    let mut out = serde_json::to_string_pretty(forest)?;
    out.push('\n');
    Ok(out)
}

/// Parse a JSON document. The top-level value must be an array; each element
/// must carry at least `id` and `name`.
pub fn deserialize(text: &str) -> Result<Vec<KpiNode>, CodecError> {
    let value: Value = serde_json::from_str(text)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(CodecError::NotAnArray {
                found: json_kind(&other),
            });
        }
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|source| CodecError::MalformedNode { index, source })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
