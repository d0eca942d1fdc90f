//! Read-response shapes accepted from the collection endpoints.

use serde_json::Value;
use shared::domain::Record;

use crate::error::TransportError;

const ENVELOPE_FIELD: &str = "data";

/// Unwraps an optional `{ "data": ... }` envelope and normalises the payload.
pub fn decode_collection(payload: Value) -> Result<Vec<Record>, TransportError> {
    match payload {
        Value::Object(mut map) if map.contains_key(ENVELOPE_FIELD) => {
            let inner = map.remove(ENVELOPE_FIELD).unwrap_or(Value::Null);
            normalize_collection(inner)
        }
        other => normalize_collection(other),
    }
}

/// Arrays pass through, a lone object becomes a one-element list and null is empty.
pub fn normalize_collection(value: Value) -> Result<Vec<Record>, TransportError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(vec![Record::from_map(map)]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                Record::try_from(item).map_err(|other| {
                    TransportError::Decode(format!(
                        "collection item {idx} is not an object: {other}"
                    ))
                })
            })
            .collect(),
        other => Err(TransportError::Decode(format!(
            "expected a list of records, got {other}"
        ))),
    }
}
