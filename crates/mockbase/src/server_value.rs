//! Placeholders for values the server computes at write time.

use serde_json::{Map, Value};

const SV_KEY: &str = ".sv";

/// Server-computed value placeholders.
#[derive(Debug, Clone, Copy)]
pub struct ServerValue;

impl ServerValue {
    pub const TIMESTAMP: &'static str = "timestamp";

    /// Placeholder replaced by the clock's time when written.
    pub fn timestamp() -> Value {
        let mut placeholder = Map::with_capacity(1);
        placeholder.insert(SV_KEY.to_string(), Value::from(Self::TIMESTAMP));
        Value::Object(placeholder)
    }
}

/// Replace every server value placeholder in `value` using `now_millis`.
///
/// Placeholders with an unknown `.sv` name are left as they are.
///
/// # Example
///
/// ```
/// use mockbase::{resolve_server_values, ServerValue};
/// use serde_json::json;
///
/// let value = json!({"at": ServerValue::timestamp(), "n": 1});
/// assert_eq!(resolve_server_values(&value, 42), json!({"at": 42, "n": 1}));
/// ```
pub fn resolve_server_values(value: &Value, now_millis: i64) -> Value {
    match value {
        Value::Object(map) if is_timestamp(map) => Value::from(now_millis),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_server_values(v, now_millis)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| resolve_server_values(v, now_millis))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_timestamp(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get(SV_KEY).and_then(Value::as_str) == Some(ServerValue::TIMESTAMP)
}
