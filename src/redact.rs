use serde_json::Value;

const SECRET_KEYS: &[&str] = &["access_token", "refresh_token", "id_token", "client_secret"];

/// Describes an upstream body for the logs without reproducing its values.
///
/// Objects are reduced to their keys, with secret-bearing keys marked; anything
/// else is reduced to its JSON kind and byte length.
pub fn summarize_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => {
            let keys: Vec<String> = map
                .keys()
                .map(|key| {
                    if SECRET_KEYS.contains(&key.as_str()) {
                        format!("{}=[redacted]", key)
                    } else {
                        key.clone()
                    }
                })
                .collect();
            format!("object {{{}}}", keys.join(", "))
        }
        Ok(other) => format!("{} ({} bytes)", kind(&other), body.len()),
        Err(_) => format!("non-json ({} bytes)", body.len()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
