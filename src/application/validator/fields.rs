// Primitive field readers over untyped JSON, each reporting the failing path
use super::error::{ValidationError, ValidationResult};
use super::path::FieldPath;
use crate::domain::number::Measure;
use serde_json::{Map, Value};

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mismatch(path: &FieldPath, expected: &str, found: &Value) -> ValidationError {
    ValidationError::schema(path, format!("expected {expected}, found {}", describe(found)))
}

pub fn object<'a>(value: &'a Value, path: &FieldPath) -> ValidationResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| mismatch(path, "an object", value))
}

pub fn array<'a>(value: &'a Value, path: &FieldPath) -> ValidationResult<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| mismatch(path, "an array", value))
}

/// A present, non-null field. Null and absent both count as missing.
pub fn required<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &FieldPath,
) -> ValidationResult<&'a Value> {
    optional(map, key).ok_or_else(|| ValidationError::schema(&path.key(key), "required field is missing"))
}

pub fn optional<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

pub fn string(value: &Value, path: &FieldPath) -> ValidationResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(path, "a string", value))
}

pub fn non_empty_string(value: &Value, path: &FieldPath) -> ValidationResult<String> {
    let text = string(value, path)?;
    if text.trim().is_empty() {
        return Err(ValidationError::schema(path, "must not be empty"));
    }
    Ok(text)
}

pub fn boolean(value: &Value, path: &FieldPath) -> ValidationResult<bool> {
    value.as_bool().ok_or_else(|| mismatch(path, "a boolean", value))
}

pub fn integer(value: &Value, path: &FieldPath) -> ValidationResult<i64> {
    value.as_i64().ok_or_else(|| mismatch(path, "an integer", value))
}

pub fn unsigned(value: &Value, path: &FieldPath) -> ValidationResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| mismatch(path, "a non-negative integer", value))
}

pub fn measure(value: &Value, path: &FieldPath) -> ValidationResult<Measure> {
    match value {
        Value::Number(number) => Measure::from_number(number.clone())
            .ok_or_else(|| ValidationError::schema(path, "number must be finite")),
        other => Err(mismatch(path, "a number", other)),
    }
}

/// A finite number or `null`.
pub fn nullable_measure(value: Option<&Value>, path: &FieldPath) -> ValidationResult<Option<Measure>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => measure(value, path).map(Some),
    }
}

/// Checks an optional `type` discriminator against its only allowed value.
pub fn type_tag(
    map: &Map<String, Value>,
    expected: &str,
    path: &FieldPath,
) -> ValidationResult<Option<String>> {
    let Some(value) = optional(map, "type") else {
        return Ok(None);
    };
    let tag_path = path.key("type");
    let tag = string(value, &tag_path)?;
    if tag != expected {
        return Err(ValidationError::schema(
            &tag_path,
            format!("expected {expected:?}, found {tag:?}"),
        ));
    }
    Ok(Some(tag))
}

/// Copies every entry whose key is not in `known`.
pub fn remaining(map: &Map<String, Value>, known: &[&str]) -> Map<String, Value> {
    map.iter()
        .filter(|(key, _)| !known.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// `null`, `{}` and `[]` carry nothing.
pub fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_treats_null_as_missing() {
        let doc = json!({"title": null, "size": 6});
        let map = doc.as_object().unwrap();
        let err = required(map, "title", &FieldPath::root()).unwrap_err();
        assert_eq!(err.path().to_string(), "title");
        assert!(required(map, "size", &FieldPath::root()).is_ok());
    }

    #[test]
    fn test_type_mismatch_reason() {
        let err = integer(&json!("3"), &FieldPath::root().key("order")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema violation at order: expected an integer, found a string"
        );
        assert!(integer(&json!(3.5), &FieldPath::root()).is_err());
        assert!(unsigned(&json!(-1), &FieldPath::root()).is_err());
    }

    #[test]
    fn test_empty_payloads() {
        assert!(is_empty_payload(&Value::Null));
        assert!(is_empty_payload(&json!({})));
        assert!(is_empty_payload(&json!([])));
        assert!(!is_empty_payload(&json!({"id": "x"})));
    }
}
