//! schema::coerce
//!
//! Runtime coercion of props against a normalized shape.
//!
//! Coercing fields accept loose input and produce the canonical form:
//!
//! | shape          | accepts                                   | produces             |
//! |----------------|-------------------------------------------|----------------------|
//! | coerced number | number, numeric string, bool, null        | JSON number          |
//! | coerced date   | RFC 3339 / `YYYY-MM-DD` string, epoch ms  | RFC 3339 (UTC, ms)   |
//!
//! Every other kind is checked strictly. Missing enum fields receive their
//! default. Object keys not named by the shape are dropped.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::normalize::NormalizedShape;
use super::shape::{Coercion, ObjectShape, Shape};
use crate::core::layer::Props;

/// Errors from runtime coercion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoerceError {
    #[error("missing required field '{path}'")]
    Missing { path: String },

    #[error("invalid value at '{path}': expected {expected}")]
    Invalid { path: String, expected: String },
}

/// Coerce `props` against `shape`, returning the canonical props.
///
/// # Errors
///
/// Returns the first [`CoerceError`] encountered, in field order.
///
/// # Example
///
/// ```
/// use layerforge::schema::coerce::coerce_props;
/// use layerforge::schema::normalize::normalize;
/// use layerforge::schema::shape::{ObjectShape, Shape};
/// use serde_json::json;
///
/// let shape = normalize(&ObjectShape::new().field("amount", Shape::Number));
/// let props = json!({ "amount": " 42 " }).as_object().unwrap().clone();
///
/// let coerced = coerce_props(&shape, &props).unwrap();
/// assert_eq!(coerced["amount"], json!(42));
/// ```
pub fn coerce_props(shape: &NormalizedShape, props: &Props) -> Result<Props, CoerceError> {
    coerce_object(shape.as_object(), props, "")
}

fn coerce_object(
    object: &ObjectShape,
    input: &Map<String, Value>,
    path: &str,
) -> Result<Map<String, Value>, CoerceError> {
    let mut out = Map::new();
    for field in object.fields() {
        let field_path = join(path, &field.name);
        if let Some(value) = coerce_value(&field.shape, input.get(&field.name), &field_path)? {
            out.insert(field.name.clone(), value);
        }
    }
    Ok(out)
}

/// `None` input means the key was absent; `None` output means it stays absent.
fn coerce_value(
    shape: &Shape,
    input: Option<&Value>,
    path: &str,
) -> Result<Option<Value>, CoerceError> {
    match (shape, input) {
        (Shape::Optional { .. }, None) => Ok(None),
        (Shape::Optional { inner }, Some(_)) => coerce_value(inner, input, path),
        (Shape::Nullable { .. }, Some(Value::Null)) => Ok(Some(Value::Null)),
        (Shape::Nullable { inner }, _) => coerce_value(inner, input, path),
        (Shape::Any, _) => Ok(input.cloned()),
        (
            Shape::Enum {
                values,
                default: Some(default),
            },
            None,
        ) if values.contains(default) => Ok(Some(Value::String(default.clone()))),
        (_, None) => Err(CoerceError::Missing {
            path: path.to_string(),
        }),
        (_, Some(value)) => coerce_present(shape, value, path).map(Some),
    }
}

fn coerce_present(shape: &Shape, value: &Value, path: &str) -> Result<Value, CoerceError> {
    let invalid = |expected: &str| CoerceError::Invalid {
        path: path.to_string(),
        expected: expected.to_string(),
    };

    match shape {
        Shape::String => value
            .is_string()
            .then(|| value.clone())
            .ok_or_else(|| invalid("string")),
        Shape::Boolean => value
            .is_boolean()
            .then(|| value.clone())
            .ok_or_else(|| invalid("boolean")),
        Shape::Number => value
            .is_number()
            .then(|| value.clone())
            .ok_or_else(|| invalid("number")),
        Shape::Date => value
            .as_str()
            .and_then(parse_date)
            .map(Value::String)
            .ok_or_else(|| invalid("date string")),
        Shape::Coerced {
            target: Coercion::Number,
        } => coerce_number(value).ok_or_else(|| invalid("number-like value")),
        Shape::Coerced {
            target: Coercion::Date,
        } => coerce_date(value).ok_or_else(|| invalid("date-like value")),
        Shape::Literal { value: literal } => literal
            .matches(value)
            .then(|| value.clone())
            .ok_or_else(|| invalid(&format!("literal {}", literal.to_value()))),
        Shape::Enum { values, .. } => value
            .as_str()
            .filter(|s| values.iter().any(|v| v == s))
            .map(|_| value.clone())
            .ok_or_else(|| invalid(&format!("one of {}", values.join(", ")))),
        Shape::Union { options } => options
            .iter()
            .find_map(|option| coerce_value(option, Some(value), path).ok().flatten())
            .ok_or_else(|| invalid("a value matching one of the union options")),
        Shape::Object(object) => match value {
            Value::Object(map) => coerce_object(object, map, path).map(Value::Object),
            _ => Err(invalid("object")),
        },
        Shape::Array { element } => match value {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    coerce_value(element, Some(item), &format!("{path}[{i}]"))
                        .map(|v| v.unwrap_or(Value::Null))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(invalid("array")),
        },
        Shape::Tuple { items } => match value {
            Value::Array(values) if values.len() == items.len() => items
                .iter()
                .zip(values)
                .enumerate()
                .map(|(i, (item, v))| {
                    coerce_value(item, Some(v), &format!("{path}[{i}]"))
                        .map(|v| v.unwrap_or(Value::Null))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            _ => Err(invalid(&format!("array of length {}", items.len()))),
        },
        Shape::Record { value: inner } => match value {
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, v) in map {
                    let coerced = coerce_value(inner, Some(v), &join(path, key))?;
                    out.insert(key.clone(), coerced.unwrap_or(Value::Null));
                }
                Ok(Value::Object(out))
            }
            _ => Err(invalid("object")),
        },
        Shape::Any => Ok(value.clone()),
        Shape::Optional { inner } | Shape::Nullable { inner } => coerce_present(inner, value, path),
        Shape::Unsupported { name } => Err(invalid(name)),
    }
}

/// Loose numeric conversion: numbers pass, numeric strings parse (blank is
/// zero), booleans map to 0/1 and null to 0. Non-finite results are rejected.
fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::Bool(b) => Some(Value::from(u8::from(*b))),
        Value::Null => Some(Value::from(0)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Some(Value::from(0));
            }
            if let Ok(n) = s.parse::<i64>() {
                return Some(Value::from(n));
            }
            s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Loose date conversion to RFC 3339 with millisecond precision in UTC.
fn coerce_date(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) => parse_date(s).map(Value::String),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<String> {
    let s = s.trim();
    let parsed = DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;
    Some(parsed.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::normalize::normalize;
    use serde_json::json;

    fn props(value: Value) -> Props {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn numbers_coerce_loosely() {
        let shape = normalize(&ObjectShape::new().field("n", Shape::Number));
        let cases = [
            (json!(3), json!(3)),
            (json!("7"), json!(7)),
            (json!("2.5"), json!(2.5)),
            (json!(""), json!(0)),
            (json!(true), json!(1)),
            (json!(null), json!(0)),
        ];
        for (input, expected) in cases {
            let out = coerce_props(&shape, &props(json!({ "n": input }))).unwrap();
            assert_eq!(out["n"], expected);
        }
        assert!(coerce_props(&shape, &props(json!({ "n": "seven" }))).is_err());
        assert!(coerce_props(&shape, &props(json!({}))).unwrap().is_empty());
    }

    #[test]
    fn dates_coerce_to_rfc3339() {
        let shape = normalize(&ObjectShape::new().field("d", Shape::Date));
        let out = coerce_props(&shape, &props(json!({ "d": "2024-03-05" }))).unwrap();
        assert_eq!(out["d"], json!("2024-03-05T00:00:00.000Z"));

        let input = props(json!({ "d": "2024-03-05T10:00:00+02:00" }));
        let out = coerce_props(&shape, &input).unwrap();
        assert_eq!(out["d"], json!("2024-03-05T08:00:00.000Z"));

        let out = coerce_props(&shape, &props(json!({ "d": 0 }))).unwrap();
        assert_eq!(out["d"], json!("1970-01-01T00:00:00.000Z"));

        assert!(coerce_props(&shape, &props(json!({ "d": "someday" }))).is_err());
    }

    #[test]
    fn enum_default_fills_missing() {
        let shape = normalize(&ObjectShape::new().field(
            "variant",
            Shape::enumeration_with_default(["default", "outline"], "default"),
        ));
        let out = coerce_props(&shape, &Props::new()).unwrap();
        assert_eq!(out["variant"], json!("default"));

        let err = coerce_props(&shape, &props(json!({ "variant": "loud" }))).unwrap_err();
        assert!(matches!(err, CoerceError::Invalid { ref path, .. } if path == "variant"));
    }

    #[test]
    fn missing_required_reported() {
        let shape = normalize(&ObjectShape::new().field("label", Shape::String));
        assert_eq!(
            coerce_props(&shape, &Props::new()),
            Err(CoerceError::Missing {
                path: "label".into()
            })
        );
    }

    #[test]
    fn nullable_accepts_null() {
        let shape = normalize(&ObjectShape::new().field("note", Shape::nullable(Shape::String)));
        let out = coerce_props(&shape, &props(json!({ "note": null }))).unwrap();
        assert_eq!(out["note"], Value::Null);
    }

    #[test]
    fn unknown_keys_dropped() {
        let shape = normalize(&ObjectShape::new().field("label", Shape::String));
        let input = props(json!({ "label": "x", "children": [1, 2] }));
        let out = coerce_props(&shape, &input).unwrap();
        assert_eq!(Value::Object(out), json!({ "label": "x" }));
    }

    #[test]
    fn nested_paths_in_errors() {
        let shape = normalize(&ObjectShape::new().field(
            "data",
            Shape::array(Shape::Object(ObjectShape::new().field("email", Shape::String))),
        ));
        let input = props(json!({ "data": [{ "email": "a@b.c" }, { "email": 5 }] }));
        let err = coerce_props(&shape, &input).unwrap_err();
        assert_eq!(
            err,
            CoerceError::Invalid {
                path: "data[1].email".into(),
                expected: "string".into()
            }
        );
    }

    #[test]
    fn unions_try_options_in_order() {
        let shape = normalize(&ObjectShape::new().field(
            "v",
            Shape::union([Shape::Boolean, Shape::Number]),
        ));
        let out = coerce_props(&shape, &props(json!({ "v": "12" }))).unwrap();
        assert_eq!(out["v"], json!(12));
        let out = coerce_props(&shape, &props(json!({ "v": false }))).unwrap();
        assert_eq!(out["v"], json!(false));
    }

    #[test]
    fn number_literals_match_integers() {
        let declared = json!({
            "kind": "object",
            "fields": [{ "name": "one", "shape": { "kind": "literal", "value": 1 } }]
        });
        let shape = normalize(&crate::schema::parse_object_shape("Pin", declared).unwrap());

        let out = coerce_props(&shape, &props(json!({ "one": 1 }))).unwrap();
        assert_eq!(out["one"], json!(1));
        assert!(coerce_props(&shape, &props(json!({ "one": 1.0 }))).is_ok());

        let err = coerce_props(&shape, &props(json!({ "one": 2 }))).unwrap_err();
        assert_eq!(
            err,
            CoerceError::Invalid {
                path: "one".into(),
                expected: "literal 1".into()
            }
        );
    }

    #[test]
    fn mixed_literal_union_accepts_integer() {
        let shape = normalize(&ObjectShape::new().field(
            "level",
            Shape::union([Shape::literal("a"), Shape::literal(1.0)]),
        ));
        let out = coerce_props(&shape, &props(json!({ "level": 1 }))).unwrap();
        assert_eq!(out["level"], json!(1));
        let out = coerce_props(&shape, &props(json!({ "level": "a" }))).unwrap();
        assert_eq!(out["level"], json!("a"));
        assert!(coerce_props(&shape, &props(json!({ "level": 2 }))).is_err());
    }

    #[test]
    fn enum_default_outside_values_is_not_filled() {
        let shape = normalize(&ObjectShape::new().field(
            "tone",
            Shape::enumeration_with_default(["calm", "loud"], "shrill"),
        ));
        assert_eq!(
            coerce_props(&shape, &Props::new()),
            Err(CoerceError::Missing {
                path: "tone".into()
            })
        );
    }
}
