//! schema::derive
//!
//! Default props for new component layers.
//!
//! # Contract
//!
//! - Only required top-level fields are produced. Nested objects also get
//!   their optional fields, except those whose kind cannot be derived.
//! - Output depends only on the shape and the seed: the same inputs give
//!   byte-identical JSON.
//! - An array whose element cannot be derived becomes `[]`.
//! - Any other required field whose kind has no derivation strategy (`any`,
//!   unsupported kinds, empty enums or unions) fails the whole derivation
//!   with a [`DerivationError`] naming the field path. Nothing is replaced
//!   by `null`.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use thiserror::Error;

use super::normalize::NormalizedShape;
use super::shape::{Coercion, ObjectShape, Shape};
use crate::core::layer::Props;

/// Seed used when nothing else is configured.
pub const DEFAULT_SEED: u64 = 1234;

/// Days between the Unix epoch and 2024-01-01, the base for derived dates.
const DATE_BASE_DAYS: i64 = 19_723;

const WORDS: &[&str] = &[
    "amber", "birch", "cobalt", "delta", "ember", "fjord", "granite", "harbor", "indigo",
    "juniper", "kestrel", "lumen", "meadow", "nova", "orbit", "prairie",
];

const NAMES: &[&str] = &[
    "Ada Park", "Bruno Diaz", "Chen Wei", "Dana Okafor", "Eli Novak", "Farah Haddad",
];

/// A required field whose value cannot be synthesized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot derive a default for required field '{path}': {reason}")]
pub struct DerivationError {
    /// Dotted field path, with `[i]` for array and tuple positions.
    pub path: String,
    pub reason: String,
}

/// Derive minimal default props for a normalized shape.
///
/// # Errors
///
/// Returns [`DerivationError`] if a required field cannot be synthesized.
///
/// # Example
///
/// ```
/// use layerforge::schema::derive::derive;
/// use layerforge::schema::normalize::normalize;
/// use layerforge::schema::shape::{ObjectShape, Shape};
///
/// let shape = normalize(
///     &ObjectShape::new()
///         .field("label", Shape::String)
///         .field("tone", Shape::enumeration_with_default(["calm", "loud"], "calm"))
///         .field("hint", Shape::optional(Shape::String)),
/// );
///
/// let props = derive(&shape, 1234).unwrap();
/// assert!(props["label"].is_string());
/// assert_eq!(props["tone"], "calm");
/// assert!(!props.contains_key("hint"));
/// assert_eq!(props, derive(&shape, 1234).unwrap());
/// ```
pub fn derive(shape: &NormalizedShape, seed: u64) -> Result<Props, DerivationError> {
    let mut rng = StdRng::seed_from_u64(seed);
    derive_object(shape.as_object(), "", true, &mut rng)
}

/// With `required_only` unset, optional fields are derived too and dropped
/// only when their kind cannot be.
fn derive_object(
    object: &ObjectShape,
    path: &str,
    required_only: bool,
    rng: &mut StdRng,
) -> Result<Map<String, Value>, DerivationError> {
    let mut out = Map::new();
    for field in object.fields() {
        let optional = field.shape.is_optional();
        if optional && required_only {
            continue;
        }
        let field_path = join(path, &field.name);
        let value = match derive_value(&field.shape, &field_path, &field.name, rng) {
            Ok(value) => value,
            Err(_) if optional => continue,
            Err(e) => return Err(e),
        };
        out.insert(field.name.clone(), value);
    }
    Ok(out)
}

/// `key` is the nearest enclosing field name, used to pick plausible strings.
fn derive_value(
    shape: &Shape,
    path: &str,
    key: &str,
    rng: &mut StdRng,
) -> Result<Value, DerivationError> {
    match shape {
        Shape::String => Ok(Value::String(sample_string(key, rng))),
        Shape::Number
        | Shape::Coerced {
            target: Coercion::Number,
        } => Ok(Value::from(rng.random_range(0..=1000_u32))),
        Shape::Boolean => Ok(Value::Bool(rng.random())),
        Shape::Date
        | Shape::Coerced {
            target: Coercion::Date,
        } => Ok(Value::String(sample_date(rng))),
        Shape::Literal { value } => Ok(value.to_value()),
        Shape::Enum { values, default } => match default {
            Some(default) if values.contains(default) => Ok(Value::String(default.clone())),
            _ if values.is_empty() => Err(unsupported(path, "enum has no values")),
            _ => Ok(Value::String(
                values[rng.random_range(0..values.len())].clone(),
            )),
        },
        Shape::Union { options } => match options.first() {
            Some(first) => derive_value(first, path, key, rng),
            None => Err(unsupported(path, "union has no options")),
        },
        Shape::Object(object) => derive_object(object, path, false, rng).map(Value::Object),
        Shape::Array { element } => {
            let len = rng.random_range(1..=3_usize);
            let first = match derive_value(element, &format!("{path}[0]"), key, rng) {
                Ok(first) => first,
                Err(_) => return Ok(Value::Array(Vec::new())),
            };
            let mut items = vec![first];
            for i in 1..len {
                items.push(derive_value(element, &format!("{path}[{i}]"), key, rng)?);
            }
            Ok(Value::Array(items))
        }
        Shape::Tuple { items } => items
            .iter()
            .enumerate()
            .map(|(i, item)| derive_value(item, &format!("{path}[{i}]"), key, rng))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Shape::Record { value } => {
            let mut out = Map::new();
            let entry_key = WORDS[rng.random_range(0..WORDS.len())].to_string();
            let entry = derive_value(value, &join(path, &entry_key), key, rng)?;
            out.insert(entry_key, entry);
            Ok(Value::Object(out))
        }
        Shape::Optional { inner } | Shape::Nullable { inner } => {
            derive_value(inner, path, key, rng)
        }
        Shape::Any => Err(unsupported(path, "`any` has no derivation strategy")),
        Shape::Unsupported { name } => Err(unsupported(
            path,
            &format!("`{name}` has no derivation strategy"),
        )),
    }
}

fn unsupported(path: &str, reason: &str) -> DerivationError {
    tracing::debug!(path, reason, "default derivation failed");
    DerivationError {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn sample_string(key: &str, rng: &mut StdRng) -> String {
    let is_id = key == "id" || key.ends_with("Id") || key.ends_with("_id");
    let key = key.to_ascii_lowercase();
    let word = WORDS[rng.random_range(0..WORDS.len())];

    if key.contains("email") {
        format!("{word}{}@example.com", rng.random_range(1..100_u32))
    } else if is_id {
        (0..8)
            .map(|_| char::from_digit(rng.random_range(0..16_u32), 16).unwrap_or('0'))
            .collect()
    } else if key.contains("url") || key.contains("href") || key.contains("link") {
        format!("https://example.com/{word}")
    } else if key.contains("name") || key.contains("customer") {
        NAMES[rng.random_range(0..NAMES.len())].to_string()
    } else {
        let second = WORDS[rng.random_range(0..WORDS.len())];
        format!("{word} {second}")
    }
}

fn sample_date(rng: &mut StdRng) -> String {
    let days = DATE_BASE_DAYS + rng.random_range(0..366_i64);
    let date = DateTime::<Utc>::UNIX_EPOCH + Duration::days(days);
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
