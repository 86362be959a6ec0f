//! schema::normalize
//!
//! Rewrites a component's declared shape into the canonical form used for
//! default derivation and runtime coercion.
//!
//! # Passes
//!
//! 1. **Enums**: a union made only of string literals becomes a closed
//!    enumeration whose default is the first literal. `Optional` and
//!    `Nullable` wrappers around the union are kept. Unions mixing literal
//!    kinds (`"a" | 1`) are left alone.
//! 2. **Coercion**: `Number` and `Date` become coercing variants wrapped in
//!    `Optional`, whatever the field's original requiredness. Free-form
//!    edits and default generation must never fail on these fields.
//! 3. **Styling**: the top-level object gains `className: Optional(String)`.
//!
//! Passes 1 and 2 recurse through optional, nullable, object, array, tuple
//! and record shapes; pass 2 also maps union options. Normalizing an
//! already normalized shape is a no-op.

use std::ops::Deref;

use serde::Serialize;

use super::shape::{Coercion, Literal, ObjectShape, Shape};

/// Field appended to every normalized shape.
pub const CLASS_NAME_FIELD: &str = "className";

/// A component shape that has been through [`normalize`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedShape(ObjectShape);

impl NormalizedShape {
    pub fn as_object(&self) -> &ObjectShape {
        &self.0
    }

    pub fn into_inner(self) -> ObjectShape {
        self.0
    }
}

impl Deref for NormalizedShape {
    type Target = ObjectShape;

    fn deref(&self) -> &ObjectShape {
        &self.0
    }
}

/// Normalize a component shape.
///
/// # Example
///
/// ```
/// use layerforge::schema::normalize::normalize;
/// use layerforge::schema::shape::{ObjectShape, Shape};
///
/// let declared = ObjectShape::new().field(
///     "size",
///     Shape::union([Shape::literal("sm"), Shape::literal("lg")]),
/// );
/// let normalized = normalize(&declared);
///
/// assert_eq!(
///     normalized.get("size"),
///     Some(&Shape::enumeration_with_default(["sm", "lg"], "sm")),
/// );
/// assert!(normalized.get("className").unwrap().is_optional());
/// ```
pub fn normalize(shape: &ObjectShape) -> NormalizedShape {
    let mut object = shape.map_fields(|field| add_coercion(&unions_to_enums(field)));
    object.insert(CLASS_NAME_FIELD, Shape::optional(Shape::String));
    NormalizedShape(object)
}

fn unions_to_enums(shape: &Shape) -> Shape {
    match shape {
        Shape::Union { options } => match string_literals(options) {
            Some(values) => {
                let default = values[0].clone();
                Shape::Enum {
                    values,
                    default: Some(default),
                }
            }
            None => shape.clone(),
        },
        Shape::Optional { inner } => Shape::optional(unions_to_enums(inner)),
        Shape::Nullable { inner } => Shape::nullable(unions_to_enums(inner)),
        Shape::Object(object) => Shape::Object(object.map_fields(unions_to_enums)),
        Shape::Array { element } => Shape::array(unions_to_enums(element)),
        Shape::Tuple { items } => Shape::tuple(items.iter().map(unions_to_enums)),
        Shape::Record { value } => Shape::record(unions_to_enums(value)),
        other => other.clone(),
    }
}

/// The option values if every option is a string literal; `None` otherwise
/// (including for an empty union).
fn string_literals(options: &[Shape]) -> Option<Vec<String>> {
    if options.is_empty() {
        return None;
    }
    options
        .iter()
        .map(|option| match option {
            Shape::Literal {
                value: Literal::String(s),
            } => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn add_coercion(shape: &Shape) -> Shape {
    match shape {
        Shape::Number => Shape::optional(Shape::Coerced {
            target: Coercion::Number,
        }),
        Shape::Date => Shape::optional(Shape::Coerced {
            target: Coercion::Date,
        }),
        Shape::Optional { inner } => Shape::optional(add_coercion(inner)),
        Shape::Nullable { inner } => Shape::nullable(add_coercion(inner)),
        Shape::Object(object) => Shape::Object(object.map_fields(add_coercion)),
        Shape::Array { element } => Shape::array(add_coercion(element)),
        Shape::Tuple { items } => Shape::tuple(items.iter().map(add_coercion)),
        Shape::Record { value } => Shape::record(add_coercion(value)),
        Shape::Union { options } => Shape::union(options.iter().map(add_coercion)),
        other => other.clone(),
    }
}
