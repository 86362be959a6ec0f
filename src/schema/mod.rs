//! schema
//!
//! Component shapes and what is computed from them.
//!
//! # Modules
//!
//! - [`shape`] - Shape descriptions and their JSON form
//! - [`normalize`] - Canonical rewriting of declared shapes
//! - [`derive`] - Deterministic default props
//! - [`coerce`] - Runtime coercion of loosely typed props
//!
//! # Pipeline
//!
//! A declared [`ObjectShape`] is normalized once, when its component is
//! registered. Defaults are derived from the normalized form when a layer is
//! created; coercion runs when props are checked against it.

pub mod coerce;
pub mod derive;
pub mod normalize;
pub mod shape;

pub use coerce::{coerce_props, CoerceError};
pub use derive::{derive, DerivationError, DEFAULT_SEED};
pub use normalize::{normalize, NormalizedShape, CLASS_NAME_FIELD};
pub use shape::{Coercion, Field, Literal, ObjectShape, Shape};

use thiserror::Error;

/// Errors from reading shape definitions.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid shape for '{component}': {message}")]
    InvalidShape { component: String, message: String },

    #[error("shape for '{component}' must be an object, found {found}")]
    NotAnObject { component: String, found: String },
}

/// Parse a component's declared shape from JSON.
///
/// The top level must be an object shape.
///
/// # Errors
///
/// Returns [`SchemaError`] for malformed JSON, a non-object shape, or an
/// enum whose default is not one of its values.
pub fn parse_object_shape(
    component: &str,
    value: serde_json::Value,
) -> Result<ObjectShape, SchemaError> {
    let invalid = |message: String| SchemaError::InvalidShape {
        component: component.to_string(),
        message,
    };
    let shape: Shape = serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
    if let Some(default) = stray_enum_default(&shape) {
        return Err(invalid(format!(
            "enum default '{default}' is not one of its values"
        )));
    }
    match shape {
        Shape::Object(object) => Ok(object),
        other => Err(SchemaError::NotAnObject {
            component: component.to_string(),
            found: other.kind_name().to_string(),
        }),
    }
}

/// First enum default, anywhere in `shape`, that is not among its values.
fn stray_enum_default(shape: &Shape) -> Option<&str> {
    match shape {
        Shape::Enum {
            values,
            default: Some(default),
        } if !values.contains(default) => Some(default.as_str()),
        Shape::Union { options } => options.iter().find_map(stray_enum_default),
        Shape::Tuple { items } => items.iter().find_map(stray_enum_default),
        Shape::Object(object) => object
            .fields()
            .iter()
            .find_map(|f| stray_enum_default(&f.shape)),
        Shape::Array { element: inner }
        | Shape::Record { value: inner }
        | Shape::Optional { inner }
        | Shape::Nullable { inner } => stray_enum_default(inner),
        _ => None,
    }
}
