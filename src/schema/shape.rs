//! schema::shape
//!
//! Shape descriptions: a closed set of node kinds describing a component's
//! configurable fields.
//!
//! # JSON form
//!
//! Shapes are internally tagged by `kind`, which lets a registry be loaded
//! from a definition file:
//!
//! ```
//! use layerforge::schema::shape::{ObjectShape, Shape};
//!
//! let json = r#"{
//!     "kind": "object",
//!     "fields": [
//!         { "name": "label", "shape": { "kind": "string" } },
//!         { "name": "size", "shape": { "kind": "optional", "inner": {
//!             "kind": "union", "options": [
//!                 { "kind": "literal", "value": "sm" },
//!                 { "kind": "literal", "value": "lg" }
//!             ]
//!         } } }
//!     ]
//! }"#;
//!
//! let shape: Shape = serde_json::from_str(json).unwrap();
//! let expected = Shape::Object(
//!     ObjectShape::new()
//!         .field("label", Shape::String)
//!         .field("size", Shape::optional(Shape::union([
//!             Shape::literal("sm"),
//!             Shape::literal("lg"),
//!         ]))),
//! );
//! assert_eq!(shape, expected);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of a shape description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    String,
    Number,
    Boolean,
    Date,
    /// Accepts anything; has no default.
    Any,
    Literal {
        value: Literal,
    },
    /// Closed set of string values, optionally with a default member.
    Enum {
        values: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Union {
        options: Vec<Shape>,
    },
    Object(ObjectShape),
    Array {
        element: Box<Shape>,
    },
    Tuple {
        items: Vec<Shape>,
    },
    /// String-keyed map with uniform values.
    Record {
        value: Box<Shape>,
    },
    Optional {
        inner: Box<Shape>,
    },
    Nullable {
        inner: Box<Shape>,
    },
    /// A number or date that accepts loosely typed input.
    Coerced {
        target: Coercion,
    },
    /// A kind this crate cannot reason about (functions, promises, ...).
    Unsupported {
        name: String,
    },
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Literal {
    /// JSON form. Whole numbers within `i64` range become integers.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Number(n) if is_whole(*n) => Value::from(*n as i64),
            Literal::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::String(s) => Value::String(s.clone()),
        }
    }

    /// Whether `value` is this constant. Numbers compare by value, so `1`
    /// matches `1.0`.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Bool(b), Value::Bool(v)) => b == v,
            (Literal::Number(n), Value::Number(v)) => v.as_f64() == Some(*n),
            (Literal::String(s), Value::String(v)) => s == v,
            _ => false,
        }
    }
}

fn is_whole(n: f64) -> bool {
    n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64
}

/// Target of a coercing shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coercion {
    Number,
    Date,
}

/// A named field of an object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
}

/// An object shape: ordered, uniquely named fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectShape {
    #[serde(default)]
    fields: Vec<Field>,
}

impl ObjectShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn field(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.insert(name, shape);
        self
    }

    /// Add a field, replacing any existing field of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, shape: Shape) {
        let name = name.into();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.shape = shape,
            None => self.fields.push(Field { name, shape }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.shape)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fields whose shape does not accept absence.
    pub fn required_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| !f.shape.is_optional())
    }

    /// A copy with every field shape passed through `f`.
    pub fn map_fields(&self, mut f: impl FnMut(&Shape) -> Shape) -> ObjectShape {
        ObjectShape {
            fields: self
                .fields
                .iter()
                .map(|field| Field {
                    name: field.name.clone(),
                    shape: f(&field.shape),
                })
                .collect(),
        }
    }
}

impl Shape {
    /// Wrap in `Optional`, without stacking a second `Optional`.
    pub fn optional(inner: Shape) -> Shape {
        match inner {
            Shape::Optional { .. } => inner,
            other => Shape::Optional {
                inner: Box::new(other),
            },
        }
    }

    /// Wrap in `Nullable`, without stacking a second `Nullable`.
    pub fn nullable(inner: Shape) -> Shape {
        match inner {
            Shape::Nullable { .. } => inner,
            other => Shape::Nullable {
                inner: Box::new(other),
            },
        }
    }

    pub fn array(element: Shape) -> Shape {
        Shape::Array {
            element: Box::new(element),
        }
    }

    pub fn tuple(items: impl IntoIterator<Item = Shape>) -> Shape {
        Shape::Tuple {
            items: items.into_iter().collect(),
        }
    }

    pub fn record(value: Shape) -> Shape {
        Shape::Record {
            value: Box::new(value),
        }
    }

    pub fn union(options: impl IntoIterator<Item = Shape>) -> Shape {
        Shape::Union {
            options: options.into_iter().collect(),
        }
    }

    pub fn literal(value: impl Into<Literal>) -> Shape {
        Shape::Literal {
            value: value.into(),
        }
    }

    /// Closed enumeration without a default.
    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Shape {
        Shape::Enum {
            values: values.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    /// Closed enumeration with a default member.
    pub fn enumeration_with_default<S: Into<String>>(
        values: impl IntoIterator<Item = S>,
        default: impl Into<String>,
    ) -> Shape {
        Shape::Enum {
            values: values.into_iter().map(Into::into).collect(),
            default: Some(default.into()),
        }
    }

    pub fn unsupported(name: impl Into<String>) -> Shape {
        Shape::Unsupported { name: name.into() }
    }

    /// Whether a field of this shape may be absent.
    ///
    /// `Nullable` is transparent here: a nullable optional field is
    /// optional, a nullable required field is required.
    pub fn is_optional(&self) -> bool {
        match self {
            Shape::Optional { .. } => true,
            Shape::Nullable { inner } => inner.is_optional(),
            _ => false,
        }
    }

    /// Short human-readable kind name, used in error messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Shape::String => "string",
            Shape::Number => "number",
            Shape::Boolean => "boolean",
            Shape::Date => "date",
            Shape::Any => "any",
            Shape::Literal { .. } => "literal",
            Shape::Enum { .. } => "enum",
            Shape::Union { .. } => "union",
            Shape::Object(_) => "object",
            Shape::Array { .. } => "array",
            Shape::Tuple { .. } => "tuple",
            Shape::Record { .. } => "record",
            Shape::Optional { .. } => "optional",
            Shape::Nullable { .. } => "nullable",
            Shape::Coerced {
                target: Coercion::Number,
            } => "coerced number",
            Shape::Coerced {
                target: Coercion::Date,
            } => "coerced date",
            Shape::Unsupported { name } => name.as_str(),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<ObjectShape> for Shape {
    fn from(object: ObjectShape) -> Self {
        Shape::Object(object)
    }
}
