//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`LayerId`] - Validated layer identifier
//! - [`ComponentType`] - Registry key naming a component kind
//! - [`TextType`] - How a text layer's content is interpreted
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use layerforge::core::types::{ComponentType, LayerId};
//!
//! let id = LayerId::new("a1B2c3D").unwrap();
//! let kind = ComponentType::new("Button").unwrap();
//! assert_eq!(id.as_str(), "a1B2c3D");
//! assert_eq!(kind.as_str(), "Button");
//!
//! // Invalid constructions fail at creation time
//! assert!(LayerId::new("").is_err());
//! assert!(ComponentType::new("_text_").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The `type` value reserved for text layers.
pub const TEXT_LAYER_TYPE: &str = "_text_";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid layer id: {0}")]
    InvalidLayerId(String),

    #[error("invalid component type: {0}")]
    InvalidComponentType(String),

    #[error("invalid text type '{0}', expected 'text' or 'markdown'")]
    InvalidTextType(String),
}

/// A validated layer identifier.
///
/// Ids are non-empty and made of ASCII alphanumerics, `-` or `_`. Both the
/// short random ids and hyphenated UUIDs produced by
/// [`IdGenerator`](super::ids::IdGenerator) satisfy this.
///
/// # Example
///
/// ```
/// use layerforge::core::types::LayerId;
///
/// assert!(LayerId::new("Xy7Qp0a").is_ok());
/// assert!(LayerId::new("0f8c2d9e-2b1a-4c7e-9a55-1f2e3d4c5b6a").is_ok());
///
/// assert!(LayerId::new("").is_err());
/// assert!(LayerId::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LayerId(String);

impl LayerId {
    /// Create a new validated layer id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidLayerId` if the id is empty or contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::InvalidLayerId("layer id cannot be empty".into()));
        }
        if let Some(c) = id
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(TypeError::InvalidLayerId(format!(
                "layer id cannot contain '{}'",
                c.escape_default()
            )));
        }
        Ok(Self(id))
    }

    /// Wrap an id produced by the crate's own generator.
    pub(crate) fn from_generated(id: String) -> Self {
        debug_assert!(Self::new(id.as_str()).is_ok());
        Self(id)
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LayerId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for LayerId {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<LayerId> for String {
    fn from(id: LayerId) -> Self {
        id.0
    }
}

impl AsRef<str> for LayerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A component registry key such as `Button` or `Badge`.
///
/// Cannot be empty, cannot contain whitespace, and cannot be the text
/// sentinel [`TEXT_LAYER_TYPE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentType(String);

impl ComponentType {
    /// Create a new validated component type.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidComponentType` for empty names, names with
    /// whitespace or control characters, and the text sentinel.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidComponentType(
                "component type cannot be empty".into(),
            ));
        }
        if name == TEXT_LAYER_TYPE {
            return Err(TypeError::InvalidComponentType(format!(
                "'{TEXT_LAYER_TYPE}' is reserved for text layers"
            )));
        }
        if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidComponentType(format!(
                "component type '{}' cannot contain whitespace",
                name.escape_default()
            )));
        }
        Ok(Self(name))
    }

    /// Get the type name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ComponentType {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ComponentType> for String {
    fn from(name: ComponentType) -> Self {
        name.0
    }
}

impl AsRef<str> for ComponentType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the content of a text layer is interpreted by the presentation layer.
///
/// Serialized as `"text"` or `"markdown"`; `"plain"` is accepted as an alias
/// for [`TextType::Plain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextType {
    #[default]
    #[serde(rename = "text", alias = "plain")]
    Plain,
    #[serde(rename = "markdown")]
    Markdown,
}

impl TextType {
    /// Parse a text type from its wire name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidTextType` for anything other than
    /// `text`, `plain` or `markdown`.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "text" | "plain" => Ok(TextType::Plain),
            "markdown" => Ok(TextType::Markdown),
            other => Err(TypeError::InvalidTextType(other.to_string())),
        }
    }

    /// The wire name of this text type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextType::Plain => "text",
            TextType::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for TextType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
