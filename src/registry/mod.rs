//! registry
//!
//! Component catalog: type name to render capability and shape.
//!
//! # Overview
//!
//! The session only needs lookups, so it is generic over
//! [`ComponentRegistry`]. [`Registry`] is the in-memory implementation;
//! embedders with their own catalog implement the trait instead.
//!
//! Entries are immutable once registered. Shapes are normalized on
//! registration so lookups never repeat the work.
//!
//! # Definition files
//!
//! ```
//! use layerforge::registry::{ComponentRegistry, Registry};
//!
//! let registry = Registry::from_json(r#"[
//!     {
//!         "name": "Badge",
//!         "render": "@/components/ui/badge",
//!         "shape": {
//!             "kind": "object",
//!             "fields": [{ "name": "label", "shape": { "kind": "string" } }]
//!         }
//!     }
//! ]"#).unwrap();
//!
//! let badge = registry.get("Badge").unwrap();
//! assert!(badge.shape.get("className").is_some());
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{ComponentType, TypeError};
use crate::schema::{normalize, parse_object_shape, NormalizedShape, ObjectShape, SchemaError};

/// Errors from building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("component '{0}' is already registered")]
    Duplicate(ComponentType),

    #[error("invalid component name: {0}")]
    InvalidName(#[from] TypeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("malformed registry definition: {0}")]
    Malformed(String),
}

/// Opaque handle the rendering layer uses to draw a component.
///
/// The core never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderCapability(String);

impl RenderCapability {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One registered component.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub name: ComponentType,
    pub render: RenderCapability,
    pub shape: NormalizedShape,
}

impl RegistryEntry {
    /// Create an entry, normalizing the declared shape.
    pub fn new(name: ComponentType, render: RenderCapability, shape: &ObjectShape) -> Self {
        Self {
            name,
            render,
            shape: normalize(shape),
        }
    }

    /// Create an entry from an already normalized shape.
    pub fn pre_normalized(
        name: ComponentType,
        render: RenderCapability,
        shape: NormalizedShape,
    ) -> Self {
        Self { name, render, shape }
    }
}

/// Read access to a component catalog.
pub trait ComponentRegistry {
    /// Look up a component by type name.
    fn get(&self, name: &str) -> Option<&RegistryEntry>;

    /// All entries, in registration order.
    fn entries(&self) -> Vec<&RegistryEntry>;

    /// Whether `name` is registered.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// In-memory registry preserving registration order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

/// Definition file record.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntryDefinition {
    name: String,
    render: String,
    shape: serde_json::Value,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Duplicate` if the name is taken.
    pub fn register(&mut self, entry: RegistryEntry) -> Result<(), RegistryError> {
        let key = entry.name.as_str().to_string();
        if self.index.contains_key(&key) {
            return Err(RegistryError::Duplicate(entry.name));
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, entry: RegistryEntry) -> Result<Self, RegistryError> {
        self.register(entry)?;
        Ok(self)
    }

    /// Load a registry from a JSON array of `{ name, render, shape }`.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, invalid names or shapes, and
    /// duplicate names.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let definitions: Vec<EntryDefinition> =
            serde_json::from_str(json).map_err(|e| RegistryError::Malformed(e.to_string()))?;

        let mut registry = Self::new();
        for def in definitions {
            let shape = parse_object_shape(&def.name, def.shape)?;
            let name = ComponentType::new(def.name)?;
            registry.register(RegistryEntry::new(name, RenderCapability::new(def.render), &shape))?;
        }
        tracing::debug!(components = registry.len(), "loaded registry definitions");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ComponentRegistry for Registry {
    fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    fn entries(&self) -> Vec<&RegistryEntry> {
        self.entries.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Shape;

    fn entry(name: &str) -> RegistryEntry {
        RegistryEntry::new(
            ComponentType::new(name).unwrap(),
            RenderCapability::new(format!("ui/{name}")),
            &ObjectShape::new().field("label", Shape::String),
        )
    }

    #[test]
    fn register_and_get() {
        let registry = Registry::new().with(entry("Badge")).unwrap().with(entry("Card")).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Badge"));
        assert!(!registry.contains("badge"));
        assert_eq!(registry.get("Card").unwrap().render.as_str(), "ui/Card");

        let names: Vec<_> = registry.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Badge", "Card"]);
    }

    #[test]
    fn shapes_normalized_on_register() {
        let registry = Registry::new().with(entry("Badge")).unwrap();
        let shape = &registry.get("Badge").unwrap().shape;
        assert_eq!(shape.get("className"), Some(&Shape::optional(Shape::String)));
    }

    #[test]
    fn duplicate_rejected() {
        let mut registry = Registry::new();
        registry.register(entry("Badge")).unwrap();
        let err = registry.register(entry("Badge")).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name.as_str() == "Badge"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_json_errors() {
        assert!(matches!(Registry::from_json("{}"), Err(RegistryError::Malformed(_))));

        let bad_name = r#"[{ "name": "_text_", "render": "x", "shape": { "kind": "object" } }]"#;
        assert!(matches!(Registry::from_json(bad_name), Err(RegistryError::InvalidName(_))));

        let bad_shape = r#"[{ "name": "Badge", "render": "x", "shape": { "kind": "array" } }]"#;
        assert!(matches!(Registry::from_json(bad_shape), Err(RegistryError::Schema(_))));
    }
}
