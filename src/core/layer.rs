//! core::layer
//!
//! Layer nodes.
//!
//! A [`Layer`] is either a component instance (registry type, props and
//! ordered children) or a text leaf. Children are held as `Arc<Layer>` so
//! successive tree versions share every subtree an edit did not touch.
//!
//! # Wire shape
//!
//! Layers serialize to the shape the presentation layer consumes:
//!
//! ```json
//! { "id": "a1B2c3D", "type": "Button", "props": {}, "children": [] }
//! { "id": "x9Y8z7W", "type": "_text_", "text": "Hi", "textType": "markdown" }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::types::{ComponentType, LayerId, TextType};

/// Component props: an ordered JSON object.
pub type Props = Map<String, Value>;

/// One node of a layer tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Layer {
    /// A text leaf (`type: "_text_"`).
    Text(TextLayer),
    /// A component instance.
    Component(ComponentLayer),
}

/// A component instance with props and ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLayer {
    pub id: LayerId,
    #[serde(rename = "type")]
    pub component_type: ComponentType,
    #[serde(default)]
    pub props: Props,
    #[serde(default)]
    pub children: Vec<Arc<Layer>>,
}

/// A text leaf. Text layers never have children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub id: LayerId,
    #[serde(rename = "type")]
    marker: TextMarker,
    pub text: String,
    pub text_type: TextType,
}

/// Serde marker pinning `type` to the text sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
enum TextMarker {
    #[default]
    #[serde(rename = "_text_")]
    Text,
}

impl ComponentLayer {
    /// Create a component layer with no children.
    pub fn new(id: LayerId, component_type: ComponentType, props: Props) -> Self {
        Self {
            id,
            component_type,
            props,
            children: Vec::new(),
        }
    }

    /// Builder-style child append, mostly useful for assembling fixtures.
    pub fn with_child(mut self, child: impl Into<Layer>) -> Self {
        self.children.push(Arc::new(child.into()));
        self
    }

    /// The same component with a replaced children sequence.
    pub(crate) fn with_children(&self, children: Vec<Arc<Layer>>) -> Self {
        Self {
            id: self.id.clone(),
            component_type: self.component_type.clone(),
            props: self.props.clone(),
            children,
        }
    }
}

impl TextLayer {
    /// Create a text layer.
    pub fn new(id: LayerId, text: impl Into<String>, text_type: TextType) -> Self {
        Self {
            id,
            marker: TextMarker::Text,
            text: text.into(),
            text_type,
        }
    }
}

impl From<ComponentLayer> for Layer {
    fn from(layer: ComponentLayer) -> Self {
        Layer::Component(layer)
    }
}

impl From<TextLayer> for Layer {
    fn from(layer: TextLayer) -> Self {
        Layer::Text(layer)
    }
}

impl Layer {
    /// The layer's id.
    pub fn id(&self) -> &LayerId {
        match self {
            Layer::Component(c) => &c.id,
            Layer::Text(t) => &t.id,
        }
    }

    /// The registry type name, or `_text_` for text layers.
    pub fn type_name(&self) -> &str {
        match self {
            Layer::Component(c) => c.component_type.as_str(),
            Layer::Text(_) => super::types::TEXT_LAYER_TYPE,
        }
    }

    /// Whether this is a text leaf.
    pub fn is_text(&self) -> bool {
        matches!(self, Layer::Text(_))
    }

    pub fn as_component(&self) -> Option<&ComponentLayer> {
        match self {
            Layer::Component(c) => Some(c),
            Layer::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextLayer> {
        match self {
            Layer::Text(t) => Some(t),
            Layer::Component(_) => None,
        }
    }

    /// Direct children; always empty for text layers.
    pub fn children(&self) -> &[Arc<Layer>] {
        match self {
            Layer::Component(c) => &c.children,
            Layer::Text(_) => &[],
        }
    }

    /// Apply a payload patch, producing the updated layer.
    ///
    /// Components shallow-merge `patch` into their props (patch keys win).
    /// Text layers read an optional string `text` and an optional
    /// `textType`; anything absent or ill-typed keeps the current value.
    pub fn with_payload(&self, patch: &Props) -> Layer {
        match self {
            Layer::Component(c) => {
                let mut props = c.props.clone();
                for (key, value) in patch {
                    props.insert(key.clone(), value.clone());
                }
                Layer::Component(ComponentLayer {
                    props,
                    ..c.clone()
                })
            }
            Layer::Text(t) => {
                let text = patch
                    .get("text")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .unwrap_or_else(|| t.text.clone());
                let text_type = patch
                    .get("textType")
                    .and_then(Value::as_str)
                    .and_then(|s| TextType::parse(s).ok())
                    .unwrap_or(t.text_type);
                Layer::Text(TextLayer {
                    text,
                    text_type,
                    ..t.clone()
                })
            }
        }
    }

    /// Deep-copy this subtree, giving every node an id from `next_id`.
    pub fn duplicate_with(&self, next_id: &mut impl FnMut() -> LayerId) -> Layer {
        match self {
            Layer::Text(t) => Layer::Text(TextLayer {
                id: next_id(),
                ..t.clone()
            }),
            Layer::Component(c) => {
                let id = next_id();
                let children = c
                    .children
                    .iter()
                    .map(|child| Arc::new(child.duplicate_with(next_id)))
                    .collect();
                Layer::Component(ComponentLayer {
                    id,
                    component_type: c.component_type.clone(),
                    props: c.props.clone(),
                    children,
                })
            }
        }
    }

    /// Visit this layer and its descendants in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Layer)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }
}
