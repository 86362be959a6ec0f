//! session
//!
//! The editing session: a layer tree, the current selection, and the
//! component registry that seeds new layers.
//!
//! # Overview
//!
//! A [`Session`] is the only mutation surface. Each operation replaces the
//! tree with a new version built by [`LayerTree`]'s copy-on-write operations,
//! then reconciles the selection so it never names a missing layer.
//!
//! # Structural no-ops
//!
//! Operations that reference a missing layer, a missing parent, or a text
//! layer as parent leave the session unchanged. They report this through
//! their return value (`false` / `None`) instead of an error. With
//! [`SessionSettings::strict`] set, the add and reorder operations return
//! [`SessionError::Validation`] instead.
//!
//! # Example
//!
//! ```
//! use layerforge::registry::{Registry, RegistryEntry, RenderCapability};
//! use layerforge::schema::{ObjectShape, Shape};
//! use layerforge::core::types::ComponentType;
//! use layerforge::session::Session;
//!
//! let registry = Registry::new()
//!     .with(RegistryEntry::new(
//!         ComponentType::new("Badge").unwrap(),
//!         RenderCapability::new("ui/badge"),
//!         &ObjectShape::new()
//!             .field("label", Shape::String)
//!             .field("outline", Shape::optional(Shape::Boolean)),
//!     ))
//!     .unwrap();
//!
//! let mut session = Session::new(registry);
//! let id = session.add_component_layer("Badge", None, None).unwrap().unwrap();
//!
//! let layer = session.find_layer_by_id(&id).unwrap().as_component().unwrap();
//! assert!(layer.props.contains_key("label"));
//! assert!(!layer.props.contains_key("outline"));
//!
//! assert!(session.select_layer(&id));
//! assert!(session.remove_layer(&id));
//! assert!(session.selected_layer_id().is_none());
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::core::ids::{IdGenerator, IdStrategy};
use crate::core::layer::{ComponentLayer, Layer, Props, TextLayer};
use crate::core::tree::{LayerTree, ValidationError};
use crate::core::types::{LayerId, TextType};
use crate::registry::{ComponentRegistry, Registry, RegistryEntry};
use crate::schema::{coerce_props, derive, CoerceError, DerivationError, DEFAULT_SEED};

/// Prop key never carried by a component layer; children are structural.
const CHILDREN_PROP: &str = "children";

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown component type: {0}")]
    UnknownComponentType(String),

    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Coerce(#[from] CoerceError),

    #[error("layer not found: {0}")]
    LayerNotFound(LayerId),

    #[error("layer {0} is not a component layer")]
    NotAComponent(LayerId),
}

/// Knobs for a session, usually built by
/// [`Config::session_settings`](crate::core::config::Config::session_settings).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Seed for default-prop derivation
    pub derive_seed: u64,
    /// How new layer ids are produced
    pub id_strategy: IdStrategy,
    /// Fixed id seed; `None` seeds from the OS
    pub id_seed: Option<u64>,
    /// Report structural no-ops of add and reorder as errors
    pub strict: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            derive_seed: DEFAULT_SEED,
            id_strategy: IdStrategy::default(),
            id_seed: None,
            strict: false,
        }
    }
}

/// An editing session over one layer tree.
#[derive(Debug)]
pub struct Session<R: ComponentRegistry = Registry> {
    registry: R,
    tree: LayerTree,
    selected: Option<LayerId>,
    ids: IdGenerator,
    settings: SessionSettings,
}

impl<R: ComponentRegistry> Session<R> {
    /// Start an empty session with default settings.
    pub fn new(registry: R) -> Self {
        Self::with_settings(registry, SessionSettings::default())
    }

    /// Start an empty session.
    pub fn with_settings(registry: R, settings: SessionSettings) -> Self {
        let ids = match settings.id_seed {
            Some(seed) => IdGenerator::seeded(settings.id_strategy, seed),
            None => IdGenerator::new(settings.id_strategy),
        };
        Self {
            registry,
            tree: LayerTree::new(),
            selected: None,
            ids,
            settings,
        }
    }

    // =========================================================================
    // Read access
    // =========================================================================

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Registered components, in registration order.
    pub fn components(&self) -> Vec<&RegistryEntry> {
        self.registry.entries()
    }

    /// The current tree version.
    pub fn tree(&self) -> &LayerTree {
        &self.tree
    }

    /// Root layers of the current tree.
    pub fn layers(&self) -> &[Arc<Layer>] {
        self.tree.roots()
    }

    pub fn selected_layer_id(&self) -> Option<&LayerId> {
        self.selected.as_ref()
    }

    pub fn selected_layer(&self) -> Option<&Layer> {
        self.selected.as_ref().and_then(|id| self.tree.find_by_id(id))
    }

    pub fn find_layer_by_id(&self, id: &LayerId) -> Option<&Layer> {
        self.tree.find_by_id(id)
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a new component layer of type `component` with derived default
    /// props and no children.
    ///
    /// Returns the new id, or `None` if the parent was unusable and the
    /// session is permissive.
    ///
    /// # Errors
    ///
    /// - `UnknownComponentType` if the registry has no such component
    /// - `Derivation` if a required prop cannot be derived
    /// - `Validation` for an unusable parent in strict mode
    pub fn add_component_layer(
        &mut self,
        component: &str,
        parent_id: Option<&LayerId>,
        position: Option<usize>,
    ) -> Result<Option<LayerId>, SessionError> {
        let entry = self
            .registry
            .get(component)
            .ok_or_else(|| SessionError::UnknownComponentType(component.to_string()))?;

        let mut props = derive(&entry.shape, self.settings.derive_seed)?;
        props.shift_remove(CHILDREN_PROP);
        let component_type = entry.name.clone();

        let id = self.fresh_id();
        let layer = ComponentLayer::new(id.clone(), component_type, props);
        let added = self.insert(layer.into(), parent_id, position)?;
        if added {
            debug!(layer = %id, component, parent = ?parent_id, "added component layer");
        }
        Ok(added.then_some(id))
    }

    /// Add a new text layer.
    ///
    /// Returns the new id, or `None` if the parent was unusable and the
    /// session is permissive.
    ///
    /// # Errors
    ///
    /// `Validation` for an unusable parent in strict mode.
    pub fn add_text_layer(
        &mut self,
        text: impl Into<String>,
        text_type: TextType,
        parent_id: Option<&LayerId>,
        position: Option<usize>,
    ) -> Result<Option<LayerId>, SessionError> {
        let id = self.fresh_id();
        let layer = TextLayer::new(id.clone(), text, text_type);
        let added = self.insert(layer.into(), parent_id, position)?;
        if added {
            debug!(layer = %id, %text_type, parent = ?parent_id, "added text layer");
        }
        Ok(added.then_some(id))
    }

    /// Deep-copy layer `id` with fresh ids, appended to the same parent.
    ///
    /// Returns the id of the copy, or `None` if `id` does not exist.
    pub fn duplicate_layer(&mut self, id: &LayerId) -> Option<LayerId> {
        let (tree, copy) = self.tree.duplicate(id, &mut self.ids);
        match &copy {
            Some(copy_id) => {
                debug!(layer = %id, copy = %copy_id, "duplicated layer");
                self.tree = tree;
            }
            None => debug!(layer = %id, "duplicate skipped: layer not found"),
        }
        copy
    }

    /// Remove layer `id` and its subtree.
    ///
    /// The selection moves to the removed layer's parent; for a root layer,
    /// to the first remaining root if it is a component; otherwise it is
    /// cleared. Returns `false`, leaving the selection alone, if `id` does
    /// not exist.
    pub fn remove_layer(&mut self, id: &LayerId) -> bool {
        if !self.tree.contains(id) {
            debug!(layer = %id, "remove skipped: layer not found");
            return false;
        }

        let parent = self.tree.find_parent_of(id).map(|p| p.id.clone());
        self.tree = self.tree.remove(id);
        self.selected = parent.or_else(|| {
            self.tree
                .roots()
                .first()
                .filter(|root| !root.is_text())
                .map(|root| root.id().clone())
        });

        debug!(layer = %id, selected = ?self.selected, "removed layer");
        true
    }

    /// Apply a payload patch to layer `id`.
    ///
    /// Component layers shallow-merge `patch` into their props; text layers
    /// take `text` and `textType` from it. Returns `false` if `id` does not
    /// exist.
    pub fn update_layer_props(&mut self, id: &LayerId, patch: &Props) -> bool {
        if !self.tree.contains(id) {
            debug!(layer = %id, "update skipped: layer not found");
            return false;
        }
        self.tree = self.tree.update_payload(id, patch);
        self.reconcile_selection();
        debug!(layer = %id, keys = patch.len(), "updated layer");
        true
    }

    /// Select layer `id`. Returns `false`, keeping the current selection,
    /// if it does not exist.
    pub fn select_layer(&mut self, id: &LayerId) -> bool {
        if !self.tree.contains(id) {
            debug!(layer = %id, "select skipped: layer not found");
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Replace the children of `parent_id` with those named in `ordered_ids`.
    ///
    /// Permissive sessions filter and reindex: unknown ids are skipped and
    /// omitted children are dropped. Strict sessions require an exact
    /// permutation.
    ///
    /// # Errors
    ///
    /// `Validation` in strict mode, for an unusable parent or a list that is
    /// not a permutation of the current children.
    pub fn reorder_children_layers(
        &mut self,
        parent_id: &LayerId,
        ordered_ids: &[LayerId],
    ) -> Result<(), SessionError> {
        if self.settings.strict {
            self.tree = self.tree.try_reorder_children(parent_id, ordered_ids)?;
        } else {
            self.tree = self.tree.reorder_children(parent_id, ordered_ids);
        }
        self.reconcile_selection();
        debug!(parent = %parent_id, count = ordered_ids.len(), "reordered children");
        Ok(())
    }

    /// Coerce the props of component layer `id` against its registered
    /// shape, returning the canonical props. The tree is not modified.
    ///
    /// # Errors
    ///
    /// - `LayerNotFound` / `NotAComponent` for a bad `id`
    /// - `UnknownComponentType` if the component is no longer registered
    /// - `Coerce` if the props do not satisfy the shape
    pub fn validate_layer_props(&self, id: &LayerId) -> Result<Props, SessionError> {
        let layer = self
            .tree
            .find_by_id(id)
            .ok_or_else(|| SessionError::LayerNotFound(id.clone()))?;
        let component = layer
            .as_component()
            .ok_or_else(|| SessionError::NotAComponent(id.clone()))?;
        let entry = self
            .registry
            .get(component.component_type.as_str())
            .ok_or_else(|| {
                SessionError::UnknownComponentType(component.component_type.to_string())
            })?;

        Ok(coerce_props(&entry.shape, &component.props)?)
    }

    /// Drop every layer and the selection.
    pub fn reset(&mut self) {
        self.tree = LayerTree::new();
        self.selected = None;
        debug!("session reset");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn fresh_id(&mut self) -> LayerId {
        let mut taken = self.tree.ids();
        self.ids.fresh(&mut taken)
    }

    /// Insert under the session's strictness. Returns whether the tree changed.
    fn insert(
        &mut self,
        layer: Layer,
        parent_id: Option<&LayerId>,
        position: Option<usize>,
    ) -> Result<bool, SessionError> {
        match self.tree.try_insert(layer, parent_id, position) {
            Ok(tree) => {
                self.tree = tree;
                Ok(true)
            }
            Err(err) if self.settings.strict => Err(err.into()),
            Err(err) => {
                debug!(error = %err, "insert skipped");
                Ok(false)
            }
        }
    }

    fn reconcile_selection(&mut self) {
        if let Some(id) = &self.selected {
            if !self.tree.contains(id) {
                debug!(layer = %id, "selection cleared: layer no longer exists");
                self.selected = None;
            }
        }
    }
}
