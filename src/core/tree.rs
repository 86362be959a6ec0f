//! core::tree
//!
//! The layer tree and its structural operations.
//!
//! # Architecture
//!
//! A [`LayerTree`] is an ordered forest of `Arc<Layer>`. Every operation
//! takes `&self` and returns a new tree:
//!
//! 1. Locate the index path from the root sequence to the target once.
//! 2. Rebuild only the ancestors along that path.
//! 3. Reuse every other subtree by `Arc` clone.
//!
//! Handles into an older tree version stay valid but stale; re-resolve by id.
//!
//! # Permissive operations
//!
//! Operations that reference a missing id, a missing parent, or a text layer
//! as parent return the tree unchanged. They do not report failure; verify
//! with [`LayerTree::find_by_id`] when confirmation matters. The `try_`
//! variants report the same situations as [`ValidationError`].
//!
//! # Example
//!
//! ```
//! use layerforge::core::layer::{ComponentLayer, Props};
//! use layerforge::core::tree::LayerTree;
//! use layerforge::core::types::{ComponentType, LayerId};
//!
//! let card = LayerId::new("card").unwrap();
//! let title = LayerId::new("title").unwrap();
//! let kind = ComponentType::new("Card").unwrap();
//!
//! let tree = LayerTree::new()
//!     .insert(ComponentLayer::new(card.clone(), kind.clone(), Props::new()).into(), None, None)
//!     .insert(ComponentLayer::new(title.clone(), kind, Props::new()).into(), Some(&card), None);
//!
//! assert_eq!(tree.find_parent_of(&title).unwrap().id, card);
//! assert!(tree.remove(&card).is_empty());
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::IdGenerator;
use super::layer::{ComponentLayer, Layer, Props};
use super::types::LayerId;

/// Errors reported by the strict structural operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("parent layer not found: {0}")]
    ParentNotFound(LayerId),

    #[error("layer {0} is a text layer and cannot have children")]
    ParentIsText(LayerId),

    #[error("layer id already present in tree: {0}")]
    DuplicateId(LayerId),

    #[error("ordered ids for '{parent}' are not a permutation of its children")]
    NotAPermutation {
        parent: LayerId,
        expected: Vec<LayerId>,
        found: Vec<LayerId>,
    },
}

/// Index path from the root sequence to a node.
type Path = Vec<usize>;

/// An ordered forest of layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerTree {
    roots: Vec<Arc<Layer>>,
}

impl LayerTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tree from a root sequence.
    pub fn from_roots(roots: Vec<Arc<Layer>>) -> Self {
        Self { roots }
    }

    /// The root-level layers in order.
    pub fn roots(&self) -> &[Arc<Layer>] {
        &self.roots
    }

    /// Whether the tree has no layers at all.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of layers, at every depth.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order iterator over every layer.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    /// The id of every layer in the tree.
    pub fn ids(&self) -> HashSet<LayerId> {
        self.iter().map(|layer| layer.id().clone()).collect()
    }

    /// Whether a layer with `id` exists.
    pub fn contains(&self, id: &LayerId) -> bool {
        self.find_by_id(id).is_some()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Find a layer by id (pre-order, first match).
    pub fn find_by_id(&self, id: &LayerId) -> Option<&Layer> {
        self.iter().find(|layer| layer.id() == id)
    }

    /// Find the component whose direct children contain `id`.
    ///
    /// Returns `None` for root-level layers and for unknown ids.
    pub fn find_parent_of(&self, id: &LayerId) -> Option<&ComponentLayer> {
        let path = self.locate(id)?;
        let (_, parent_path) = path.split_last()?;
        if parent_path.is_empty() {
            return None;
        }
        self.node_at(parent_path)?.as_component()
    }

    /// Ancestors of `id`, nearest first. Empty for roots and unknown ids.
    pub fn ancestors_of(&self, id: &LayerId) -> Vec<&ComponentLayer> {
        let Some(path) = self.locate(id) else {
            return Vec::new();
        };
        (1..path.len())
            .rev()
            .filter_map(|depth| self.node_at(&path[..depth]))
            .filter_map(Layer::as_component)
            .collect()
    }

    // =========================================================================
    // Structural operations
    // =========================================================================

    /// Insert `layer` under `parent_id` (or at root level when `None`).
    ///
    /// `position` is clamped to the sequence length; `None` appends. A
    /// missing parent or a text parent leaves the tree unchanged.
    pub fn insert(
        &self,
        layer: Layer,
        parent_id: Option<&LayerId>,
        position: Option<usize>,
    ) -> LayerTree {
        self.insert_checked(layer, parent_id, position, false)
            .unwrap_or_else(|_| self.clone())
    }

    /// Strict [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// - `ParentNotFound` / `ParentIsText` for an unusable parent
    /// - `DuplicateId` if any id in `layer`'s subtree is already in the tree
    pub fn try_insert(
        &self,
        layer: Layer,
        parent_id: Option<&LayerId>,
        position: Option<usize>,
    ) -> Result<LayerTree, ValidationError> {
        self.insert_checked(layer, parent_id, position, true)
    }

    fn insert_checked(
        &self,
        layer: Layer,
        parent_id: Option<&LayerId>,
        position: Option<usize>,
        check_ids: bool,
    ) -> Result<LayerTree, ValidationError> {
        let container = match parent_id {
            None => Path::new(),
            Some(parent) => self.children_path_of(parent)?,
        };

        if check_ids {
            let existing = self.ids();
            let mut duplicate = None;
            layer.walk(&mut |node| {
                if duplicate.is_none() && existing.contains(node.id()) {
                    duplicate = Some(node.id().clone());
                }
            });
            if let Some(id) = duplicate {
                return Err(ValidationError::DuplicateId(id));
            }
        }

        let node = Arc::new(layer);
        let roots = rebuild(&self.roots, &container, |seq| {
            let mut seq = seq.to_vec();
            let at = position.map_or(seq.len(), |p| p.min(seq.len()));
            seq.insert(at, node);
            seq
        });
        // The container path was just resolved to a component.
        Ok(roots.map(Self::from_roots).unwrap_or_else(|| self.clone()))
    }

    /// Remove the layer `id` and its whole subtree. Unknown ids are a no-op.
    pub fn remove(&self, id: &LayerId) -> LayerTree {
        let Some(path) = self.locate(id) else {
            return self.clone();
        };
        let Some((&index, container)) = path.split_last() else {
            return self.clone();
        };
        rebuild(&self.roots, container, |seq| {
            let mut seq = seq.to_vec();
            seq.remove(index);
            seq
        })
        .map(Self::from_roots)
        .unwrap_or_else(|| self.clone())
    }

    /// Deep-copy the subtree at `id` with fresh ids and append the copy to
    /// the same parent (or the root sequence for a root layer).
    ///
    /// Returns the new tree and the id of the copy's root; unknown ids give
    /// back an unchanged tree and `None`.
    pub fn duplicate(&self, id: &LayerId, ids: &mut IdGenerator) -> (LayerTree, Option<LayerId>) {
        let Some(path) = self.locate(id) else {
            return (self.clone(), None);
        };
        let Some(original) = self.node_at(&path) else {
            return (self.clone(), None);
        };

        let mut taken = self.ids();
        let copy = original.duplicate_with(&mut || ids.fresh(&mut taken));
        let copy_id = copy.id().clone();
        let node = Arc::new(copy);

        let container = &path[..path.len() - 1];
        match rebuild(&self.roots, container, |seq| {
            let mut seq = seq.to_vec();
            seq.push(node);
            seq
        }) {
            Some(roots) => (Self::from_roots(roots), Some(copy_id)),
            None => (self.clone(), None),
        }
    }

    /// Apply a payload patch to layer `id`. Unknown ids are a no-op.
    ///
    /// See [`Layer::with_payload`] for merge semantics.
    pub fn update_payload(&self, id: &LayerId, patch: &Props) -> LayerTree {
        let Some(path) = self.locate(id) else {
            return self.clone();
        };
        let Some((&index, container)) = path.split_last() else {
            return self.clone();
        };
        rebuild(&self.roots, container, |seq| {
            let mut seq = seq.to_vec();
            seq[index] = Arc::new(seq[index].with_payload(patch));
            seq
        })
        .map(Self::from_roots)
        .unwrap_or_else(|| self.clone())
    }

    /// Replace the children of `parent_id` with those named in `ordered_ids`,
    /// in that order.
    ///
    /// Children missing from `ordered_ids` are dropped; ids that are not
    /// children are skipped; a repeated id is kept at its first occurrence
    /// only. Unknown or text parents leave the tree unchanged.
    pub fn reorder_children(&self, parent_id: &LayerId, ordered_ids: &[LayerId]) -> LayerTree {
        self.reorder_checked(parent_id, ordered_ids, false)
            .unwrap_or_else(|_| self.clone())
    }

    /// Strict [`reorder_children`](Self::reorder_children): `ordered_ids`
    /// must be exactly a permutation of the current child ids.
    ///
    /// # Errors
    ///
    /// `ParentNotFound`, `ParentIsText`, or `NotAPermutation`.
    pub fn try_reorder_children(
        &self,
        parent_id: &LayerId,
        ordered_ids: &[LayerId],
    ) -> Result<LayerTree, ValidationError> {
        self.reorder_checked(parent_id, ordered_ids, true)
    }

    fn reorder_checked(
        &self,
        parent_id: &LayerId,
        ordered_ids: &[LayerId],
        strict: bool,
    ) -> Result<LayerTree, ValidationError> {
        let container = self.children_path_of(parent_id)?;
        let current = self.node_at(&container).map(Layer::children).unwrap_or(&[]);

        if strict {
            let expected: Vec<LayerId> = current.iter().map(|c| c.id().clone()).collect();
            let mut want: Vec<&LayerId> = expected.iter().collect();
            let mut got: Vec<&LayerId> = ordered_ids.iter().collect();
            want.sort();
            got.sort();
            if want != got {
                return Err(ValidationError::NotAPermutation {
                    parent: parent_id.clone(),
                    expected,
                    found: ordered_ids.to_vec(),
                });
            }
        }

        let roots = rebuild(&self.roots, &container, |seq| {
            let mut seen = HashSet::new();
            ordered_ids
                .iter()
                .filter(|id| seen.insert(*id))
                .filter_map(|id| seq.iter().find(|child| child.id() == id).cloned())
                .collect()
        });
        Ok(roots.map(Self::from_roots).unwrap_or_else(|| self.clone()))
    }

    // =========================================================================
    // Path helpers
    // =========================================================================

    /// Index path to `id`, searching pre-order.
    fn locate(&self, id: &LayerId) -> Option<Path> {
        let mut path = Path::new();
        locate_in(&self.roots, id, &mut path).then_some(path)
    }

    fn node_at(&self, path: &[usize]) -> Option<&Layer> {
        let (&first, rest) = path.split_first()?;
        let mut node: &Layer = self.roots.get(first)?;
        for &index in rest {
            node = node.children().get(index)?;
        }
        Some(node)
    }

    /// Path addressing the children sequence of component `parent`.
    fn children_path_of(&self, parent: &LayerId) -> Result<Path, ValidationError> {
        let path = self
            .locate(parent)
            .ok_or_else(|| ValidationError::ParentNotFound(parent.clone()))?;
        match self.node_at(&path) {
            Some(Layer::Component(_)) => Ok(path),
            Some(Layer::Text(_)) => Err(ValidationError::ParentIsText(parent.clone())),
            None => Err(ValidationError::ParentNotFound(parent.clone())),
        }
    }
}

fn locate_in(seq: &[Arc<Layer>], id: &LayerId, path: &mut Path) -> bool {
    for (index, layer) in seq.iter().enumerate() {
        path.push(index);
        if layer.id() == id || locate_in(layer.children(), id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Rebuild `seq` with the children sequence addressed by `path` replaced by
/// `edit`'s output. An empty path addresses `seq` itself.
///
/// Only the components along `path` are reallocated. Returns `None` if the
/// path does not lead through components.
fn rebuild(
    seq: &[Arc<Layer>],
    path: &[usize],
    edit: impl FnOnce(&[Arc<Layer>]) -> Vec<Arc<Layer>>,
) -> Option<Vec<Arc<Layer>>> {
    let Some((&index, rest)) = path.split_first() else {
        return Some(edit(seq));
    };
    let component = seq.get(index)?.as_component()?;
    let children = rebuild(&component.children, rest, edit)?;
    let mut out = seq.to_vec();
    out[index] = Arc::new(Layer::Component(component.with_children(children)));
    Some(out)
}

/// Pre-order iterator over a [`LayerTree`].
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a Arc<Layer>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node.as_ref())
    }
}

impl<'a> IntoIterator for &'a LayerTree {
    type Item = &'a Layer;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::IdStrategy;
    use crate::core::layer::TextLayer;
    use crate::core::types::{ComponentType, TextType};
    use serde_json::json;

    fn id(s: &str) -> LayerId {
        LayerId::new(s).unwrap()
    }

    fn component(s: &str) -> Layer {
        ComponentLayer::new(id(s), ComponentType::new("Box").unwrap(), Props::new()).into()
    }

    fn text(s: &str) -> Layer {
        TextLayer::new(id(s), s, TextType::Plain).into()
    }

    fn child_ids(tree: &LayerTree, parent: &str) -> Vec<String> {
        tree.find_by_id(&id(parent))
            .unwrap()
            .children()
            .iter()
            .map(|c| c.id().to_string())
            .collect()
    }

    fn root_ids(tree: &LayerTree) -> Vec<String> {
        tree.roots().iter().map(|c| c.id().to_string()).collect()
    }

    /// a[b[d], c], t
    fn sample() -> LayerTree {
        LayerTree::new()
            .insert(component("a"), None, None)
            .insert(component("b"), Some(&id("a")), None)
            .insert(component("c"), Some(&id("a")), None)
            .insert(component("d"), Some(&id("b")), None)
            .insert(text("t"), None, None)
    }

    #[test]
    fn empty_tree() {
        let tree = LayerTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert!(tree.find_by_id(&id("x")).is_none());
    }

    #[test]
    fn iter_is_preorder() {
        let tree = sample();
        let order: Vec<_> = tree.iter().map(|l| l.id().to_string()).collect();
        assert_eq!(order, vec!["a", "b", "d", "c", "t"]);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn find_parent_of_nested_and_root() {
        let tree = sample();
        assert_eq!(tree.find_parent_of(&id("d")).unwrap().id, id("b"));
        assert_eq!(tree.find_parent_of(&id("c")).unwrap().id, id("a"));
        assert!(tree.find_parent_of(&id("a")).is_none());
        assert!(tree.find_parent_of(&id("missing")).is_none());
    }

    #[test]
    fn ancestors_nearest_first() {
        let tree = sample();
        let ancestors: Vec<_> = tree
            .ancestors_of(&id("d"))
            .iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ancestors, vec!["b", "a"]);
        assert!(tree.ancestors_of(&id("a")).is_empty());
    }

    #[test]
    fn insert_at_position_and_clamped() {
        let tree = sample();
        let tree = tree.insert(component("x"), Some(&id("a")), Some(0));
        assert_eq!(child_ids(&tree, "a"), vec!["x", "b", "c"]);

        let tree = tree.insert(component("y"), Some(&id("a")), Some(99));
        assert_eq!(child_ids(&tree, "a"), vec!["x", "b", "c", "y"]);

        let tree = tree.insert(component("z"), None, Some(1));
        assert_eq!(root_ids(&tree), vec!["a", "z", "t"]);
    }

    #[test]
    fn insert_under_text_or_missing_parent_is_noop() {
        let tree = sample();
        assert_eq!(tree.insert(component("x"), Some(&id("t")), None), tree);
        assert_eq!(tree.insert(component("x"), Some(&id("nope")), None), tree);
    }

    #[test]
    fn try_insert_reports_problems() {
        let tree = sample();
        assert_eq!(
            tree.try_insert(component("x"), Some(&id("t")), None),
            Err(ValidationError::ParentIsText(id("t")))
        );
        assert_eq!(
            tree.try_insert(component("x"), Some(&id("nope")), None),
            Err(ValidationError::ParentNotFound(id("nope")))
        );
        assert_eq!(
            tree.try_insert(component("d"), None, None),
            Err(ValidationError::DuplicateId(id("d")))
        );
        assert!(tree.try_insert(component("x"), Some(&id("a")), None).is_ok());
    }

    #[test]
    fn insert_then_find_roundtrip() {
        let tree = sample();
        let layer = text("fresh");
        let tree = tree.insert(layer.clone(), Some(&id("d")), None);
        assert_eq!(tree.find_by_id(&id("fresh")), Some(&layer));
    }

    #[test]
    fn remove_excises_subtree() {
        let tree = sample().remove(&id("b"));
        assert!(tree.find_by_id(&id("b")).is_none());
        assert!(tree.find_by_id(&id("d")).is_none());
        assert_eq!(child_ids(&tree, "a"), vec!["c"]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn remove_missing_is_noop() {
        let tree = sample();
        assert_eq!(tree.remove(&id("ghost")), tree);
    }

    #[test]
    fn untouched_subtrees_are_shared() {
        let tree = sample();
        let updated = tree.remove(&id("d"));

        // `t` is a sibling of the rebuilt ancestor `a`.
        assert!(Arc::ptr_eq(&tree.roots()[1], &updated.roots()[1]));
        // `c` is a sibling on the rebuilt path.
        let before = &tree.roots()[0].children()[1];
        let after = &updated.roots()[0].children()[1];
        assert!(Arc::ptr_eq(before, after));
        // The original tree is unaffected.
        assert!(tree.find_by_id(&id("d")).is_some());
    }

    #[test]
    fn duplicate_appends_copy_with_fresh_ids() {
        let tree = sample();
        let mut ids = IdGenerator::seeded(IdStrategy::default(), 7);
        let (updated, copy_id) = tree.duplicate(&id("b"), &mut ids);
        let copy_id = copy_id.unwrap();

        let children = child_ids(&updated, "a");
        assert_eq!(children.len(), 3);
        assert_eq!(children[..2], ["b".to_string(), "c".to_string()]);
        assert_eq!(children[2], copy_id.to_string());

        let copy = updated.find_by_id(&copy_id).unwrap();
        assert_eq!(copy.type_name(), "Box");
        assert_eq!(copy.children().len(), 1);
        let grandchild = copy.children()[0].id();
        assert!(!tree.contains(grandchild));
        assert!(!tree.contains(&copy_id));
        assert_eq!(updated.ids().len(), updated.len());
    }

    #[test]
    fn duplicate_root_appends_to_roots() {
        let tree = sample();
        let mut ids = IdGenerator::seeded(IdStrategy::default(), 1);
        let (updated, copy_id) = tree.duplicate(&id("t"), &mut ids);
        let roots = root_ids(&updated);
        assert_eq!(roots.len(), 3);
        assert_eq!(roots[2], copy_id.unwrap().to_string());
    }

    #[test]
    fn duplicate_missing_is_noop() {
        let tree = sample();
        let mut ids = IdGenerator::seeded(IdStrategy::default(), 1);
        let (updated, copy_id) = tree.duplicate(&id("ghost"), &mut ids);
        assert_eq!(updated, tree);
        assert!(copy_id.is_none());
    }

    #[test]
    fn update_payload_nested() {
        let tree = sample();
        let mut patch = Props::new();
        patch.insert("gap".into(), json!(4));
        let updated = tree.update_payload(&id("d"), &patch);
        let d = updated.find_by_id(&id("d")).unwrap().as_component().unwrap();
        assert_eq!(d.props["gap"], json!(4));
        assert!(tree.find_by_id(&id("d")).unwrap().as_component().unwrap().props.is_empty());

        assert_eq!(tree.update_payload(&id("ghost"), &patch), tree);
    }

    #[test]
    fn reorder_permutation_preserved() {
        let tree = sample().insert(component("e"), Some(&id("a")), None);
        let order = [id("e"), id("b"), id("c")];
        let updated = tree.reorder_children(&id("a"), &order);
        assert_eq!(child_ids(&updated, "a"), vec!["e", "b", "c"]);
        assert_eq!(tree.try_reorder_children(&id("a"), &order), Ok(updated));
    }

    #[test]
    fn reorder_filters_and_skips() {
        let tree = sample();
        let updated = tree.reorder_children(&id("a"), &[id("c"), id("zzz"), id("c")]);
        assert_eq!(child_ids(&updated, "a"), vec!["c"]);
        assert!(updated.find_by_id(&id("zzz")).is_none());
    }

    #[test]
    fn reorder_invalid_parent_is_noop() {
        let tree = sample();
        assert_eq!(tree.reorder_children(&id("t"), &[]), tree);
        assert_eq!(tree.reorder_children(&id("ghost"), &[]), tree);
    }

    #[test]
    fn try_reorder_rejects_non_permutation() {
        let tree = sample();
        let err = tree
            .try_reorder_children(&id("a"), &[id("c")])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotAPermutation {
                parent: id("a"),
                expected: vec![id("b"), id("c")],
                found: vec![id("c")],
            }
        );
    }

    #[test]
    fn serializes_as_plain_array() {
        let tree = LayerTree::new().insert(text("t"), None, None);
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            value,
            json!([{ "id": "t", "type": "_text_", "text": "t", "textType": "text" }])
        );
        let parsed: LayerTree = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, tree);
    }
}
