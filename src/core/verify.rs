//! core::verify
//!
//! Layer tree and selection verification.
//!
//! # Modes
//!
//! - **Fast verify**: tree and selection only
//!   - Ensure ids are unique across the tree
//!   - Ensure the selection resolves
//!
//! - **Full verify**: also checks against a registry
//!   - Ensure every component type is registered
//!   - Ensure no component carries a `children` prop
//!
//! # Invariants
//!
//! - Never mutates the tree
//! - Must be deterministic: errors are reported in pre-order

use std::collections::HashSet;

use thiserror::Error;

use super::tree::LayerTree;
use super::types::LayerId;
use crate::registry::ComponentRegistry;

/// Errors from verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("layer id appears more than once: {0}")]
    DuplicateId(LayerId),

    #[error("selected layer does not exist: {0}")]
    DanglingSelection(LayerId),

    #[error("layer {id} has unregistered component type '{component}'")]
    UnknownComponentType { id: LayerId, component: String },

    #[error("layer {0} carries children as a prop")]
    ChildrenProp(LayerId),
}

/// Result of verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }

    fn from_errors(errors: Vec<VerifyError>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failure(errors)
        }
    }
}

/// Perform fast verification of a tree and its selection.
pub fn fast_verify(tree: &LayerTree, selected: Option<&LayerId>) -> VerifyResult {
    VerifyResult::from_errors(fast_errors(tree, selected))
}

/// Perform full verification against `registry`.
pub fn full_verify<R: ComponentRegistry + ?Sized>(
    tree: &LayerTree,
    selected: Option<&LayerId>,
    registry: &R,
) -> VerifyResult {
    let mut errors = fast_errors(tree, selected);

    for component in tree.iter().filter_map(|layer| layer.as_component()) {
        if registry.get(component.component_type.as_str()).is_none() {
            errors.push(VerifyError::UnknownComponentType {
                id: component.id.clone(),
                component: component.component_type.to_string(),
            });
        }
        if component.props.contains_key("children") {
            errors.push(VerifyError::ChildrenProp(component.id.clone()));
        }
    }

    VerifyResult::from_errors(errors)
}

fn fast_errors(tree: &LayerTree, selected: Option<&LayerId>) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for layer in tree {
        if !seen.insert(layer.id()) {
            errors.push(VerifyError::DuplicateId(layer.id().clone()));
        }
    }

    if let Some(id) = selected {
        if !seen.contains(id) {
            errors.push(VerifyError::DanglingSelection(id.clone()));
        }
    }

    errors
}
