//! Layerforge - editable trees of UI component layers
//!
//! Layerforge keeps an in-memory tree of component instances ("layers") for
//! a visual UI builder. New layers are seeded with default props derived
//! from their component's shape, and every structural edit (insert, remove,
//! duplicate, reorder, update) produces a new tree version that shares
//! untouched subtrees with the previous one.
//!
//! # Architecture
//!
//! The codebase is layered, leaves first:
//!
//! - [`schema`] - Shape descriptions, normalization, default derivation, coercion
//! - [`core`] - Domain types, the layer tree, id generation, verification, config
//! - [`registry`] - Component catalog the session looks components up in
//! - [`session`] - Tree plus selection; the only mutation surface
//!
//! # Correctness Invariants
//!
//! Layerforge maintains the following invariants:
//!
//! 1. Layer ids are unique within a tree
//! 2. Text layers never have children
//! 3. The selection, if set, always resolves in the current tree
//! 4. Default props are a pure function of the shape and the seed

pub mod core;
pub mod registry;
pub mod schema;
pub mod session;
