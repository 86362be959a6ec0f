//! core
//!
//! Core domain types, the layer tree, and its supporting services.
//!
//! # Modules
//!
//! - [`types`] - Strong types: LayerId, ComponentType, TextType
//! - [`layer`] - Layer nodes and their wire form
//! - [`tree`] - Layer tree representation and structural operations
//! - [`ids`] - Layer id generation
//! - [`verify`] - Verification of tree and selection invariants
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Tree versions are immutable; edits produce new versions
//! - All verification is deterministic

pub mod config;
pub mod ids;
pub mod layer;
pub mod tree;
pub mod types;
pub mod verify;
