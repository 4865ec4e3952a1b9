#![warn(clippy::pedantic)]
//! Shared AST node set for the Zena compiler.
//!
//! Every phase downstream of parsing — `zena_checker`, `zena_codegen` —
//! consumes the tree defined here. Nodes are plain tagged-variant enums
//! (see [`nodes`]): there is no downcasting escape hatch, every match must
//! be exhaustive.
//!
//! Inferred types and resolved bindings are *not* stored on the nodes
//! themselves. They live in side tables keyed by [`NodeId`], built by
//! `zena_checker` and consulted by `zena_codegen`. This keeps the tree
//! immutable after parsing and avoids threading `RefCell` through every
//! expression variant.

pub mod diagnostic;
pub mod ids;
pub mod location;
pub mod module;
pub mod nodes;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use ids::{ModuleId, NodeId};
pub use location::Location;
