#![warn(clippy::pedantic)]
//! The module loader and import/re-export resolver (spec §4.3) —
//! component C3.
//!
//! [`ModuleGraph::load`] walks every module reachable from an entry
//! point through a pluggable [`Host`], tolerating import cycles and
//! resolving `export * from` wildcards. It has no opinion on lexical
//! syntax: callers supply the parse function.

pub mod graph;
pub mod host;
pub mod memory_host;

pub use graph::ModuleGraph;
pub use host::{Host, HostError, Target};
pub use memory_host::MemoryHost;
