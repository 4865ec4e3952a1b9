//! WASM-GC binary emitter (spec §4.1).
//!
//! New relative to the teacher crate, whose codegen lowers through
//! LLVM IR and `llc` rather than emitting wasm bytes directly — LLVM's
//! wasm backend at the time of the teacher's authorship has no support
//! for the GC proposal's struct/array/rec-group types, so `zena-codegen`
//! targets this crate instead of `inkwell::Builder`.
//!
//! [`BinaryEmitter`] assembles a module section by section: types
//! first (struct/vtable layout needs forward references between
//! mutually recursive classes, see [`BinaryEmitter::reserve_type`]),
//! then imports/functions/tables/memory/globals/tags/exports/start/
//! elements/data, finished off by [`BinaryEmitter::finish`]. Failures
//! are internal compiler bugs (spec §7), never user diagnostics — they
//! surface as [`errors::BinaryEmitError`].

mod constexpr;
mod emitter;
pub mod errors;
mod leb;
mod module;
mod types;

pub use constexpr::ConstExpr;
pub use emitter::BinaryEmitter;
pub use errors::BinaryEmitError;
pub use module::{ExportKind, ImportKind};
pub use types::{CompositeType, FieldType, HeapType, RefType, StorageType, SubType, ValType};
