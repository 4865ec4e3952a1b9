#![warn(clippy::pedantic)]
//! The type universe (spec §3.2/§4.2) — component C2.
//!
//! [`TypeUniverse`] owns every semantic [`Type`] produced during a single
//! compile. Two syntactic usages that denote the same semantic type
//! always get back the *same* [`TypeId`] — see [`TypeUniverse`]'s
//! interning contract. The checker reads and interns; the code generator
//! only reads.

mod assignability;
mod errors;
mod ty;
mod universe;

pub use errors::TypeUniverseError;
pub use ty::{
    ArrayType, ClassType, EnumType, FunctionType, InterfaceType, PrimitiveKind, RecordType, Type,
    TypeAliasType, TypeId, TypeParameterType,
};
pub use universe::TypeUniverse;
