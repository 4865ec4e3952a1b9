use thiserror::Error;

use crate::ty::TypeId;

/// Internal errors — states spec §7 calls "impossible": a compiler bug,
/// never a user error. These abort compilation.
#[derive(Debug, Error)]
pub enum TypeUniverseError {
    #[error("type id {0:?} does not refer to a registered type")]
    UnknownTypeId(TypeId),

    #[error("type {0:?} was read as a class before its fields were populated")]
    ClassNotPopulated(TypeId),

    #[error("type {0:?} was read as an interface before its members were populated")]
    InterfaceNotPopulated(TypeId),

    #[error("expected a generic declaration at {0:?}, found a non-generic type")]
    NotGeneric(TypeId),

    #[error("instantiating {generic_source:?} expected {expected} type arguments, found {found}")]
    TypeArgumentCountMismatch {
        generic_source: TypeId,
        expected: usize,
        found: usize,
    },
}
