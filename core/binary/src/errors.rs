use thiserror::Error;

/// Internal errors raised by [`crate::BinaryEmitter`].
///
/// These are never user-facing diagnostics (see spec §7's two error
/// tiers): they indicate the code generator asked the emitter to do
/// something impossible — a reserved type nobody ever defined, an
/// out-of-range index, a read of the wrong composite shape. The caller
/// (`zena-codegen`) is expected to propagate these with `?` up through
/// `anyhow` rather than recover from them.
#[derive(Debug, Error)]
pub enum BinaryEmitError {
    #[error("type index {index} is out of range ({len} types registered)")]
    TypeIndexOutOfRange { index: u32, len: u32 },

    #[error("type index {0} was reserved but never defined")]
    TypeNeverDefined(u32),

    #[error("type index {0} is already defined")]
    TypeAlreadyDefined(u32),

    #[error("type index {0} is not a function type")]
    NotAFunctionType(u32),

    #[error("type index {0} is not a struct type")]
    NotAStructType(u32),

    #[error("type index {0} is not an array type")]
    NotAnArrayType(u32),

    #[error("struct type {type_index} has no field {field_index}")]
    NoSuchField { type_index: u32, field_index: u32 },

    #[error("function index {0} is out of range")]
    FunctionIndexOutOfRange(u32),

    #[error("function index {0} has no code body registered")]
    CodeNeverDefined(u32),
}

pub type Result<T> = std::result::Result<T, BinaryEmitError>;
