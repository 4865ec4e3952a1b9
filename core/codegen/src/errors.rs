use thiserror::Error;

/// Internal codegen bugs (spec §7 tier 2) — an elaborated program the
/// checker accepted that codegen cannot lay out or lower. Never a user
/// error; propagated with `anyhow::Context` at the `zena-compiler`
/// boundary, exactly as `LayoutError`/`BinaryEmitError` do one layer
/// down.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("class {0:?} has no registered layout")]
    MissingClassLayout(zena_types::TypeId),

    #[error("no vtable slot for method '{0}' on {1:?}")]
    MissingMethodSlot(String, zena_types::TypeId),

    #[error("field '{0}' not found during layout of {1:?}")]
    MissingField(String, zena_types::TypeId),

    #[error("function body of '{0}' has no registered function index")]
    MissingFunctionIndex(String),

    #[error("unresolved identifier '{0}' during codegen")]
    UnresolvedIdentifier(String),

    #[error("no inferred type recorded for node {0:?} in module {1:?}")]
    MissingNodeType(zena_ast::NodeId, zena_ast::ModuleId),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("class '{0}' not found")]
    UnknownClass(String),

    #[error("top-level binding '{0}' is neither a function nor a constant-literal initializer")]
    UnsupportedGlobalInitializer(String),

    #[error(transparent)]
    Binary(#[from] zena_binary::BinaryEmitError),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
