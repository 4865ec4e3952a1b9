use thiserror::Error;
use zena_ast::ModuleId;
use zena_types::TypeUniverseError;

/// Internal "impossible state" errors (spec §7): a compiler bug, never
/// a user error. Surfaced through `anyhow::Result` at the top level and
/// abort compilation rather than becoming a [`zena_ast::Diagnostic`].
#[derive(Debug, Error)]
pub enum CheckerBug {
    #[error("declaration pre-pass never registered a shell for module {0:?}")]
    MissingModuleEnvironment(ModuleId),

    #[error(transparent)]
    TypeUniverse(#[from] TypeUniverseError),
}
