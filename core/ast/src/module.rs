//! The `Module` record (spec §3.1).

use rustc_hash::FxHashMap;

use crate::diagnostic::Diagnostic;
use crate::ids::ModuleId;
use crate::nodes::{ExportKind, Program};

/// Kind-qualified export/import key: a value and a type may share a bare
/// name (`value:Point` the constructor function, `type:Point` the class)
/// without colliding.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ExportKey {
    pub kind: ExportKind,
    pub name: String,
}

impl ExportKey {
    #[must_use]
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            kind: ExportKind::Value,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn ty(name: impl Into<String>) -> Self {
        Self {
            kind: ExportKind::Type,
            name: name.into(),
        }
    }
}

/// One source file's worth of state, as tracked by `zena_module_graph`.
pub struct Module {
    pub id: ModuleId,
    /// Canonical identifier: a host-chosen string — `main.zena`, an
    /// absolute OS path, or a `zena:`-prefixed stdlib specifier.
    pub path: String,
    pub source: String,
    pub ast: Program,
    /// Specifier-as-written → resolved target module path.
    pub imports: FxHashMap<String, String>,
    /// Kind-qualified export name → the index of the declaration in
    /// `ast.decls` that provides it (re-exports are resolved by the
    /// graph and recorded separately, see [`Module::reexported_from`]).
    pub exports: FxHashMap<ExportKey, usize>,
    /// `export * from` targets, recorded so re-export collisions and
    /// transitive lookups can be diagnosed without re-parsing.
    pub reexported_from: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub is_stdlib: bool,
}

impl Module {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}
