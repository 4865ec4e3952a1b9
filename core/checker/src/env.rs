//! Per-module name environments built by [`crate::decls`]'s Phase A and
//! consulted by every later phase. Keeping these separate from
//! [`zena_types::TypeUniverse`] mirrors the teacher's split between a
//! symbol table (names in scope) and the type arena itself.

use rustc_hash::FxHashMap;
use zena_ast::nodes::FieldDecl;
use zena_ast::ModuleId;
use zena_types::TypeId;

/// A mixin is structural, not nominal: it never gets its own `TypeId`,
/// it only donates fields/methods to classes that write `with Name`.
#[derive(Clone, Debug, Default)]
pub struct MixinInfo {
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<zena_ast::nodes::MethodDecl>,
}

#[derive(Default)]
pub struct ModuleEnv {
    /// Kind-qualified by caller: this map holds type-position names
    /// (classes, interfaces, enums, type aliases) reachable from this
    /// module, local declarations first, then named/star imports.
    pub type_names: FxHashMap<String, TypeId>,
    /// Value-position names: top-level `let`s, and classes again under
    /// their own name (a class is usable as a constructor value, spec
    /// §3.1's kind-qualified export keys).
    pub value_names: FxHashMap<String, TypeId>,
    pub mixins: FxHashMap<String, MixinInfo>,
}

#[derive(Default)]
pub struct Environments {
    pub modules: FxHashMap<ModuleId, ModuleEnv>,
}

impl Environments {
    pub fn module(&self, id: ModuleId) -> &ModuleEnv {
        self.modules.get(&id).expect("every module gets an environment in Phase A")
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut ModuleEnv {
        self.modules.entry(id).or_default()
    }
}
