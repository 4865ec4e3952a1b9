//! The typed-results side table (spec §3.3's "every expression node
//! carries `inferredType`", satisfied here without a mutable AST — see
//! `DESIGN.md`'s "AST mutation strategy" entry).

use rustc_hash::FxHashMap;
use zena_ast::ids::GlobalNodeId;
use zena_types::{TypeId, TypeUniverse};

#[derive(Default)]
pub struct SemanticContext {
    pub universe: TypeUniverse,
    node_types: FxHashMap<GlobalNodeId, TypeId>,
}

impl SemanticContext {
    #[must_use]
    pub fn new(universe: TypeUniverse) -> Self {
        Self {
            universe,
            node_types: FxHashMap::default(),
        }
    }

    pub fn set_type(&mut self, node: GlobalNodeId, ty: TypeId) {
        self.node_types.insert(node, ty);
    }

    #[must_use]
    pub fn type_of(&self, node: GlobalNodeId) -> Option<TypeId> {
        self.node_types.get(&node).copied()
    }
}
