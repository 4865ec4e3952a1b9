use std::fmt::{self, Display, Formatter};

/// Identifies a module within a single compilation. Assigned by
/// `zena_module_graph` in load order; stable for the lifetime of the
/// `Pipeline` call that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

impl Display for ModuleId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "module#{}", self.0)
    }
}

/// Identifies an AST node within its owning module. Assigned sequentially
/// by the parser; never zero, never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A node id qualified by the module that owns it — the key used by every
/// side table the checker and code generator build (inferred types,
/// resolved bindings, reachability).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct GlobalNodeId {
    pub module: ModuleId,
    pub node: NodeId,
}

impl GlobalNodeId {
    #[must_use]
    pub fn new(module: ModuleId, node: NodeId) -> Self {
        Self { module, node }
    }
}

/// Monotonic id allocator, one per module, handed to the parser.
/// Ids start at 1: `NodeId(0)` is never issued, so it is safe to use as a
/// sentinel for "no node" in tables that need one.
pub struct NodeIdGen {
    next: u32,
}

impl Default for NodeIdGen {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeIdGen {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> NodeId {
        let id = self.next;
        self.next += 1;
        NodeId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_start_at_one() {
        let mut gen = NodeIdGen::new();
        assert_eq!(gen.next(), NodeId(1));
        assert_eq!(gen.next(), NodeId(2));
        assert_eq!(gen.next(), NodeId(3));
    }

    #[test]
    fn global_node_id_distinguishes_same_node_id_across_modules() {
        let a = GlobalNodeId::new(ModuleId(0), NodeId(1));
        let b = GlobalNodeId::new(ModuleId(1), NodeId(1));
        assert_ne!(a, b);
    }
}
