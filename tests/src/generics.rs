//! Scenario 4: two occurrences of the same generic instantiation must
//! share one `TypeId` (spec §8, "type interning").

#[cfg(test)]
mod scenarios {
    use zena_ast::ids::GlobalNodeId;
    use zena_ast::nodes::{Decl, Expr};
    use zena_ast::ModuleId;
    use zena_module_graph::{MemoryHost, ModuleGraph, Target};

    #[test]
    fn two_box_i32_instantiations_compare_identity_equal() {
        let source = "\
            class Box<T> {\n\
                value: T;\n\
                constructor(v: T) {\n\
                    this.value = v;\n\
                }\n\
            }\n\
            let a = new Box<i32>(1);\n\
            let b = new Box<i32>(2);\n";

        let host = MemoryHost::new(Target::Host).with_file("entry.zena", source);
        let graph = ModuleGraph::load("entry.zena", &host, &[], zena_parser::parse_module);
        assert!(!graph.has_errors(), "unexpected diagnostics: {:?}", graph.diagnostics().collect::<Vec<_>>());

        let module = graph.module(ModuleId(0)).expect("entry module loaded first");
        let mut new_expr_ids = module.ast.decls.iter().filter_map(|d| match d {
            Decl::Let(l) => match &l.value {
                Expr::New(n) => Some(n.id),
                _ => None,
            },
            _ => None,
        });
        let a_id = new_expr_ids.next().expect("Box<i32> literal `a`");
        let b_id = new_expr_ids.next().expect("Box<i32> literal `b`");

        let (sem, _environments, diagnostics) = zena_checker::check(&graph);
        assert!(diagnostics.iter().all(|d| !d.is_error()), "unexpected checker errors: {diagnostics:?}");

        let a_ty = sem.type_of(GlobalNodeId::new(ModuleId(0), a_id)).expect("type recorded for `a`");
        let b_ty = sem.type_of(GlobalNodeId::new(ModuleId(0), b_id)).expect("type recorded for `b`");
        assert_eq!(a_ty, b_ty, "both Box<i32> instantiations must share one Type identity");
    }
}
