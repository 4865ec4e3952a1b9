//! Ties Phase A ([`crate::decls`]) and Phase B ([`crate::expr`],
//! [`crate::stmt`]) together into the checker's single public entry
//! point.

use rustc_hash::FxHashMap;
use zena_ast::nodes::Decl;
use zena_ast::{Diagnostic, DiagnosticCode};
use zena_module_graph::ModuleGraph;
use zena_types::{Type, TypeId, TypeUniverse};

use crate::context::SemanticContext;
use crate::decls::register_declarations;
use crate::env::{Environments, ModuleEnv};
use crate::expr::{check_expr, ExprCx};
use crate::scope::Scopes;
use crate::stmt::{check_block, declare_params};

/// Runs both checker phases over an already-loaded, import-resolved
/// module graph and returns the typed side table, the per-module
/// declaration environments (codegen's only source for resolving a
/// surface type name such as `IsExpr`'s `ty` back to a `TypeId` once
/// Phase A has already assigned one), and every diagnostic raised along
/// the way. The caller decides whether `diagnostics` contains anything
/// severe enough to stop before codegen (`Diagnostic::is_error`).
#[must_use]
pub fn check(graph: &ModuleGraph) -> (SemanticContext, Environments, Vec<Diagnostic>) {
    let mut universe = TypeUniverse::new();
    let (environments, mut diagnostics) = register_declarations(graph, &mut universe);
    let mut sem = SemanticContext::new(universe);

    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        let env = environments.module(module_id);
        let ctx = ExprCx { module_id, env };
        for decl in &module.ast.decls {
            match decl {
                Decl::Let(l) => check_top_level_let(l, &ctx, &mut sem, &mut diagnostics),
                Decl::Class(c) => check_class_body(c, &ctx, env, &mut sem, &mut diagnostics),
                Decl::Interface(_) | Decl::Mixin(_) | Decl::Enum(_) | Decl::TypeAlias(_) => {}
            }
        }
    }

    (sem, environments, diagnostics)
}

fn check_top_level_let(
    l: &zena_ast::nodes::LetDecl,
    ctx: &ExprCx,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut scopes = Scopes::new();
    let actual = check_expr(&l.value, ctx, &mut scopes, sem, diagnostics);
    let Some(&declared) = ctx.env.value_names.get(&l.name) else {
        return;
    };
    if !sem.universe.is_assignable(actual, declared) {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::TypeMismatch,
            format!("initializer of '{}' is not assignable to its declared type", l.name),
            l.location.clone(),
        ));
    }
}

/// Builds the `name -> TypeId` map for a class's own type parameters,
/// read back from the arena since [`zena_types::ClassType`] only keeps
/// the ids (`declare_type_params` already consumed the names when it
/// ran during Phase A).
fn class_local_type_params(universe: &TypeUniverse, type_parameters: &[TypeId]) -> FxHashMap<String, TypeId> {
    type_parameters
        .iter()
        .filter_map(|&id| match universe.get(id) {
            Type::TypeParameter(tp) => Some((tp.name.clone(), id)),
            _ => None,
        })
        .collect()
}

fn check_class_body(
    c: &zena_ast::nodes::ClassDecl,
    ctx: &ExprCx,
    env: &ModuleEnv,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(&class_id) = env.type_names.get(&c.name) else {
        return;
    };
    let Some(class) = sem.universe.as_class(class_id) else {
        return;
    };
    let local_tp = class_local_type_params(&sem.universe, &class.type_parameters);
    let methods = class.methods.clone();

    if let Some(ctor) = &c.constructor {
        let mut scopes = Scopes::new();
        scopes.declare("this", class_id, false);
        declare_params(&ctor.params, ctx, &local_tp, &mut scopes, sem, diagnostics);
        let void = sem.universe.void();
        check_block(&ctor.body, ctx, void, &local_tp, &mut scopes, sem, diagnostics);
    }

    let mut checked = std::collections::HashSet::new();
    for m in &c.methods {
        check_method_body(m, &methods, class_id, ctx, &local_tp, sem, diagnostics);
        checked.insert(m.name());
    }

    for mixin_ref in &c.mixins {
        let Some(name) = mixin_name(mixin_ref) else { continue };
        let Some(mixin) = env.mixins.get(name) else { continue };
        for m in &mixin.methods {
            if checked.contains(&m.name()) {
                continue;
            }
            check_method_body(m, &methods, class_id, ctx, &local_tp, sem, diagnostics);
        }
    }
}

fn mixin_name(te: &zena_ast::nodes::TypeExpr) -> Option<&str> {
    match te {
        zena_ast::nodes::TypeExpr::Name(n) | zena_ast::nodes::TypeExpr::Generic(n, _) => Some(n.as_str()),
        _ => None,
    }
}

fn check_method_body(
    m: &zena_ast::nodes::MethodDecl,
    methods: &FxHashMap<String, TypeId>,
    class_id: TypeId,
    ctx: &ExprCx,
    local_tp: &FxHashMap<String, TypeId>,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(&fn_id) = methods.get(&m.name()) else {
        return;
    };
    let Some(f) = sem.universe.as_function(fn_id) else {
        return;
    };
    let (param_tys, return_ty) = (f.parameters.clone(), f.return_type);
    let mut scopes = Scopes::new();
    scopes.declare("this", class_id, false);
    for (p, &ty) in m.params.iter().zip(param_tys.iter()) {
        scopes.declare(p.name.clone(), ty, p.is_mut);
    }
    check_block(&m.body, ctx, return_ty, local_tp, &mut scopes, sem, diagnostics);
}
