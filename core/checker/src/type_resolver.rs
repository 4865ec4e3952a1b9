//! Turns a syntactic [`TypeExpr`] into an interned [`TypeId`], looking
//! names up in the resolving module's [`ModuleEnv`] plus whatever
//! generic type parameters are in scope at the call site (a class or
//! method's own `type_params`).

use rustc_hash::FxHashMap;
use zena_ast::nodes::TypeExpr;
use zena_ast::{Diagnostic, DiagnosticCode, Location};
use zena_types::{PrimitiveKind, TypeId, TypeUniverse};

use crate::env::ModuleEnv;

pub struct TypeResolverCtx<'a> {
    pub env: &'a ModuleEnv,
    pub local_type_params: &'a FxHashMap<String, TypeId>,
}

/// Resolves `expr`. Unknown names and arity mismatches are reported as
/// diagnostics and recovered from by substituting `any` — the checker
/// keeps going rather than aborting on the first bad annotation.
pub fn resolve_type_expr(
    expr: &TypeExpr,
    ctx: &TypeResolverCtx,
    universe: &mut TypeUniverse,
    location: &Location,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    match expr {
        TypeExpr::Name(name) => resolve_named(name, &[], ctx, universe, location, diagnostics),
        TypeExpr::Generic(name, args) => {
            let arg_ids: Vec<TypeId> = args
                .iter()
                .map(|a| resolve_type_expr(a, ctx, universe, location, diagnostics))
                .collect();
            resolve_named(name, &arg_ids, ctx, universe, location, diagnostics)
        }
        TypeExpr::Array(elem) => {
            let elem_id = resolve_type_expr(elem, ctx, universe, location, diagnostics);
            universe.intern_array(elem_id)
        }
        TypeExpr::Tuple(elems) => {
            let ids = elems
                .iter()
                .map(|e| resolve_type_expr(e, ctx, universe, location, diagnostics))
                .collect();
            universe.new_tuple(ids)
        }
        TypeExpr::UnboxedTuple(elems) => {
            let ids = elems
                .iter()
                .map(|e| resolve_type_expr(e, ctx, universe, location, diagnostics))
                .collect();
            universe.intern_unboxed_tuple(ids)
        }
        TypeExpr::Record(fields) => {
            let ids = fields
                .iter()
                .map(|(name, ty)| (name.clone(), resolve_type_expr(ty, ctx, universe, location, diagnostics)))
                .collect();
            universe.intern_record(ids)
        }
        TypeExpr::Function(params, ret) => {
            let param_ids = params
                .iter()
                .map(|p| resolve_type_expr(p, ctx, universe, location, diagnostics))
                .collect();
            let ret_id = resolve_type_expr(ret, ctx, universe, location, diagnostics);
            universe.new_function(param_ids, ret_id)
        }
        TypeExpr::Union(members) => {
            let ids = members
                .iter()
                .map(|m| resolve_type_expr(m, ctx, universe, location, diagnostics))
                .collect();
            universe.union_of(ids)
        }
    }
}

fn resolve_named(
    name: &str,
    args: &[TypeId],
    ctx: &TypeResolverCtx,
    universe: &mut TypeUniverse,
    location: &Location,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    if args.is_empty() {
        if let Some(&id) = ctx.local_type_params.get(name) {
            return id;
        }
        if let Some(id) = builtin_primitive(name, universe) {
            return id;
        }
    }
    let Some(&base) = ctx.env.type_names.get(name) else {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::UnknownType,
            format!("unknown type '{name}'"),
            location.clone(),
        ));
        return universe.any();
    };
    if args.is_empty() {
        return base;
    }
    let instantiated = if universe.as_class(base).is_some() {
        universe.instantiate_class(base, args.to_vec())
    } else if universe.as_interface(base).is_some() {
        universe.instantiate_interface(base, args.to_vec())
    } else if universe.as_type_alias(base).is_some() {
        universe.instantiate_alias(base, args.to_vec())
    } else {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::UnknownType,
            format!("'{name}' does not accept type arguments"),
            location.clone(),
        ));
        return universe.any();
    };
    instantiated.unwrap_or_else(|err| {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ArityMismatch,
            err.to_string(),
            location.clone(),
        ));
        universe.any()
    })
}

/// Primitive and other built-in type names never go through a module's
/// own `type_names` table — there is no declaration site to register a
/// shell at, they are simply always in scope. Checked before the module
/// environment so a user class can't accidentally shadow `i32`.
fn builtin_primitive(name: &str, universe: &TypeUniverse) -> Option<TypeId> {
    let kind = match name {
        "i32" => PrimitiveKind::I32,
        "i64" => PrimitiveKind::I64,
        "f32" => PrimitiveKind::F32,
        "f64" => PrimitiveKind::F64,
        "bool" => PrimitiveKind::Boolean,
        "void" => PrimitiveKind::Void,
        "never" => PrimitiveKind::Never,
        "any" => PrimitiveKind::Any,
        "anyref" => PrimitiveKind::AnyRef,
        "string" => return Some(universe.string()),
        _ => return None,
    };
    Some(universe.primitive(kind))
}
