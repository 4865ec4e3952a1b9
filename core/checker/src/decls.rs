//! Phase A: the declaration pre-pass (spec §4.4's "Phase A / Phase B"
//! split). Registers a shell `TypeId` for every class, interface, and
//! type alias before any body is checked, so mutually- and
//! self-referential declarations (`class Node { next: Node | null; }`)
//! resolve without forward-declaration syntax.

use rustc_hash::FxHashMap;
use zena_ast::module::ExportKey;
use zena_ast::nodes::{
    ClassDecl, Decl, EnumDecl, ExportKind, ImportBindings, InterfaceDecl, MethodDecl, TypeAliasDecl,
    TypeExpr, TypeParamDecl,
};
use zena_ast::{Diagnostic, DiagnosticCode, Location, ModuleId};
use zena_module_graph::ModuleGraph;
use zena_types::{ClassType, EnumType, FieldInfo, InterfaceType, Type, TypeAliasType, TypeId, TypeUniverse};

use crate::env::{Environments, MixinInfo, ModuleEnv};
use crate::type_resolver::{resolve_type_expr, TypeResolverCtx};

pub fn register_declarations(
    graph: &ModuleGraph,
    universe: &mut TypeUniverse,
) -> (Environments, Vec<Diagnostic>) {
    let mut environments = Environments::default();
    let mut diagnostics = Vec::new();

    // Step 1: reserve a shell for every nominal declaration and record
    // mixins verbatim (they never get a TypeId of their own).
    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        check_duplicate_decls(&module.ast.decls, &mut diagnostics);
        let env = environments.module_mut(module_id);
        for decl in &module.ast.decls {
            match decl {
                Decl::Class(c) => {
                    let id = universe.reserve();
                    env.type_names.insert(c.name.clone(), id);
                    env.value_names.insert(c.name.clone(), id);
                }
                Decl::Interface(i) => {
                    let id = universe.reserve();
                    env.type_names.insert(i.name.clone(), id);
                }
                Decl::TypeAlias(a) => {
                    let id = universe.reserve();
                    env.type_names.insert(a.name.clone(), id);
                }
                Decl::Enum(e) => {
                    let id = universe.reserve();
                    universe.populate(id, Type::Enum(build_enum(e, module_id)));
                    env.type_names.insert(e.name.clone(), id);
                }
                Decl::Mixin(m) => {
                    env.mixins.insert(
                        m.name.clone(),
                        MixinInfo {
                            fields: m.fields.clone(),
                            methods: m.methods.clone(),
                        },
                    );
                }
                Decl::Let(_) => {}
            }
        }
    }

    // Step 1.5: resolve imports now that every module's local names
    // exist, so cross-module (and cyclic) references are all visible.
    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        let mut added_types = Vec::new();
        let mut added_values = Vec::new();
        for import in &module.ast.imports {
            let Some(resolved_path) = module.imports.get(&import.specifier) else {
                continue; // already diagnosed by the module graph
            };
            let Some(target_id) = graph.id_for_path(resolved_path) else {
                continue;
            };
            match &import.bindings {
                ImportBindings::Star { alias: _ } => {
                    // No namespace object is modeled: a star import
                    // flattens the target's exports directly into this
                    // module's name environments.
                    let target_module = graph.module(target_id).expect("resolved target exists");
                    for key in target_module.exports.keys() {
                        if let Some((owner, _)) = graph.resolve_export(target_id, key) {
                            copy_export_as(&environments, owner, key, &key.name, &mut added_types, &mut added_values);
                        }
                    }
                }
                ImportBindings::Named(names) => {
                    for imported in names {
                        let key = ExportKey {
                            kind: imported.kind,
                            name: imported.name.clone(),
                        };
                        let Some((owner, _)) = graph.resolve_export(target_id, &key) else {
                            continue; // already diagnosed as UnresolvedImport
                        };
                        let local_name = imported.alias.clone().unwrap_or_else(|| imported.name.clone());
                        copy_export_as(&environments, owner, &key, &local_name, &mut added_types, &mut added_values);
                    }
                }
            }
        }
        let env = environments.module_mut(module_id);
        env.type_names.extend(added_types);
        env.value_names.extend(added_values);
    }

    // Step 2: populate every reserved shell now that all names — local
    // and imported — are visible.
    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        for decl in &module.ast.decls {
            match decl {
                Decl::Class(c) => populate_class(c, module_id, &environments, universe, &mut diagnostics),
                Decl::Interface(i) => populate_interface(i, module_id, &environments, universe, &mut diagnostics),
                Decl::TypeAlias(a) => populate_alias(a, module_id, &environments, universe, &mut diagnostics),
                Decl::Enum(_) | Decl::Mixin(_) | Decl::Let(_) => {}
            }
        }
    }

    // Step 3: give every top-level `let` a forward-referenceable type
    // before any body is checked, so mutually recursive top-level
    // functions (`export let isEven = (n) => ... isOdd(n - 1) ...`)
    // resolve regardless of declaration order. An explicit `let` type
    // annotation wins; otherwise a lambda initializer's own fully
    // annotated signature is used without looking at its body; a bare
    // value with neither is given `any` here and narrowed to its real
    // type once Phase B checks the initializer.
    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        let env_snapshot_names: Vec<(String, TypeId)> = module
            .ast
            .decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Let(l) => {
                    let env = environments.module(module_id);
                    let ty = let_declared_type(l, env, universe, &mut diagnostics);
                    Some((l.name.clone(), ty))
                }
                _ => None,
            })
            .collect();
        let env = environments.module_mut(module_id);
        env.value_names.extend(env_snapshot_names);
    }

    (environments, diagnostics)
}

/// The type a top-level `let` can be assigned before its initializer is
/// actually checked (see Step 3's doc comment above).
fn let_declared_type(
    l: &zena_ast::nodes::LetDecl,
    env: &ModuleEnv,
    universe: &mut TypeUniverse,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    let local_tp = FxHashMap::default();
    let ctx = TypeResolverCtx {
        env,
        local_type_params: &local_tp,
    };
    if let Some(te) = &l.ty {
        return resolve_type_expr(te, &ctx, universe, &l.location, diagnostics);
    }
    if let zena_ast::nodes::Expr::Lambda(lambda) = &l.value {
        let params = lambda
            .params
            .iter()
            .map(|p| resolve_type_expr(&p.ty, &ctx, universe, &p.location, diagnostics))
            .collect();
        let ret = lambda
            .return_ty
            .as_ref()
            .map(|te| resolve_type_expr(te, &ctx, universe, &lambda.location, diagnostics))
            .unwrap_or_else(|| universe.void());
        return universe.new_function(params, ret);
    }
    universe.any()
}

fn build_enum(e: &EnumDecl, module: ModuleId) -> EnumType {
    let mut next = 0i32;
    let variants = e
        .variants
        .iter()
        .map(|(name, discriminant)| {
            let value = discriminant.map_or(next, |d| i32::try_from(d).unwrap_or(next));
            next = value + 1;
            (name.clone(), value)
        })
        .collect();
    EnumType {
        name: e.name.clone(),
        module,
        variants,
    }
}

fn copy_export_as(
    environments: &Environments,
    owner: ModuleId,
    key: &ExportKey,
    local_name: &str,
    added_types: &mut Vec<(String, TypeId)>,
    added_values: &mut Vec<(String, TypeId)>,
) {
    let Some(owner_env) = environments.modules.get(&owner) else {
        return;
    };
    match key.kind {
        ExportKind::Type => {
            if let Some(&id) = owner_env.type_names.get(&key.name) {
                added_types.push((local_name.to_string(), id));
            }
        }
        ExportKind::Value => {
            if let Some(&id) = owner_env.value_names.get(&key.name) {
                added_values.push((local_name.to_string(), id));
            }
        }
    }
}

fn declare_type_params(
    params: &[TypeParamDecl],
    env: &ModuleEnv,
    universe: &mut TypeUniverse,
    diagnostics: &mut Vec<Diagnostic>,
    location: &Location,
) -> (FxHashMap<String, TypeId>, Vec<TypeId>) {
    let mut local = FxHashMap::default();
    let mut ids = Vec::new();
    for p in params {
        let ctx = TypeResolverCtx {
            env,
            local_type_params: &local,
        };
        let upper = p
            .upper_bound
            .as_ref()
            .map(|te| resolve_type_expr(te, &ctx, universe, location, diagnostics));
        let default = p
            .default
            .as_ref()
            .map(|te| resolve_type_expr(te, &ctx, universe, location, diagnostics));
        let id = universe.declare_type_parameter(p.name.clone(), upper, default);
        local.insert(p.name.clone(), id);
        ids.push(id);
    }
    (local, ids)
}

/// A class's `with A, B` clause writes mixin names as bare (or, in
/// principle, generic) type expressions; only the name matters since a
/// mixin donates structure, never a type argument list of its own.
fn mixin_name(te: &TypeExpr) -> Option<&str> {
    match te {
        TypeExpr::Name(n) | TypeExpr::Generic(n, _) => Some(n.as_str()),
        _ => None,
    }
}

fn populate_class(
    c: &ClassDecl,
    module_id: ModuleId,
    environments: &Environments,
    universe: &mut TypeUniverse,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let env = environments.module(module_id);
    let class_id = *env.type_names.get(&c.name).expect("reserved in step 1");
    let (local_tp, tp_ids) = declare_type_params(&c.type_params, env, universe, diagnostics, &c.location);
    let ctx = TypeResolverCtx {
        env,
        local_type_params: &local_tp,
    };

    let super_class = c
        .super_class
        .as_ref()
        .map(|te| resolve_type_expr(te, &ctx, universe, &c.location, diagnostics));
    let implements: Vec<TypeId> = c
        .implements
        .iter()
        .map(|te| resolve_type_expr(te, &ctx, universe, &c.location, diagnostics))
        .collect();

    let mut fields = Vec::new();
    if let Some(parent) = super_class {
        if let Some(parent_class) = universe.as_class(parent) {
            fields.extend(parent_class.fields.clone());
        }
    }
    for mixin_ref in &c.mixins {
        if let Some(name) = mixin_name(mixin_ref) {
            if let Some(mixin) = env.mixins.get(name).cloned() {
                for f in &mixin.fields {
                    let ty = resolve_type_expr(&f.ty, &ctx, universe, &f.location, diagnostics);
                    fields.push(FieldInfo {
                        name: f.name.clone(),
                        ty,
                        is_mut: f.is_mut,
                    });
                }
            }
        }
    }
    for f in &c.fields {
        let ty = resolve_type_expr(&f.ty, &ctx, universe, &f.location, diagnostics);
        fields.push(FieldInfo {
            name: f.name.clone(),
            ty,
            is_mut: f.is_mut,
        });
    }

    let mut methods = FxHashMap::default();
    if let Some(parent) = super_class {
        if let Some(parent_class) = universe.as_class(parent) {
            methods.extend(parent_class.methods.clone());
        }
    }
    for mixin_ref in &c.mixins {
        if let Some(name) = mixin_name(mixin_ref) {
            if let Some(mixin) = env.mixins.get(name).cloned() {
                for m in &mixin.methods {
                    let fn_id = resolve_method_signature(m, &ctx, universe, diagnostics);
                    methods.insert(m.name(), fn_id);
                }
            }
        }
    }
    for m in &c.methods {
        let fn_id = resolve_method_signature(m, &ctx, universe, diagnostics);
        methods.insert(m.name(), fn_id);
    }

    let constructor_type = c.constructor.as_ref().map(|ctor| {
        let params = ctor
            .params
            .iter()
            .map(|p| resolve_type_expr(&p.ty, &ctx, universe, &p.location, diagnostics))
            .collect();
        universe.new_function(params, class_id)
    });

    let on_type = c
        .on_type
        .as_ref()
        .map(|te| resolve_type_expr(te, &ctx, universe, &c.location, diagnostics));

    universe.populate(
        class_id,
        Type::Class(ClassType {
            name: c.name.clone(),
            module: module_id,
            fields,
            methods,
            constructor_type,
            super_class,
            implements,
            type_parameters: tp_ids,
            type_arguments: None,
            generic_source: None,
            is_final: c.is_final,
            is_extension: c.is_extension,
            on_type,
        }),
    );
}

/// Methods may only reference their enclosing class's type parameters,
/// not introduce new ones of their own: `zena_types::FunctionType`
/// carries a `type_parameters` slot but nothing in this workspace's
/// `TypeUniverse` API instantiates a method independently of its
/// class, so a per-method generic parameter would have no way to ever
/// be substituted. `MethodDecl.type_params` is parsed but intentionally
/// unused here.
fn resolve_method_signature(
    m: &MethodDecl,
    ctx: &TypeResolverCtx,
    universe: &mut TypeUniverse,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    let params = m
        .params
        .iter()
        .map(|p| resolve_type_expr(&p.ty, ctx, universe, &p.location, diagnostics))
        .collect();
    let ret = m
        .return_ty
        .as_ref()
        .map(|te| resolve_type_expr(te, ctx, universe, &m.location, diagnostics))
        .unwrap_or_else(|| universe.void());
    universe.new_function(params, ret)
}

fn populate_interface(
    i: &InterfaceDecl,
    module_id: ModuleId,
    environments: &Environments,
    universe: &mut TypeUniverse,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let env = environments.module(module_id);
    let iface_id = *env.type_names.get(&i.name).expect("reserved in step 1");
    let (local_tp, tp_ids) = declare_type_params(&i.type_params, env, universe, diagnostics, &i.location);
    let ctx = TypeResolverCtx {
        env,
        local_type_params: &local_tp,
    };

    let parent_interfaces = i
        .parent_interfaces
        .iter()
        .map(|te| resolve_type_expr(te, &ctx, universe, &i.location, diagnostics))
        .collect();

    let mut methods = FxHashMap::default();
    for sig in &i.methods {
        let params = sig
            .params
            .iter()
            .map(|p| resolve_type_expr(p, &ctx, universe, &i.location, diagnostics))
            .collect();
        let ret = resolve_type_expr(&sig.return_ty, &ctx, universe, &i.location, diagnostics);
        let fn_id = universe.new_function(params, ret);
        methods.insert(sig.name.clone(), fn_id);
    }
    let mut properties = FxHashMap::default();
    for prop in &i.properties {
        let ty = resolve_type_expr(&prop.ty, &ctx, universe, &i.location, diagnostics);
        properties.insert(prop.name.clone(), (ty, prop.is_mut));
    }

    universe.populate(
        iface_id,
        Type::Interface(InterfaceType {
            name: i.name.clone(),
            module: module_id,
            methods,
            properties,
            parent_interfaces,
            type_parameters: tp_ids,
            type_arguments: None,
            generic_source: None,
        }),
    );
}

fn populate_alias(
    a: &TypeAliasDecl,
    module_id: ModuleId,
    environments: &Environments,
    universe: &mut TypeUniverse,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let env = environments.module(module_id);
    let alias_id = *env.type_names.get(&a.name).expect("reserved in step 1");
    let (local_tp, tp_ids) = declare_type_params(&a.type_params, env, universe, diagnostics, &a.location);
    let ctx = TypeResolverCtx {
        env,
        local_type_params: &local_tp,
    };
    let target = resolve_type_expr(&a.target, &ctx, universe, &a.location, diagnostics);
    universe.populate(
        alias_id,
        Type::TypeAlias(TypeAliasType {
            name: a.name.clone(),
            module: module_id,
            target,
            is_distinct: a.is_distinct,
            type_parameters: tp_ids,
            type_arguments: None,
            generic_source: None,
        }),
    );
}

fn decl_location(decl: &Decl) -> Location {
    match decl {
        Decl::Let(d) => d.location.clone(),
        Decl::Class(d) => d.location.clone(),
        Decl::Interface(d) => d.location.clone(),
        Decl::Mixin(d) => d.location.clone(),
        Decl::Enum(d) => d.location.clone(),
        Decl::TypeAlias(d) => d.location.clone(),
    }
}

/// Two public declarations claiming the same kind-qualified name within
/// one module (spec §4.3's loader only catches cross-module collisions;
/// this is the same-module case).
fn check_duplicate_decls(decls: &[Decl], diagnostics: &mut Vec<Diagnostic>) {
    let mut seen: FxHashMap<(ExportKind, String), Location> = FxHashMap::default();
    for decl in decls {
        let keys: Vec<(ExportKind, String)> = match decl {
            Decl::Class(c) => vec![
                (ExportKind::Type, c.name.clone()),
                (ExportKind::Value, c.name.clone()),
            ],
            Decl::Let(l) => vec![(ExportKind::Value, l.name.clone())],
            Decl::Interface(i) => vec![(ExportKind::Type, i.name.clone())],
            Decl::Mixin(m) => vec![(ExportKind::Type, m.name.clone())],
            Decl::Enum(e) => vec![(ExportKind::Type, e.name.clone())],
            Decl::TypeAlias(t) => vec![(ExportKind::Type, t.name.clone())],
        };
        for key in keys {
            if seen.contains_key(&key) {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::DuplicateDeclaration,
                    format!("'{}' is declared more than once in this module", key.1),
                    decl_location(decl),
                ));
            } else {
                seen.insert(key, decl_location(decl));
            }
        }
    }
}
