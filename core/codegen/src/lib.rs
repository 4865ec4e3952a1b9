#![warn(clippy::pedantic)]
//! WASM-GC code generator (spec §4.5) — component C5.
//!
//! Lowers a whole-program [`zena_module_graph::ModuleGraph`] plus the
//! [`zena_checker::SemanticContext`]/[`zena_checker::Environments`] side
//! tables the checker produced for it into a finished `.wasm` module.
//! Where the teacher crate walks a typed AST and emits LLVM IR through
//! `inkwell`, this crate walks the same shape of AST and emits WASM-GC
//! bytes directly through [`zena_binary::BinaryEmitter`] — LLVM's wasm
//! backend has no support for the GC proposal's struct/array/rec-group
//! types, so there is no LLVM layer to keep here.
//!
//! Module map: [`runtime_types`] registers the ambient string/box/array
//! types every module needs regardless of source content; [`layout`]
//! computes per-class struct/vtable shape and owns the monomorphization
//! cache; [`instr`] is raw instruction-encoding helpers; [`expr`] and
//! [`stmt`] lower expressions/statements into instruction bytes;
//! [`function`] ties one function body together; [`dce`] is the
//! reachability pass that runs before this module's own [`generate`]
//! registers anything with [`zena_binary::BinaryEmitter`].

pub mod dce;
pub mod errors;
pub mod expr;
pub mod function;
pub mod instr;
pub mod layout;
pub mod runtime_types;
pub mod stmt;

pub use errors::LayoutError;
pub use layout::{ClassLayout, FieldSlot, LayoutTable, MethodSlot};
pub use runtime_types::RuntimeTypes;

use rustc_hash::FxHashMap;
use zena_ast::nodes::{Decl, Expr, LambdaBody, MethodDecl, Visibility};
use zena_ast::ModuleId;
use zena_binary::{BinaryEmitter, ExportKind, HeapType, RefType, ValType};
use zena_checker::{Environments, SemanticContext};
use zena_module_graph::ModuleGraph;
use zena_types::{PrimitiveKind, Type, TypeId, TypeUniverse};

use crate::errors::Result;
use crate::function::{FnCx, LoopLabels, Locals};
use crate::layout::value_type_for;

/// Mirrors the `{target, debug, dce}` triple spec §4.6 passes to the
/// generator; `target` only matters to `zena-compiler`'s host wiring,
/// not to the bytes this crate emits, so it is not threaded through
/// here. `debug` is currently unused — no name-section emission yet
/// (see `DESIGN.md`).
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub dce: bool,
    pub debug: bool,
}

/// Lowers every reachable declaration of `graph` into a finished WASM
/// binary. `sem`/`environments` are the two halves of what
/// `zena_checker::check` returns: the per-node type side table and the
/// per-module name environments (the latter is what lets `is`/`as` and
/// `new` resolve a surface class name back to a `TypeId` post-checking,
/// see `crate::expr::node_type_for_type_expr`).
pub fn generate(
    graph: &ModuleGraph,
    sem: &SemanticContext,
    environments: &Environments,
    opts: &GenerateOptions,
) -> Result<Vec<u8>> {
    let universe = &sem.universe;
    let mut emitter = BinaryEmitter::new();
    let runtime = RuntimeTypes::register(&mut emitter);
    let mut layout = LayoutTable::new();
    let reach = dce::compute(graph, opts.dce);
    let _ = opts.debug;

    let mut functions: FxHashMap<String, (u32, u32)> = FxHashMap::default();
    let mut pending_functions: Vec<PendingFunction> = Vec::new();

    // Pass 1: register every reachable top-level function's signature
    // and a global slot for every reachable non-function `let`, before
    // lowering any body — a body may call a function or read a global
    // declared later in source order, or in another module entirely.
    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        let env = environments.module(module_id);
        for decl in &module.ast.decls {
            let Decl::Let(l) = decl else { continue };
            if !reach.has_function(module_id, &l.name) {
                continue;
            }
            let Some(&value_ty) = env.value_names.get(&l.name) else { continue };

            if let Expr::Lambda(lambda) = &l.value {
                let f = universe
                    .as_function(value_ty)
                    .ok_or_else(|| LayoutError::MissingFunctionIndex(l.name.clone()))?
                    .clone();
                let func_type_idx = layout.func_type_of(&mut emitter, universe, &runtime, value_ty)?;
                let func_idx = emitter.add_function(func_type_idx)?;
                functions.entry(l.name.clone()).or_insert((func_idx, func_type_idx));
                if l.visibility == Visibility::Public {
                    emitter.add_export(l.name.clone(), ExportKind::Func, func_idx);
                }
                pending_functions.push(PendingFunction {
                    module_id,
                    func_idx,
                    param_names: lambda.params.iter().map(|p| p.name.clone()).collect(),
                    param_types: f.parameters.clone(),
                    return_type: f.return_type,
                    body: &lambda.body,
                });
            } else {
                // A non-function top-level `let`: only a constant
                // literal initializer is supported (see `DESIGN.md` —
                // arbitrary global initializer expressions are out of
                // scope for this generator).
                let init = const_literal(&l.value, value_ty, universe)
                    .ok_or_else(|| LayoutError::UnsupportedGlobalInitializer(l.name.clone()))?;
                let wasm_ty = value_type_for(&mut layout, &mut emitter, universe, &runtime, value_ty)?;
                let global_idx = emitter.add_global(wasm_ty, false, init);
                if l.visibility == Visibility::Public {
                    emitter.add_export(l.name.clone(), ExportKind::Global, global_idx);
                }
            }
        }
    }

    // Pass 2: register every reachable class's struct/vtable layout and
    // every method/constructor's function index (cycle-safe: a class is
    // marked compiled as soon as its layout exists, before its own
    // bodies are lowered, so a method that constructs its own class
    // does not recurse forever).
    let mut class_method_funcs: FxHashMap<TypeId, FxHashMap<String, u32>> = FxHashMap::default();
    let mut compiled_classes: std::collections::HashSet<TypeId> = std::collections::HashSet::new();
    let mut pending_bodies: Vec<PendingBody> = Vec::new();

    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        let env = environments.module(module_id);
        for decl in &module.ast.decls {
            let Decl::Class(c) = decl else { continue };
            if !reach.has_class(module_id, &c.name) {
                continue;
            }
            let Some(&class_id) = env.type_names.get(&c.name) else { continue };
            compile_class(
                class_id,
                graph,
                environments,
                &mut emitter,
                &mut layout,
                &runtime,
                universe,
                &mut class_method_funcs,
                &mut compiled_classes,
                &mut pending_bodies,
            )?;
        }
    }

    // Pass 3: lower every registered body now that every function index,
    // global index, and class layout in the whole reachable program
    // exists.
    for pf in &pending_functions {
        let env = environments.module(pf.module_id);
        let params: Vec<(String, ValType)> = pf
            .param_names
            .iter()
            .zip(pf.param_types.iter())
            .map(|(name, &ty)| Ok((name.clone(), value_type_for(&mut layout, &mut emitter, universe, &runtime, ty)?)))
            .collect::<Result<_>>()?;
        let is_void = matches!(universe.get(pf.return_type), Type::Primitive(PrimitiveKind::Void));

        let locals = Locals::new(&params);
        let mut fcx = FnCx {
            emitter: &mut emitter,
            layout: &mut layout,
            runtime: &runtime,
            universe,
            sem,
            module_id: pf.module_id,
            locals,
            loops: LoopLabels::new(),
            this_class: None,
            functions: &functions,
            classes_by_name: &env.type_names,
            diagnostics_module: pf.module_id,
        };
        let mut buf = Vec::new();
        match pf.body {
            LambdaBody::Expr(e) => {
                let ty = expr::lower_expr(&mut fcx, &mut buf, e)?;
                let _ = ty;
                if is_void {
                    instr::drop(&mut buf);
                }
            }
            LambdaBody::Block(b) => stmt::lower_block(&mut fcx, &mut buf, b)?,
        }
        let extra = fcx.locals.extra_locals();
        emitter.add_code(pf.func_idx, extra, buf)?;
    }

    for pb in &pending_bodies {
        let env = environments.module(pb.module_id);
        let params: Vec<(String, ValType)> = pb
            .param_names
            .iter()
            .zip(pb.param_types.iter())
            .map(|(name, &ty)| Ok((name.clone(), value_type_for(&mut layout, &mut emitter, universe, &runtime, ty)?)))
            .collect::<Result<_>>()?;
        let mut full_params = vec![("this".to_string(), ValType::Ref(RefType::non_null(pb.receiver_heap)))];
        full_params.extend(params);

        let locals = Locals::new(&full_params);
        let mut fcx = FnCx {
            emitter: &mut emitter,
            layout: &mut layout,
            runtime: &runtime,
            universe,
            sem,
            module_id: pb.module_id,
            locals,
            loops: LoopLabels::new(),
            this_class: Some(pb.class_id),
            functions: &functions,
            classes_by_name: &env.type_names,
            diagnostics_module: pb.module_id,
        };
        let mut buf = Vec::new();

        // Methods reusing an inherited vtable slot receive `this` typed
        // to the ancestor that first introduced the slot (WASM function
        // types have no subtyping, so an override must match the
        // slot's signature exactly) — cast back down to this class's
        // own struct type before the body runs so field access resolves
        // normally. Constructors are never vtable slots, so their
        // receiver is already this class's own struct and no cast is
        // needed.
        if pb.needs_receiver_cast {
            instr::local_get(&mut buf, 0);
            instr::ref_cast(&mut buf, HeapType::Concrete(pb.own_struct_idx));
            let this_idx = fcx.locals.declare("this", ValType::Ref(RefType::non_null(HeapType::Concrete(pb.own_struct_idx))));
            instr::local_set(&mut buf, this_idx);
        }

        stmt::lower_block(&mut fcx, &mut buf, &pb.body)?;
        let extra = fcx.locals.extra_locals();
        emitter.add_code(pb.func_idx, extra, buf)?;
    }

    emitter.finish().map_err(LayoutError::from)
}

struct PendingFunction<'a> {
    module_id: ModuleId,
    func_idx: u32,
    param_names: Vec<String>,
    param_types: Vec<TypeId>,
    return_type: TypeId,
    body: &'a LambdaBody,
}

struct PendingBody {
    module_id: ModuleId,
    class_id: TypeId,
    func_idx: u32,
    param_names: Vec<String>,
    param_types: Vec<TypeId>,
    receiver_heap: HeapType,
    own_struct_idx: u32,
    needs_receiver_cast: bool,
    body: zena_ast::nodes::Block,
}

/// Registers `class_id`'s struct/vtable layout and every method/
/// constructor function index, recursing into the superclass first so
/// an inherited (non-overridden) vtable slot can reuse the parent's
/// already-registered function index. Marks `class_id` compiled before
/// touching its methods, so a method body that instantiates its own
/// class (direct or mutual recursion) does not re-enter this function.
#[allow(clippy::too_many_arguments)]
fn compile_class(
    class_id: TypeId,
    graph: &ModuleGraph,
    environments: &Environments,
    emitter: &mut BinaryEmitter,
    layout: &mut LayoutTable,
    runtime: &RuntimeTypes,
    universe: &TypeUniverse,
    class_method_funcs: &mut FxHashMap<TypeId, FxHashMap<String, u32>>,
    compiled: &mut std::collections::HashSet<TypeId>,
    pending_bodies: &mut Vec<PendingBody>,
) -> Result<()> {
    if !compiled.insert(class_id) {
        return Ok(());
    }
    let class = universe.as_class(class_id).ok_or(LayoutError::MissingClassLayout(class_id))?.clone();

    if let Some(parent_id) = class.super_class {
        compile_class(
            parent_id,
            graph,
            environments,
            emitter,
            layout,
            runtime,
            universe,
            class_method_funcs,
            compiled,
            pending_bodies,
        )?;
    }

    let struct_idx = layout.layout_of(emitter, universe, runtime, class_id)?.struct_type_idx;

    let module = graph.module(class.module).expect("module in graph exists");
    let Some(decl) = module.ast.decls.iter().find_map(|d| match d {
        Decl::Class(c) if c.name == class.name => Some(c),
        _ => None,
    }) else {
        return Err(LayoutError::UnknownClass(class.name.clone()));
    };

    if let Some(ctor) = &decl.constructor {
        let ctor_ty = class
            .constructor_type
            .ok_or_else(|| LayoutError::MissingFunctionIndex(format!("{}::constructor", class.name)))?;
        let ctor_fn = universe
            .as_function(ctor_ty)
            .ok_or_else(|| LayoutError::MissingFunctionIndex(format!("{}::constructor", class.name)))?
            .clone();
        let ctor_type_idx = layout.constructor_func_type(emitter, universe, runtime, struct_idx, &ctor_fn.parameters)?;
        let ctor_func_idx = emitter.add_function(ctor_type_idx)?;
        layout.set_constructor_func_idx(class_id, ctor_func_idx);
        pending_bodies.push(PendingBody {
            module_id: class.module,
            class_id,
            func_idx: ctor_func_idx,
            param_names: ctor.params.iter().map(|p| p.name.clone()).collect(),
            param_types: ctor_fn.parameters.clone(),
            receiver_heap: HeapType::Concrete(struct_idx),
            own_struct_idx: struct_idx,
            needs_receiver_cast: false,
            body: ctor.body.clone(),
        });
    }

    let env = environments.module(class.module);
    let mut declared: FxHashMap<String, &MethodDecl> = FxHashMap::default();
    for m in &decl.methods {
        declared.insert(m.name(), m);
    }
    for mixin_ref in &decl.mixins {
        if let Some(mname) = mixin_name(mixin_ref) {
            if let Some(mixin) = env.mixins.get(mname) {
                for m in &mixin.methods {
                    declared.entry(m.name()).or_insert(m);
                }
            }
        }
    }

    let slots = layout.layout_of(emitter, universe, runtime, class_id)?.methods.clone();
    let parent_funcs = class.super_class.and_then(|p| class_method_funcs.get(&p).cloned()).unwrap_or_default();
    let mut own_funcs: FxHashMap<String, u32> = FxHashMap::default();

    for (name, slot) in &slots {
        if let Some(m) = declared.get(name) {
            let func_idx = emitter.add_function(slot.func_type_idx)?;
            let receiver_params = emitter.get_function_type_params(slot.func_type_idx)?;
            let receiver_heap = match receiver_params.first() {
                Some(ValType::Ref(r)) => r.heap,
                _ => HeapType::Concrete(struct_idx),
            };
            let is_override = parent_funcs.contains_key(name) || receiver_heap != HeapType::Concrete(struct_idx);
            let method_ty = *class
                .methods
                .get(name)
                .ok_or_else(|| LayoutError::MissingMethodSlot(name.clone(), class_id))?;
            let f = universe
                .as_function(method_ty)
                .ok_or_else(|| LayoutError::MissingMethodSlot(name.clone(), class_id))?
                .clone();
            pending_bodies.push(PendingBody {
                module_id: class.module,
                class_id,
                func_idx,
                param_names: m.params.iter().map(|p| p.name.clone()).collect(),
                param_types: f.parameters.clone(),
                receiver_heap,
                own_struct_idx: struct_idx,
                needs_receiver_cast: is_override,
                body: m.body.clone(),
            });
            own_funcs.insert(name.clone(), func_idx);
        } else if let Some(&idx) = parent_funcs.get(name) {
            own_funcs.insert(name.clone(), idx);
        } else {
            return Err(LayoutError::MissingMethodSlot(name.clone(), class_id));
        }
    }

    for &func_idx in own_funcs.values() {
        emitter.declare_function(func_idx);
    }
    class_method_funcs.insert(class_id, own_funcs.clone());
    layout.finalize_vtable_global(emitter, class_id, &own_funcs)?;
    Ok(())
}

fn mixin_name(te: &zena_ast::nodes::TypeExpr) -> Option<&str> {
    match te {
        zena_ast::nodes::TypeExpr::Name(n) | zena_ast::nodes::TypeExpr::Generic(n, _) => Some(n.as_str()),
        _ => None,
    }
}

/// A narrow, explicit set of constant-foldable literal initializers for
/// non-function top-level `let`s. Anything else (a call, a `new`, a
/// binary expression) is out of scope — WASM globals require a constant
/// initializer and this generator does not build a general constant-
/// folder (see `DESIGN.md`).
fn const_literal(expr: &Expr, ty: TypeId, universe: &TypeUniverse) -> Option<zena_binary::ConstExpr> {
    use zena_binary::ConstExpr;
    match expr {
        Expr::IntLiteral(n) => {
            if matches!(universe.get(ty), Type::Primitive(PrimitiveKind::I64)) {
                Some(ConstExpr::I64(n.value))
            } else {
                Some(ConstExpr::I32(n.value as i32))
            }
        }
        Expr::FloatLiteral(n) => {
            if matches!(universe.get(ty), Type::Primitive(PrimitiveKind::F32)) {
                Some(ConstExpr::F32(n.value as f32))
            } else {
                Some(ConstExpr::F64(n.value))
            }
        }
        Expr::BoolLiteral(n) => Some(ConstExpr::I32(i32::from(n.value))),
        Expr::NullLiteral(_, _) => Some(ConstExpr::RefNull(HeapType::Any)),
        Expr::Paren(inner) => const_literal(inner, ty, universe),
        _ => None,
    }
}
