//! Per-function lowering context: the local-variable table and the
//! bundle of borrows [`crate::expr`]/[`crate::stmt`] thread through a
//! single function or method body (spec §4.5.5/§4.5.6).

use rustc_hash::FxHashMap;
use zena_ast::ModuleId;
use zena_binary::{BinaryEmitter, ValType};
use zena_checker::SemanticContext;
use zena_types::{TypeId, TypeUniverse};

use crate::instr;
use crate::layout::LayoutTable;
use crate::runtime_types::RuntimeTypes;

/// Pushes the zero/null default for `ty`. Used to fill every
/// non-vtable field of a fresh instance at `new` time (spec §4.5.6) —
/// every field is encoded nullable or numeric (see
/// `crate::layout::value_type_for`), so this never needs a non-null
/// reference default.
pub fn push_zero_value(buf: &mut Vec<u8>, ty: ValType) {
    match ty {
        ValType::I32 => instr::i32_const(buf, 0),
        ValType::I64 => instr::i64_const(buf, 0),
        ValType::F32 => instr::f32_const(buf, 0.0),
        ValType::F64 => instr::f64_const(buf, 0.0),
        ValType::Ref(r) => instr::ref_null(buf, r.heap),
    }
}

/// One function's name → (local index, WASM type) scopes. Parameters
/// occupy indices `0..param_count`; every further `declare` call adds
/// an additional local past that, matching how the code section's
/// local-declaration vector only lists locals beyond the parameters.
pub struct Locals {
    scopes: Vec<FxHashMap<String, (u32, ValType)>>,
    extra: Vec<ValType>,
    next_index: u32,
}

impl Locals {
    #[must_use]
    pub fn new(params: &[(String, ValType)]) -> Self {
        let mut scope = FxHashMap::default();
        for (i, (name, ty)) in params.iter().enumerate() {
            scope.insert(name.clone(), (i as u32, *ty));
        }
        Locals { scopes: vec![scope], extra: Vec::new(), next_index: params.len() as u32 }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares a new local in the innermost scope, returning its index.
    pub fn declare(&mut self, name: &str, ty: ValType) -> u32 {
        let index = self.next_index;
        self.next_index += 1;
        self.extra.push(ty);
        self.scopes.last_mut().expect("at least one scope").insert(name.to_string(), (index, ty));
        index
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<(u32, ValType)> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    /// The locals vector `zena_binary::BinaryEmitter::add_code` expects
    /// — everything declared past the parameters, in declaration order.
    #[must_use]
    pub fn extra_locals(&self) -> Vec<ValType> {
        self.extra.clone()
    }
}

/// One function/method/constructor body's binding: what its `this`
/// reference resolves to (`None` for free functions), the class it is
/// a member of when applicable, and a loop-label stack so `break`/
/// `continue` know how many blocks to `br` out of (spec §4.5.5).
pub struct LoopLabels {
    /// One `(break_depth, continue_depth)` pair per enclosing loop, the
    /// innermost loop last. Depths are measured from the `br`/`br_if`
    /// site, recomputed by the caller at each nesting level since every
    /// `if`/`block` wrapper the lowering emits shifts them by one.
    stack: Vec<(u32, u32)>,
}

impl LoopLabels {
    #[must_use]
    pub fn new() -> Self {
        LoopLabels { stack: Vec::new() }
    }

    pub fn push(&mut self, break_depth: u32, continue_depth: u32) {
        self.stack.push((break_depth, continue_depth));
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    #[must_use]
    pub fn innermost(&self) -> Option<(u32, u32)> {
        self.stack.last().copied()
    }

    /// Every entry already on the stack sits one block further away
    /// once a new `block`/`if`/`loop` wrapper is pushed around them.
    pub fn shift(&mut self, by: u32) {
        for (b, c) in &mut self.stack {
            *b += by;
            *c += by;
        }
    }

    pub fn unshift(&mut self, by: u32) {
        for (b, c) in &mut self.stack {
            *b -= by;
            *c -= by;
        }
    }
}

/// Everything [`crate::expr`] and [`crate::stmt`] need to lower one
/// function body. `this_class` is `Some` inside a method or
/// constructor body, giving bare-field access through `this` a struct
/// type to resolve against (the surface language still requires
/// `this.field`, so this is only consulted for `this` itself, not for
/// implicit field lookup).
pub struct FnCx<'a> {
    pub emitter: &'a mut BinaryEmitter,
    pub layout: &'a mut LayoutTable,
    pub runtime: &'a RuntimeTypes,
    pub universe: &'a TypeUniverse,
    pub sem: &'a SemanticContext,
    pub module_id: ModuleId,
    pub locals: Locals,
    pub loops: LoopLabels,
    pub this_class: Option<TypeId>,
    /// Flat cross-module function table built once in
    /// [`crate::generate`]: `name -> (func_idx, func_type_idx)`. A
    /// deliberately flat namespace — see `DESIGN.md` for why codegen
    /// does not re-derive per-module import resolution here.
    pub functions: &'a FxHashMap<String, (u32, u32)>,
    /// The current module's type-position names (classes, interfaces,
    /// enums, aliases in scope here, including imports) — `Environments`'
    /// Phase A output for this one module, used to resolve `is`/`as`'s
    /// syntactic [`zena_ast::nodes::TypeExpr`] back to a `TypeId`.
    pub classes_by_name: &'a FxHashMap<String, TypeId>,
    pub diagnostics_module: ModuleId,
}
