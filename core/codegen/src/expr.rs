//! Expression lowering (spec §4.5.6): one function per
//! [`zena_ast::nodes::Expr`] variant, each leaving exactly one value of
//! the returned [`ValType`] on the stack.

use zena_ast::ids::GlobalNodeId;
use zena_ast::nodes::{Expr, OperatorKind, UnaryOperatorKind};
use zena_binary::{HeapType, RefType, ValType};
use zena_types::{PrimitiveKind, Type, TypeId};

use crate::errors::{LayoutError, Result};
use crate::function::{push_zero_value, FnCx};
use crate::instr::{self, f32_op, f64_op, i32_op, i64_op};

fn node_type(fcx: &FnCx, node: zena_ast::NodeId) -> Result<TypeId> {
    fcx.sem
        .type_of(GlobalNodeId::new(fcx.module_id, node))
        .ok_or(LayoutError::MissingNodeType(node, fcx.module_id))
}

/// Lowers `expr`, returning the WASM value type of whatever it left on
/// the stack.
pub fn lower_expr(fcx: &mut FnCx, buf: &mut Vec<u8>, expr: &Expr) -> Result<ValType> {
    match expr {
        Expr::IntLiteral(n) => {
            let ty = node_type(fcx, n.id)?;
            match fcx.universe.get(ty) {
                Type::Primitive(PrimitiveKind::I64) => {
                    instr::i64_const(buf, n.value);
                    Ok(ValType::I64)
                }
                _ => {
                    instr::i32_const(buf, n.value as i32);
                    Ok(ValType::I32)
                }
            }
        }
        Expr::FloatLiteral(n) => {
            let ty = node_type(fcx, n.id)?;
            if matches!(fcx.universe.get(ty), Type::Primitive(PrimitiveKind::F32)) {
                instr::f32_const(buf, n.value as f32);
                Ok(ValType::F32)
            } else {
                instr::f64_const(buf, n.value);
                Ok(ValType::F64)
            }
        }
        Expr::BoolLiteral(n) => {
            instr::i32_const(buf, i32::from(n.value));
            Ok(ValType::I32)
        }
        Expr::NullLiteral(_, _) => {
            let ty = ValType::Ref(RefType::nullable(HeapType::Any));
            push_zero_value(buf, ty);
            Ok(ty)
        }
        Expr::StringLiteral(n) => lower_string_literal(fcx, buf, &n.value),
        Expr::Identifier(id) => lower_identifier(fcx, buf, &id.name),
        Expr::Paren(inner) => lower_expr(fcx, buf, inner),
        Expr::Binary(b) => lower_binary(fcx, buf, b),
        Expr::Unary(u) => lower_unary(fcx, buf, u),
        Expr::Call(c) => lower_call(fcx, buf, c),
        Expr::New(n) => lower_new(fcx, buf, n),
        Expr::MemberAccess(m) => lower_member_access(fcx, buf, m),
        Expr::TypeMemberAccess(t) => lower_type_member_access(fcx, buf, t),
        Expr::IndexAccess(ix) => lower_index_get(fcx, buf, ix),
        Expr::ArrayLiteral(a) => lower_array_literal(fcx, buf, a),
        Expr::Is(is) => lower_is(fcx, buf, is),
        Expr::As(a) => {
            // Erasure-based: every reference type already lowers to
            // `anyref` or a concrete struct ref, so a checked-by-the-
            // checker `as` cast is a `ref.cast` when the target is a
            // concrete class, a no-op otherwise.
            let operand_ty = lower_expr(fcx, buf, &a.expr)?;
            let target = node_type(fcx, a.id)?;
            if let Type::Class(_) = fcx.universe.get(target) {
                let struct_idx = fcx.layout.layout_of(fcx.emitter, fcx.universe, fcx.runtime, target)?.struct_type_idx;
                instr::ref_cast(buf, HeapType::Concrete(struct_idx));
            }
            Ok(operand_ty)
        }
        Expr::TupleLiteral(t) => {
            // No tuple runtime representation yet (spec §9 leaves tuple
            // interning open and this codegen does not build one) —
            // evaluate for side effects and erase to `anyref null`.
            for e in &t.elements {
                let ty = lower_expr(fcx, buf, e)?;
                instr::drop(buf);
                let _ = ty;
            }
            let ty = ValType::Ref(RefType::nullable(HeapType::Any));
            push_zero_value(buf, ty);
            Ok(ty)
        }
        Expr::RecordLiteral(r) => {
            for (_, e) in &r.fields {
                let ty = lower_expr(fcx, buf, e)?;
                instr::drop(buf);
                let _ = ty;
            }
            let ty = ValType::Ref(RefType::nullable(HeapType::Any));
            push_zero_value(buf, ty);
            Ok(ty)
        }
        Expr::Lambda(_) => {
            // Only top-level `let`-bound lambdas compile to real
            // functions (see `crate::generate`'s function table); a
            // lambda appearing as a nested expression has no capture
            // support yet.
            let ty = ValType::Ref(RefType::nullable(HeapType::Func));
            push_zero_value(buf, ty);
            Ok(ty)
        }
    }
}

fn lower_identifier(fcx: &mut FnCx, buf: &mut Vec<u8>, name: &str) -> Result<ValType> {
    if let Some((idx, ty)) = fcx.locals.resolve(name) {
        instr::local_get(buf, idx);
        return Ok(ty);
    }
    if let Some(&(func_idx, func_type_idx)) = fcx.functions.get(name) {
        fcx.emitter.declare_function(func_idx);
        instr::ref_func(buf, func_idx);
        let _ = func_type_idx;
        return Ok(ValType::Ref(RefType::nullable(HeapType::Func)));
    }
    Err(LayoutError::UnresolvedIdentifier(name.to_string()))
}

fn lower_string_literal(fcx: &mut FnCx, buf: &mut Vec<u8>, value: &str) -> Result<ValType> {
    let bytes = value.as_bytes().to_vec();
    let len = bytes.len() as i32;
    let data_idx = fcx.emitter.add_data(bytes);
    instr::i32_const(buf, 0);
    instr::i32_const(buf, len);
    instr::array_new_data(buf, fcx.runtime.byte_array, data_idx);
    instr::struct_new(buf, fcx.runtime.string);
    Ok(ValType::Ref(fcx.runtime.string_ref(true)))
}

fn numeric_kind(fcx: &FnCx, ty: TypeId) -> Option<ValType> {
    match fcx.universe.get(ty) {
        Type::Primitive(PrimitiveKind::I32 | PrimitiveKind::Boolean) => Some(ValType::I32),
        Type::Primitive(PrimitiveKind::I64) => Some(ValType::I64),
        Type::Primitive(PrimitiveKind::F32) => Some(ValType::F32),
        Type::Primitive(PrimitiveKind::F64) => Some(ValType::F64),
        Type::Enum(_) => Some(ValType::I32),
        _ => None,
    }
}

fn lower_binary(fcx: &mut FnCx, buf: &mut Vec<u8>, b: &zena_ast::nodes::BinaryExpr) -> Result<ValType> {
    if matches!(b.operator, OperatorKind::And | OperatorKind::Or) {
        return lower_logical(fcx, buf, matches!(b.operator, OperatorKind::And), &b.left, &b.right);
    }

    let left_ty = node_type(fcx, b.left.id())?;
    let kind = numeric_kind(fcx, left_ty);

    if matches!(b.operator, OperatorKind::RefEq | OperatorKind::RefNe) {
        lower_expr(fcx, buf, &b.left)?;
        lower_expr(fcx, buf, &b.right)?;
        instr::ref_eq(buf);
        if matches!(b.operator, OperatorKind::RefNe) {
            instr::simple(buf, i32_op::EQZ);
        }
        return Ok(ValType::I32);
    }

    match kind {
        Some(ValType::I32) => {
            lower_expr(fcx, buf, &b.left)?;
            lower_expr(fcx, buf, &b.right)?;
            instr::simple(buf, i32_opcode(b.operator)?);
            Ok(result_ty(b.operator, ValType::I32))
        }
        Some(ValType::I64) => {
            lower_expr(fcx, buf, &b.left)?;
            lower_expr(fcx, buf, &b.right)?;
            instr::simple(buf, i64_opcode(b.operator)?);
            Ok(result_ty(b.operator, ValType::I64))
        }
        Some(ValType::F32) => {
            lower_expr(fcx, buf, &b.left)?;
            lower_expr(fcx, buf, &b.right)?;
            instr::simple(buf, f32_opcode(b.operator)?);
            Ok(result_ty(b.operator, ValType::F32))
        }
        Some(ValType::F64) | None => {
            // Reference-typed equality (classes, strings, `any`) falls
            // back to identity comparison — no `operator ==` overload
            // dispatch yet (see `DESIGN.md`).
            if kind.is_none() && matches!(b.operator, OperatorKind::Eq | OperatorKind::Ne) {
                lower_expr(fcx, buf, &b.left)?;
                lower_expr(fcx, buf, &b.right)?;
                instr::ref_eq(buf);
                if matches!(b.operator, OperatorKind::Ne) {
                    instr::simple(buf, i32_op::EQZ);
                }
                return Ok(ValType::I32);
            }
            lower_expr(fcx, buf, &b.left)?;
            lower_expr(fcx, buf, &b.right)?;
            instr::simple(buf, f64_opcode(b.operator)?);
            Ok(result_ty(b.operator, ValType::F64))
        }
    }
}

fn result_ty(op: OperatorKind, numeric: ValType) -> ValType {
    use OperatorKind::{Eq, Ge, Gt, Le, Lt, Ne};
    if matches!(op, Eq | Ne | Lt | Le | Gt | Ge) {
        ValType::I32
    } else {
        numeric
    }
}

fn i32_opcode(op: OperatorKind) -> Result<u8> {
    use OperatorKind as O;
    Ok(match op {
        O::Add => i32_op::ADD,
        O::Sub => i32_op::SUB,
        O::Mul => i32_op::MUL,
        O::Div => i32_op::DIV_S,
        O::Mod => i32_op::REM_S,
        O::BitAnd => i32_op::AND,
        O::BitOr => i32_op::OR,
        O::BitXor => i32_op::XOR,
        O::Shl => i32_op::SHL,
        O::Shr => i32_op::SHR_S,
        O::UShr => i32_op::SHR_U,
        O::Eq => i32_op::EQ,
        O::Ne => i32_op::NE,
        O::Lt => i32_op::LT_S,
        O::Le => i32_op::LE_S,
        O::Gt => i32_op::GT_S,
        O::Ge => i32_op::GE_S,
        O::And | O::Or | O::RefEq | O::RefNe => unreachable!("handled separately"),
    })
}

fn i64_opcode(op: OperatorKind) -> Result<u8> {
    use OperatorKind as O;
    Ok(match op {
        O::Add => i64_op::ADD,
        O::Sub => i64_op::SUB,
        O::Mul => i64_op::MUL,
        O::Div => i64_op::DIV_S,
        O::Mod => i64_op::REM_S,
        O::BitAnd => i64_op::AND,
        O::BitOr => i64_op::OR,
        O::BitXor => i64_op::XOR,
        O::Shl => i64_op::SHL,
        O::Shr => i64_op::SHR_S,
        O::UShr => i64_op::SHR_U,
        O::Eq => i64_op::EQ,
        O::Ne => i64_op::NE,
        O::Lt => i64_op::LT_S,
        O::Le => i64_op::LE_S,
        O::Gt => i64_op::GT_S,
        O::Ge => i64_op::GE_S,
        O::And | O::Or | O::RefEq | O::RefNe => unreachable!("handled separately"),
    })
}

fn f32_opcode(op: OperatorKind) -> Result<u8> {
    use OperatorKind as O;
    Ok(match op {
        O::Add => f32_op::ADD,
        O::Sub => f32_op::SUB,
        O::Mul => f32_op::MUL,
        O::Div => f32_op::DIV,
        O::Eq => f32_op::EQ,
        O::Ne => f32_op::NE,
        O::Lt => f32_op::LT,
        O::Le => f32_op::LE,
        O::Gt => f32_op::GT,
        O::Ge => f32_op::GE,
        _ => return Err(LayoutError::NotCallable("unsupported f32 operator".to_string())),
    })
}

fn f64_opcode(op: OperatorKind) -> Result<u8> {
    use OperatorKind as O;
    Ok(match op {
        O::Add => f64_op::ADD,
        O::Sub => f64_op::SUB,
        O::Mul => f64_op::MUL,
        O::Div => f64_op::DIV,
        O::Eq => f64_op::EQ,
        O::Ne => f64_op::NE,
        O::Lt => f64_op::LT,
        O::Le => f64_op::LE,
        O::Gt => f64_op::GT,
        O::Ge => f64_op::GE,
        _ => return Err(LayoutError::NotCallable("unsupported f64 operator".to_string())),
    })
}

/// `&&`/`||` short-circuit through a temp local rather than a
/// value-producing `if`, since this codegen's `block_start`/`if_start`
/// always use the empty blocktype (spec §4.5.5 keeps every control
/// structure void-typed and routes results through locals instead).
fn lower_logical(fcx: &mut FnCx, buf: &mut Vec<u8>, is_and: bool, left: &Expr, right: &Expr) -> Result<ValType> {
    lower_expr(fcx, buf, left)?;
    let tmp = fcx.locals.declare("$logical", ValType::I32);
    instr::local_set(buf, tmp);
    instr::local_get(buf, tmp);
    if !is_and {
        instr::simple(buf, i32_op::EQZ);
    }
    instr::if_start(buf);
    lower_expr(fcx, buf, right)?;
    instr::local_set(buf, tmp);
    instr::end(buf);
    instr::local_get(buf, tmp);
    Ok(ValType::I32)
}

fn lower_unary(fcx: &mut FnCx, buf: &mut Vec<u8>, u: &zena_ast::nodes::UnaryExpr) -> Result<ValType> {
    let ty = lower_expr(fcx, buf, &u.operand)?;
    match u.operator {
        UnaryOperatorKind::Not => {
            instr::simple(buf, i32_op::EQZ);
            Ok(ValType::I32)
        }
        UnaryOperatorKind::Neg => {
            match ty {
                ValType::I32 => {
                    instr::i32_const(buf, -1);
                    instr::simple(buf, i32_op::MUL);
                }
                ValType::I64 => {
                    instr::i64_const(buf, -1);
                    instr::simple(buf, i64_op::MUL);
                }
                ValType::F32 => instr::simple(buf, f32_op::NEG),
                ValType::F64 => instr::simple(buf, f64_op::NEG),
                ValType::Ref(_) => {
                    return Err(LayoutError::NotCallable("cannot negate a reference".to_string()))
                }
            }
            Ok(ty)
        }
    }
}

fn lower_call(fcx: &mut FnCx, buf: &mut Vec<u8>, c: &zena_ast::nodes::CallExpr) -> Result<ValType> {
    match &c.callee {
        Expr::Identifier(id) => {
            let Some(&(func_idx, func_type_idx)) = fcx.functions.get(&id.name) else {
                return Err(LayoutError::UnresolvedIdentifier(id.name.clone()));
            };
            for arg in &c.args {
                lower_expr(fcx, buf, arg)?;
            }
            instr::call(buf, func_idx);
            let results = fcx.emitter.get_function_type_results(func_type_idx)?;
            match results.first().copied() {
                Some(ty) => Ok(ty),
                // A void callee leaves nothing on the stack, but every
                // lowered expression here leaves exactly one value —
                // push a throwaway so callers (e.g. `Statement::Expr`'s
                // unconditional `drop`) stay balanced.
                None => {
                    instr::i32_const(buf, 0);
                    Ok(ValType::I32)
                }
            }
        }
        Expr::MemberAccess(m) => lower_method_call(fcx, buf, m, &c.args),
        other => Err(LayoutError::NotCallable(format!("{other:?}"))),
    }
}

fn lower_method_call(
    fcx: &mut FnCx,
    buf: &mut Vec<u8>,
    m: &zena_ast::nodes::MemberAccessExpr,
    args: &[Expr],
) -> Result<ValType> {
    let receiver_ty = node_type(fcx, m.expr.id())?;
    let Type::Class(_) = fcx.universe.get(receiver_ty) else {
        return Err(LayoutError::NotCallable(format!(
            "method dispatch through a non-class receiver is not supported for '{}'",
            m.name
        )));
    };
    let (struct_idx, vtable_idx, slot, func_type_idx) = {
        let layout = fcx.layout.layout_of(fcx.emitter, fcx.universe, fcx.runtime, receiver_ty)?;
        let method = layout
            .methods
            .get(&m.name)
            .ok_or_else(|| LayoutError::MissingMethodSlot(m.name.clone(), receiver_ty))?;
        (layout.struct_type_idx, layout.vtable_type_idx, method.slot, method.func_type_idx)
    };

    lower_expr(fcx, buf, &m.expr)?;
    let recv_local = fcx.locals.declare("$recv", ValType::Ref(RefType::non_null(HeapType::Concrete(struct_idx))));
    instr::local_set(buf, recv_local);
    instr::local_get(buf, recv_local);
    for arg in args {
        lower_expr(fcx, buf, arg)?;
    }
    instr::local_get(buf, recv_local);
    instr::struct_get(buf, struct_idx, 0);
    instr::struct_get(buf, vtable_idx, slot);
    instr::call_ref(buf, func_type_idx);
    let results = fcx.emitter.get_function_type_results(func_type_idx)?;
    match results.first().copied() {
        Some(ty) => Ok(ty),
        None => {
            instr::i32_const(buf, 0);
            Ok(ValType::I32)
        }
    }
}

fn lower_new(fcx: &mut FnCx, buf: &mut Vec<u8>, n: &zena_ast::nodes::NewExpr) -> Result<ValType> {
    let class_ty = node_type(fcx, n.id)?;
    let (struct_idx, vtable_global, field_types, ctor_func_idx) = {
        let layout = fcx.layout.layout_of(fcx.emitter, fcx.universe, fcx.runtime, class_ty)?;
        let mut ordered: Vec<_> = layout.fields.values().collect();
        ordered.sort_by_key(|f| f.index);
        let field_types: Vec<ValType> = ordered.into_iter().map(|f| f.wasm_ty).collect();
        (layout.struct_type_idx, layout.vtable_global_idx, field_types, layout.constructor_func_idx)
    };

    instr::global_get(buf, vtable_global);
    for ty in &field_types {
        push_zero_value(buf, *ty);
    }
    instr::struct_new(buf, struct_idx);

    let instance_local =
        fcx.locals.declare("$new", ValType::Ref(RefType::non_null(HeapType::Concrete(struct_idx))));
    instr::local_tee(buf, instance_local);

    if let Some(ctor_idx) = ctor_func_idx {
        instr::local_get(buf, instance_local);
        for arg in &n.args {
            lower_expr(fcx, buf, arg)?;
        }
        instr::call(buf, ctor_idx);
    } else {
        instr::drop(buf);
    }
    instr::local_get(buf, instance_local);
    Ok(ValType::Ref(RefType::nullable(HeapType::Concrete(struct_idx))))
}

fn lower_member_access(
    fcx: &mut FnCx,
    buf: &mut Vec<u8>,
    m: &zena_ast::nodes::MemberAccessExpr,
) -> Result<ValType> {
    let receiver_ty = node_type(fcx, m.expr.id())?;
    lower_expr(fcx, buf, &m.expr)?;
    let layout = fcx.layout.layout_of(fcx.emitter, fcx.universe, fcx.runtime, receiver_ty)?;
    let field = layout
        .fields
        .get(&m.name)
        .ok_or_else(|| LayoutError::MissingField(m.name.clone(), receiver_ty))?;
    instr::struct_get(buf, layout.struct_type_idx, field.index);
    Ok(field.wasm_ty)
}

fn lower_type_member_access(
    fcx: &mut FnCx,
    buf: &mut Vec<u8>,
    t: &zena_ast::nodes::TypeMemberAccessExpr,
) -> Result<ValType> {
    // Enum variant reference (`Color.Blue`): lowers directly to its
    // i32 discriminant (spec §4.5.4 — enums are unboxed integers). The
    // node's own inferred type already names the enum, so there is no
    // need to resolve `t.type_name` against a separate table.
    let node_ty = node_type(fcx, t.id)?;
    if let Type::Enum(e) = fcx.universe.get(node_ty) {
        if let Some((_, value)) = e.variants.iter().find(|(name, _)| *name == t.name) {
            instr::i32_const(buf, *value);
            return Ok(ValType::I32);
        }
    }
    Err(LayoutError::UnknownClass(format!("{}.{}", t.type_name, t.name)))
}

fn lower_index_get(
    fcx: &mut FnCx,
    buf: &mut Vec<u8>,
    ix: &zena_ast::nodes::IndexAccessExpr,
) -> Result<ValType> {
    lower_expr(fcx, buf, &ix.expr)?;
    lower_expr(fcx, buf, &ix.index)?;
    instr::array_get(buf, fcx.runtime.anyref_array);
    Ok(ValType::Ref(fcx.runtime.anyref_array_ref(true)))
}

fn lower_array_literal(
    fcx: &mut FnCx,
    buf: &mut Vec<u8>,
    a: &zena_ast::nodes::ArrayLiteralExpr,
) -> Result<ValType> {
    for e in &a.elements {
        lower_expr(fcx, buf, e)?;
    }
    instr::array_new_fixed(buf, fcx.runtime.anyref_array, a.elements.len() as u32);
    Ok(ValType::Ref(fcx.runtime.anyref_array_ref(true)))
}

fn lower_is(fcx: &mut FnCx, buf: &mut Vec<u8>, is: &zena_ast::nodes::IsExpr) -> Result<ValType> {
    let target = fcx.sem.universe.resolve_alias(node_type_for_type_expr(fcx, &is.ty));
    lower_expr(fcx, buf, &is.expr)?;
    if let Type::Class(_) = fcx.universe.get(target) {
        let struct_idx = fcx.layout.layout_of(fcx.emitter, fcx.universe, fcx.runtime, target)?.struct_type_idx;
        instr::ref_test(buf, HeapType::Concrete(struct_idx));
    } else {
        instr::drop(buf);
        instr::i32_const(buf, 1);
    }
    if is.negated {
        instr::simple(buf, i32_op::EQZ);
    }
    Ok(ValType::I32)
}

/// `is`/`as` carry a syntactic [`zena_ast::nodes::TypeExpr`], not a
/// `TypeId` — the checker records the *expression's* inferred type as a
/// boolean for `is`, not the narrowed target, so there is no side-table
/// shortcut here the way `new`/`as`'s own node type is. We resolve the
/// name against the current module's `Environments` type-name map
/// instead (the same Phase A table the checker itself resolved `is`/
/// `as` against), which covers every concrete-class case the checker
/// supports for narrowing (spec §4.4); anything else falls back to
/// `any`.
fn node_type_for_type_expr(fcx: &FnCx, ty: &zena_ast::nodes::TypeExpr) -> TypeId {
    if let zena_ast::nodes::TypeExpr::Name(name) = ty {
        if let Some(&id) = fcx.classes_by_name.get(name) {
            return id;
        }
    }
    fcx.sem.universe.any()
}
