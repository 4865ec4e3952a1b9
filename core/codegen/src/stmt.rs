//! Statement lowering (spec §4.5.5): every control-flow form compiles
//! to void-typed `block`/`loop`/`if` nesting, with `break`/`continue`
//! resolved through [`crate::function::LoopLabels`] rather than a
//! value stack.

use zena_ast::ids::GlobalNodeId;
use zena_ast::nodes::{Block, ElseArm, Statement};
use zena_binary::{HeapType, RefType, ValType};

use crate::errors::{LayoutError, Result};
use crate::expr::lower_expr;
use crate::function::FnCx;
use crate::instr;

/// Lowers every statement of `block` in its own local scope.
pub fn lower_block(fcx: &mut FnCx, buf: &mut Vec<u8>, block: &Block) -> Result<()> {
    fcx.locals.push_scope();
    for stmt in &block.statements {
        lower_statement(fcx, buf, stmt)?;
    }
    fcx.locals.pop_scope();
    Ok(())
}

pub fn lower_statement(fcx: &mut FnCx, buf: &mut Vec<u8>, stmt: &Statement) -> Result<()> {
    match stmt {
        Statement::Expr(e) => {
            let ty = lower_expr(fcx, buf, e)?;
            instr::drop(buf);
            let _ = ty;
            Ok(())
        }
        Statement::Let(s) => {
            let ty = lower_expr(fcx, buf, &s.value)?;
            let local = fcx.locals.declare(&s.name, ty);
            instr::local_set(buf, local);
            Ok(())
        }
        Statement::Assign(s) => lower_assign(fcx, buf, s),
        Statement::If(s) => lower_if(fcx, buf, s),
        Statement::While(s) => lower_while(fcx, buf, s),
        Statement::For(s) => lower_for(fcx, buf, s),
        Statement::Return(s) => {
            if let Some(value) = &s.value {
                lower_expr(fcx, buf, value)?;
            }
            instr::ret(buf);
            Ok(())
        }
        Statement::Break(_, _) => {
            let (break_depth, _) =
                fcx.loops.innermost().ok_or_else(|| LayoutError::NotCallable("break outside a loop".to_string()))?;
            instr::br(buf, break_depth);
            Ok(())
        }
        Statement::Continue(_, _) => {
            let (_, continue_depth) = fcx
                .loops
                .innermost()
                .ok_or_else(|| LayoutError::NotCallable("continue outside a loop".to_string()))?;
            instr::br(buf, continue_depth);
            Ok(())
        }
        Statement::Throw(s) => {
            lower_expr(fcx, buf, &s.value)?;
            instr::throw(buf, 0);
            Ok(())
        }
        Statement::TryCatch(s) => lower_try_catch(fcx, buf, s),
        Statement::Assert(s) => {
            lower_expr(fcx, buf, &s.condition)?;
            instr::simple(buf, instr::i32_op::EQZ);
            instr::if_start(buf);
            instr::unreachable(buf);
            instr::end(buf);
            Ok(())
        }
        Statement::Block(b) => lower_block(fcx, buf, b),
    }
}

fn lower_assign(fcx: &mut FnCx, buf: &mut Vec<u8>, s: &zena_ast::nodes::AssignStmt) -> Result<()> {
    use zena_ast::nodes::Expr;
    match &s.target {
        Expr::Identifier(id) => {
            let ty = lower_expr(fcx, buf, &s.value)?;
            let _ = ty;
            let (idx, _) = fcx
                .locals
                .resolve(&id.name)
                .ok_or_else(|| LayoutError::UnresolvedIdentifier(id.name.clone()))?;
            instr::local_set(buf, idx);
            Ok(())
        }
        Expr::MemberAccess(m) => {
            let receiver_ty = fcx
                .sem
                .type_of(GlobalNodeId::new(fcx.module_id, m.expr.id()))
                .ok_or(LayoutError::MissingNodeType(m.expr.id(), fcx.module_id))?;
            let (struct_idx, field_idx) = {
                let layout = fcx.layout.layout_of(fcx.emitter, fcx.universe, fcx.runtime, receiver_ty)?;
                let field = layout
                    .fields
                    .get(&m.name)
                    .ok_or_else(|| LayoutError::MissingField(m.name.clone(), receiver_ty))?;
                (layout.struct_type_idx, field.index)
            };
            lower_expr(fcx, buf, &m.expr)?;
            lower_expr(fcx, buf, &s.value)?;
            instr::struct_set(buf, struct_idx, field_idx);
            Ok(())
        }
        Expr::IndexAccess(ix) => {
            lower_expr(fcx, buf, &ix.expr)?;
            lower_expr(fcx, buf, &ix.index)?;
            lower_expr(fcx, buf, &s.value)?;
            instr::array_set(buf, fcx.runtime.anyref_array);
            Ok(())
        }
        other => Err(LayoutError::NotCallable(format!("invalid assignment target {other:?}"))),
    }
}

fn lower_if(fcx: &mut FnCx, buf: &mut Vec<u8>, s: &zena_ast::nodes::IfStmt) -> Result<()> {
    lower_expr(fcx, buf, &s.condition)?;
    fcx.loops.shift(1);
    instr::if_start(buf);
    lower_block(fcx, buf, &s.then_block)?;
    if let Some(arm) = &s.else_block {
        instr::else_(buf);
        match arm {
            ElseArm::Block(b) => lower_block(fcx, buf, b)?,
            ElseArm::If(inner) => lower_if(fcx, buf, inner)?,
        }
    }
    instr::end(buf);
    fcx.loops.unshift(1);
    Ok(())
}

/// `while cond { body }` lowers to `block { loop { br_if 1 unless cond;
/// body; br 0 } }` — the outer block gives `break` a target one level
/// shallower than `continue`'s `loop` target (spec §4.5.5).
fn lower_while(fcx: &mut FnCx, buf: &mut Vec<u8>, s: &zena_ast::nodes::WhileStmt) -> Result<()> {
    instr::block_start(buf);
    instr::loop_start(buf);
    fcx.loops.shift(2);
    fcx.loops.push(1, 0);

    lower_expr(fcx, buf, &s.condition)?;
    instr::simple(buf, crate::instr::i32_op::EQZ);
    instr::br_if(buf, 1);
    lower_block(fcx, buf, &s.body)?;
    instr::br(buf, 0);

    fcx.loops.pop();
    fcx.loops.unshift(2);
    instr::end(buf);
    instr::end(buf);
    Ok(())
}

fn lower_for(fcx: &mut FnCx, buf: &mut Vec<u8>, s: &zena_ast::nodes::ForStmt) -> Result<()> {
    fcx.locals.push_scope();
    if let Some(init) = &s.init {
        lower_statement(fcx, buf, init)?;
    }

    instr::block_start(buf);
    instr::loop_start(buf);
    // `continue` must still run `update` before looping back, so body
    // gets one more wrapping block than `while` does: `break` exits all
    // three (depth 2), `continue` only exits the innermost one (depth
    // 0), landing just before `update`.
    instr::block_start(buf);
    fcx.loops.shift(3);
    fcx.loops.push(2, 0);

    if let Some(cond) = &s.condition {
        lower_expr(fcx, buf, cond)?;
        instr::simple(buf, crate::instr::i32_op::EQZ);
        instr::br_if(buf, 2);
    }
    lower_block(fcx, buf, &s.body)?;
    instr::end(buf);
    if let Some(update) = &s.update {
        lower_statement(fcx, buf, update)?;
    }
    instr::br(buf, 0);

    fcx.loops.pop();
    fcx.loops.unshift(3);
    instr::end(buf);
    instr::end(buf);
    fcx.locals.pop_scope();
    Ok(())
}

/// `catch_all` (not `catch $tag`) since there is no per-exception-type
/// tag registry yet — every thrown value is caught uniformly and
/// `catch_name`, if bound, resolves to its WASM-mandated zero/null
/// value rather than the thrown payload (a documented simplification,
/// see `DESIGN.md`).
fn lower_try_catch(fcx: &mut FnCx, buf: &mut Vec<u8>, s: &zena_ast::nodes::TryCatchStmt) -> Result<()> {
    instr::try_start(buf);
    lower_block(fcx, buf, &s.try_block)?;
    instr::catch_all(buf);
    fcx.locals.push_scope();
    if let Some(name) = &s.catch_name {
        fcx.locals.declare(name, ValType::Ref(RefType::nullable(HeapType::Any)));
    }
    lower_block(fcx, buf, &s.catch_block)?;
    fcx.locals.pop_scope();
    instr::end(buf);
    Ok(())
}
