//! Phase B expression checking (spec §4.4). Walks an [`Expr`] tree,
//! resolving each node to a [`TypeId`] and recording it in the
//! [`SemanticContext`] side table so codegen never re-infers.

use zena_ast::ids::GlobalNodeId;
use zena_ast::nodes::{Expr, OperatorKind, UnaryOperatorKind};
use zena_ast::{Diagnostic, DiagnosticCode, ModuleId};
use zena_types::{PrimitiveKind, Type, TypeId};

use crate::context::SemanticContext;
use crate::env::ModuleEnv;
use crate::scope::Scopes;
use crate::type_resolver::{resolve_type_expr, TypeResolverCtx};

pub struct ExprCx<'a> {
    pub module_id: ModuleId,
    pub env: &'a ModuleEnv,
}

fn gid(ctx: &ExprCx, id: zena_ast::NodeId) -> GlobalNodeId {
    GlobalNodeId::new(ctx.module_id, id)
}

fn empty_local_type_params() -> rustc_hash::FxHashMap<String, TypeId> {
    rustc_hash::FxHashMap::default()
}

pub fn check_expr(
    expr: &Expr,
    ctx: &ExprCx,
    scopes: &mut Scopes,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    let ty = check_expr_inner(expr, ctx, scopes, sem, diagnostics);
    sem.set_type(gid(ctx, expr.id()), ty);
    ty
}

fn check_expr_inner(
    expr: &Expr,
    ctx: &ExprCx,
    scopes: &mut Scopes,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    match expr {
        Expr::IntLiteral(_) => sem.universe.i32(),
        Expr::FloatLiteral(_) => sem.universe.primitive(PrimitiveKind::F64),
        Expr::BoolLiteral(_) => sem.universe.primitive(PrimitiveKind::Boolean),
        Expr::StringLiteral(_) => sem.universe.string(),
        Expr::NullLiteral(..) => sem.universe.null(),
        Expr::Paren(inner) => check_expr(inner, ctx, scopes, sem, diagnostics),

        Expr::Identifier(id) => {
            if let Some(binding) = scopes.lookup(&id.name) {
                return binding.ty;
            }
            if let Some(&ty) = ctx.env.value_names.get(&id.name) {
                return ty;
            }
            diagnostics.push(Diagnostic::error(
                DiagnosticCode::CannotInfer,
                format!("cannot resolve '{}'", id.name),
                id.location.clone(),
            ));
            sem.universe.any()
        }

        Expr::Binary(b) => {
            let lhs = check_expr(&b.left, ctx, scopes, sem, diagnostics);
            let rhs = check_expr(&b.right, ctx, scopes, sem, diagnostics);
            check_binary(b.operator, lhs, rhs, &b.location, sem, diagnostics)
        }

        Expr::Unary(u) => {
            let operand = check_expr(&u.operand, ctx, scopes, sem, diagnostics);
            check_unary(u.operator, operand, &u.location, sem, diagnostics)
        }

        Expr::Call(c) => {
            let callee_ty = check_expr(&c.callee, ctx, scopes, sem, diagnostics);
            let arg_tys: Vec<TypeId> = c
                .args
                .iter()
                .map(|a| check_expr(a, ctx, scopes, sem, diagnostics))
                .collect();
            check_call(callee_ty, &arg_tys, &c.location, sem, diagnostics)
        }

        Expr::New(n) => {
            let Some(&base) = ctx.env.type_names.get(&n.class_name) else {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::UnknownType,
                    format!("unknown class '{}'", n.class_name),
                    n.location.clone(),
                ));
                return sem.universe.any();
            };
            let local_tp = empty_local_type_params();
            let resolver_ctx = TypeResolverCtx {
                env: ctx.env,
                local_type_params: &local_tp,
            };
            let class_ty = if n.type_args.is_empty() {
                base
            } else {
                let args: Vec<TypeId> = n
                    .type_args
                    .iter()
                    .map(|te| resolve_type_expr(te, &resolver_ctx, &mut sem.universe, &n.location, diagnostics))
                    .collect();
                sem.universe.instantiate_class(base, args).unwrap_or_else(|err| {
                    diagnostics.push(Diagnostic::error(DiagnosticCode::ArityMismatch, err.to_string(), n.location.clone()));
                    sem.universe.any()
                })
            };
            let arg_tys: Vec<TypeId> = n
                .args
                .iter()
                .map(|a| check_expr(a, ctx, scopes, sem, diagnostics))
                .collect();
            let Some(class) = sem.universe.as_class(class_ty) else {
                return sem.universe.any();
            };
            let Some(ctor) = class.constructor_type else {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::ArityMismatch,
                    format!("'{}' has no constructor", n.class_name),
                    n.location.clone(),
                ));
                return class_ty;
            };
            check_call(ctor, &arg_tys, &n.location, sem, diagnostics);
            class_ty
        }

        Expr::MemberAccess(m) => {
            let recv = check_expr(&m.expr, ctx, scopes, sem, diagnostics);
            check_member(recv, &m.name, &m.location, sem, diagnostics)
        }

        Expr::TypeMemberAccess(t) => {
            let Some(&enum_ty) = ctx.env.type_names.get(&t.type_name) else {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::UnknownType,
                    format!("unknown type '{}'", t.type_name),
                    t.location.clone(),
                ));
                return sem.universe.any();
            };
            let Some(e) = sem.universe.as_enum(enum_ty) else {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::PropertyNotFound,
                    format!("'{}' is not an enum", t.type_name),
                    t.location.clone(),
                ));
                return sem.universe.any();
            };
            if e.variants.iter().any(|(name, _)| name == &t.name) {
                enum_ty
            } else {
                diagnostics.push(Diagnostic::error(
                    DiagnosticCode::PropertyNotFound,
                    format!("enum '{}' has no variant '{}'", t.type_name, t.name),
                    t.location.clone(),
                ));
                sem.universe.any()
            }
        }

        Expr::IndexAccess(i) => {
            let recv = check_expr(&i.expr, ctx, scopes, sem, diagnostics);
            let index_ty = check_expr(&i.index, ctx, scopes, sem, diagnostics);
            check_index(recv, index_ty, &i.location, sem, diagnostics)
        }

        Expr::ArrayLiteral(a) => {
            let elem_tys: Vec<TypeId> = a
                .elements
                .iter()
                .map(|e| check_expr(e, ctx, scopes, sem, diagnostics))
                .collect();
            let elem = if elem_tys.is_empty() {
                sem.universe.never()
            } else {
                sem.universe.union_of(elem_tys)
            };
            sem.universe.intern_array(elem)
        }

        Expr::TupleLiteral(t) => {
            let tys: Vec<TypeId> = t
                .elements
                .iter()
                .map(|e| check_expr(e, ctx, scopes, sem, diagnostics))
                .collect();
            sem.universe.new_tuple(tys)
        }

        Expr::RecordLiteral(r) => {
            let fields: Vec<(String, TypeId)> = r
                .fields
                .iter()
                .map(|(name, e)| (name.clone(), check_expr(e, ctx, scopes, sem, diagnostics)))
                .collect();
            sem.universe.intern_record(fields)
        }

        Expr::Is(i) => {
            check_expr(&i.expr, ctx, scopes, sem, diagnostics);
            let local_tp = empty_local_type_params();
            let resolver_ctx = TypeResolverCtx {
                env: ctx.env,
                local_type_params: &local_tp,
            };
            resolve_type_expr(&i.ty, &resolver_ctx, &mut sem.universe, &i.location, diagnostics);
            sem.universe.primitive(PrimitiveKind::Boolean)
        }

        Expr::As(a) => {
            check_expr(&a.expr, ctx, scopes, sem, diagnostics);
            let local_tp = empty_local_type_params();
            let resolver_ctx = TypeResolverCtx {
                env: ctx.env,
                local_type_params: &local_tp,
            };
            resolve_type_expr(&a.ty, &resolver_ctx, &mut sem.universe, &a.location, diagnostics)
        }

        Expr::Lambda(l) => crate::stmt::check_lambda(l, ctx, scopes, sem, diagnostics),
    }
}

fn is_numeric(universe: &zena_types::TypeUniverse, ty: TypeId) -> bool {
    matches!(
        universe.get(ty),
        Type::Primitive(PrimitiveKind::I32 | PrimitiveKind::I64 | PrimitiveKind::F32 | PrimitiveKind::F64)
    )
}

fn is_integer(universe: &zena_types::TypeUniverse, ty: TypeId) -> bool {
    matches!(universe.get(ty), Type::Primitive(PrimitiveKind::I32 | PrimitiveKind::I64))
}

fn operator_overload(
    universe: &zena_types::TypeUniverse,
    receiver: TypeId,
    op: OperatorKind,
) -> Option<TypeId> {
    let class = universe.as_class(receiver)?;
    class.methods.get(&format!("operator {op:?}")).copied()
}

fn check_binary(
    op: OperatorKind,
    lhs: TypeId,
    rhs: TypeId,
    location: &zena_ast::Location,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    let u = &sem.universe;
    let boolean = u.primitive(PrimitiveKind::Boolean);
    match op {
        OperatorKind::And | OperatorKind::Or => {
            if u.is_assignable(lhs, boolean) && u.is_assignable(rhs, boolean) {
                return boolean;
            }
        }
        OperatorKind::Eq | OperatorKind::Ne | OperatorKind::RefEq | OperatorKind::RefNe => {
            return boolean;
        }
        OperatorKind::Lt | OperatorKind::Le | OperatorKind::Gt | OperatorKind::Ge => {
            if is_numeric(u, lhs) && is_numeric(u, rhs) {
                return boolean;
            }
        }
        OperatorKind::Add => {
            if is_numeric(u, lhs) && lhs == rhs {
                return lhs;
            }
            if matches!(u.get(lhs), Type::Str) && matches!(u.get(rhs), Type::Str) {
                return u.string();
            }
        }
        OperatorKind::Sub | OperatorKind::Mul | OperatorKind::Div | OperatorKind::Mod => {
            if is_numeric(u, lhs) && lhs == rhs {
                return lhs;
            }
        }
        OperatorKind::BitAnd | OperatorKind::BitOr | OperatorKind::BitXor | OperatorKind::Shl | OperatorKind::Shr | OperatorKind::UShr => {
            if is_integer(u, lhs) && lhs == rhs {
                return lhs;
            }
        }
    }
    if let Some(method_ty) = operator_overload(&sem.universe, lhs, op) {
        let ret = check_call(method_ty, &[rhs], location, sem, diagnostics);
        return ret;
    }
    diagnostics.push(Diagnostic::error(
        DiagnosticCode::TypeMismatch,
        format!("operator {op:?} is not defined for these operand types"),
        location.clone(),
    ));
    sem.universe.any()
}

fn check_unary(
    op: UnaryOperatorKind,
    operand: TypeId,
    location: &zena_ast::Location,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    match op {
        UnaryOperatorKind::Not => {
            let boolean = sem.universe.primitive(PrimitiveKind::Boolean);
            if sem.universe.is_assignable(operand, boolean) {
                return boolean;
            }
        }
        UnaryOperatorKind::Neg => {
            if is_numeric(&sem.universe, operand) {
                return operand;
            }
        }
    }
    diagnostics.push(Diagnostic::error(
        DiagnosticCode::TypeMismatch,
        format!("operator {op:?} is not defined for this operand type"),
        location.clone(),
    ));
    sem.universe.any()
}

fn check_call(
    callee_ty: TypeId,
    arg_tys: &[TypeId],
    location: &zena_ast::Location,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    let Some(f) = sem.universe.as_function(callee_ty) else {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::TypeMismatch,
            "callee is not callable".to_string(),
            location.clone(),
        ));
        return sem.universe.any();
    };
    let f = f.clone();
    if f.parameters.len() != arg_tys.len() {
        diagnostics.push(Diagnostic::error(
            DiagnosticCode::ArityMismatch,
            format!("expected {} argument(s), found {}", f.parameters.len(), arg_tys.len()),
            location.clone(),
        ));
        return f.return_type;
    }
    for (param_ty, &arg_ty) in f.parameters.iter().zip(arg_tys.iter()) {
        if !sem.universe.is_assignable(arg_ty, *param_ty) {
            diagnostics.push(Diagnostic::error(
                DiagnosticCode::TypeMismatch,
                "argument type is not assignable to the parameter type".to_string(),
                location.clone(),
            ));
        }
    }
    f.return_type
}

fn check_member(
    recv: TypeId,
    name: &str,
    location: &zena_ast::Location,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    let resolved = sem.universe.resolve_alias(recv);
    match sem.universe.get(resolved).clone() {
        Type::Class(c) => {
            if let Some(f) = c.fields.iter().find(|f| f.name == name) {
                return f.ty;
            }
            if let Some(&m) = c.methods.get(name) {
                return m;
            }
        }
        Type::Interface(i) => {
            if let Some(&(ty, _)) = i.properties.get(name) {
                return ty;
            }
            if let Some(&m) = i.methods.get(name) {
                return m;
            }
        }
        Type::Record(r) => {
            if let Some((_, ty)) = r.fields.iter().find(|(n, _)| n == name) {
                return *ty;
            }
        }
        _ => {}
    }
    diagnostics.push(Diagnostic::error(
        DiagnosticCode::PropertyNotFound,
        format!("no member '{name}' on this type"),
        location.clone(),
    ));
    sem.universe.any()
}

fn check_index(
    recv: TypeId,
    index_ty: TypeId,
    location: &zena_ast::Location,
    sem: &mut SemanticContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeId {
    if let Type::Array(arr) = sem.universe.get(recv) {
        let elem = arr.element_type;
        let i32_ty = sem.universe.i32();
        if !sem.universe.is_assignable(index_ty, i32_ty) {
            diagnostics.push(Diagnostic::error(
                DiagnosticCode::TypeMismatch,
                "array index must be an i32".to_string(),
                location.clone(),
            ));
        }
        return elem;
    }
    if let Some(get) = sem.universe.as_class(recv).and_then(|c| c.methods.get("operator []").copied()) {
        return check_call(get, &[index_ty], location, sem, diagnostics);
    }
    diagnostics.push(Diagnostic::error(
        DiagnosticCode::TypeMismatch,
        "this type does not support indexing".to_string(),
        location.clone(),
    ));
    sem.universe.any()
}
