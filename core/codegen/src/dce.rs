//! Reachability pass (spec §4.5.7): decides which top-level functions
//! and classes `generate` actually has to lower.
//!
//! This scans raw AST identifier/`new`/member-access references rather
//! than the lowered IR, which makes it exact for top-level functions
//! (the case spec §8 scenario 6 exercises: an unused top-level `let`
//! must vanish byte-for-byte) but an over-approximation at the method
//! level — once a class is reachable every one of its methods is kept,
//! rather than tracing which vtable slots are actually invoked. Getting
//! per-method precision right would mean tracking override chains
//! through virtual dispatch, which this flat pass does not attempt; see
//! `DESIGN.md`.

use rustc_hash::FxHashSet;
use zena_ast::nodes::{Block, Decl, ElseArm, Expr, LambdaBody, Statement, Visibility};
use zena_ast::ModuleId;
use zena_module_graph::ModuleGraph;

#[derive(Default)]
pub struct Reachable {
    pub functions: FxHashSet<(ModuleId, String)>,
    pub classes: FxHashSet<(ModuleId, String)>,
}

impl Reachable {
    #[must_use]
    pub fn has_function(&self, module: ModuleId, name: &str) -> bool {
        self.functions.contains(&(module, name.to_string()))
    }

    #[must_use]
    pub fn has_class(&self, module: ModuleId, name: &str) -> bool {
        self.classes.contains(&(module, name.to_string()))
    }
}

/// With `enabled == false` every top-level declaration is reachable —
/// `generate` still needs the same `Reachable` shape either way.
#[must_use]
pub fn compute(graph: &ModuleGraph, enabled: bool) -> Reachable {
    let mut reach = Reachable::default();
    if !enabled {
        for &module_id in graph.order() {
            let module = graph.module(module_id).expect("module in graph.order() exists");
            for decl in &module.ast.decls {
                match decl {
                    Decl::Let(l) => {
                        reach.functions.insert((module_id, l.name.clone()));
                    }
                    Decl::Class(c) => {
                        reach.classes.insert((module_id, c.name.clone()));
                    }
                    _ => {}
                }
            }
        }
        return reach;
    }

    let mut worklist: Vec<(ModuleId, String)> = Vec::new();
    for &module_id in graph.order() {
        let module = graph.module(module_id).expect("module in graph.order() exists");
        for decl in &module.ast.decls {
            match decl {
                Decl::Let(l) if is_root(&l.visibility, &l.name) => {
                    worklist.push((module_id, l.name.clone()));
                }
                Decl::Class(c) if c.visibility == Visibility::Public => {
                    mark_class(&mut reach, &mut worklist, module_id, &c.name, graph);
                }
                _ => {}
            }
        }
    }

    while let Some((module_id, name)) = worklist.pop() {
        if !reach.functions.insert((module_id, name.clone())) {
            continue;
        }
        let module = graph.module(module_id).expect("module in graph.order() exists");
        let Some(Decl::Let(l)) = module.ast.decls.iter().find(|d| matches!(d, Decl::Let(x) if x.name == name))
        else {
            continue;
        };
        walk_expr(&l.value, module_id, graph, &mut reach, &mut worklist);
    }

    reach
}

fn is_root(vis: &Visibility, name: &str) -> bool {
    *vis == Visibility::Public || name == "main"
}

fn mark_class(
    reach: &mut Reachable,
    worklist: &mut Vec<(ModuleId, String)>,
    module_id: ModuleId,
    name: &str,
    graph: &ModuleGraph,
) {
    if !reach.classes.insert((module_id, name.to_string())) {
        return;
    }
    let module = graph.module(module_id).expect("module in graph.order() exists");
    let Some(Decl::Class(c)) = module.ast.decls.iter().find(|d| matches!(d, Decl::Class(x) if x.name == name)) else {
        return;
    };
    if let Some(ctor) = &c.constructor {
        walk_block(&ctor.body, module_id, graph, reach, worklist);
    }
    for m in &c.methods {
        walk_block(&m.body, module_id, graph, reach, worklist);
    }
}

fn walk_block(
    block: &Block,
    module_id: ModuleId,
    graph: &ModuleGraph,
    reach: &mut Reachable,
    worklist: &mut Vec<(ModuleId, String)>,
) {
    for stmt in &block.statements {
        walk_statement(stmt, module_id, graph, reach, worklist);
    }
}

fn walk_statement(
    stmt: &Statement,
    module_id: ModuleId,
    graph: &ModuleGraph,
    reach: &mut Reachable,
    worklist: &mut Vec<(ModuleId, String)>,
) {
    match stmt {
        Statement::Expr(e) => walk_expr(e, module_id, graph, reach, worklist),
        Statement::Let(s) => walk_expr(&s.value, module_id, graph, reach, worklist),
        Statement::Assign(s) => {
            walk_expr(&s.target, module_id, graph, reach, worklist);
            walk_expr(&s.value, module_id, graph, reach, worklist);
        }
        Statement::If(s) => {
            walk_expr(&s.condition, module_id, graph, reach, worklist);
            walk_block(&s.then_block, module_id, graph, reach, worklist);
            match &s.else_block {
                Some(ElseArm::Block(b)) => walk_block(b, module_id, graph, reach, worklist),
                Some(ElseArm::If(i)) => walk_statement(&Statement::If((**i).clone()), module_id, graph, reach, worklist),
                None => {}
            }
        }
        Statement::While(s) => {
            walk_expr(&s.condition, module_id, graph, reach, worklist);
            walk_block(&s.body, module_id, graph, reach, worklist);
        }
        Statement::For(s) => {
            if let Some(init) = &s.init {
                walk_statement(init, module_id, graph, reach, worklist);
            }
            if let Some(cond) = &s.condition {
                walk_expr(cond, module_id, graph, reach, worklist);
            }
            if let Some(update) = &s.update {
                walk_statement(update, module_id, graph, reach, worklist);
            }
            walk_block(&s.body, module_id, graph, reach, worklist);
        }
        Statement::Return(s) => {
            if let Some(v) = &s.value {
                walk_expr(v, module_id, graph, reach, worklist);
            }
        }
        Statement::Break(_, _) | Statement::Continue(_, _) => {}
        Statement::Throw(s) => walk_expr(&s.value, module_id, graph, reach, worklist),
        Statement::TryCatch(s) => {
            walk_block(&s.try_block, module_id, graph, reach, worklist);
            walk_block(&s.catch_block, module_id, graph, reach, worklist);
        }
        Statement::Assert(s) => walk_expr(&s.condition, module_id, graph, reach, worklist),
        Statement::Block(b) => walk_block(b, module_id, graph, reach, worklist),
    }
}

fn walk_expr(
    expr: &Expr,
    module_id: ModuleId,
    graph: &ModuleGraph,
    reach: &mut Reachable,
    worklist: &mut Vec<(ModuleId, String)>,
) {
    match expr {
        Expr::IntLiteral(_)
        | Expr::FloatLiteral(_)
        | Expr::BoolLiteral(_)
        | Expr::StringLiteral(_)
        | Expr::NullLiteral(_, _) => {}
        Expr::Identifier(id) => {
            if !reach.functions.contains(&(module_id, id.name.clone())) {
                worklist.push((module_id, id.name.clone()));
            }
        }
        Expr::Binary(b) => {
            walk_expr(&b.left, module_id, graph, reach, worklist);
            walk_expr(&b.right, module_id, graph, reach, worklist);
        }
        Expr::Unary(u) => walk_expr(&u.operand, module_id, graph, reach, worklist),
        Expr::Call(c) => {
            walk_expr(&c.callee, module_id, graph, reach, worklist);
            for a in &c.args {
                walk_expr(a, module_id, graph, reach, worklist);
            }
        }
        Expr::New(n) => {
            mark_class(reach, worklist, module_id, &n.class_name, graph);
            for a in &n.args {
                walk_expr(a, module_id, graph, reach, worklist);
            }
        }
        Expr::MemberAccess(m) => walk_expr(&m.expr, module_id, graph, reach, worklist),
        Expr::TypeMemberAccess(_) => {}
        Expr::IndexAccess(i) => {
            walk_expr(&i.expr, module_id, graph, reach, worklist);
            walk_expr(&i.index, module_id, graph, reach, worklist);
        }
        Expr::ArrayLiteral(a) => {
            for e in &a.elements {
                walk_expr(e, module_id, graph, reach, worklist);
            }
        }
        Expr::TupleLiteral(t) => {
            for e in &t.elements {
                walk_expr(e, module_id, graph, reach, worklist);
            }
        }
        Expr::RecordLiteral(r) => {
            for (_, e) in &r.fields {
                walk_expr(e, module_id, graph, reach, worklist);
            }
        }
        Expr::Is(i) => walk_expr(&i.expr, module_id, graph, reach, worklist),
        Expr::As(a) => walk_expr(&a.expr, module_id, graph, reach, worklist),
        Expr::Paren(p) => walk_expr(p, module_id, graph, reach, worklist),
        Expr::Lambda(l) => match &l.body {
            LambdaBody::Expr(e) => walk_expr(e, module_id, graph, reach, worklist),
            LambdaBody::Block(b) => walk_block(b, module_id, graph, reach, worklist),
        },
    }
}
