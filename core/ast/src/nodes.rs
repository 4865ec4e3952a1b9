//! The AST node set (spec §3.1/§3.3).
//!
//! Every node carries `id` (for side-table lookups) and `location` (for
//! diagnostics). Sub-trees are owned outright (`Box`/`Vec`) — the tree is
//! immutable after parsing, so there is no need for the interior
//! mutability the checker needs on a *mutable* representation.

use crate::ids::NodeId;
use crate::location::Location;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Visibility {
    #[default]
    Private,
    Public,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnaryOperatorKind {
    Not,
    Neg,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperatorKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    RefEq,
    RefNe,
}

/// The top-level unit produced by the parser for one source file.
#[derive(Clone, Debug)]
pub struct Program {
    pub id: NodeId,
    pub location: Location,
    pub imports: Vec<ImportDirective>,
    pub re_exports: Vec<ReExportDirective>,
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug)]
pub struct ImportDirective {
    pub id: NodeId,
    pub location: Location,
    /// `./x`, `../x`, `zena:name`, or a bare package specifier, exactly as
    /// written — resolution is `zena_module_graph`'s job.
    pub specifier: String,
    pub bindings: ImportBindings,
}

#[derive(Clone, Debug)]
pub enum ImportBindings {
    /// `import { a, b as c } from "./x"`
    Named(Vec<ImportedName>),
    /// `import * as ns from "./x"`
    Star { alias: String },
}

#[derive(Clone, Debug)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
    /// Whether the imported name is a type (`type:`) or value (`value:`)
    /// binding — mirrors the kind-qualified export keys of spec §3.1.
    pub kind: ExportKind,
}

#[derive(Clone, Debug)]
pub struct ReExportDirective {
    pub id: NodeId,
    pub location: Location,
    /// `export * from "./x"`
    pub specifier: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ExportKind {
    Value,
    Type,
}

#[derive(Clone, Debug)]
pub enum Decl {
    Let(LetDecl),
    Class(ClassDecl),
    Interface(InterfaceDecl),
    Mixin(MixinDecl),
    Enum(EnumDecl),
    TypeAlias(TypeAliasDecl),
}

impl Decl {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Decl::Let(d) => d.id,
            Decl::Class(d) => d.id,
            Decl::Interface(d) => d.id,
            Decl::Mixin(d) => d.id,
            Decl::Enum(d) => d.id,
            Decl::TypeAlias(d) => d.id,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Decl::Let(d) => &d.name,
            Decl::Class(d) => &d.name,
            Decl::Interface(d) => &d.name,
            Decl::Mixin(d) => &d.name,
            Decl::Enum(d) => &d.name,
            Decl::TypeAlias(d) => &d.name,
        }
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        match self {
            Decl::Let(d) => d.visibility.clone(),
            Decl::Class(d) => d.visibility.clone(),
            Decl::Interface(d) => d.visibility.clone(),
            Decl::Mixin(d) => d.visibility.clone(),
            Decl::Enum(d) => d.visibility.clone(),
            Decl::TypeAlias(d) => d.visibility.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LetDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub name: String,
    pub is_mut: bool,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
}

#[derive(Clone, Debug)]
pub struct TypeParamDecl {
    pub name: String,
    pub upper_bound: Option<TypeExpr>,
    pub default: Option<TypeExpr>,
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub super_class: Option<TypeExpr>,
    pub implements: Vec<TypeExpr>,
    pub mixins: Vec<TypeExpr>,
    pub is_final: bool,
    /// Extension classes (`extension on T { ... }`) graft methods onto an
    /// existing type without subclassing it.
    pub is_extension: bool,
    pub on_type: Option<TypeExpr>,
    pub fields: Vec<FieldDecl>,
    pub constructor: Option<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub name: String,
    pub ty: TypeExpr,
    pub is_mut: bool,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub id: NodeId,
    pub location: Location,
    pub name: String,
    pub ty: TypeExpr,
    pub is_mut: bool,
}

#[derive(Clone, Debug)]
pub struct ConstructorDecl {
    pub id: NodeId,
    pub location: Location,
    pub params: Vec<Param>,
    pub body: Block,
}

/// A method can be a regular name, or override one of the built-in
/// operator/index slots the spec's §4.5.6 lowering refers to
/// (`operator ==`, `operator []`, `operator []=`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Named(String),
    OperatorOverload(OperatorKind),
    IndexGet,
    IndexSet,
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub kind: MethodKind,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeExpr>,
    pub body: Block,
    pub is_final: bool,
}

impl MethodDecl {
    #[must_use]
    pub fn name(&self) -> String {
        match &self.kind {
            MethodKind::Named(n) => n.clone(),
            MethodKind::OperatorOverload(op) => format!("operator {op:?}"),
            MethodKind::IndexGet => "operator []".to_string(),
            MethodKind::IndexSet => "operator []=".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InterfaceDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub parent_interfaces: Vec<TypeExpr>,
    pub methods: Vec<MethodSig>,
    pub properties: Vec<PropertySig>,
}

#[derive(Clone, Debug)]
pub struct MethodSig {
    pub name: String,
    pub params: Vec<TypeExpr>,
    pub return_ty: TypeExpr,
}

#[derive(Clone, Debug)]
pub struct PropertySig {
    pub name: String,
    pub ty: TypeExpr,
    pub is_mut: bool,
}

#[derive(Clone, Debug)]
pub struct MixinDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub name: String,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub name: String,
    /// Variant name plus an explicit discriminant, when written
    /// (`Blue = 10`); otherwise filled in by the checker as
    /// previous-discriminant-plus-one, starting at zero.
    pub variants: Vec<(String, Option<i64>)>,
}

#[derive(Clone, Debug)]
pub struct TypeAliasDecl {
    pub id: NodeId,
    pub location: Location,
    pub visibility: Visibility,
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub target: TypeExpr,
    pub is_distinct: bool,
}

/// Syntactic type annotation as written by the user, before the checker
/// resolves it to an interned [`zena_types`] `TypeId`.
#[derive(Clone, Debug)]
pub enum TypeExpr {
    Name(String),
    Generic(String, Vec<TypeExpr>),
    Array(Box<TypeExpr>),
    Tuple(Vec<TypeExpr>),
    /// `inline (A, B, ...)` — unboxed tuple surface syntax (spec §4.5.4).
    UnboxedTuple(Vec<TypeExpr>),
    Record(Vec<(String, TypeExpr)>),
    Function(Vec<TypeExpr>, Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

#[derive(Clone, Debug)]
pub struct Block {
    pub id: NodeId,
    pub location: Location,
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Expr(Expr),
    Let(LetStmt),
    Assign(AssignStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    Break(NodeId, Location),
    Continue(NodeId, Location),
    Throw(ThrowStmt),
    TryCatch(TryCatchStmt),
    Assert(AssertStmt),
    Block(Block),
}

impl Statement {
    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Statement::Expr(e) => e.location(),
            Statement::Let(s) => s.location.clone(),
            Statement::Assign(s) => s.location.clone(),
            Statement::If(s) => s.location.clone(),
            Statement::While(s) => s.location.clone(),
            Statement::For(s) => s.location.clone(),
            Statement::Return(s) => s.location.clone(),
            Statement::Break(_, loc) | Statement::Continue(_, loc) => loc.clone(),
            Statement::Throw(s) => s.location.clone(),
            Statement::TryCatch(s) => s.location.clone(),
            Statement::Assert(s) => s.location.clone(),
            Statement::Block(b) => b.location.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LetStmt {
    pub id: NodeId,
    pub location: Location,
    pub name: String,
    pub is_mut: bool,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
}

#[derive(Clone, Debug)]
pub struct AssignStmt {
    pub id: NodeId,
    pub location: Location,
    pub target: Expr,
    pub value: Expr,
}

#[derive(Clone, Debug)]
pub struct IfStmt {
    pub id: NodeId,
    pub location: Location,
    pub condition: Expr,
    pub then_block: Block,
    pub else_block: Option<ElseArm>,
}

#[derive(Clone, Debug)]
pub enum ElseArm {
    Block(Block),
    If(Box<IfStmt>),
}

#[derive(Clone, Debug)]
pub struct WhileStmt {
    pub id: NodeId,
    pub location: Location,
    pub condition: Expr,
    pub body: Block,
}

#[derive(Clone, Debug)]
pub struct ForStmt {
    pub id: NodeId,
    pub location: Location,
    pub init: Option<Box<Statement>>,
    pub condition: Option<Expr>,
    pub update: Option<Box<Statement>>,
    pub body: Block,
}

#[derive(Clone, Debug)]
pub struct ReturnStmt {
    pub id: NodeId,
    pub location: Location,
    pub value: Option<Expr>,
}

#[derive(Clone, Debug)]
pub struct ThrowStmt {
    pub id: NodeId,
    pub location: Location,
    pub value: Expr,
}

#[derive(Clone, Debug)]
pub struct TryCatchStmt {
    pub id: NodeId,
    pub location: Location,
    pub try_block: Block,
    pub catch_name: Option<String>,
    pub catch_block: Block,
}

#[derive(Clone, Debug)]
pub struct AssertStmt {
    pub id: NodeId,
    pub location: Location,
    pub condition: Expr,
}

#[derive(Clone, Debug)]
pub enum Expr {
    IntLiteral(IntLiteral),
    FloatLiteral(FloatLiteral),
    BoolLiteral(BoolLiteral),
    StringLiteral(StringLiteral),
    NullLiteral(NodeId, Location),
    Identifier(Identifier),
    Binary(Box<BinaryExpr>),
    Unary(Box<UnaryExpr>),
    Call(Box<CallExpr>),
    New(Box<NewExpr>),
    MemberAccess(Box<MemberAccessExpr>),
    TypeMemberAccess(Box<TypeMemberAccessExpr>),
    IndexAccess(Box<IndexAccessExpr>),
    ArrayLiteral(ArrayLiteralExpr),
    TupleLiteral(TupleLiteralExpr),
    RecordLiteral(RecordLiteralExpr),
    Is(Box<IsExpr>),
    As(Box<AsExpr>),
    Paren(Box<Expr>),
    Lambda(Box<LambdaExpr>),
}

impl Expr {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Expr::IntLiteral(n) => n.id,
            Expr::FloatLiteral(n) => n.id,
            Expr::BoolLiteral(n) => n.id,
            Expr::StringLiteral(n) => n.id,
            Expr::NullLiteral(id, _) => *id,
            Expr::Identifier(n) => n.id,
            Expr::Binary(n) => n.id,
            Expr::Unary(n) => n.id,
            Expr::Call(n) => n.id,
            Expr::New(n) => n.id,
            Expr::MemberAccess(n) => n.id,
            Expr::TypeMemberAccess(n) => n.id,
            Expr::IndexAccess(n) => n.id,
            Expr::ArrayLiteral(n) => n.id,
            Expr::TupleLiteral(n) => n.id,
            Expr::RecordLiteral(n) => n.id,
            Expr::Is(n) => n.id,
            Expr::As(n) => n.id,
            Expr::Paren(inner) => inner.id(),
            Expr::Lambda(n) => n.id,
        }
    }

    #[must_use]
    pub fn location(&self) -> Location {
        match self {
            Expr::IntLiteral(n) => n.location.clone(),
            Expr::FloatLiteral(n) => n.location.clone(),
            Expr::BoolLiteral(n) => n.location.clone(),
            Expr::StringLiteral(n) => n.location.clone(),
            Expr::NullLiteral(_, loc) => loc.clone(),
            Expr::Identifier(n) => n.location.clone(),
            Expr::Binary(n) => n.location.clone(),
            Expr::Unary(n) => n.location.clone(),
            Expr::Call(n) => n.location.clone(),
            Expr::New(n) => n.location.clone(),
            Expr::MemberAccess(n) => n.location.clone(),
            Expr::TypeMemberAccess(n) => n.location.clone(),
            Expr::IndexAccess(n) => n.location.clone(),
            Expr::ArrayLiteral(n) => n.location.clone(),
            Expr::TupleLiteral(n) => n.location.clone(),
            Expr::RecordLiteral(n) => n.location.clone(),
            Expr::Is(n) => n.location.clone(),
            Expr::As(n) => n.location.clone(),
            Expr::Paren(inner) => inner.location(),
            Expr::Lambda(n) => n.location.clone(),
        }
    }
}

/// A function literal: `(params) => expr` or `(params) => { ... }`.
/// Top-level `let`s bound to one of these are how the surface language
/// writes free functions — there is no separate `fn` declaration form.
#[derive(Clone, Debug)]
pub struct LambdaExpr {
    pub id: NodeId,
    pub location: Location,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeExpr>,
    pub body: LambdaBody,
}

#[derive(Clone, Debug)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Clone, Debug)]
pub struct IntLiteral {
    pub id: NodeId,
    pub location: Location,
    pub value: i64,
}

#[derive(Clone, Debug)]
pub struct FloatLiteral {
    pub id: NodeId,
    pub location: Location,
    pub value: f64,
}

#[derive(Clone, Debug)]
pub struct BoolLiteral {
    pub id: NodeId,
    pub location: Location,
    pub value: bool,
}

#[derive(Clone, Debug)]
pub struct StringLiteral {
    pub id: NodeId,
    pub location: Location,
    pub value: String,
}

#[derive(Clone, Debug)]
pub struct Identifier {
    pub id: NodeId,
    pub location: Location,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct BinaryExpr {
    pub id: NodeId,
    pub location: Location,
    pub left: Expr,
    pub operator: OperatorKind,
    pub right: Expr,
}

#[derive(Clone, Debug)]
pub struct UnaryExpr {
    pub id: NodeId,
    pub location: Location,
    pub operator: UnaryOperatorKind,
    pub operand: Expr,
}

#[derive(Clone, Debug)]
pub struct CallExpr {
    pub id: NodeId,
    pub location: Location,
    pub callee: Expr,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug)]
pub struct NewExpr {
    pub id: NodeId,
    pub location: Location,
    pub class_name: String,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug)]
pub struct MemberAccessExpr {
    pub id: NodeId,
    pub location: Location,
    pub expr: Expr,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct TypeMemberAccessExpr {
    pub id: NodeId,
    pub location: Location,
    pub type_name: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct IndexAccessExpr {
    pub id: NodeId,
    pub location: Location,
    pub expr: Expr,
    pub index: Expr,
}

#[derive(Clone, Debug)]
pub struct ArrayLiteralExpr {
    pub id: NodeId,
    pub location: Location,
    pub elements: Vec<Expr>,
}

#[derive(Clone, Debug)]
pub struct TupleLiteralExpr {
    pub id: NodeId,
    pub location: Location,
    pub elements: Vec<Expr>,
}

#[derive(Clone, Debug)]
pub struct RecordLiteralExpr {
    pub id: NodeId,
    pub location: Location,
    pub fields: Vec<(String, Expr)>,
}

#[derive(Clone, Debug)]
pub struct IsExpr {
    pub id: NodeId,
    pub location: Location,
    pub expr: Expr,
    pub ty: TypeExpr,
    /// `x is not T` desugars to the negated form at parse time so the
    /// checker only has to implement one narrowing rule (spec §4.4).
    pub negated: bool,
}

#[derive(Clone, Debug)]
pub struct AsExpr {
    pub id: NodeId,
    pub location: Location,
    pub expr: Expr,
    pub ty: TypeExpr,
}
