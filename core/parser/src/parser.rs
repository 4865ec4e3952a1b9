//! Recursive-descent parser over the token stream produced by
//! [`crate::lexer::Lexer`]. Builds `zena_ast::nodes` trees directly —
//! there is no intermediate CST (spec §1 leaves lexical syntax
//! unspecified, so nothing downstream depends on one existing).

use zena_ast::ids::NodeIdGen;
use zena_ast::nodes::{
    ArrayLiteralExpr, AsExpr, AssertStmt, AssignStmt, BinaryExpr, Block, BoolLiteral, CallExpr,
    ClassDecl, ConstructorDecl, Decl, ElseArm, EnumDecl, Expr, FieldDecl, FloatLiteral, ForStmt,
    Identifier, IfStmt, ImportBindings, ImportDirective, ImportedName, IndexAccessExpr, IntLiteral,
    InterfaceDecl, IsExpr, LambdaBody, LambdaExpr, LetDecl, LetStmt, MemberAccessExpr, MethodDecl,
    MethodKind, MethodSig, MixinDecl, NewExpr, OperatorKind, Param, Program, PropertySig,
    RecordLiteralExpr, ReExportDirective, ReturnStmt, Statement, StringLiteral, ThrowStmt,
    TryCatchStmt, TupleLiteralExpr, TypeAliasDecl, TypeExpr, TypeMemberAccessExpr, TypeParamDecl,
    UnaryExpr, UnaryOperatorKind, Visibility, WhileStmt,
};
use zena_ast::{Diagnostic, DiagnosticCode, Location};

use crate::errors::ParseError;
use crate::lexer::{Lexer, Token, TokenKind};

/// Parses one source file into a [`Program`] plus any diagnostics —
/// the shape `zena_module_graph::ModuleGraph::load`'s `parse` callback
/// expects.
#[must_use]
pub fn parse_module(_path: &str, source: &str) -> (Program, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let tokens = match Lexer::new(source).tokenize() {
        Ok(tokens) => tokens,
        Err(err) => {
            diagnostics.push(Diagnostic::error(
                DiagnosticCode::SyntaxError,
                err.message,
                err.location,
            ));
            return (empty_program(), diagnostics);
        }
    };
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program(&mut diagnostics);
    (program, diagnostics)
}

fn empty_program() -> Program {
    Program {
        id: zena_ast::NodeId(1),
        location: Location::synthetic(),
        imports: Vec::new(),
        re_exports: Vec::new(),
        decls: Vec::new(),
    }
}

enum TopLevelItem {
    Import(ImportDirective),
    ReExport(ReExportDirective),
    Decl(Decl),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ids: NodeIdGen,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            ids: NodeIdGen::new(),
        }
    }

    fn kind(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn kind_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn loc(&self) -> Location {
        self.tokens[self.pos.min(self.tokens.len() - 1)].location.clone()
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(ParseError {
                location: self.loc(),
                message: format!("expected {kind:?}, found {:?}", self.kind()),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(ParseError {
                location: self.loc(),
                message: format!("expected an identifier, found {other:?}"),
            }),
        }
    }

    fn next_id(&mut self) -> zena_ast::NodeId {
        self.ids.next()
    }

    // ---- top level ----------------------------------------------------

    fn parse_program(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Program {
        let id = self.next_id();
        let location = self.loc();
        let mut imports = Vec::new();
        let mut re_exports = Vec::new();
        let mut decls = Vec::new();

        while !self.check(&TokenKind::Eof) {
            match self.parse_top_level_item() {
                Ok(TopLevelItem::Import(i)) => imports.push(i),
                Ok(TopLevelItem::ReExport(r)) => re_exports.push(r),
                Ok(TopLevelItem::Decl(d)) => decls.push(d),
                Err(err) => {
                    diagnostics.push(Diagnostic::error(
                        DiagnosticCode::SyntaxError,
                        err.message,
                        err.location,
                    ));
                    self.recover_to_next_top_level_item();
                }
            }
        }

        Program {
            id,
            location,
            imports,
            re_exports,
            decls,
        }
    }

    /// Parser-level errors are reported once and parsing continues at
    /// the next statement boundary (spec §7) — here, the next top-level
    /// item.
    fn recover_to_next_top_level_item(&mut self) {
        loop {
            if self.check(&TokenKind::Eof) {
                return;
            }
            if self.eat(&TokenKind::Semicolon) {
                return;
            }
            if self.check(&TokenKind::RBrace) {
                self.advance();
                return;
            }
            self.advance();
        }
    }

    fn parse_top_level_item(&mut self) -> Result<TopLevelItem, ParseError> {
        if self.check(&TokenKind::Import) {
            return self.parse_import().map(TopLevelItem::Import);
        }
        if self.eat(&TokenKind::Export) {
            if self.check(&TokenKind::Star) {
                self.advance();
                self.expect(&TokenKind::From)?;
                let specifier = self.expect_string()?;
                self.expect(&TokenKind::Semicolon)?;
                return Ok(TopLevelItem::ReExport(ReExportDirective {
                    id: self.next_id(),
                    location: self.loc(),
                    specifier,
                }));
            }
            return self.parse_decl(Visibility::Public).map(TopLevelItem::Decl);
        }
        self.parse_decl(Visibility::Private).map(TopLevelItem::Decl)
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        match self.kind().clone() {
            TokenKind::Str(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(ParseError {
                location: self.loc(),
                message: format!("expected a string literal, found {other:?}"),
            }),
        }
    }

    fn parse_import(&mut self) -> Result<ImportDirective, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Import)?;
        let bindings = if self.eat(&TokenKind::Star) {
            self.expect(&TokenKind::As)?;
            let alias = self.expect_ident()?;
            ImportBindings::Star { alias }
        } else {
            self.expect(&TokenKind::LBrace)?;
            let mut names = Vec::new();
            while !self.check(&TokenKind::RBrace) {
                let kind = if self.eat(&TokenKind::Type) {
                    zena_ast::nodes::ExportKind::Type
                } else {
                    zena_ast::nodes::ExportKind::Value
                };
                let name = self.expect_ident()?;
                let alias = if self.eat(&TokenKind::As) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                names.push(ImportedName { name, alias, kind });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace)?;
            ImportBindings::Named(names)
        };
        self.expect(&TokenKind::From)?;
        let specifier = self.expect_string()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(ImportDirective {
            id,
            location,
            specifier,
            bindings,
        })
    }

    fn parse_decl(&mut self, visibility: Visibility) -> Result<Decl, ParseError> {
        match self.kind().clone() {
            TokenKind::Let => self.parse_let_decl(visibility).map(Decl::Let),
            TokenKind::Final | TokenKind::Class => self.parse_class_decl(visibility).map(Decl::Class),
            TokenKind::Extension => self.parse_extension_decl(visibility).map(Decl::Class),
            TokenKind::Interface => self.parse_interface_decl(visibility).map(Decl::Interface),
            TokenKind::Mixin => self.parse_mixin_decl(visibility).map(Decl::Mixin),
            TokenKind::Enum => self.parse_enum_decl(visibility).map(Decl::Enum),
            TokenKind::Type => self.parse_type_alias_decl(visibility).map(Decl::TypeAlias),
            other => Err(ParseError {
                location: self.loc(),
                message: format!("expected a declaration, found {other:?}"),
            }),
        }
    }

    fn parse_let_decl(&mut self, visibility: Visibility) -> Result<LetDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Let)?;
        let is_mut = self.eat(&TokenKind::Mut);
        let name = self.expect_ident()?;
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_union()?)
        } else {
            None
        };
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(LetDecl {
            id,
            location,
            visibility,
            name,
            is_mut,
            ty,
            value,
        })
    }

    fn parse_class_decl(&mut self, visibility: Visibility) -> Result<ClassDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        let is_final = self.eat(&TokenKind::Final);
        self.expect(&TokenKind::Class)?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let super_class = if self.eat_ident_keyword("extends") {
            Some(self.parse_type_atom_named()?)
        } else {
            None
        };
        let implements = if self.eat_ident_keyword("implements") {
            self.parse_type_list_until_brace_or_with()?
        } else {
            Vec::new()
        };
        let mixins = if self.eat_ident_keyword("with") {
            self.parse_type_list_until_brace_or_with()?
        } else {
            Vec::new()
        };
        let (fields, constructor, methods) = self.parse_class_body()?;
        Ok(ClassDecl {
            id,
            location,
            visibility,
            name,
            type_params,
            super_class,
            implements,
            mixins,
            is_final,
            is_extension: false,
            on_type: None,
            fields,
            constructor,
            methods,
        })
    }

    fn parse_extension_decl(&mut self, visibility: Visibility) -> Result<ClassDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Extension)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::On)?;
        let on_type = self.parse_type_union()?;
        let (fields, constructor, methods) = self.parse_class_body()?;
        Ok(ClassDecl {
            id,
            location,
            visibility,
            name,
            type_params: Vec::new(),
            super_class: None,
            implements: Vec::new(),
            mixins: Vec::new(),
            is_final: false,
            is_extension: true,
            on_type: Some(on_type),
            fields,
            constructor,
            methods,
        })
    }

    /// A crude keyword lookalike for soft keywords (`extends`,
    /// `implements`, `with`) that only ever appear right after a class
    /// header, so they don't need reserved-word status in the lexer.
    fn eat_ident_keyword(&mut self, text: &str) -> bool {
        if let TokenKind::Ident(name) = self.kind() {
            if name == text {
                self.advance();
                return true;
            }
        }
        false
    }

    fn parse_type_list_until_brace_or_with(&mut self) -> Result<Vec<TypeExpr>, ParseError> {
        let mut types = vec![self.parse_type_atom_named()?];
        while self.eat(&TokenKind::Comma) {
            types.push(self.parse_type_atom_named()?);
        }
        Ok(types)
    }

    /// A bare or generic named type (`Animal`, `Box<i32>`) — what
    /// appears after `extends`/`implements`/`with`/`new`.
    fn parse_type_atom_named(&mut self) -> Result<TypeExpr, ParseError> {
        let name = self.expect_ident()?;
        if self.eat(&TokenKind::Lt) {
            let mut args = vec![self.parse_type_union()?];
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_type_union()?);
            }
            self.expect(&TokenKind::Gt)?;
            Ok(TypeExpr::Generic(name, args))
        } else {
            Ok(TypeExpr::Name(name))
        }
    }

    fn parse_class_body(
        &mut self,
    ) -> Result<(Vec<FieldDecl>, Option<ConstructorDecl>, Vec<MethodDecl>), ParseError> {
        self.expect(&TokenKind::LBrace)?;
        let mut fields = Vec::new();
        let mut constructor = None;
        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.eat(&TokenKind::Constructor) {
                constructor = Some(self.parse_constructor()?);
                continue;
            }
            let is_final = self.eat(&TokenKind::Final);
            if !is_final && self.check(&TokenKind::Mut) {
                fields.push(self.parse_field()?);
                continue;
            }
            if self.check(&TokenKind::Operator) {
                methods.push(self.parse_method(is_final)?);
                continue;
            }
            // Disambiguate `name: Type;` (field) from `name(...) {...}`
            // (method) by looking one token past the identifier.
            if matches!(self.kind(), TokenKind::Ident(_))
                && matches!(self.kind_at(1), TokenKind::Colon)
                && !is_final
            {
                fields.push(self.parse_field()?);
            } else {
                methods.push(self.parse_method(is_final)?);
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok((fields, constructor, methods))
    }

    fn parse_field(&mut self) -> Result<FieldDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        let is_mut = self.eat(&TokenKind::Mut);
        let name = self.expect_ident()?;
        self.expect(&TokenKind::Colon)?;
        let ty = self.parse_type_union()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(FieldDecl {
            id,
            location,
            visibility: Visibility::Public,
            name,
            ty,
            is_mut,
        })
    }

    fn parse_constructor(&mut self) -> Result<ConstructorDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(ConstructorDecl {
            id,
            location,
            params,
            body,
        })
    }

    fn parse_method(&mut self, is_final: bool) -> Result<MethodDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        let kind = if self.eat(&TokenKind::Operator) {
            self.parse_operator_method_kind()?
        } else {
            MethodKind::Named(self.expect_ident()?)
        };
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;
        let return_ty = if self.eat(&TokenKind::Arrow) {
            Some(self.parse_type_union()?)
        } else {
            None
        };
        let body = self.parse_block()?;
        Ok(MethodDecl {
            id,
            location,
            visibility: Visibility::Public,
            kind,
            type_params,
            params,
            return_ty,
            body,
            is_final,
        })
    }

    fn parse_operator_method_kind(&mut self) -> Result<MethodKind, ParseError> {
        if self.eat(&TokenKind::LBracket) {
            self.expect(&TokenKind::RBracket)?;
            return Ok(if self.eat(&TokenKind::Eq) {
                MethodKind::IndexSet
            } else {
                MethodKind::IndexGet
            });
        }
        let op = match self.kind().clone() {
            TokenKind::Plus => OperatorKind::Add,
            TokenKind::Minus => OperatorKind::Sub,
            TokenKind::Star => OperatorKind::Mul,
            TokenKind::Slash => OperatorKind::Div,
            TokenKind::Percent => OperatorKind::Mod,
            TokenKind::AndAnd => OperatorKind::And,
            TokenKind::OrOr => OperatorKind::Or,
            TokenKind::EqEq => OperatorKind::Eq,
            TokenKind::NotEq => OperatorKind::Ne,
            TokenKind::Lt => OperatorKind::Lt,
            TokenKind::Le => OperatorKind::Le,
            TokenKind::Gt => OperatorKind::Gt,
            TokenKind::Ge => OperatorKind::Ge,
            TokenKind::Amp => OperatorKind::BitAnd,
            TokenKind::Pipe => OperatorKind::BitOr,
            TokenKind::Caret => OperatorKind::BitXor,
            TokenKind::Shl => OperatorKind::Shl,
            TokenKind::Shr => OperatorKind::Shr,
            TokenKind::UShr => OperatorKind::UShr,
            TokenKind::EqEqEq => OperatorKind::RefEq,
            TokenKind::NotEqEq => OperatorKind::RefNe,
            other => {
                return Err(ParseError {
                    location: self.loc(),
                    message: format!("expected an operator after 'operator', found {other:?}"),
                });
            }
        };
        self.advance();
        Ok(MethodKind::OperatorOverload(op))
    }

    fn parse_interface_decl(&mut self, visibility: Visibility) -> Result<InterfaceDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Interface)?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let parent_interfaces = if self.eat_ident_keyword("extends") {
            self.parse_type_list_until_brace_or_with()?
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::LBrace)?;
        let mut methods = Vec::new();
        let mut properties = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.check(&TokenKind::Mut)
                || (matches!(self.kind(), TokenKind::Ident(_)) && matches!(self.kind_at(1), TokenKind::Colon))
            {
                let is_mut = self.eat(&TokenKind::Mut);
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Colon)?;
                let ty = self.parse_type_union()?;
                self.expect(&TokenKind::Semicolon)?;
                properties.push(PropertySig { name, ty, is_mut });
            } else {
                let name = self.expect_ident()?;
                self.expect(&TokenKind::LParen)?;
                let mut params = Vec::new();
                while !self.check(&TokenKind::RParen) {
                    params.push(self.parse_type_union()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen)?;
                self.expect(&TokenKind::Arrow)?;
                let return_ty = self.parse_type_union()?;
                self.expect(&TokenKind::Semicolon)?;
                methods.push(MethodSig { name, params, return_ty });
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(InterfaceDecl {
            id,
            location,
            visibility,
            name,
            type_params,
            parent_interfaces,
            methods,
            properties,
        })
    }

    fn parse_mixin_decl(&mut self, visibility: Visibility) -> Result<MixinDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Mixin)?;
        let name = self.expect_ident()?;
        let (fields, _constructor, methods) = self.parse_class_body()?;
        Ok(MixinDecl {
            id,
            location,
            visibility,
            name,
            fields,
            methods,
        })
    }

    fn parse_enum_decl(&mut self, visibility: Visibility) -> Result<EnumDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Enum)?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;
        let mut variants = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            let variant_name = self.expect_ident()?;
            let discriminant = if self.eat(&TokenKind::Eq) {
                Some(self.parse_int_literal_value()?)
            } else {
                None
            };
            variants.push((variant_name, discriminant));
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(EnumDecl {
            id,
            location,
            visibility,
            name,
            variants,
        })
    }

    fn parse_int_literal_value(&mut self) -> Result<i64, ParseError> {
        let negative = self.eat(&TokenKind::Minus);
        match self.kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(if negative { -n } else { n })
            }
            other => Err(ParseError {
                location: self.loc(),
                message: format!("expected an integer literal, found {other:?}"),
            }),
        }
    }

    fn parse_type_alias_decl(&mut self, visibility: Visibility) -> Result<TypeAliasDecl, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Type)?;
        let is_distinct = self.eat(&TokenKind::Distinct);
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(&TokenKind::Eq)?;
        let target = self.parse_type_union()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(TypeAliasDecl {
            id,
            location,
            visibility,
            name,
            type_params,
            target,
            is_distinct,
        })
    }

    fn parse_type_params(&mut self) -> Result<Vec<TypeParamDecl>, ParseError> {
        if !self.eat(&TokenKind::Lt) {
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let upper_bound = if self.eat(&TokenKind::Colon) {
                Some(self.parse_type_union()?)
            } else {
                None
            };
            let default = if self.eat(&TokenKind::Eq) {
                Some(self.parse_type_union()?)
            } else {
                None
            };
            params.push(TypeParamDecl {
                name,
                upper_bound,
                default,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Gt)?;
        Ok(params)
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) {
            let id = self.next_id();
            let location = self.loc();
            let is_mut = self.eat(&TokenKind::Mut);
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Colon)?;
            let ty = self.parse_type_union()?;
            params.push(Param {
                id,
                location,
                name,
                ty,
                is_mut,
            });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    // ---- types ----------------------------------------------------

    fn parse_type_union(&mut self) -> Result<TypeExpr, ParseError> {
        let mut members = vec![self.parse_type_postfix()?];
        while self.eat(&TokenKind::Pipe) {
            members.push(self.parse_type_postfix()?);
        }
        if members.len() == 1 {
            Ok(members.pop().unwrap())
        } else {
            Ok(TypeExpr::Union(members))
        }
    }

    fn parse_type_postfix(&mut self) -> Result<TypeExpr, ParseError> {
        let mut ty = self.parse_type_atom()?;
        while self.check(&TokenKind::LBracket) && self.kind_at(1) == &TokenKind::RBracket {
            self.advance();
            self.advance();
            ty = TypeExpr::Array(Box::new(ty));
        }
        Ok(ty)
    }

    fn parse_type_atom(&mut self) -> Result<TypeExpr, ParseError> {
        if self.eat(&TokenKind::Inline) {
            self.expect(&TokenKind::LParen)?;
            let mut elements = Vec::new();
            while !self.check(&TokenKind::RParen) {
                elements.push(self.parse_type_union()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(TypeExpr::UnboxedTuple(elements));
        }
        if self.eat(&TokenKind::LParen) {
            let mut elements = Vec::new();
            while !self.check(&TokenKind::RParen) {
                elements.push(self.parse_type_union()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RParen)?;
            if self.eat(&TokenKind::Arrow) {
                let ret = self.parse_type_union()?;
                return Ok(TypeExpr::Function(elements, Box::new(ret)));
            }
            if elements.len() == 1 {
                return Ok(elements.pop().unwrap());
            }
            return Ok(TypeExpr::Tuple(elements));
        }
        if self.eat(&TokenKind::LBrace) {
            let mut fields = Vec::new();
            while !self.check(&TokenKind::RBrace) {
                let name = self.expect_ident()?;
                self.expect(&TokenKind::Colon)?;
                let ty = self.parse_type_union()?;
                fields.push((name, ty));
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace)?;
            return Ok(TypeExpr::Record(fields));
        }
        self.parse_type_atom_named()
    }

    // ---- statements -------------------------------------------------

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            statements.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Block {
            id,
            location,
            statements,
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.kind().clone() {
            TokenKind::Let => self.parse_let_stmt().map(Statement::Let),
            TokenKind::If => self.parse_if().map(Statement::If),
            TokenKind::While => self.parse_while().map(Statement::While),
            TokenKind::For => self.parse_for().map(Statement::For),
            TokenKind::Return => self.parse_return().map(Statement::Return),
            TokenKind::Break => {
                let id = self.next_id();
                let location = self.loc();
                self.advance();
                self.expect(&TokenKind::Semicolon)?;
                Ok(Statement::Break(id, location))
            }
            TokenKind::Continue => {
                let id = self.next_id();
                let location = self.loc();
                self.advance();
                self.expect(&TokenKind::Semicolon)?;
                Ok(Statement::Continue(id, location))
            }
            TokenKind::Throw => self.parse_throw().map(Statement::Throw),
            TokenKind::Try => self.parse_try_catch().map(Statement::TryCatch),
            TokenKind::Assert => self.parse_assert().map(Statement::Assert),
            TokenKind::LBrace => self.parse_block().map(Statement::Block),
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    fn parse_let_stmt(&mut self) -> Result<LetStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Let)?;
        let is_mut = self.eat(&TokenKind::Mut);
        let name = self.expect_ident()?;
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_union()?)
        } else {
            None
        };
        self.expect(&TokenKind::Eq)?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(LetStmt {
            id,
            location,
            name,
            is_mut,
            ty,
            value,
        })
    }

    fn parse_if(&mut self) -> Result<IfStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let then_block = self.parse_block()?;
        let else_block = if self.eat(&TokenKind::Else) {
            if self.check(&TokenKind::If) {
                Some(ElseArm::If(Box::new(self.parse_if()?)))
            } else {
                Some(ElseArm::Block(self.parse_block()?))
            }
        } else {
            None
        };
        Ok(IfStmt {
            id,
            location,
            condition,
            then_block,
            else_block,
        })
    }

    fn parse_while(&mut self) -> Result<WhileStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(WhileStmt {
            id,
            location,
            condition,
            body,
        })
    }

    fn parse_for(&mut self) -> Result<ForStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::For)?;
        self.expect(&TokenKind::LParen)?;
        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_for_init_clause()?))
        };
        self.expect(&TokenKind::Semicolon)?;
        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_for_update_clause()?))
        };
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(ForStmt {
            id,
            location,
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_for_init_clause(&mut self) -> Result<Statement, ParseError> {
        if self.check(&TokenKind::Let) {
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let is_mut = self.eat(&TokenKind::Mut);
            let name = self.expect_ident()?;
            let ty = if self.eat(&TokenKind::Colon) {
                Some(self.parse_type_union()?)
            } else {
                None
            };
            self.expect(&TokenKind::Eq)?;
            let value = self.parse_expr()?;
            return Ok(Statement::Let(LetStmt {
                id,
                location,
                name,
                is_mut,
                ty,
                value,
            }));
        }
        let expr = self.parse_expr()?;
        Ok(Statement::Expr(expr))
    }

    fn parse_for_update_clause(&mut self) -> Result<Statement, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        let target = self.parse_expr()?;
        if self.eat(&TokenKind::Eq) {
            let value = self.parse_expr()?;
            return Ok(Statement::Assign(AssignStmt {
                id,
                location,
                target,
                value,
            }));
        }
        Ok(Statement::Expr(target))
    }

    fn parse_return(&mut self) -> Result<ReturnStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Return)?;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon)?;
        Ok(ReturnStmt { id, location, value })
    }

    fn parse_throw(&mut self) -> Result<ThrowStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Throw)?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(ThrowStmt { id, location, value })
    }

    fn parse_try_catch(&mut self) -> Result<TryCatchStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Try)?;
        let try_block = self.parse_block()?;
        self.expect(&TokenKind::Catch)?;
        let catch_name = if self.eat(&TokenKind::LParen) {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::RParen)?;
            Some(name)
        } else {
            None
        };
        let catch_block = self.parse_block()?;
        Ok(TryCatchStmt {
            id,
            location,
            try_block,
            catch_name,
            catch_block,
        })
    }

    fn parse_assert(&mut self) -> Result<AssertStmt, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        self.expect(&TokenKind::Assert)?;
        let condition = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon)?;
        Ok(AssertStmt { id, location, condition })
    }

    fn parse_expr_or_assign_stmt(&mut self) -> Result<Statement, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        let expr = self.parse_expr()?;
        if self.eat(&TokenKind::Eq) {
            let value = self.parse_expr()?;
            self.expect(&TokenKind::Semicolon)?;
            return Ok(Statement::Assign(AssignStmt {
                id,
                location,
                target: expr,
                value,
            }));
        }
        self.expect(&TokenKind::Semicolon)?;
        Ok(Statement::Expr(expr))
    }

    // ---- expressions ------------------------------------------------

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::OrOr) {
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: OperatorKind::Or,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitor()?;
        while self.check(&TokenKind::AndAnd) {
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_bitor()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: OperatorKind::And,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitxor()?;
        while self.check(&TokenKind::Pipe) {
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_bitxor()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: OperatorKind::BitOr,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitand()?;
        while self.check(&TokenKind::Caret) {
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_bitand()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: OperatorKind::BitXor,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::Amp) {
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_equality()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: OperatorKind::BitAnd,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => OperatorKind::Eq,
                TokenKind::NotEq => OperatorKind::Ne,
                TokenKind::EqEqEq => OperatorKind::RefEq,
                TokenKind::NotEqEq => OperatorKind::RefNe,
                _ => break,
            };
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: op,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_shift()?;
        loop {
            if let Some(op) = match self.kind() {
                TokenKind::Lt => Some(OperatorKind::Lt),
                TokenKind::Le => Some(OperatorKind::Le),
                TokenKind::Gt => Some(OperatorKind::Gt),
                TokenKind::Ge => Some(OperatorKind::Ge),
                _ => None,
            } {
                let id = self.next_id();
                let location = self.loc();
                self.advance();
                let right = self.parse_shift()?;
                left = Expr::Binary(Box::new(BinaryExpr {
                    id,
                    location,
                    left,
                    operator: op,
                    right,
                }));
                continue;
            }
            if self.check(&TokenKind::Is) {
                let id = self.next_id();
                let location = self.loc();
                self.advance();
                let negated = self.eat(&TokenKind::Not);
                let ty = self.parse_type_union()?;
                left = Expr::Is(Box::new(IsExpr {
                    id,
                    location,
                    expr: left,
                    ty,
                    negated,
                }));
                continue;
            }
            if self.check(&TokenKind::As) {
                let id = self.next_id();
                let location = self.loc();
                self.advance();
                let ty = self.parse_type_union()?;
                left = Expr::As(Box::new(AsExpr {
                    id,
                    location,
                    expr: left,
                    ty,
                }));
                continue;
            }
            break;
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::Shl => OperatorKind::Shl,
                TokenKind::Shr => OperatorKind::Shr,
                TokenKind::UShr => OperatorKind::UShr,
                _ => break,
            };
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: op,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => OperatorKind::Add,
                TokenKind::Minus => OperatorKind::Sub,
                _ => break,
            };
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: op,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => OperatorKind::Mul,
                TokenKind::Slash => OperatorKind::Div,
                TokenKind::Percent => OperatorKind::Mod,
                _ => break,
            };
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(BinaryExpr {
                id,
                location,
                left,
                operator: op,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.kind() {
            TokenKind::Bang => Some(UnaryOperatorKind::Not),
            TokenKind::Minus => Some(UnaryOperatorKind::Neg),
            _ => None,
        };
        if let Some(operator) = op {
            let id = self.next_id();
            let location = self.loc();
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(Box::new(UnaryExpr {
                id,
                location,
                operator,
                operand,
            })));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let id = self.next_id();
                let location = self.loc();
                let name = self.expect_ident()?;
                expr = Expr::MemberAccess(Box::new(MemberAccessExpr {
                    id,
                    location,
                    expr,
                    name,
                }));
            } else if self.eat(&TokenKind::LBracket) {
                let id = self.next_id();
                let location = self.loc();
                let index = self.parse_expr()?;
                self.expect(&TokenKind::RBracket)?;
                expr = Expr::IndexAccess(Box::new(IndexAccessExpr {
                    id,
                    location,
                    expr,
                    index,
                }));
            } else if self.check(&TokenKind::LParen) {
                let id = self.next_id();
                let location = self.loc();
                self.advance();
                let mut args = Vec::new();
                while !self.check(&TokenKind::RParen) {
                    args.push(self.parse_expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen)?;
                expr = Expr::Call(Box::new(CallExpr {
                    id,
                    location,
                    callee: expr,
                    type_args: Vec::new(),
                    args,
                }));
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let id = self.next_id();
        let location = self.loc();
        match self.kind().clone() {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::IntLiteral(IntLiteral { id, location, value: n }))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::FloatLiteral(FloatLiteral { id, location, value: f }))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLiteral(BoolLiteral { id, location, value: true }))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLiteral(BoolLiteral {
                    id,
                    location,
                    value: false,
                }))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::StringLiteral(StringLiteral {
                    id,
                    location,
                    value: s,
                }))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::NullLiteral(id, location))
            }
            TokenKind::New => self.parse_new_expr(id, location),
            TokenKind::Ident(name) => {
                self.advance();
                if name.chars().next().is_some_and(char::is_uppercase) && self.check(&TokenKind::Dot) {
                    self.advance();
                    let member_id = self.next_id();
                    let member_name = self.expect_ident()?;
                    Ok(Expr::TypeMemberAccess(Box::new(TypeMemberAccessExpr {
                        id: member_id,
                        location,
                        type_name: name,
                        name: member_name,
                    })))
                } else {
                    Ok(Expr::Identifier(Identifier { id, location, name }))
                }
            }
            TokenKind::LParen if self.looks_like_lambda() => self.parse_lambda(id, location),
            TokenKind::LParen => {
                self.advance();
                if self.eat(&TokenKind::RParen) {
                    return Ok(Expr::TupleLiteral(TupleLiteralExpr {
                        id,
                        location,
                        elements: Vec::new(),
                    }));
                }
                let first = self.parse_expr()?;
                if self.eat(&TokenKind::Comma) {
                    let mut elements = vec![first];
                    while !self.check(&TokenKind::RParen) {
                        elements.push(self.parse_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen)?;
                    return Ok(Expr::TupleLiteral(TupleLiteralExpr {
                        id,
                        location,
                        elements,
                    }));
                }
                self.expect(&TokenKind::RParen)?;
                Ok(Expr::Paren(Box::new(first)))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&TokenKind::RBracket) {
                    elements.push(self.parse_expr()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBracket)?;
                Ok(Expr::ArrayLiteral(ArrayLiteralExpr {
                    id,
                    location,
                    elements,
                }))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.check(&TokenKind::RBrace) {
                    let name = self.expect_ident()?;
                    self.expect(&TokenKind::Colon)?;
                    let value = self.parse_expr()?;
                    fields.push((name, value));
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&TokenKind::RBrace)?;
                Ok(Expr::RecordLiteral(RecordLiteralExpr {
                    id,
                    location,
                    fields,
                }))
            }
            other => Err(ParseError {
                location,
                message: format!("expected an expression, found {other:?}"),
            }),
        }
    }

    fn parse_new_expr(&mut self, id: zena_ast::NodeId, location: Location) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::New)?;
        let class_name = self.expect_ident()?;
        let type_args = if self.eat(&TokenKind::Lt) {
            let mut args = vec![self.parse_type_union()?];
            while self.eat(&TokenKind::Comma) {
                args.push(self.parse_type_union()?);
            }
            self.expect(&TokenKind::Gt)?;
            args
        } else {
            Vec::new()
        };
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check(&TokenKind::RParen) {
            args.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Expr::New(Box::new(NewExpr {
            id,
            location,
            class_name,
            type_args,
            args,
        })))
    }

    /// Looks ahead from the current `(` to its matching `)` and checks
    /// whether a lambda marker (`=>` or a `: ReturnType =>`) follows,
    /// so grouping/tuple expressions and lambda literals — both of
    /// which start with `(` — don't need backtracking.
    fn looks_like_lambda(&self) -> bool {
        let mut depth = 0i32;
        let mut i = self.pos;
        loop {
            match self.tokens.get(i).map(|t| &t.kind) {
                Some(TokenKind::LParen) => depth += 1,
                Some(TokenKind::RParen) => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::FatArrow | TokenKind::Colon)
                        );
                    }
                }
                Some(TokenKind::Eof) | None => return false,
                _ => {}
            }
            i += 1;
        }
    }

    fn parse_lambda(&mut self, id: zena_ast::NodeId, location: Location) -> Result<Expr, ParseError> {
        let params = self.parse_params()?;
        let return_ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_union()?)
        } else {
            None
        };
        self.expect(&TokenKind::FatArrow)?;
        let body = if self.check(&TokenKind::LBrace) {
            LambdaBody::Block(self.parse_block()?)
        } else {
            LambdaBody::Expr(Box::new(self.parse_expr()?))
        };
        Ok(Expr::Lambda(Box::new(LambdaExpr {
            id,
            location,
            type_params: Vec::new(),
            params,
            return_ty,
            body,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let (program, diagnostics) = parse_module("test.zena", source);
        assert!(diagnostics.is_empty(), "unexpected diagnostics: {diagnostics:?}");
        program
    }

    #[test]
    fn parses_a_zero_arg_lambda_let() {
        let program = parse_ok("export let main = () => 42;");
        assert_eq!(program.decls.len(), 1);
        let Decl::Let(decl) = &program.decls[0] else {
            panic!("expected a let decl")
        };
        assert_eq!(decl.visibility, Visibility::Public);
        assert!(matches!(decl.value, Expr::Lambda(_)));
    }

    #[test]
    fn parses_a_class_with_constructor_and_method() {
        let program = parse_ok(
            "class Point { x: i32; y: i32; constructor(x: i32, y: i32) { this.x = x; } \
             sum(): i32 { return self.x + self.y; } }",
        );
        assert_eq!(program.decls.len(), 1);
        let Decl::Class(class) = &program.decls[0] else {
            panic!("expected a class decl")
        };
        assert_eq!(class.fields.len(), 2);
        assert!(class.constructor.is_some());
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn parses_nullable_union_field_and_narrowing() {
        let program = parse_ok(
            "class Node { value: i32; next: Node | null; }\n\
             let process = (n: Node | null) => { if (n !== null) { return n.value; } return 0; };",
        );
        assert_eq!(program.decls.len(), 2);
        let Decl::Class(class) = &program.decls[0] else {
            panic!("expected class")
        };
        assert!(matches!(class.fields[1].ty, TypeExpr::Union(_)));
    }

    #[test]
    fn parses_enum_with_explicit_discriminant() {
        let program = parse_ok("enum Color { Red, Green = 10, Blue }");
        let Decl::Enum(e) = &program.decls[0] else {
            panic!("expected enum")
        };
        assert_eq!(e.variants, vec![
            ("Red".to_string(), None),
            ("Green".to_string(), Some(10)),
            ("Blue".to_string(), None),
        ]);
    }

    #[test]
    fn parses_generic_class_instantiation() {
        let program = parse_ok("let b = new Box<i32>(1);");
        let Decl::Let(decl) = &program.decls[0] else {
            panic!("expected let")
        };
        let Expr::New(new_expr) = &decl.value else {
            panic!("expected new expr")
        };
        assert_eq!(new_expr.type_args.len(), 1);
    }

    #[test]
    fn reports_a_syntax_error_and_recovers_at_the_next_declaration() {
        let (program, diagnostics) = parse_module("test.zena", "let x = ;\nlet y = 1;");
        assert!(!diagnostics.is_empty());
        assert_eq!(diagnostics[0].code, DiagnosticCode::SyntaxError);
        assert_eq!(program.decls.len(), 1);
    }
}
