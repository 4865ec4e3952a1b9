//! Hand-written lexer. Produces a flat token stream consumed by
//! [`crate::parser::Parser`]; there is no separate CST (spec §1 treats
//! the whole front end as an external collaborator, so there is no
//! reason to keep one around for tooling this workspace doesn't have).

use zena_ast::Location;

use crate::errors::LexError;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),

    Let,
    Mut,
    Class,
    Interface,
    Mixin,
    Enum,
    Type,
    Export,
    Import,
    From,
    As,
    Is,
    Not,
    New,
    Return,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    Throw,
    Try,
    Catch,
    Assert,
    Extension,
    On,
    Final,
    Operator,
    True,
    False,
    Null,
    Inline,
    Distinct,
    Constructor,

    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Star2, // `**` reserved, unused by the grammar below but lexed for forward compatibility
    Arrow,    // ->
    FatArrow, // =>

    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    AndAnd,
    OrOr,
    Bang,
    Amp,
    Pipe,
    Caret,
    Shl,
    Shr,
    UShr,
    Eq,
    Question,

    Eof,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn here(&self) -> Location {
        Location::new(
            u32::try_from(self.pos).unwrap_or(u32::MAX),
            u32::try_from(self.pos).unwrap_or(u32::MAX),
            self.line,
            self.column,
            self.line,
            self.column,
        )
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    while self.peek().is_some() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.advance();
                    }
                    self.advance();
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Tokenizes the whole source. Stops at the first lexical error
    /// rather than attempting to recover mid-token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.here();
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    location: start,
                });
                break;
            };
            let kind = if c.is_ascii_digit() {
                self.lex_number()?
            } else if c == '"' {
                self.lex_string()?
            } else if c.is_alphabetic() || c == '_' {
                self.lex_ident_or_keyword()
            } else {
                self.lex_operator(start.clone())?
            };
            tokens.push(Token {
                kind,
                location: start,
            });
        }
        Ok(tokens)
    }

    fn lex_number(&mut self) -> Result<TokenKind, LexError> {
        let start_pos = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        let text: String = self.chars[start_pos..self.pos].iter().collect();
        if is_float {
            text.parse::<f64>().map(TokenKind::Float).map_err(|_| LexError {
                location: self.here(),
                message: format!("invalid float literal '{text}'"),
            })
        } else {
            text.parse::<i64>().map(TokenKind::Int).map_err(|_| LexError {
                location: self.here(),
                message: format!("invalid integer literal '{text}'"),
            })
        }
    }

    fn lex_string(&mut self) -> Result<TokenKind, LexError> {
        self.advance(); // opening quote
        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => value.push(other),
                    None => {
                        return Err(LexError {
                            location: self.here(),
                            message: "unterminated escape sequence in string literal".to_string(),
                        });
                    }
                },
                Some(c) => value.push(c),
                None => {
                    return Err(LexError {
                        location: self.here(),
                        message: "unterminated string literal".to_string(),
                    });
                }
            }
        }
        Ok(TokenKind::Str(value))
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let start_pos = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text: String = self.chars[start_pos..self.pos].iter().collect();
        match text.as_str() {
            "let" => TokenKind::Let,
            "mut" => TokenKind::Mut,
            "class" => TokenKind::Class,
            "interface" => TokenKind::Interface,
            "mixin" => TokenKind::Mixin,
            "enum" => TokenKind::Enum,
            "type" => TokenKind::Type,
            "export" => TokenKind::Export,
            "import" => TokenKind::Import,
            "from" => TokenKind::From,
            "as" => TokenKind::As,
            "is" => TokenKind::Is,
            "not" => TokenKind::Not,
            "new" => TokenKind::New,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "throw" => TokenKind::Throw,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "assert" => TokenKind::Assert,
            "extension" => TokenKind::Extension,
            "on" => TokenKind::On,
            "final" => TokenKind::Final,
            "operator" => TokenKind::Operator,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "inline" => TokenKind::Inline,
            "distinct" => TokenKind::Distinct,
            "constructor" => TokenKind::Constructor,
            _ => TokenKind::Ident(text),
        }
    }

    fn lex_operator(&mut self, start: Location) -> Result<TokenKind, LexError> {
        let c = self.advance().expect("caller already peeked a char");
        let kind = match c {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' if self.peek() == Some('>') => {
                self.advance();
                TokenKind::Arrow
            }
            '-' => TokenKind::Minus,
            '*' if self.peek() == Some('*') => {
                self.advance();
                TokenKind::Star2
            }
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '?' => TokenKind::Question,
            '&' if self.peek() == Some('&') => {
                self.advance();
                TokenKind::AndAnd
            }
            '&' => TokenKind::Amp,
            '|' if self.peek() == Some('|') => {
                self.advance();
                TokenKind::OrOr
            }
            '|' => TokenKind::Pipe,
            '=' if self.peek() == Some('=') && self.peek_at(1) == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::EqEqEq
            }
            '=' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::EqEq
            }
            '=' if self.peek() == Some('>') => {
                self.advance();
                TokenKind::FatArrow
            }
            '=' => TokenKind::Eq,
            '!' if self.peek() == Some('=') && self.peek_at(1) == Some('=') => {
                self.advance();
                self.advance();
                TokenKind::NotEqEq
            }
            '!' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::NotEq
            }
            '!' => TokenKind::Bang,
            '<' if self.peek() == Some('<') => {
                self.advance();
                TokenKind::Shl
            }
            '<' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::Le
            }
            '<' => TokenKind::Lt,
            '>' if self.peek() == Some('>') && self.peek_at(1) == Some('>') => {
                self.advance();
                self.advance();
                TokenKind::UShr
            }
            '>' if self.peek() == Some('>') => {
                self.advance();
                TokenKind::Shr
            }
            '>' if self.peek() == Some('=') => {
                self.advance();
                TokenKind::Ge
            }
            '>' => TokenKind::Gt,
            other => {
                return Err(LexError {
                    location: start,
                    message: format!("unexpected character '{other}'"),
                });
            }
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_a_let_declaration() {
        let kinds = kinds("let x = 42;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Ident("x".to_string()),
                TokenKind::Eq,
                TokenKind::Int(42),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_triple_and_double_equals() {
        let kinds = kinds("a !== b != c === d == e");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::NotEqEq,
                TokenKind::Ident("b".to_string()),
                TokenKind::NotEq,
                TokenKind::Ident("c".to_string()),
                TokenKind::EqEqEq,
                TokenKind::Ident("d".to_string()),
                TokenKind::EqEq,
                TokenKind::Ident("e".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        let kinds = kinds("let x = 1; // trailing\n/* block */ let y = 2;");
        assert_eq!(kinds.iter().filter(|k| matches!(k, TokenKind::Let)).count(), 2);
    }

    #[test]
    fn lexes_string_escapes() {
        let kinds = kinds(r#""a\nb""#);
        assert_eq!(kinds[0], TokenKind::Str("a\nb".to_string()));
    }

    #[test]
    fn lexes_distinct_and_constructor_keywords() {
        let kinds = kinds("type distinct constructor");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Type,
                TokenKind::Distinct,
                TokenKind::Constructor,
                TokenKind::Eof,
            ]
        );
    }
}
