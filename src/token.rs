// ABOUTME: Token types produced by the scanner and consumed by the parser

use std::fmt;

/// The fixed 39-member enumeration of lexical categories in Lox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character punctuation.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character comparators.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals.
    Identifier,
    String,
    Number,

    // Keywords.
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The literal value carried by `NUMBER` and `STRING` tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", format_number(*n)),
            Literal::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Renders a Lox number with the shortest round-trip decimal representation,
/// dropping the fractional part for whole numbers.
pub fn format_number(n: f64) -> String {
    format!("{}", n)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, literal: Option<Literal>, line: usize) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            literal,
            line,
        }
    }

    /// Renders this token the way the `scanner` CLI subcommand prints it:
    /// `KIND LEXEME LITERAL-OR-nil`.
    pub fn display_line(&self) -> String {
        match &self.literal {
            Some(lit) => format!("{} {} {}", self.kind, self.lexeme, lit),
            None => format!("{} {} nil", self.kind, self.lexeme),
        }
    }

    /// Describes this token's position for error messages: the lexeme, or
    /// "end" when this is the EOF token.
    pub fn error_location(&self) -> String {
        if self.kind == TokenKind::Eof {
            "end".to_string()
        } else {
            format!("'{}'", self.lexeme)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_line_with_literal() {
        let t = Token::new(TokenKind::Number, "42", Some(Literal::Number(42.0)), 1);
        assert_eq!(t.display_line(), "Number 42 42");
    }

    #[test]
    fn display_line_without_literal() {
        let t = Token::new(TokenKind::Plus, "+", None, 1);
        assert_eq!(t.display_line(), "Plus + nil");
    }

    #[test]
    fn error_location_at_eof() {
        let t = Token::new(TokenKind::Eof, "", None, 3);
        assert_eq!(t.error_location(), "end");
    }

    #[test]
    fn error_location_at_token() {
        let t = Token::new(TokenKind::Identifier, "y", None, 3);
        assert_eq!(t.error_location(), "'y'");
    }
}
