// ABOUTME: Character-at-a-time lexer turning source text into a token stream

use crate::error::{ErrorList, LoxError};
use crate::token::{Literal, Token, TokenKind};

/// Scans an entire source string into tokens, recovering past scan errors so
/// the caller sees as many problems as possible in one pass.
pub struct Scanner {
    source: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
    errors: ErrorList,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
            errors: ErrorList::new(),
        }
    }

    /// Scans the whole source, returning the token list (terminated by
    /// `EOF`) and any accumulated errors. Consumes `self`: scanning past
    /// `EOF` is therefore unreachable by construction rather than guarded
    /// at runtime.
    pub fn scan_tokens(mut self) -> (Vec<Token>, ErrorList) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", None, self.line));
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_lit(kind, None);
    }

    fn add_token_lit(&mut self, kind: TokenKind, literal: Option<Literal>) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.match_next('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_next('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_next('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_next('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_next('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_identifier_start(c) => self.identifier(),
            _ => {
                self.errors.push(LoxError::scan(self.line, "Unexpected character."));
            }
        }
    }

    fn string(&mut self) {
        let start_line = self.line;
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.is_at_end() {
            self.errors.push(LoxError::scan(start_line, "Unterminated string."));
            return;
        }
        // Consume the closing quote.
        self.advance();
        let value: String = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_token_lit(TokenKind::String, Some(Literal::Str(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text = self.lexeme();
        let value: f64 = text.parse().unwrap_or(0.0);
        self.add_token_lit(TokenKind::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while is_identifier_continue(self.peek()) {
            self.advance();
        }
        let text = self.lexeme();
        let kind = keyword_kind(&text).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword_kind(text: &str) -> Option<TokenKind> {
    Some(match text {
        "and" => TokenKind::And,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "fun" => TokenKind::Fun,
        "for" => TokenKind::For,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty(), "unexpected scan errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(
            kinds("(){},.-+;*"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("!= == <= >= ! = < >"),
            vec![
                TokenKind::BangEqual,
                TokenKind::EqualEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Bang,
                TokenKind::Equal,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comment_is_skipped() {
        assert_eq!(kinds("// a whole comment\n1"), vec![TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn string_literal() {
        let (tokens, errors) = Scanner::new("\"hi there\"").scan_tokens();
        assert!(errors.is_empty());
        match &tokens[0].literal {
            Some(Literal::Str(s)) => assert_eq!(s, "hi there"),
            other => panic!("expected string literal, got {:?}", other),
        }
    }

    #[test]
    fn unterminated_string_errors() {
        let (_, errors) = Scanner::new("\"oops").scan_tokens();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn number_literal_with_fraction() {
        let (tokens, _) = Scanner::new("3.14").scan_tokens();
        match &tokens[0].literal {
            Some(Literal::Number(n)) => assert!((n - 3.14).abs() < 1e-9),
            other => panic!("expected number literal, got {:?}", other),
        }
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("and class var orchid"),
            vec![
                TokenKind::And,
                TokenKind::Class,
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unexpected_character_recovers() {
        let (tokens, errors) = Scanner::new("1 @ 2").scan_tokens();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn line_numbers_track_newlines() {
        let (tokens, _) = Scanner::new("1\n2\n3").scan_tokens();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
    }
}
