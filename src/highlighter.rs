// ABOUTME: Syntax highlighter for the REPL line editor
// Implements rustyline's Highlighter trait to colorize Lox keywords, literals,
// and comments while preserving the line's display width.

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_NATIVE: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)

const KEYWORDS: &[&str] = &[
    "and", "class", "else", "false", "fun", "for", "if", "nil", "or", "print", "return", "super",
    "this", "true", "var", "while",
];
const NATIVES: &[&str] = &["clock"];

/// `rustyline::Helper` for the REPL prompt, giving Lox source basic color
/// without pulling in a derive crate the teacher's own helper didn't use.
pub struct LoxHelper;

impl LoxHelper {
    pub fn new() -> Self {
        LoxHelper
    }
}

impl Default for LoxHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for LoxHelper {}

impl Completer for LoxHelper {
    type Candidate = String;
}

impl Hinter for LoxHelper {
    type Hint = String;
}

impl Validator for LoxHelper {}

impl Highlighter for LoxHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn highlight_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut result = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '/' if chars.get(i + 1) == Some(&'/') => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    result.push(chars[i]);
                    i += 1;
                }
                if i < chars.len() {
                    result.push('"');
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                result.push_str(COLOR_NUMBER);
                result.extend(&chars[start..i]);
                result.push_str(COLOR_RESET);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if KEYWORDS.contains(&word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if NATIVES.contains(&word.as_str()) {
                    result.push_str(COLOR_NATIVE);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }
            c => {
                result.push(c);
                i += 1;
            }
        }
    }

    result
}
