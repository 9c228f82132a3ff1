// ABOUTME: rustyline-backed line loop shared by all three CLI subcommands

use crate::config::PROMPT;
use crate::highlighter::LoxHelper;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};

/// Reads lines from standard input with the `> ` prompt until EOF or
/// Ctrl-D/Ctrl-C, invoking `on_line` with each line's text (history is kept
/// automatically; the line is not otherwise touched, e.g. no trimming of
/// trailing whitespace beyond what rustyline itself strips).
pub fn run<F: FnMut(&str)>(mut on_line: F) {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(config).expect("failed to initialize line editor");
    rl.set_helper(Some(LoxHelper::new()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => on_line(&line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }
}
