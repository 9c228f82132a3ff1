// ABOUTME: Version string and REPL banner/prompt constants

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "loxtree";
pub const WELCOME_SUBTITLE: &str = "A tree-walking interpreter for Lox";
pub const PROMPT: &str = "> ";
