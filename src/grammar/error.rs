use thiserror::Error;

use super::symbol::{NonTerminal, Terminal, Token};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("invalid rule: {0}")]
    InvalidRule(String),
    #[error("invalid grammar: {0}")]
    InvalidGrammar(String),
    #[error("ambiguous grammar: {rules} rules compete for ({head}, {terminal})")]
    AmbiguousGrammar {
        head: NonTerminal,
        terminal: Terminal,
        rules: usize,
    },
    #[error("unexpected token `{}` ({}) at {}..{}", found.text, found.symbol, found.span.start, found.span.end)]
    UnexpectedToken {
        found: Token,
        expected: Vec<Terminal>,
    },
    #[error("no pattern matches at offset {offset}")]
    TokenizeFailure { offset: usize },
    #[error("parser stack reached end of stream as a symbol to expand")]
    MalformedStack,
    #[error("malformed tree: {0}")]
    MalformedTree(String),
    #[error("line {line}: {message}")]
    InvalidNotation { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, GrammarError>;
