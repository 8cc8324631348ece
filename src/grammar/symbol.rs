use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    sync::atomic::{self, AtomicU64},
};

use regex::Regex;

use super::{
    error::{GrammarError, Result},
    END_MARK, EPSILON,
};

/// A regular expression matched against source text.
///
/// Two patterns are the same terminal when their pattern text is the same,
/// regardless of how the expression was compiled.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: Regex,
    literal: Option<String>,
}

impl Pattern {
    fn new(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(GrammarError::InvalidSymbol(
                "empty pattern, use Terminal::Empty to represent an empty sequence".to_string(),
            ));
        }
        Regex::new(source)
            .map_err(|e| GrammarError::InvalidSymbol(format!("pattern `{}`: {}", source, e)))?;
        let anchored = Regex::new(&format!(r"\A(?:{})", source))
            .map_err(|e| GrammarError::InvalidSymbol(format!("pattern `{}`: {}", source, e)))?;
        Ok(Self {
            source: source.to_string(),
            anchored,
            literal: None,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The unescaped text, for patterns built with [`Terminal::literal`].
    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// Length in bytes of the match starting exactly at the beginning of
    /// `text`. Zero-length matches are not matches.
    pub(crate) fn match_len(&self, text: &str) -> Option<usize> {
        self.anchored
            .find(text)
            .map(|m| m.end())
            .filter(|&len| len > 0)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl Hash for Pattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source.cmp(&other.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminal {
    Pattern(Pattern),
    /// Marks the end of the token stream. Only the tokenizer and the parse
    /// table use it; it cannot appear in a rule.
    EndOfStream,
    /// The empty sequence. A rule using it must have it as its only symbol,
    /// e.g. `A -> Empty` means "A may be removed".
    Empty,
}

impl Terminal {
    pub fn new(pattern: &str) -> Result<Self> {
        Pattern::new(pattern).map(Terminal::Pattern)
    }

    /// A terminal matching `text` literally.
    pub fn literal(text: &str) -> Result<Self> {
        let mut pattern = Pattern::new(&regex::escape(text))?;
        pattern.literal = Some(text.to_string());
        Ok(Terminal::Pattern(pattern))
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        match self {
            Terminal::Pattern(p) => Some(p),
            Terminal::EndOfStream | Terminal::Empty => None,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Pattern(p) => match p.literal() {
                Some(text) => write!(f, "{:?}", text),
                None => write!(f, "/{}/", p.as_str()),
            },
            Terminal::EndOfStream => write!(f, "{}", END_MARK),
            Terminal::Empty => write!(f, "{}", EPSILON),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u64);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NonTerminal {
    /// Entry point of every grammar.
    Start,
    Generated(SymbolId),
}

impl NonTerminal {
    /// A fresh non-terminal, distinct from every other one in the process.
    pub fn generate() -> Self {
        NonTerminal::Generated(SymbolId(
            NEXT_SYMBOL_ID.fetch_add(1, atomic::Ordering::Relaxed),
        ))
    }
}

impl fmt::Display for NonTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonTerminal::Start => write!(f, "Start"),
            NonTerminal::Generated(id) => write!(f, "N{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Terminal(Terminal),
    NonTerminal(NonTerminal),
}

impl Symbol {
    pub fn terminal(&self) -> Option<&Terminal> {
        match self {
            Symbol::Terminal(t) => Some(t),
            Symbol::NonTerminal(_) => None,
        }
    }

    pub fn non_terminal(&self) -> Option<NonTerminal> {
        match self {
            Symbol::NonTerminal(nt) => Some(*nt),
            Symbol::Terminal(_) => None,
        }
    }
}

impl From<Terminal> for Symbol {
    fn from(t: Terminal) -> Self {
        Symbol::Terminal(t)
    }
}

impl From<&Terminal> for Symbol {
    fn from(t: &Terminal) -> Self {
        Symbol::Terminal(t.clone())
    }
}

impl From<NonTerminal> for Symbol {
    fn from(nt: NonTerminal) -> Self {
        Symbol::NonTerminal(nt)
    }
}

impl From<&NonTerminal> for Symbol {
    fn from(nt: &NonTerminal) -> Self {
        Symbol::NonTerminal(*nt)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(t) => t.fmt(f),
            Symbol::NonTerminal(nt) => nt.fmt(f),
        }
    }
}

/// A production `head -> body`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rule {
    head: NonTerminal,
    body: Vec<Symbol>,
}

impl Rule {
    pub fn new<I>(head: NonTerminal, body: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        let body: Vec<Symbol> = body.into_iter().map(Into::into).collect();
        let invalid =
            |message: &str| Err(GrammarError::InvalidRule(format!("{}: {}", head, message)));

        let Some(first) = body.first() else {
            return invalid("the body must not be empty, use Terminal::Empty for an empty sequence");
        };
        if body.contains(&Symbol::Terminal(Terminal::EndOfStream)) {
            return invalid("end of stream is reserved for the parser and cannot appear in a rule");
        }
        if first.non_terminal() == Some(head) {
            return invalid("left recursion is not allowed");
        }
        if body.len() > 1 && body.contains(&Symbol::Terminal(Terminal::Empty)) {
            return invalid("the empty terminal must be the only symbol of its body");
        }

        Ok(Self { head, body })
    }

    pub fn head(&self) -> NonTerminal {
        self.head
    }

    pub fn body(&self) -> &[Symbol] {
        &self.body
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ->", self.head)?;
        for symbol in &self.body {
            write!(f, " {}", symbol)?;
        }
        Ok(())
    }
}

/// A piece of source text matched by a terminal. `span` holds byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub symbol: Terminal,
    pub text: String,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(symbol: Terminal, text: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            symbol,
            text: text.into(),
            span,
        }
    }

    pub fn end_of_stream(offset: usize) -> Self {
        Self::new(Terminal::EndOfStream, "", offset..offset)
    }
}
