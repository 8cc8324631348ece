use std::collections::BTreeMap;

use log::{debug, trace};

use super::{
    error::{GrammarError, Result},
    ll1_parsing_table::ParseTable,
    symbol::{NonTerminal, Rule, Symbol, Terminal, Token},
    tree::ParseTree,
    Grammar,
};

/// Table-driven predictive parser over a conflict-free [`ParseTable`].
#[derive(Debug, Clone)]
pub struct Ll1Parser {
    table: BTreeMap<(NonTerminal, Terminal), Rule>,
    expected: BTreeMap<NonTerminal, Vec<Terminal>>,
}

/// A non-terminal being expanded: the body symbols still to process and the
/// subtrees built so far.
struct Frame<'p> {
    head: NonTerminal,
    pending: std::slice::Iter<'p, Symbol>,
    children: Vec<ParseTree>,
}

/// Pulls tokens one at a time. A stream that runs dry behaves like one that
/// ends with `EndOfStream` right after its last token.
struct Lookahead<I> {
    tokens: I,
    end: usize,
}

impl<I: Iterator<Item = Result<Token>>> Lookahead<I> {
    fn pull(&mut self) -> Result<Token> {
        match self.tokens.next() {
            Some(token) => {
                let token = token?;
                self.end = token.span.end;
                Ok(token)
            }
            None => Ok(Token::end_of_stream(self.end)),
        }
    }
}

impl Ll1Parser {
    pub fn new(table: &ParseTable) -> Result<Self> {
        if let Some((head, terminal, rules)) = table.conflicts().next() {
            return Err(GrammarError::AmbiguousGrammar {
                head,
                terminal: terminal.clone(),
                rules: rules.len(),
            });
        }

        let table_entries: BTreeMap<(NonTerminal, Terminal), Rule> = table
            .cells()
            .filter_map(|(nt, t, rules)| {
                rules
                    .iter()
                    .next()
                    .map(|rule| ((nt, t.clone()), rule.clone()))
            })
            .collect();
        let expected = table
            .non_terminals()
            .iter()
            .map(|&nt| (nt, table.expected(nt)))
            .collect();
        debug!("parser ready with {} table entries", table_entries.len());

        Ok(Self {
            table: table_entries,
            expected,
        })
    }

    fn expand(&self, head: NonTerminal, lookahead: &Token) -> Result<Frame<'_>> {
        let Some(rule) = self.table.get(&(head, lookahead.symbol.clone())) else {
            return Err(GrammarError::UnexpectedToken {
                found: lookahead.clone(),
                expected: self.expected.get(&head).cloned().unwrap_or_default(),
            });
        };
        trace!("expand {} on {}", rule, lookahead.symbol);
        Ok(Frame {
            head,
            pending: rule.body().iter(),
            children: Vec::with_capacity(rule.body().len()),
        })
    }

    /// Parses a whole token stream into a tree rooted at `Start`.
    ///
    /// The stream is read one token past the last consumed one, and the
    /// whole input has to be consumed: after the root the lookahead must be
    /// `EndOfStream`. Trailing input is an `UnexpectedToken` error expecting
    /// `EndOfStream`, and so is a lookahead that differs from the predicted
    /// terminal, expecting that terminal.
    pub fn parse<I>(&self, tokens: I) -> Result<ParseTree>
    where
        I: IntoIterator<Item = Result<Token>>,
    {
        let mut input = Lookahead {
            tokens: tokens.into_iter(),
            end: 0,
        };
        let mut lookahead = input.pull()?;
        let mut stack = vec![self.expand(NonTerminal::Start, &lookahead)?];

        loop {
            let Some(frame) = stack.last_mut() else {
                return Err(GrammarError::MalformedStack);
            };
            match frame.pending.next() {
                None => {
                    let Some(done) = stack.pop() else {
                        return Err(GrammarError::MalformedStack);
                    };
                    let node = ParseTree::NonTerminal {
                        symbol: done.head,
                        children: done.children,
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => {
                            if lookahead.symbol != Terminal::EndOfStream {
                                return Err(GrammarError::UnexpectedToken {
                                    found: lookahead,
                                    expected: vec![Terminal::EndOfStream],
                                });
                            }
                            return Ok(node);
                        }
                    }
                }
                Some(Symbol::NonTerminal(nt)) => {
                    let child = self.expand(*nt, &lookahead)?;
                    stack.push(child);
                }
                Some(Symbol::Terminal(Terminal::Empty)) => frame.children.push(ParseTree::Empty),
                Some(Symbol::Terminal(Terminal::EndOfStream)) => {
                    return Err(GrammarError::MalformedStack)
                }
                Some(Symbol::Terminal(terminal)) => {
                    if *terminal != lookahead.symbol {
                        return Err(GrammarError::UnexpectedToken {
                            found: lookahead,
                            expected: vec![terminal.clone()],
                        });
                    }
                    let token = std::mem::replace(&mut lookahead, input.pull()?);
                    frame.children.push(ParseTree::Terminal {
                        symbol: terminal.clone(),
                        token,
                    });
                }
            }
        }
    }
}

impl Grammar {
    pub fn parser(&self) -> Result<Ll1Parser> {
        Ll1Parser::new(&self.parse_table()?)
    }

    /// Tokenizes and parses `source` in one go.
    pub fn parse(&self, source: &str) -> Result<ParseTree> {
        self.parser()?.parse(self.tokenize(source))
    }
}
