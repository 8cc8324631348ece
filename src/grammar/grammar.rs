use std::collections::{BTreeSet, HashMap};

use super::{
    error::Result,
    symbol::{NonTerminal, Rule, Symbol, Terminal},
};

/// An ordered set of rules together with the display names of its symbols.
///
/// Terminals are remembered in the order they are first declared or used;
/// the tokenizer breaks ties between equally long matches with that order.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    rules: Vec<Rule>,
    terminals: Vec<Terminal>,
    skip: Vec<Terminal>,
    names: HashMap<Symbol, String>,
    pub symbol_table: HashMap<String, Symbol>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules<I: IntoIterator<Item = Rule>>(rules: I) -> Self {
        let mut g = Self::new();
        for rule in rules {
            g.add_rule(rule);
        }
        g
    }

    /// Adds `rule` unless an equal rule is already present.
    pub fn add_rule(&mut self, rule: Rule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        for symbol in rule.body() {
            if let Some(t) = symbol.terminal() {
                self.declare_terminal(t.clone());
            }
        }
        self.rules.push(rule);
        true
    }

    pub fn add_production<I>(&mut self, head: NonTerminal, body: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        self.add_rule(Rule::new(head, body)?);
        Ok(self)
    }

    pub fn declare_terminal(&mut self, terminal: Terminal) {
        if terminal.pattern().is_some() && !self.terminals.contains(&terminal) {
            self.terminals.push(terminal);
        }
    }

    /// Registers a pattern whose matches the tokenizer consumes silently.
    pub fn add_skip(&mut self, terminal: Terminal) {
        if terminal.pattern().is_some() && !self.skip.contains(&terminal) {
            self.skip.push(terminal);
        }
    }

    pub fn set_name(&mut self, symbol: impl Into<Symbol>, name: impl Into<String>) {
        let symbol = symbol.into();
        let name = name.into();
        self.symbol_table.insert(name.clone(), symbol.clone());
        self.names.insert(symbol, name);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rules_of(&self, head: NonTerminal) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |rule| rule.head() == head)
    }

    /// Every pattern terminal, in declaration order.
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn skip_terminals(&self) -> &[Terminal] {
        &self.skip
    }

    /// Rule heads in order of first appearance.
    pub fn heads(&self) -> Vec<NonTerminal> {
        let mut heads: Vec<NonTerminal> = Vec::new();
        for rule in &self.rules {
            if !heads.contains(&rule.head()) {
                heads.push(rule.head());
            }
        }
        heads
    }

    /// Every non-terminal that heads a rule or appears in a body.
    pub fn non_terminals(&self) -> BTreeSet<NonTerminal> {
        self.rules
            .iter()
            .flat_map(|rule| {
                std::iter::once(rule.head())
                    .chain(rule.body().iter().filter_map(|s| s.non_terminal()))
            })
            .collect()
    }

    pub fn get_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbol_table.get(name)
    }

    pub fn get_symbol_name(&self, symbol: &Symbol) -> String {
        match self.names.get(symbol) {
            Some(name) => name.clone(),
            None => symbol.to_string(),
        }
    }

    pub fn get_terminal_name(&self, terminal: &Terminal) -> String {
        self.get_symbol_name(&Symbol::Terminal(terminal.clone()))
    }

    pub fn get_non_terminal_name(&self, non_terminal: NonTerminal) -> String {
        self.get_symbol_name(&Symbol::NonTerminal(non_terminal))
    }

    pub fn has_name(&self, symbol: &Symbol) -> bool {
        self.names.contains_key(symbol)
    }
}
