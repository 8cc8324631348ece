use crowbook_text_processing::escape::tex as escape_tex;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::Grammar;

use super::{
    error::{GrammarError, Result},
    first_follow::FirstFollowTable,
    pretty_print::ProductionOutput,
    symbol::{NonTerminal, Rule, Symbol, Terminal},
};

/// Predictive parse table: for each (non-terminal, lookahead) pair, the rules
/// that may be chosen. A grammar is LL(1) when no cell holds more than one
/// rule; building the table never checks that, see [`ParseTable::conflicts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTable {
    non_terminals: BTreeSet<NonTerminal>,
    terminals: BTreeSet<Terminal>,
    cells: BTreeMap<(NonTerminal, Terminal), BTreeSet<Rule>>,
}

impl ParseTable {
    pub fn build(rules: &[Rule], ff: &FirstFollowTable) -> Self {
        let mut non_terminals = BTreeSet::new();
        let mut terminals = BTreeSet::from([Terminal::EndOfStream]);
        for rule in rules {
            non_terminals.insert(rule.head());
            for symbol in rule.body() {
                match symbol {
                    Symbol::NonTerminal(nt) => {
                        non_terminals.insert(*nt);
                    }
                    Symbol::Terminal(Terminal::Empty) => {}
                    Symbol::Terminal(t) => {
                        terminals.insert(t.clone());
                    }
                }
            }
        }

        let bodies: Vec<(&Rule, BTreeSet<Terminal>)> = rules
            .iter()
            .map(|rule| (rule, ff.first.of_body(rule.body())))
            .collect();

        let mut cells = BTreeMap::new();
        for &nt in &non_terminals {
            for t in &terminals {
                let cell: BTreeSet<Rule> = bodies
                    .iter()
                    .filter(|(rule, _)| rule.head() == nt)
                    .filter(|(_, first)| {
                        first.contains(t)
                            || (first.contains(&Terminal::Empty) && ff.follow.contains(nt, t))
                    })
                    .map(|(rule, _)| (*rule).clone())
                    .collect();
                cells.insert((nt, t.clone()), cell);
            }
        }

        let table = Self {
            non_terminals,
            terminals,
            cells,
        };
        debug!(
            "LL(1) table with {} rows, {} columns, {} conflicts",
            table.non_terminals.len(),
            table.terminals.len(),
            table.conflicts().count()
        );
        table
    }

    pub fn get(&self, non_terminal: NonTerminal, terminal: &Terminal) -> Option<&BTreeSet<Rule>> {
        self.cells.get(&(non_terminal, terminal.clone()))
    }

    pub fn non_terminals(&self) -> &BTreeSet<NonTerminal> {
        &self.non_terminals
    }

    /// Lookahead alphabet, `EndOfStream` included and `Empty` excluded.
    pub fn terminals(&self) -> &BTreeSet<Terminal> {
        &self.terminals
    }

    pub fn cells(&self) -> impl Iterator<Item = (NonTerminal, &Terminal, &BTreeSet<Rule>)> {
        self.cells.iter().map(|((nt, t), rules)| (*nt, t, rules))
    }

    /// Cells holding more than one rule.
    pub fn conflicts(&self) -> impl Iterator<Item = (NonTerminal, &Terminal, &BTreeSet<Rule>)> {
        self.cells().filter(|(_, _, rules)| rules.len() > 1)
    }

    pub fn is_ll1(&self) -> bool {
        self.conflicts().next().is_none()
    }

    /// Lookaheads for which `non_terminal` has an entry.
    pub fn expected(&self, non_terminal: NonTerminal) -> Vec<Terminal> {
        self.cells()
            .filter(|(nt, _, rules)| *nt == non_terminal && !rules.is_empty())
            .map(|(_, t, _)| t.clone())
            .collect()
    }
}

#[derive(Serialize)]
pub struct LL1ParsingTable {
    terminals: Vec<String>,
    rows: Vec<(String, Vec<ProductionOutput>)>,
}

impl LL1ParsingTable {
    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().cloned());
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.clone()];
            line.extend(
                row.iter()
                    .map(|productions| productions.to_plaintext(left.len(), false)),
            );
            output.push(line);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| output.iter().map(|line| line[j].len()).max().unwrap_or(0))
            .collect();
        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|t| format!("\\text{{{}}}", escape_tex(t.as_str()))),
        );
        let header = header.join(" & ");

        let mut output: Vec<String> = Vec::new();
        let terminal_set: HashSet<&str> = self.terminals.iter().map(|t| t.as_str()).collect();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![escape_tex(left.as_str()).to_string()];
            line.extend(row.iter().map(|productions| {
                let cell = productions.to_latex(false, &terminal_set);
                if productions.rights.len() > 1 {
                    format!("{{\\color{{red}}{}}}", cell)
                } else {
                    cell
                }
            }));
            output.push(line.join(" & "));
        }

        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Grammar {
    /// Computes FIRST/FOLLOW and builds the parse table.
    ///
    /// Fails when there is no `Start` rule or a non-terminal is used without
    /// heading any rule. Conflicting cells are kept for inspection.
    pub fn parse_table(&self) -> Result<ParseTable> {
        let ff = self.first_follow()?;
        let heads: HashSet<NonTerminal> = self.heads().into_iter().collect();
        if let Some(undefined) = self.non_terminals().into_iter().find(|nt| !heads.contains(nt)) {
            return Err(GrammarError::InvalidGrammar(format!(
                "{} is used but heads no rule",
                self.get_non_terminal_name(undefined)
            )));
        }
        Ok(ParseTable::build(self.rules(), &ff))
    }

    pub fn to_ll1_parsing_table(&self, table: &ParseTable) -> LL1ParsingTable {
        let terminals: Vec<&Terminal> = table.terminals().iter().collect();

        let mut rows = Vec::new();
        for nt in self.heads() {
            let left = self.get_non_terminal_name(nt);
            let row = terminals
                .iter()
                .map(|t| ProductionOutput {
                    left: left.clone(),
                    rights: table
                        .get(nt, t)
                        .into_iter()
                        .flatten()
                        .map(|rule| self.production_to_vec_string(rule.body()))
                        .collect(),
                })
                .collect();
            rows.push((left, row));
        }

        LL1ParsingTable {
            terminals: terminals
                .iter()
                .map(|t| self.get_terminal_name(t))
                .collect(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::test_grammars;

    fn only(rule: Rule) -> BTreeSet<Rule> {
        BTreeSet::from([rule])
    }

    #[test]
    fn nullable_rule_goes_under_follow() {
        let a_ = NonTerminal::generate();
        let b_ = NonTerminal::generate();
        let a = Terminal::literal("a").unwrap();
        let b = Terminal::literal("b").unwrap();
        let c = Terminal::literal("c").unwrap();
        let eos = Terminal::EndOfStream;

        let start_rule = Rule::new(
            NonTerminal::Start,
            [Symbol::from(&a), Symbol::from(a_), Symbol::from(b_), Symbol::from(&b)],
        )
        .unwrap();
        let a_rule = Rule::new(a_, [Symbol::from(&a), Symbol::from(a_), Symbol::from(&c)]).unwrap();
        let a_empty = Rule::new(a_, [Terminal::Empty]).unwrap();
        let b_rule = Rule::new(b_, [Symbol::from(&b), Symbol::from(b_)]).unwrap();
        let b_c = Rule::new(b_, [&c]).unwrap();

        let g = Grammar::from_rules([
            start_rule.clone(),
            a_rule.clone(),
            a_empty.clone(),
            b_rule.clone(),
            b_c.clone(),
        ]);
        let table = g.parse_table().unwrap();
        let none = BTreeSet::new();

        assert_eq!(table.get(NonTerminal::Start, &a), Some(&only(start_rule)));
        assert_eq!(table.get(NonTerminal::Start, &b), Some(&none));
        assert_eq!(table.get(NonTerminal::Start, &c), Some(&none));
        assert_eq!(table.get(NonTerminal::Start, &eos), Some(&none));
        assert_eq!(table.get(a_, &a), Some(&only(a_rule)));
        assert_eq!(table.get(a_, &b), Some(&only(a_empty.clone())));
        assert_eq!(table.get(a_, &c), Some(&only(a_empty)));
        assert_eq!(table.get(a_, &eos), Some(&none));
        assert_eq!(table.get(b_, &a), Some(&none));
        assert_eq!(table.get(b_, &b), Some(&only(b_rule)));
        assert_eq!(table.get(b_, &c), Some(&only(b_c)));
        assert_eq!(table.get(b_, &eos), Some(&none));
        assert_eq!(table.get(b_, &Terminal::Empty), None);
        assert!(table.is_ll1());
    }

    #[test]
    fn expression_table() {
        let g = test_grammars::expression("id");
        let table = g.grammar.parse_table().unwrap();

        let rule = |head, body: Vec<Symbol>| only(Rule::new(head, body).unwrap());
        assert_eq!(
            table.get(NonTerminal::Start, &g.lb),
            Some(&rule(NonTerminal::Start, vec![g.t.into(), g.e_.into()]))
        );
        assert_eq!(
            table.get(g.e_, &Terminal::EndOfStream),
            Some(&rule(g.e_, vec![Terminal::Empty.into()]))
        );
        assert_eq!(table.get(g.t, &g.mul), Some(&BTreeSet::new()));
        assert_eq!(
            table.get(g.t_, &g.mul),
            Some(&rule(g.t_, vec![(&g.mul).into(), g.f.into(), g.t_.into()]))
        );
        assert_eq!(table.get(g.f, &g.id), Some(&rule(g.f, vec![(&g.id).into()])));
        let mut expected = vec![g.lb.clone(), g.id.clone()];
        expected.sort();
        assert_eq!(table.expected(g.f), expected);
    }

    #[test]
    fn construction_is_deterministic() {
        let g = test_grammars::expression("[0-9]+");
        let first = g.grammar.parse_table().unwrap();
        let reversed = Grammar::from_rules(g.grammar.rules().iter().rev().cloned());
        assert_eq!(reversed.parse_table().unwrap(), first);
        assert_eq!(g.grammar.parse_table().unwrap(), first);
    }

    #[test]
    fn conflicts_are_kept() {
        let a = Terminal::literal("a").unwrap();
        let b = Terminal::literal("b").unwrap();
        let mut g = Grammar::new();
        g.add_production(NonTerminal::Start, [&a])
            .unwrap()
            .add_production(NonTerminal::Start, [&a, &b])
            .unwrap();

        let table = g.parse_table().unwrap();
        let conflicts: Vec<_> = table.conflicts().collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].0, NonTerminal::Start);
        assert_eq!(conflicts[0].1, &a);
        assert_eq!(conflicts[0].2.len(), 2);
        assert!(!table.is_ll1());
    }

    #[test]
    fn undefined_non_terminal() {
        let missing = NonTerminal::generate();
        let mut g = Grammar::new();
        g.add_production(NonTerminal::Start, [missing]).unwrap();
        assert!(matches!(g.parse_table(), Err(GrammarError::InvalidGrammar(_))));
    }

    #[test]
    fn plaintext_rendering() {
        let g = test_grammars::expression("[0-9]+");
        let table = g.grammar.parse_table().unwrap();
        let text = g.grammar.to_ll1_parsing_table(&table).to_plaintext();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].contains("id"));
        assert!(lines[0].contains('$'));
        assert!(text.contains("E' -> ε"));
        assert!(text.contains("F -> \"(\" Start \")\""));
    }

    #[test]
    fn latex_rendering() {
        let g = test_grammars::expression("[0-9]+");
        let table = g.grammar.parse_table().unwrap();
        let latex = g.grammar.to_ll1_parsing_table(&table).to_latex();
        assert!(latex.starts_with("\\[\\begin{array}{c|l|l|l|l|l|l}"));
        assert!(latex.ends_with("\\end{array}\\]"));
        assert!(latex.contains("\\text{id}"));
        assert!(latex.contains("\\epsilon"));
        assert!(!latex.contains("\\color{red}"));
    }

    #[test]
    fn latex_marks_conflicting_cells() {
        let a = Terminal::literal("a").unwrap();
        let b = Terminal::literal("b").unwrap();
        let mut g = Grammar::new();
        g.add_production(NonTerminal::Start, [&a])
            .unwrap()
            .add_production(NonTerminal::Start, [&a, &b])
            .unwrap();

        let table = g.parse_table().unwrap();
        let latex = g.to_ll1_parsing_table(&table).to_latex();
        assert_eq!(latex.matches("\\color{red}").count(), 1);
        let row = latex.lines().find(|line| line.starts_with("Start")).unwrap();
        assert!(row.contains("{\\color{red}Start \\rightarrow "));
        assert!(row.contains("\\mid"));
    }
}
