use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::fixed_point::fixed_point_counted;

use super::{
    error::{GrammarError, Result},
    symbol::{NonTerminal, Rule, Symbol, Terminal},
    Grammar,
};

/// FIRST set of every rule head. `Terminal::Empty` in a set marks the
/// non-terminal as nullable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FirstSets(BTreeMap<NonTerminal, BTreeSet<Terminal>>);

impl FirstSets {
    pub fn compute(rules: &[Rule]) -> Self {
        let initial = rules
            .iter()
            .map(|rule| (rule.head(), BTreeSet::new()))
            .collect();
        let (sets, steps) = fixed_point_counted(FirstSets(initial), |state| state.step(rules));
        debug!("FIRST sets of {} rules stable after {} steps", rules.len(), steps);
        sets
    }

    pub(crate) fn step(&self, rules: &[Rule]) -> Self {
        let mut next = self.0.clone();
        for rule in rules {
            let contribution = self.of_body(rule.body());
            next.entry(rule.head()).or_default().extend(contribution);
        }
        FirstSets(next)
    }

    /// FIRST set of a symbol sequence. The empty sequence yields `{Empty}`.
    pub fn of_body(&self, body: &[Symbol]) -> BTreeSet<Terminal> {
        let mut first = BTreeSet::new();
        for symbol in body {
            match symbol {
                Symbol::Terminal(t) => {
                    first.insert(t.clone());
                    return first;
                }
                Symbol::NonTerminal(nt) => {
                    let Some(set) = self.0.get(nt) else {
                        return first;
                    };
                    first.extend(set.iter().filter(|t| **t != Terminal::Empty).cloned());
                    if !set.contains(&Terminal::Empty) {
                        return first;
                    }
                }
            }
        }
        first.insert(Terminal::Empty);
        first
    }

    pub fn get(&self, non_terminal: NonTerminal) -> Option<&BTreeSet<Terminal>> {
        self.0.get(&non_terminal)
    }

    pub fn is_nullable(&self, non_terminal: NonTerminal) -> bool {
        self.get(non_terminal)
            .map_or(false, |set| set.contains(&Terminal::Empty))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NonTerminal, &BTreeSet<Terminal>)> {
        self.0.iter().map(|(nt, set)| (*nt, set))
    }
}

/// FOLLOW set of every non-terminal. `Terminal::EndOfStream` only ever
/// enters through `Start`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FollowSets(BTreeMap<NonTerminal, BTreeSet<Terminal>>);

impl FollowSets {
    pub fn compute(rules: &[Rule], first: &FirstSets) -> Self {
        let mut initial: BTreeMap<NonTerminal, BTreeSet<Terminal>> = rules
            .iter()
            .map(|rule| (rule.head(), BTreeSet::new()))
            .collect();
        initial.insert(NonTerminal::Start, BTreeSet::from([Terminal::EndOfStream]));

        let (sets, steps) =
            fixed_point_counted(FollowSets(initial), |state| state.step(rules, first));
        debug!("FOLLOW sets of {} rules stable after {} steps", rules.len(), steps);
        sets
    }

    pub(crate) fn step(&self, rules: &[Rule], first: &FirstSets) -> Self {
        let mut next = self.0.clone();
        for rule in rules {
            let body = rule.body();
            for (i, symbol) in body.iter().enumerate() {
                let Symbol::NonTerminal(nt) = symbol else {
                    continue;
                };
                let rest = first.of_body(&body[i + 1..]);
                let follow = next.entry(*nt).or_default();
                follow.extend(rest.iter().filter(|t| **t != Terminal::Empty).cloned());
                if rest.contains(&Terminal::Empty) {
                    if let Some(head_follow) = self.0.get(&rule.head()) {
                        follow.extend(head_follow.iter().cloned());
                    }
                }
            }
        }
        FollowSets(next)
    }

    pub fn get(&self, non_terminal: NonTerminal) -> Option<&BTreeSet<Terminal>> {
        self.0.get(&non_terminal)
    }

    pub fn contains(&self, non_terminal: NonTerminal, terminal: &Terminal) -> bool {
        self.get(non_terminal)
            .map_or(false, |set| set.contains(terminal))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NonTerminal, &BTreeSet<Terminal>)> {
        self.0.iter().map(|(nt, set)| (*nt, set))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstFollowTable {
    pub first: FirstSets,
    pub follow: FollowSets,
}

impl FirstFollowTable {
    pub fn compute(rules: &[Rule]) -> Self {
        let first = FirstSets::compute(rules);
        let follow = FollowSets::compute(rules, &first);
        Self { first, follow }
    }
}

impl Grammar {
    pub fn first_follow(&self) -> Result<FirstFollowTable> {
        if self.rules_of(NonTerminal::Start).next().is_none() {
            return Err(GrammarError::InvalidGrammar(
                "the grammar needs at least one rule headed by Start".to_string(),
            ));
        }
        Ok(FirstFollowTable::compute(self.rules()))
    }
}
