use std::collections::HashMap;

use crate::Grammar;

use super::{
    error::{GrammarError, Result},
    symbol::{NonTerminal, Symbol, Terminal},
    EPSILON,
};

enum Line<'a> {
    Skip(&'a str),
    Declaration(&'a str),
    Production(NonTerminal, Vec<&'a str>),
}

fn notation_error(line: usize, message: impl Into<String>) -> GrammarError {
    GrammarError::InvalidNotation {
        line,
        message: message.into(),
    }
}

/// `"text"` / `'text'` literals and `/regex/` patterns.
fn inline_terminal(line: usize, item: &str) -> Result<Option<Terminal>> {
    let quoted = |q: char| item.len() >= 2 && item.starts_with(q) && item.ends_with(q);
    let inner = || &item[1..item.len() - 1];
    let terminal = if quoted('"') || quoted('\'') {
        Terminal::literal(inner())
    } else if quoted('/') {
        Terminal::new(inner())
    } else {
        return Ok(None);
    };
    terminal
        .map(Some)
        .map_err(|e| notation_error(line, e.to_string()))
}

impl Grammar {
    /// Reads a grammar written one production per line:
    ///
    /// ```text
    /// # comment
    /// %skip /\s+/
    /// id = /[0-9]+/
    /// Start -> T E'
    /// E' -> "+" T E' | ε
    /// ```
    ///
    /// A line starting with `|` continues the previous production. Body items
    /// are separated by whitespace and are either `"literal"`, `/regex/`, `ε`,
    /// a declared terminal name or a rule head. The first head is `Start`.
    pub fn from_notation(text: &str) -> Result<Self> {
        let mut heads: HashMap<&str, NonTerminal> = HashMap::new();
        let mut head_order: Vec<&str> = Vec::new();
        let mut terminals: HashMap<&str, Terminal> = HashMap::new();
        let mut lines: Vec<(usize, Line)> = Vec::new();

        let mut previous_head: Option<NonTerminal> = None;
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let items: Vec<&str> = trimmed.split_whitespace().collect();

            if items[0] == "%skip" {
                if items.len() != 2 {
                    return Err(notation_error(line, "%skip takes exactly one pattern"));
                }
                lines.push((line, Line::Skip(items[1])));
                continue;
            }

            let arrows = items.iter().filter(|&&item| item == "->").count();
            if arrows > 1 {
                return Err(notation_error(line, "too many \"->\""));
            }
            if arrows == 1 {
                match items.iter().position(|&item| item == "->") {
                    Some(0) => return Err(notation_error(line, "empty left side")),
                    Some(1) => {}
                    _ => return Err(notation_error(line, "left side contains whitespace")),
                }
                let name = items[0];
                if terminals.contains_key(name) {
                    return Err(notation_error(
                        line,
                        format!("`{}` is both a terminal and a rule head", name),
                    ));
                }
                let head = match heads.get(name) {
                    Some(&head) => head,
                    None => {
                        let head = if heads.is_empty() {
                            NonTerminal::Start
                        } else {
                            NonTerminal::generate()
                        };
                        heads.insert(name, head);
                        head_order.push(name);
                        head
                    }
                };
                previous_head = Some(head);
                lines.push((line, Line::Production(head, items[2..].to_vec())));
                continue;
            }

            if items.len() == 3 && items[1] == "=" {
                let terminal = inline_terminal(line, items[2])?.ok_or_else(|| {
                    notation_error(line, "a terminal is declared as \"literal\" or /regex/")
                })?;
                if heads.contains_key(items[0]) {
                    return Err(notation_error(
                        line,
                        format!("`{}` is both a terminal and a rule head", items[0]),
                    ));
                }
                if terminals.insert(items[0], terminal).is_some() {
                    return Err(notation_error(
                        line,
                        format!("terminal `{}` declared twice", items[0]),
                    ));
                }
                lines.push((line, Line::Declaration(items[0])));
                continue;
            }

            match (items[0], previous_head) {
                ("|", Some(head)) => {
                    lines.push((line, Line::Production(head, items[1..].to_vec())))
                }
                _ => return Err(notation_error(line, "cannot find left side")),
            }
        }

        let mut g = Self::new();
        for name in &head_order {
            g.set_name(heads[name], *name);
        }

        for (line, parsed) in lines {
            match parsed {
                Line::Skip(item) => {
                    let terminal = inline_terminal(line, item)?.ok_or_else(|| {
                        notation_error(line, "%skip takes a \"literal\" or /regex/")
                    })?;
                    g.add_skip(terminal);
                }
                Line::Declaration(name) => {
                    let terminal = terminals[name].clone();
                    g.set_name(terminal.clone(), name);
                    g.declare_terminal(terminal);
                }
                Line::Production(head, items) => {
                    for alternative in items.split(|&item| item == "|") {
                        if alternative.is_empty() {
                            return Err(notation_error(
                                line,
                                format!("empty alternative, use {} for an empty body", EPSILON),
                            ));
                        }
                        let body = alternative
                            .iter()
                            .map(|&item| -> Result<Symbol> {
                                if item == EPSILON || item == "epsilon" {
                                    return Ok(Terminal::Empty.into());
                                }
                                if let Some(terminal) = inline_terminal(line, item)? {
                                    return Ok(terminal.into());
                                }
                                if let Some(terminal) = terminals.get(item) {
                                    return Ok(terminal.into());
                                }
                                if let Some(&head) = heads.get(item) {
                                    return Ok(head.into());
                                }
                                Err(notation_error(
                                    line,
                                    format!("`{}` is not a declared terminal or rule head", item),
                                ))
                            })
                            .collect::<Result<Vec<Symbol>>>()?;
                        g.add_production(head, body)?;
                    }
                }
            }
        }

        Ok(g)
    }
}
