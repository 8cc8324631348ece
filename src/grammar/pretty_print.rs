use std::collections::HashSet;

use crowbook_text_processing::escape;
use serde::Serialize;

use super::{
    first_follow::FirstFollowTable,
    symbol::{Symbol, Terminal, Token},
    tree::{ElidedTree, ParseTree},
    Grammar, EPSILON,
};

#[derive(Debug, Clone, Serialize)]
pub struct ProductionOutput {
    pub left: String,
    pub rights: Vec<Vec<String>>,
}

impl ProductionOutput {
    pub fn to_plaintext(&self, left_width: usize, multiline: bool) -> String {
        self.rights
            .iter()
            .map(|right| right.join(" "))
            .enumerate()
            .map(|(i, right)| {
                if i == 0 {
                    format!("{:>width$} -> {}", self.left, right, width = left_width)
                } else if multiline {
                    format!("{:>width$}  | {}", "", right, width = left_width)
                } else {
                    format!(" | {}", right)
                }
            })
            .collect::<Vec<_>>()
            .join(if multiline { "\n" } else { "" })
    }

    pub fn to_latex(&self, and_sign: bool, terminal_set: &HashSet<&str>) -> String {
        if self.rights.is_empty() {
            return String::new();
        }

        let left = if and_sign {
            format!("{} & \\rightarrow &", escape::tex(self.left.as_str()))
        } else {
            format!("{} \\rightarrow ", escape::tex(self.left.as_str()))
        };
        let right = self
            .rights
            .iter()
            .map(|right| {
                right
                    .iter()
                    .map(|s| {
                        if terminal_set.contains(s.as_str()) {
                            format!("\\text{{{}}}", escape::tex(s.as_str()))
                        } else {
                            escape::tex(s.as_str()).to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" \\ ")
            })
            .collect::<Vec<_>>()
            .join(" \\mid ");

        let output = left + &right;
        output.replace(EPSILON, "\\epsilon")
    }
}

pub struct ProductionOutputVec {
    productions: Vec<ProductionOutput>,
    terminals: Vec<String>,
}

impl ProductionOutputVec {
    pub fn to_plaintext(&self) -> String {
        let left_max_len = self
            .productions
            .iter()
            .map(|p| p.left.len())
            .max()
            .unwrap_or(0);
        self.productions
            .iter()
            .map(|s| s.to_plaintext(left_max_len, true))
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let terminal_set: HashSet<&str> = self.terminals.iter().map(|t| t.as_str()).collect();
        std::iter::once("\\[\\begin{array}{cll}".to_string())
            .chain(
                self.productions
                    .iter()
                    .map(|s| s.to_latex(true, &terminal_set)),
            )
            .chain(std::iter::once("\\end{array}\\]".to_string()))
            .collect::<Vec<String>>()
            .join("\\\\\n")
    }
}

impl Grammar {
    pub fn production_to_vec_string(&self, body: &[Symbol]) -> Vec<String> {
        body.iter().map(|s| self.get_symbol_name(s)).collect()
    }

    pub fn to_production_output_vec(&self) -> ProductionOutputVec {
        let productions = self
            .heads()
            .into_iter()
            .map(|head| ProductionOutput {
                left: self.get_non_terminal_name(head),
                rights: self
                    .rules_of(head)
                    .map(|rule| self.production_to_vec_string(rule.body()))
                    .collect(),
            })
            .collect();
        let terminals = self
            .terminals()
            .iter()
            .map(|t| self.get_terminal_name(t))
            .collect();
        ProductionOutputVec {
            productions,
            terminals,
        }
    }
}

#[derive(Serialize)]
struct NonTerminalOutput {
    name: String,
    nullable: bool,
    first: Vec<String>,
    follow: Vec<String>,
}

impl NonTerminalOutput {
    fn to_plaintext(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            self.name,
            self.nullable,
            self.first.join(", "),
            self.follow.join(", ")
        )
    }

    fn to_latex(&self) -> String {
        fn f(a: &[String]) -> String {
            a.iter()
                .map(|s| escape::tex(s.as_str()).to_string())
                .collect::<Vec<_>>()
                .join(r"\ ")
                .replace(EPSILON, r"$\epsilon$")
        }

        format!(
            "{} & {} & {} & {}",
            escape::tex(self.name.as_str()),
            self.nullable,
            f(&self.first),
            f(&self.follow)
        )
    }
}

#[derive(Serialize)]
pub struct NonTerminalOutputVec {
    data: Vec<NonTerminalOutput>,
}

impl NonTerminalOutputVec {
    pub fn to_plaintext(&self) -> String {
        self.data
            .iter()
            .map(|s| s.to_plaintext())
            .collect::<Vec<String>>()
            .join("\n")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .data
            .iter()
            .map(|e| e.to_latex())
            .collect::<Vec<_>>()
            .join("\\\\\n ");

        "\\begin{tabular}{c|c|c|c}\n".to_string()
            + "Symbol & Nullable & First & Follow\\\\\\hline\n"
            + &content
            + "\\\\\n\\end{tabular}"
    }
}

impl Grammar {
    pub fn to_non_terminal_output_vec(&self, ff: &FirstFollowTable) -> NonTerminalOutputVec {
        let names = |set: Option<&std::collections::BTreeSet<Terminal>>| -> Vec<String> {
            let mut names: Vec<String> = set
                .into_iter()
                .flatten()
                .filter(|t| **t != Terminal::Empty)
                .map(|t| self.get_terminal_name(t))
                .collect();
            names.sort();
            names
        };

        let data = self
            .heads()
            .into_iter()
            .map(|nt| {
                let nullable = ff.first.is_nullable(nt);
                let mut first = names(ff.first.get(nt));
                if nullable {
                    first.push(EPSILON.to_string());
                }
                NonTerminalOutput {
                    name: self.get_non_terminal_name(nt),
                    nullable,
                    first,
                    follow: names(ff.follow.get(nt)),
                }
            })
            .collect();
        NonTerminalOutputVec { data }
    }
}

/// A tree with symbols replaced by their display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum TreeOutput {
    Terminal {
        name: Option<String>,
        text: String,
        start: usize,
        end: usize,
    },
    Empty,
    NonTerminal {
        name: String,
        children: Vec<TreeOutput>,
    },
}

impl TreeOutput {
    /// Compact rendering, e.g. `Start(T(F(id"1")), E'("+", T(F(id"1"))))`.
    /// Named terminals prefix their text with the name.
    pub fn to_plaintext(&self) -> String {
        match self {
            TreeOutput::Terminal {
                name: Some(name),
                text,
                ..
            } => format!("{}{:?}", name, text),
            TreeOutput::Terminal { name: None, text, .. } => format!("{:?}", text),
            TreeOutput::Empty => EPSILON.to_string(),
            TreeOutput::NonTerminal { name, children } => format!(
                "{}({})",
                name,
                children
                    .iter()
                    .map(|c| c.to_plaintext())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl Grammar {
    fn terminal_output(&self, symbol: &Terminal, token: &Token) -> TreeOutput {
        let symbol = Symbol::Terminal(symbol.clone());
        TreeOutput::Terminal {
            name: self
                .has_name(&symbol)
                .then(|| self.get_symbol_name(&symbol)),
            text: token.text.clone(),
            start: token.span.start,
            end: token.span.end,
        }
    }

    pub fn to_tree_output(&self, tree: &ParseTree) -> TreeOutput {
        match tree {
            ParseTree::Terminal { symbol, token } => self.terminal_output(symbol, token),
            ParseTree::Empty => TreeOutput::Empty,
            ParseTree::NonTerminal { symbol, children } => TreeOutput::NonTerminal {
                name: self.get_non_terminal_name(*symbol),
                children: children.iter().map(|c| self.to_tree_output(c)).collect(),
            },
        }
    }

    pub fn to_elided_tree_output(&self, tree: &ElidedTree) -> TreeOutput {
        match tree {
            ElidedTree::Terminal { symbol, token } => self.terminal_output(symbol, token),
            ElidedTree::NonTerminal { symbol, children } => TreeOutput::NonTerminal {
                name: self.get_non_terminal_name(*symbol),
                children: children
                    .iter()
                    .map(|c| self.to_elided_tree_output(c))
                    .collect(),
            },
        }
    }
}
