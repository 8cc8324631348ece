use super::{
    error::{GrammarError, Result},
    symbol::{NonTerminal, Terminal, Token},
};

/// Concrete syntax tree as produced by the parser, empty productions
/// included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    Terminal { symbol: Terminal, token: Token },
    Empty,
    NonTerminal {
        symbol: NonTerminal,
        children: Vec<ParseTree>,
    },
}

/// Concrete syntax tree without empty-production nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElidedTree {
    Terminal { symbol: Terminal, token: Token },
    NonTerminal {
        symbol: NonTerminal,
        children: Vec<ElidedTree>,
    },
}

impl ParseTree {
    pub fn children(&self) -> &[ParseTree] {
        match self {
            ParseTree::NonTerminal { children, .. } => children,
            ParseTree::Terminal { .. } | ParseTree::Empty => &[],
        }
    }

    /// A non-terminal node that derived the empty sequence directly.
    pub fn is_empty_match(&self) -> bool {
        matches!(self.children().first(), Some(ParseTree::Empty))
    }

    /// Removes the nodes whose direct child is an empty node:
    ///
    /// ```text
    ///      S
    ///    /   \            S
    ///   A     C           |
    ///  / \    |    ==>    A
    /// a   B   ε           |
    ///     |               a
    ///     ε
    /// ```
    ///
    /// Only a non-terminal node with a non-empty first child can be the root.
    pub fn remove_empty(self) -> Result<ElidedTree> {
        match self {
            ParseTree::NonTerminal { symbol, children } => remove_empty(symbol, children),
            ParseTree::Terminal { .. } | ParseTree::Empty => Err(GrammarError::MalformedTree(
                "only a non-terminal node can be the root of the transform".to_string(),
            )),
        }
    }
}

fn remove_empty(symbol: NonTerminal, children: Vec<ParseTree>) -> Result<ElidedTree> {
    match children.first() {
        None => {
            return Err(GrammarError::MalformedTree(format!(
                "{} has no children",
                symbol
            )))
        }
        Some(ParseTree::Empty) => {
            return Err(GrammarError::MalformedTree(format!(
                "{} directly derives the empty sequence",
                symbol
            )))
        }
        Some(_) => {}
    }

    let children = children
        .into_iter()
        .filter_map(|child| match child {
            ParseTree::Empty => None,
            ParseTree::Terminal { symbol, token } => {
                Some(Ok(ElidedTree::Terminal { symbol, token }))
            }
            ParseTree::NonTerminal { symbol, children } => {
                if matches!(children.first(), Some(ParseTree::Empty)) {
                    None
                } else {
                    Some(remove_empty(symbol, children))
                }
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ElidedTree::NonTerminal { symbol, children })
}

impl ElidedTree {
    pub fn children(&self) -> &[ElidedTree] {
        match self {
            ElidedTree::NonTerminal { children, .. } => children,
            ElidedTree::Terminal { .. } => &[],
        }
    }

    /// Leaf tokens, left to right.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut tokens = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ElidedTree::Terminal { token, .. } => tokens.push(token),
                ElidedTree::NonTerminal { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        tokens
    }
}
