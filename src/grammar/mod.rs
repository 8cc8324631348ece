pub mod error;
pub mod first_follow;
pub mod grammar;
pub mod ll1_parser;
pub mod ll1_parsing_table;
pub mod notation;
pub mod pretty_print;
pub mod symbol;
pub mod tokenizer;
pub mod tree;

#[cfg(test)]
mod test_grammars;

pub use error::{GrammarError, Result};
pub use first_follow::{FirstFollowTable, FirstSets, FollowSets};
pub use grammar::Grammar;
pub use ll1_parser::Ll1Parser;
pub use ll1_parsing_table::{LL1ParsingTable, ParseTable};
pub use symbol::{NonTerminal, Pattern, Rule, Symbol, SymbolId, Terminal, Token};
pub use tokenizer::Tokenizer;
pub use tree::{ElidedTree, ParseTree};

pub const EPSILON: &str = "ε";
pub const END_MARK: &str = "$";
