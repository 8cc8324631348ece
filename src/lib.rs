extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod fixed_point;
pub mod grammar;

pub use fixed_point::fixed_point;
pub use grammar::{
    ElidedTree, FirstFollowTable, Grammar, GrammarError, Ll1Parser, NonTerminal, ParseTable,
    ParseTree, Result, Rule, Symbol, Terminal, Token, Tokenizer,
};

fn error_json(e: GrammarError) -> String {
    serde_json::json!({ "error": e.to_string() }).to_string()
}

#[wasm_bindgen]
pub fn first_follow_to_json(grammar: &str) -> String {
    let output = Grammar::from_notation(grammar).and_then(|g| {
        let ff = g.first_follow()?;
        Ok(g.to_non_terminal_output_vec(&ff).to_json())
    });
    output.unwrap_or_else(error_json)
}

#[wasm_bindgen]
pub fn ll1_table_to_json(grammar: &str) -> String {
    let output = Grammar::from_notation(grammar).and_then(|g| {
        let table = g.parse_table()?;
        Ok(g.to_ll1_parsing_table(&table).to_json())
    });
    output.unwrap_or_else(error_json)
}

/// Parses `input` and returns the tree without empty productions.
#[wasm_bindgen]
pub fn parse_to_json(grammar: &str, input: &str) -> String {
    let output = Grammar::from_notation(grammar).and_then(|g| {
        let tree = g.parse(input)?.remove_empty()?;
        Ok(g.to_elided_tree_output(&tree).to_json())
    });
    output.unwrap_or_else(error_json)
}
