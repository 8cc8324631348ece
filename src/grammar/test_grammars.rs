//! Grammars shared by the unit tests.

use super::{
    symbol::{NonTerminal, Symbol, Terminal},
    Grammar,
};

pub struct Expression {
    pub grammar: Grammar,
    pub e_: NonTerminal,
    pub t: NonTerminal,
    pub t_: NonTerminal,
    pub f: NonTerminal,
    pub plus: Terminal,
    pub mul: Terminal,
    pub lb: Terminal,
    pub rb: Terminal,
    pub id: Terminal,
}

/// The classic right-recursive expression grammar:
///
/// ```text
/// Start -> T E'
/// E'    -> + T E' | ε
/// T     -> F T'
/// T'    -> * F T' | ε
/// F     -> ( Start ) | id
/// ```
pub fn expression(id_pattern: &str) -> Expression {
    let e_ = NonTerminal::generate();
    let t = NonTerminal::generate();
    let t_ = NonTerminal::generate();
    let f = NonTerminal::generate();

    let plus = Terminal::literal("+").unwrap();
    let mul = Terminal::literal("*").unwrap();
    let lb = Terminal::literal("(").unwrap();
    let rb = Terminal::literal(")").unwrap();
    let id = Terminal::new(id_pattern).unwrap();

    let mut grammar = Grammar::new();
    grammar
        .add_production(NonTerminal::Start, [Symbol::from(t), Symbol::from(e_)])
        .unwrap()
        .add_production(e_, [Symbol::from(&plus), Symbol::from(t), Symbol::from(e_)])
        .unwrap()
        .add_production(e_, [Terminal::Empty])
        .unwrap()
        .add_production(t, [Symbol::from(f), Symbol::from(t_)])
        .unwrap()
        .add_production(t_, [Symbol::from(&mul), Symbol::from(f), Symbol::from(t_)])
        .unwrap()
        .add_production(t_, [Terminal::Empty])
        .unwrap()
        .add_production(
            f,
            [Symbol::from(&lb), Symbol::from(NonTerminal::Start), Symbol::from(&rb)],
        )
        .unwrap()
        .add_production(f, [&id])
        .unwrap();

    grammar.set_name(e_, "E'");
    grammar.set_name(t, "T");
    grammar.set_name(t_, "T'");
    grammar.set_name(f, "F");
    grammar.set_name(id.clone(), "id");

    Expression {
        grammar,
        e_,
        t,
        t_,
        f,
        plus,
        mul,
        lb,
        rb,
        id,
    }
}
