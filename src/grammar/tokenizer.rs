use log::trace;

use super::{
    error::{GrammarError, Result},
    symbol::{Terminal, Token},
    Grammar,
};

/// Lazy, endless token stream over `source`.
///
/// At every position each pattern is tried anchored there and the longest
/// match wins; among equally long matches the terminal listed first wins.
/// Once the source is exhausted the stream yields `EndOfStream` tokens with
/// the span `len..len` forever.
#[derive(Debug, Clone)]
pub struct Tokenizer<'s> {
    source: &'s str,
    terminals: Vec<Terminal>,
    skip: Vec<Terminal>,
    position: usize,
    peeked: Option<Token>,
}

impl<'s> Tokenizer<'s> {
    /// `Empty` and `EndOfStream` in `terminals` are ignored.
    pub fn new(source: &'s str, terminals: &[Terminal]) -> Self {
        Self {
            source,
            terminals: only_patterns(terminals),
            skip: Vec::new(),
            position: 0,
            peeked: None,
        }
    }

    /// Patterns whose matches are consumed without producing tokens. They
    /// compete with the terminals for the longest match and lose ties.
    pub fn skipping(mut self, skip: &[Terminal]) -> Self {
        self.skip = only_patterns(skip);
        self
    }

    /// Byte offset of the next unscanned character.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn peek(&mut self) -> Result<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan()?,
        };
        Ok(self.peeked.insert(token))
    }

    pub fn advance(&mut self) -> Result<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan(),
        }
    }

    fn scan(&mut self) -> Result<Token> {
        loop {
            if self.position >= self.source.len() {
                return Ok(Token::end_of_stream(self.source.len()));
            }

            let rest = &self.source[self.position..];
            let mut best: Option<(usize, &Terminal, bool)> = None;
            let candidates = self
                .terminals
                .iter()
                .map(|t| (t, false))
                .chain(self.skip.iter().map(|t| (t, true)));
            for (terminal, skipped) in candidates {
                let Some(len) = terminal.pattern().and_then(|p| p.match_len(rest)) else {
                    continue;
                };
                if best.map_or(true, |(best_len, _, _)| len > best_len) {
                    best = Some((len, terminal, skipped));
                }
            }

            let Some((len, terminal, skipped)) = best else {
                return Err(GrammarError::TokenizeFailure {
                    offset: self.position,
                });
            };
            let span = self.position..self.position + len;
            let token = Token::new(terminal.clone(), &self.source[span.clone()], span.clone());
            self.position = span.end;
            if skipped {
                trace!("skipped {:?} at {:?}", token.text, token.span);
                continue;
            }
            trace!("token {} {:?} at {:?}", token.symbol, token.text, token.span);
            return Ok(token);
        }
    }
}

fn only_patterns(terminals: &[Terminal]) -> Vec<Terminal> {
    let mut patterns: Vec<Terminal> = Vec::new();
    for terminal in terminals {
        if terminal.pattern().is_some() && !patterns.contains(terminal) {
            patterns.push(terminal.clone());
        }
    }
    patterns
}

/// Never returns `None`; errors repeat because the position does not move.
impl Iterator for Tokenizer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.advance())
    }
}

impl Grammar {
    /// Token stream over `source` using every terminal of the grammar, in
    /// declaration order, plus its skip patterns.
    pub fn tokenize<'s>(&self, source: &'s str) -> Tokenizer<'s> {
        Tokenizer::new(source, self.terminals()).skipping(self.skip_terminals())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn lit(text: &str) -> Terminal {
        Terminal::literal(text).unwrap()
    }

    #[test]
    fn maximal_munch() {
        let a = lit("a");
        let aa = lit("aa");
        let mut tokens = Tokenizer::new("aa", &[a, aa.clone()]);
        assert_eq!(tokens.advance().unwrap(), Token::new(aa, "aa", 0..2));
        assert_eq!(tokens.advance().unwrap(), Token::end_of_stream(2));
    }

    #[test]
    fn end_of_stream_forever() {
        let mut tokens = Tokenizer::new("ab", &[lit("a"), lit("b")]);
        let texts: Vec<String> = tokens.by_ref().take(2).map(|t| t.unwrap().text).collect();
        assert_eq!(texts, vec!["a", "b"]);
        for _ in 0..10 {
            assert_eq!(tokens.next(), Some(Ok(Token::end_of_stream(2))));
        }
    }

    #[test]
    fn empty_source() {
        let mut tokens = Tokenizer::new("", &[lit("a")]);
        assert_eq!(tokens.advance().unwrap(), Token::end_of_stream(0));
        assert_eq!(tokens.advance().unwrap(), Token::end_of_stream(0));
    }

    #[test]
    fn ties_go_to_the_first_terminal() {
        let keyword = lit("if");
        let ident = Terminal::new("[a-z]+").unwrap();

        let mut tokens = Tokenizer::new("if", &[keyword.clone(), ident.clone()]);
        assert_eq!(tokens.advance().unwrap().symbol, keyword);

        let mut tokens = Tokenizer::new("if", &[ident.clone(), keyword.clone()]);
        assert_eq!(tokens.advance().unwrap().symbol, ident);

        let mut tokens = Tokenizer::new("iffy", &[keyword, ident.clone()]);
        assert_eq!(tokens.advance().unwrap(), Token::new(ident, "iffy", 0..4));
    }

    #[test]
    fn failure_reports_offset() {
        let mut tokens = Tokenizer::new("aab", &[lit("a")]);
        assert!(tokens.advance().is_ok());
        assert!(tokens.advance().is_ok());
        assert_eq!(
            tokens.advance(),
            Err(GrammarError::TokenizeFailure { offset: 2 })
        );
        assert_eq!(
            tokens.next(),
            Some(Err(GrammarError::TokenizeFailure { offset: 2 }))
        );
    }

    #[test]
    fn matches_must_start_at_the_position() {
        let b = lit("b");
        let mut tokens = Tokenizer::new("ab", &[b]);
        assert_eq!(
            tokens.advance(),
            Err(GrammarError::TokenizeFailure { offset: 0 })
        );
    }

    #[test]
    fn zero_length_matches_do_not_count() {
        let mut tokens = Tokenizer::new("b", &[Terminal::new("a*").unwrap()]);
        assert_eq!(
            tokens.advance(),
            Err(GrammarError::TokenizeFailure { offset: 0 })
        );
    }

    #[test]
    fn markers_are_not_patterns() {
        let mut tokens = Tokenizer::new("x", &[Terminal::Empty, Terminal::EndOfStream]);
        assert_eq!(
            tokens.advance(),
            Err(GrammarError::TokenizeFailure { offset: 0 })
        );
    }

    #[test]
    fn skip_patterns() {
        let num = Terminal::new("[0-9]+").unwrap();
        let plus = lit("+");
        let ws = Terminal::new(r"\s+").unwrap();
        let mut tokens = Tokenizer::new(" 1 +  22 ", &[num.clone(), plus.clone()]).skipping(&[ws]);
        assert_eq!(tokens.advance().unwrap(), Token::new(num.clone(), "1", 1..2));
        assert_eq!(tokens.advance().unwrap(), Token::new(plus, "+", 3..4));
        assert_eq!(tokens.advance().unwrap(), Token::new(num, "22", 6..8));
        assert_eq!(tokens.advance().unwrap(), Token::end_of_stream(9));
    }

    #[test]
    fn peek_does_not_consume() {
        let a = lit("a");
        let mut tokens = Tokenizer::new("a", &[a.clone()]);
        assert_eq!(tokens.peek().unwrap().symbol, a);
        assert_eq!(tokens.peek().unwrap().symbol, a);
        assert_eq!(tokens.advance().unwrap().symbol, a);
        assert_eq!(tokens.peek().unwrap(), &Token::end_of_stream(1));
    }

    proptest! {
        #[test]
        fn tokens_cover_the_source(source in "[ab]{0,24}") {
            let mut tokens = Tokenizer::new(&source, &[lit("a"), lit("b"), lit("ab")]);
            let mut rebuilt = String::new();
            let mut offset = 0;
            loop {
                let token = tokens.advance().unwrap();
                prop_assert_eq!(token.span.start, offset);
                if token.symbol == Terminal::EndOfStream {
                    prop_assert_eq!(token.span.clone(), source.len()..source.len());
                    break;
                }
                offset = token.span.end;
                rebuilt.push_str(&token.text);
            }
            prop_assert_eq!(rebuilt, source.clone());
            prop_assert_eq!(tokens.advance().unwrap(), Token::end_of_stream(source.len()));
        }
    }
}
