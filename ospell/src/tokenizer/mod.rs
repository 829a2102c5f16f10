//! Longest-match tokenization of words into transducer symbols.
//!
//! Multi-character symbols such as `ch` or `<VB>` win over their single
//! character prefixes. Text no symbol covers is split per character and handed
//! out as an unknown token, which the search engines number past the end of
//! the alphabet for the duration of one query.
use std::ops::Range;

use smol_str::SmolStr;

use crate::transducer::TransducerAlphabet;
use crate::types::SymbolNumber;

/// One tokenized span of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// byte range within the input
    pub span: Range<usize>,
    /// the covered text
    pub text: &'a str,
    /// the matched input symbol, `None` when no symbol covers `text`
    pub symbol: Option<SymbolNumber>,
}

/// Lazy iterator of [`Token`]s over a word.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    alphabet: &'a TransducerAlphabet,
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(alphabet: &'a TransducerAlphabet, input: &'a str) -> Tokenizer<'a> {
        Tokenizer {
            alphabet,
            input,
            pos: 0,
        }
    }

    fn longest_match(&self, rest: &'a str) -> Option<(usize, SymbolNumber)> {
        let limit = std::cmp::min(rest.len(), self.alphabet.longest_input_symbol());

        (1..=limit)
            .rev()
            .filter(|end| rest.is_char_boundary(*end))
            .find_map(|end| self.alphabet.input_symbol(&rest[..end]).map(|sym| (end, sym)))
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        let first = rest.chars().next()?;

        let (len, symbol) = match self.longest_match(rest) {
            Some((len, sym)) => (len, Some(sym)),
            None => (first.len_utf8(), None),
        };

        let start = self.pos;
        self.pos += len;

        Some(Token {
            span: start..self.pos,
            text: &self.input[start..self.pos],
            symbol,
        })
    }
}

/// A word encoded for one query.
///
/// `extra` holds the spellings of unknown tokens; the first one is numbered
/// `base`, the alphabet's current symbol count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedInput {
    pub symbols: Vec<SymbolNumber>,
    pub extra: Vec<SmolStr>,
    pub base: usize,
}

impl EncodedInput {
    /// Encode `word`, or `None` when the unknown tokens would overflow the
    /// symbol space.
    pub fn new(alphabet: &TransducerAlphabet, word: &str) -> Option<EncodedInput> {
        let base = alphabet.key_table().len();
        let mut symbols = Vec::with_capacity(word.len());
        let mut extra: Vec<SmolStr> = Vec::new();

        for token in alphabet.tokenize(word) {
            let sym = match token.symbol {
                Some(sym) => sym,
                None => {
                    let offset = match extra.iter().position(|x| x == token.text) {
                        Some(i) => i,
                        None => {
                            extra.push(token.text.into());
                            extra.len() - 1
                        }
                    };

                    let n = base + offset;
                    if n >= u16::MAX as usize {
                        return None;
                    }
                    SymbolNumber(n as u16)
                }
            };

            symbols.push(sym);
        }

        Some(EncodedInput {
            symbols,
            extra,
            base,
        })
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The spelling of an unknown symbol of this query.
    #[inline(always)]
    pub fn extra_symbol(&self, sym: SymbolNumber) -> Option<&SmolStr> {
        (sym.0 as usize)
            .checked_sub(self.base)
            .and_then(|i| self.extra.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::hfst::builder::TransducerBuilder;
    use crate::transducer::Transducer;

    fn alphabet() -> TransducerAlphabet {
        let mut b = TransducerBuilder::new();
        let s = b.add_state();
        b.add_arc(0, s, "ch", "ch", 0.0);
        b.add_arc(0, s, "c", "c", 0.0);
        b.add_arc(0, s, "h", "h", 0.0);
        b.add_arc(0, s, "o", "<N>", 0.0);
        b.add_arc(0, s, "ö", "ö", 0.0);
        b.set_final(s, 0.0);
        b.build().unwrap().alphabet().clone()
    }

    #[test]
    fn prefers_longest_symbol() {
        let alphabet = alphabet();
        let tokens: Vec<&str> = alphabet.tokenize("chcho").map(|t| t.text).collect();
        assert_eq!(tokens, vec!["ch", "ch", "o"]);
    }

    #[test]
    fn output_only_symbols_are_not_input() {
        let alphabet = alphabet();
        let tokens: Vec<Token> = alphabet.tokenize("<N>").collect();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.symbol.is_none()));
    }

    #[test]
    fn unknown_characters_fall_back_per_char() {
        let alphabet = alphabet();
        let tokens: Vec<Token> = alphabet.tokenize("xöy").collect();

        assert_eq!(tokens[0].span, 0..1);
        assert_eq!(tokens[0].symbol, None);
        assert_eq!(tokens[1].span, 1..3);
        assert!(tokens[1].symbol.is_some());
        assert_eq!(tokens[2].text, "y");
    }

    #[test]
    fn encodes_unknowns_past_the_alphabet() {
        let alphabet = alphabet();
        let encoded = EncodedInput::new(&alphabet, "xchx").unwrap();
        let base = alphabet.key_table().len() as u16;

        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded.symbols[0], SymbolNumber(base));
        assert_eq!(encoded.symbols[2], SymbolNumber(base));
        assert_eq!(encoded.extra, vec![SmolStr::from("x")]);
        assert_eq!(encoded.extra_symbol(SymbolNumber(base)).map(|s| s.as_str()), Some("x"));
    }

    #[test]
    fn empty_input_has_no_tokens() {
        let alphabet = alphabet();
        assert_eq!(alphabet.tokenize("").count(), 0);
        assert!(EncodedInput::new(&alphabet, "").unwrap().is_empty());
    }
}
