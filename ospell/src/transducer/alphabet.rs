use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::tokenizer::Tokenizer;
use crate::transducer::Transducer;
use crate::types::{OperationsMap, SymbolNumber};

pub const IDENTITY_SYMBOL: &str = "@_IDENTITY_SYMBOL_@";
pub const UNKNOWN_SYMBOL: &str = "@_UNKNOWN_SYMBOL_@";
pub const EPSILON_SYMBOL: &str = "@_EPSILON_SYMBOL_@";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransducerAlphabet {
    pub(crate) key_table: Vec<SmolStr>,
    pub(crate) initial_symbol_count: SymbolNumber,
    pub(crate) input_symbol_count: SymbolNumber,
    pub(crate) flag_state_size: SymbolNumber,
    pub(crate) length: usize,
    pub(crate) longest_input_symbol: usize,
    pub(crate) string_to_symbol: HashMap<SmolStr, SymbolNumber>,
    pub(crate) operations: OperationsMap,
    pub(crate) identity_symbol: Option<SymbolNumber>,
    pub(crate) unknown_symbol: Option<SymbolNumber>,
}

impl TransducerAlphabet {
    /// Render symbols, resolving numbers past the key table through `extra`.
    ///
    /// Identity and unknown symbols render as nothing; the search engines
    /// replace them with the matched input symbol before rendering.
    pub fn string_from_symbols(&self, syms: &[SymbolNumber], extra: &[SmolStr]) -> SmolStr {
        let len = self.key_table.len();

        syms.iter()
            .map(|s| {
                let i = s.0 as usize;
                if Some(*s) == self.identity_symbol || Some(*s) == self.unknown_symbol {
                    ""
                } else if i < len {
                    &*self.key_table[i]
                } else {
                    extra.get(i - len).map(|x| &**x).unwrap_or("")
                }
            })
            .collect()
    }

    #[inline(always)]
    pub fn key_table(&self) -> &Vec<SmolStr> {
        &self.key_table
    }

    #[inline(always)]
    pub fn state_size(&self) -> SymbolNumber {
        self.flag_state_size
    }

    #[inline(always)]
    pub fn operations(&self) -> &OperationsMap {
        &self.operations
    }

    #[inline(always)]
    pub fn string_to_symbol(&self) -> &HashMap<SmolStr, SymbolNumber> {
        &self.string_to_symbol
    }

    #[inline(always)]
    pub fn is_flag(&self, symbol: SymbolNumber) -> bool {
        self.operations.contains_key(&symbol)
    }

    #[inline(always)]
    pub fn add_symbol(&mut self, string: &str) -> SymbolNumber {
        let sym = SymbolNumber(self.key_table.len() as u16);
        self.string_to_symbol.insert(string.into(), sym);
        self.key_table.push(string.into());
        sym
    }

    #[inline(always)]
    pub fn identity(&self) -> Option<SymbolNumber> {
        self.identity_symbol
    }

    #[inline(always)]
    pub fn unknown(&self) -> Option<SymbolNumber> {
        self.unknown_symbol
    }

    /// Symbol count as read from the file, before any translator additions.
    #[inline(always)]
    pub fn initial_symbol_count(&self) -> SymbolNumber {
        self.initial_symbol_count
    }

    /// Symbols numbered below this appear on the input side of some arc.
    #[inline(always)]
    pub fn input_symbol_count(&self) -> SymbolNumber {
        self.input_symbol_count
    }

    /// Byte length of the alphabet section in the file.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The input-side symbol spelled exactly `s`, if any.
    #[inline(always)]
    pub fn input_symbol(&self, s: &str) -> Option<SymbolNumber> {
        match self.string_to_symbol.get(s) {
            Some(&sym) if sym < self.input_symbol_count => Some(sym),
            _ => None,
        }
    }

    /// Byte length of the longest input-side symbol.
    #[inline(always)]
    pub fn longest_input_symbol(&self) -> usize {
        self.longest_input_symbol
    }

    /// Longest-match tokenizer over this alphabet's input symbols.
    #[inline(always)]
    pub fn tokenize<'a>(&'a self, input: &'a str) -> Tokenizer<'a> {
        Tokenizer::new(self, input)
    }

    /// Spellings of `mutator` output symbols this alphabet cannot match on its
    /// input side.
    pub fn missing_symbols_from<T: Transducer>(&self, mutator: &T) -> Vec<SmolStr> {
        let from = mutator.alphabet();
        let mut missing: Vec<SmolStr> = mutator
            .output_symbols()
            .into_iter()
            .filter(|sym| {
                *sym != SymbolNumber::ZERO
                    && !from.is_flag(*sym)
                    && Some(*sym) != from.identity_symbol
                    && Some(*sym) != from.unknown_symbol
            })
            .filter_map(|sym| from.key_table.get(sym.0 as usize))
            .filter(|key| !key.is_empty() && self.input_symbol(key).is_none())
            .cloned()
            .collect();

        missing.sort();
        missing
    }

    /// Map every symbol of `mutator` onto this alphabet, appending symbols this
    /// alphabet lacks so they can still reach identity and unknown arcs.
    pub fn create_translator_from<T: Transducer>(&mut self, mutator: &T) -> Vec<SymbolNumber> {
        let from = mutator.alphabet();
        let from_keys = from.key_table();

        let mut translator = Vec::with_capacity(from_keys.len());
        translator.push(SymbolNumber::ZERO);

        for (i, from_sym) in from_keys.iter().enumerate().skip(1) {
            let i = SymbolNumber(i as u16);

            let special = if Some(i) == from.identity_symbol {
                self.identity_symbol
            } else if Some(i) == from.unknown_symbol {
                self.unknown_symbol
            } else {
                None
            };

            let sym = match special {
                Some(sym) => sym,
                None if from_sym.is_empty() => {
                    // Flags and suppressed specials of the mutator get a slot of
                    // their own so they never alias a real lexicon symbol.
                    self.key_table.push(SmolStr::default());
                    SymbolNumber((self.key_table.len() - 1) as u16)
                }
                None => match self.string_to_symbol.get(from_sym) {
                    Some(&sym) => sym,
                    None => self.add_symbol(from_sym),
                },
            };

            translator.push(sym);
        }

        translator
    }
}
