use hashbrown::HashMap;
use log::warn;
use smol_str::SmolStr;

use crate::transducer::alphabet::{
    TransducerAlphabet, EPSILON_SYMBOL, IDENTITY_SYMBOL, UNKNOWN_SYMBOL,
};
use crate::transducer::TransducerError;
use crate::types::{
    FlagDiacriticOperation, FlagDiacriticOperator, OperationsMap, SymbolNumber, ValueNumber,
};

pub struct TransducerAlphabetParser {
    key_table: Vec<SmolStr>,
    flag_state_size: SymbolNumber,
    length: usize,
    longest_input_symbol: usize,
    string_to_symbol: HashMap<SmolStr, SymbolNumber>,
    operations: OperationsMap,
    feature_bucket: HashMap<SmolStr, SymbolNumber>,
    value_bucket: HashMap<SmolStr, ValueNumber>,
    val_n: ValueNumber,
    feat_n: SymbolNumber,
    identity_symbol: Option<SymbolNumber>,
    unknown_symbol: Option<SymbolNumber>,
}

impl std::default::Default for TransducerAlphabetParser {
    fn default() -> Self {
        let mut value_bucket = HashMap::new();
        // The empty value is neutral
        value_bucket.insert(SmolStr::default(), ValueNumber::ZERO);

        TransducerAlphabetParser {
            key_table: Vec::with_capacity(64),
            flag_state_size: SymbolNumber::ZERO,
            length: 0,
            longest_input_symbol: 0,
            string_to_symbol: HashMap::new(),
            operations: HashMap::new(),
            feature_bucket: HashMap::new(),
            value_bucket,
            val_n: ValueNumber(1),
            feat_n: SymbolNumber::ZERO,
            identity_symbol: None,
            unknown_symbol: None,
        }
    }
}

/// Split `@P.FEATURE.VALUE@` into its parts.
fn parse_flag(key: &str) -> Option<(FlagDiacriticOperator, &str, &str)> {
    use std::str::FromStr;

    let inner = key.strip_prefix('@')?.strip_suffix('@')?;
    let mut chunks = inner.splitn(3, '.');

    let operator = FlagDiacriticOperator::from_str(chunks.next()?).ok()?;
    let feature = chunks.next()?;
    let value = chunks.next().unwrap_or("");

    Some((operator, feature, value))
}

impl TransducerAlphabetParser {
    pub fn new() -> TransducerAlphabetParser {
        Self::default()
    }

    fn handle_flag(
        &mut self,
        i: SymbolNumber,
        operation: FlagDiacriticOperator,
        feature: &str,
        value: &str,
    ) {
        let feature = match self.feature_bucket.get(feature) {
            Some(&f) => f,
            None => {
                let f = self.feat_n;
                self.feature_bucket.insert(feature.into(), f);
                self.feat_n = self.feat_n.incr();
                f
            }
        };

        let value = match self.value_bucket.get(value) {
            Some(&v) => v,
            None => {
                let v = self.val_n;
                self.value_bucket.insert(value.into(), v);
                self.val_n = self.val_n.incr();
                v
            }
        };

        self.operations.insert(
            i,
            FlagDiacriticOperation {
                operation,
                feature,
                value,
            },
        );
        self.key_table.push(SmolStr::default());
    }

    fn handle_special_symbol(&mut self, i: SymbolNumber, key: SmolStr) {
        if let Some((operation, feature, value)) = parse_flag(&key) {
            if key.len() >= 5 && key.as_bytes()[2] == b'.' {
                return self.handle_flag(i, operation, feature, value);
            }
        }

        match &*key {
            IDENTITY_SYMBOL => {
                self.identity_symbol = Some(i);
                self.key_table.push(key);
            }
            UNKNOWN_SYMBOL => {
                self.unknown_symbol = Some(i);
                self.key_table.push(key);
            }
            EPSILON_SYMBOL => self.key_table.push(SmolStr::default()),
            _ => {
                // No idea, suppress.
                warn!("Unhandled alphabet key: {}", &key);
                self.key_table.push(SmolStr::default());
            }
        }
    }

    fn parse_inner(
        &mut self,
        buf: &[u8],
        symbols: SymbolNumber,
        input_symbols: SymbolNumber,
    ) -> Result<(), TransducerError> {
        let mut offset = 0usize;

        for i in 0..symbols.0 {
            let i = SymbolNumber(i);

            let end = buf[offset..]
                .iter()
                .position(|b| *b == 0)
                .ok_or_else(|| {
                    TransducerError::Alphabet(format!(
                        "symbol {} is not terminated; expected {} symbols",
                        i, symbols
                    ))
                })?;

            let key: SmolStr = std::str::from_utf8(&buf[offset..offset + end])
                .map_err(|_| TransducerError::Alphabet(format!("symbol {} is not UTF-8", i)))?
                .into();

            offset += end + 1;

            if i == SymbolNumber::ZERO {
                // Zeroth symbol is epsilon whatever it is called
                self.key_table.push(SmolStr::default());
                continue;
            }

            if key.len() > 1 && key.starts_with('@') && key.ends_with('@') {
                self.handle_special_symbol(i, key);
            } else {
                if i < input_symbols {
                    self.longest_input_symbol = self.longest_input_symbol.max(key.len());
                }
                self.string_to_symbol.insert(key.clone(), i);
                self.key_table.push(key);
            }
        }

        self.flag_state_size = SymbolNumber(self.feature_bucket.len() as u16);
        self.length = offset;

        Ok(())
    }

    pub fn parse(
        buf: &[u8],
        symbols: SymbolNumber,
        input_symbols: SymbolNumber,
    ) -> Result<TransducerAlphabet, TransducerError> {
        let mut p = TransducerAlphabetParser::new();
        p.parse_inner(buf, symbols, input_symbols)?;

        Ok(TransducerAlphabet {
            key_table: p.key_table,
            initial_symbol_count: symbols,
            input_symbol_count: input_symbols,
            length: p.length,
            longest_input_symbol: p.longest_input_symbol,
            flag_state_size: p.flag_state_size,
            string_to_symbol: p.string_to_symbol,
            operations: p.operations,
            identity_symbol: p.identity_symbol,
            unknown_symbol: p.unknown_symbol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(keys: &[&str]) -> Vec<u8> {
        let mut buf = vec![];
        for k in keys {
            buf.extend_from_slice(k.as_bytes());
            buf.push(0);
        }
        buf
    }

    #[test]
    fn parses_plain_and_special_symbols() {
        let keys = [
            EPSILON_SYMBOL,
            "a",
            "ch",
            IDENTITY_SYMBOL,
            UNKNOWN_SYMBOL,
            "@_SOMETHING_ELSE_@",
            "<N>",
        ];
        let buf = symbols(&keys);
        let alphabet =
            TransducerAlphabetParser::parse(&buf, SymbolNumber(7), SymbolNumber(6)).unwrap();

        assert_eq!(alphabet.len(), buf.len());
        assert_eq!(alphabet.key_table()[0], "");
        assert_eq!(alphabet.key_table()[2], "ch");
        assert_eq!(alphabet.key_table()[5], "");
        assert_eq!(alphabet.identity(), Some(SymbolNumber(3)));
        assert_eq!(alphabet.unknown(), Some(SymbolNumber(4)));
        assert_eq!(alphabet.input_symbol("ch"), Some(SymbolNumber(2)));
        assert_eq!(alphabet.input_symbol("<N>"), None);
        assert_eq!(alphabet.longest_input_symbol(), 2);
    }

    #[test]
    fn numbers_flag_features_and_values() {
        let keys = ["", "@P.CASE.NOM@", "@R.CASE.NOM@", "@D.CASE@", "@U.NUM.SG@", "@C.NUM@"];
        let buf = symbols(&keys);
        let alphabet =
            TransducerAlphabetParser::parse(&buf, SymbolNumber(6), SymbolNumber(6)).unwrap();

        assert_eq!(alphabet.state_size(), SymbolNumber(2));

        let p = &alphabet.operations()[&SymbolNumber(1)];
        assert_eq!(p.operation, FlagDiacriticOperator::PositiveSet);
        assert_eq!(p.feature, SymbolNumber(0));
        assert_eq!(p.value, ValueNumber(1));

        let d = &alphabet.operations()[&SymbolNumber(3)];
        assert_eq!(d.operation, FlagDiacriticOperator::Disallow);
        assert_eq!(d.value, ValueNumber::ZERO);

        let u = &alphabet.operations()[&SymbolNumber(4)];
        assert_eq!(u.feature, SymbolNumber(1));
        assert_eq!(u.value, ValueNumber(2));

        assert!(alphabet.is_flag(SymbolNumber(5)));
        assert!(alphabet.key_table().iter().all(|k| k.is_empty()));
    }

    #[test]
    fn unterminated_alphabet_is_an_error() {
        let buf = b"\0abc".to_vec();
        assert!(matches!(
            TransducerAlphabetParser::parse(&buf, SymbolNumber(2), SymbolNumber(2)),
            Err(TransducerError::Alphabet(_))
        ));
    }
}
