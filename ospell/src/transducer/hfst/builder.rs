//! Compile small automata into optimized-lookup bytes.
//!
//! Every state gets a block in the index table, so lookups never fall back to
//! scanning the transition table. This is wasteful for large lexicons but
//! keeps the layout simple and makes the result readable by any
//! optimized-lookup reader.
use byteorder::{ByteOrder, LittleEndian};
use hashbrown::HashMap;
use smol_str::SmolStr;

use super::HfstTransducer;
use crate::constants::{HFST3_MAGIC, NO_SYMBOL, NO_TABLE_INDEX, TARGET_TABLE};
use crate::transducer::alphabet::EPSILON_SYMBOL;
use crate::transducer::TransducerError;
use crate::types::TransitionTableIndex;

#[derive(Debug, Clone)]
struct Edge {
    to: usize,
    input: SmolStr,
    output: SmolStr,
    weight: f32,
}

/// States, arcs and final weights of an automaton under construction.
///
/// State `0` exists from the start and is the initial state. An empty string
/// on either side of an arc is epsilon.
#[derive(Debug, Clone)]
pub struct TransducerBuilder {
    arcs: Vec<Vec<Edge>>,
    finals: Vec<Option<f32>>,
    properties: Vec<(SmolStr, SmolStr)>,
}

impl Default for TransducerBuilder {
    fn default() -> Self {
        TransducerBuilder {
            arcs: vec![vec![]],
            finals: vec![None],
            properties: vec![],
        }
    }
}

struct Symbols {
    keys: Vec<SmolStr>,
    numbers: HashMap<SmolStr, u16>,
}

impl Symbols {
    fn number(&mut self, key: &str) -> u16 {
        if key.is_empty() {
            return 0;
        }

        if let Some(n) = self.numbers.get(key) {
            return *n;
        }

        let n = self.keys.len() as u16;
        self.keys.push(key.into());
        self.numbers.insert(key.into(), n);
        n
    }

    fn get(&self, key: &str) -> u16 {
        if key.is_empty() {
            0
        } else {
            self.numbers.get(key).copied().unwrap_or(NO_SYMBOL)
        }
    }
}

fn index_entry(buf: &mut Vec<u8>, input: u16, target: u32) {
    let mut entry = [0u8; 6];
    LittleEndian::write_u16(&mut entry[0..2], input);
    LittleEndian::write_u32(&mut entry[2..6], target);
    buf.extend_from_slice(&entry);
}

fn transition_entry(buf: &mut Vec<u8>, input: u16, output: u16, target: u32, weight: f32) {
    let mut entry = [0u8; 12];
    LittleEndian::write_u16(&mut entry[0..2], input);
    LittleEndian::write_u16(&mut entry[2..4], output);
    LittleEndian::write_u32(&mut entry[4..8], target);
    LittleEndian::write_f32(&mut entry[8..12], weight);
    buf.extend_from_slice(&entry);
}

fn is_flag(key: &str) -> bool {
    let b = key.as_bytes();
    b.len() >= 5 && b[0] == b'@' && b[2] == b'.' && b[b.len() - 1] == b'@'
}

impl TransducerBuilder {
    pub fn new() -> TransducerBuilder {
        Self::default()
    }

    /// Add a state and return its number.
    pub fn add_state(&mut self) -> usize {
        self.arcs.push(vec![]);
        self.finals.push(None);
        self.arcs.len() - 1
    }

    /// Add an arc, creating any missing states up to `from` and `to`.
    pub fn add_arc(&mut self, from: usize, to: usize, input: &str, output: &str, weight: f32) {
        while self.arcs.len() <= from.max(to) {
            self.add_state();
        }

        self.arcs[from].push(Edge {
            to,
            input: input.into(),
            output: output.into(),
            weight,
        });
    }

    /// Add a chain of states spelling `input` as `output` from `from` to `to`.
    /// The longer side is padded with epsilons and the weight goes on the first arc.
    pub fn add_path(
        &mut self,
        from: usize,
        to: usize,
        input: &[&str],
        output: &[&str],
        weight: f32,
    ) {
        let len = input.len().max(output.len()).max(1);
        let mut state = from;

        for i in 0..len {
            let next = if i + 1 == len { to } else { self.add_state() };
            let w = if i == 0 { weight } else { 0.0 };
            self.add_arc(
                state,
                next,
                input.get(i).copied().unwrap_or(""),
                output.get(i).copied().unwrap_or(""),
                w,
            );
            state = next;
        }
    }

    pub fn set_final(&mut self, state: usize, weight: f32) {
        while self.arcs.len() <= state {
            self.add_state();
        }
        self.finals[state] = Some(weight);
    }

    /// Record a key/value pair in the HFST3 header.
    pub fn property(&mut self, key: &str, value: &str) -> &mut Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    pub fn state_count(&self) -> usize {
        self.arcs.len()
    }

    /// The index the loaded transducer uses for `state`.
    pub fn state_index(&self, state: usize) -> TransitionTableIndex {
        let (_, input_count) = self.symbols();
        TransitionTableIndex(state as u32 * (u32::from(input_count) + 1))
    }

    fn symbols(&self) -> (Symbols, u16) {
        let mut symbols = Symbols {
            keys: vec![SmolStr::new(EPSILON_SYMBOL)],
            numbers: HashMap::new(),
        };

        for arc in self.arcs.iter().flatten() {
            symbols.number(&arc.input);
        }
        let input_count = symbols.keys.len() as u16;

        for arc in self.arcs.iter().flatten() {
            symbols.number(&arc.output);
        }

        (symbols, input_count)
    }

    fn header(
        &self,
        symbols: &Symbols,
        input_count: u16,
        index_size: u32,
        target_size: u32,
    ) -> Vec<u8> {
        let mut text = String::new();
        text.push_str("version\03.3\0type\0HFST_OLW\0");
        for (k, v) in &self.properties {
            text.push_str(k);
            text.push('\0');
            text.push_str(v);
            text.push('\0');
        }

        let mut buf = HFST3_MAGIC.to_vec();
        let mut len = [0u8; 2];
        LittleEndian::write_u16(&mut len, text.len() as u16);
        buf.extend_from_slice(&len);
        buf.push(0);
        buf.extend_from_slice(text.as_bytes());

        let mut main = [0u8; 56];
        LittleEndian::write_u16(&mut main[0..2], input_count);
        LittleEndian::write_u16(&mut main[2..4], symbols.keys.len() as u16);
        LittleEndian::write_u32(&mut main[4..8], index_size);
        LittleEndian::write_u32(&mut main[8..12], target_size);
        LittleEndian::write_u32(&mut main[12..16], self.arcs.len() as u32);
        let arc_count: usize = self.arcs.iter().map(Vec::len).sum();
        LittleEndian::write_u32(&mut main[16..20], arc_count as u32);
        // Weighted; the remaining properties are left unset.
        LittleEndian::write_u32(&mut main[20..24], 1);
        buf.extend_from_slice(&main);

        for key in &symbols.keys {
            buf.extend_from_slice(key.as_bytes());
            buf.push(0);
        }

        buf
    }

    /// Serialize into a weighted optimized-lookup file with an HFST3 header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let (symbols, input_count) = self.symbols();
        let block = u32::from(input_count) + 1;
        let state_base = |s: usize| s as u32 * block;

        let mut index = vec![];
        let mut transitions = vec![];
        let mut target_size = 0u32;

        for (state, arcs) in self.arcs.iter().enumerate() {
            match self.finals[state] {
                Some(w) => index_entry(&mut index, NO_SYMBOL, w.to_bits()),
                None => index_entry(&mut index, NO_SYMBOL, NO_TABLE_INDEX),
            }

            for sym in 0..input_count {
                let group: Vec<&Edge> = arcs
                    .iter()
                    .filter(|a| {
                        let input = symbols.get(&a.input);
                        if sym == 0 {
                            input == 0 || is_flag(&a.input)
                        } else {
                            input == sym && !is_flag(&a.input)
                        }
                    })
                    .collect();

                if group.is_empty() {
                    index_entry(&mut index, NO_SYMBOL, NO_TABLE_INDEX);
                    continue;
                }

                index_entry(&mut index, sym, TARGET_TABLE + target_size);

                for arc in group {
                    transition_entry(
                        &mut transitions,
                        symbols.get(&arc.input),
                        symbols.get(&arc.output),
                        state_base(arc.to),
                        arc.weight,
                    );
                    target_size += 1;
                }

                transition_entry(&mut transitions, NO_SYMBOL, NO_SYMBOL, NO_TABLE_INDEX, 0.0);
                target_size += 1;
            }
        }

        let index_size = self.arcs.len() as u32 * block;
        let mut buf = self.header(&symbols, input_count, index_size, target_size);
        buf.extend_from_slice(&index);
        buf.extend_from_slice(&transitions);
        buf
    }

    /// Compile and load in one step.
    pub fn build(&self) -> Result<HfstTransducer<Vec<u8>>, TransducerError> {
        HfstTransducer::from_bytes(self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::Transducer;
    use crate::types::{SymbolNumber, Weight};

    #[test]
    fn numbers_input_symbols_first() {
        let mut b = TransducerBuilder::new();
        b.add_arc(0, 1, "a", "<X>", 0.0);
        b.add_arc(1, 2, "@P.F.V@", "@P.F.V@", 0.0);
        b.set_final(2, 0.0);

        let t = b.build().unwrap();
        let alphabet = t.alphabet();

        assert_eq!(alphabet.input_symbol_count(), SymbolNumber(3));
        assert_eq!(alphabet.key_table()[1], "a");
        assert!(alphabet.is_flag(SymbolNumber(2)));
        assert_eq!(alphabet.key_table()[3], "<X>");
    }

    #[test]
    fn flags_share_the_epsilon_block() {
        let mut b = TransducerBuilder::new();
        b.add_arc(0, 1, "@P.F.V@", "@P.F.V@", 0.0);
        b.add_arc(0, 2, "", "y", 0.5);
        b.set_final(1, 0.0);

        let t = b.build().unwrap();
        let free: Vec<_> = t
            .transitions(TransitionTableIndex::ZERO, SymbolNumber::ZERO)
            .collect();

        assert_eq!(free.len(), 2);
        assert!(free.iter().any(|a| t.alphabet().is_flag(a.input)));
        assert!(free.iter().any(|a| a.input == SymbolNumber::ZERO && a.weight == Weight(0.5)));
    }

    #[test]
    fn paths_pad_the_shorter_side() {
        let mut b = TransducerBuilder::new();
        let end = b.add_state();
        b.add_path(0, end, &["m", "o", "q"], &["<moq>"], 1.0);
        b.set_final(end, 0.0);

        assert_eq!(b.state_count(), 4);

        let t = b.build().unwrap();
        let m = t.alphabet().input_symbol("m").unwrap();
        let arc = t.transitions(TransitionTableIndex::ZERO, m).next().unwrap();
        assert_eq!(arc.weight, Weight(1.0));
        assert_eq!(arc.target, b.state_index(2));
    }

    #[test]
    fn properties_land_in_the_header() {
        let mut b = TransducerBuilder::new();
        b.set_final(0, 0.0);
        b.property("max-weight", "7.5").property("name", "test");

        let t = b.build().unwrap();
        assert_eq!(t.properties().get("max-weight").map(|s| s.as_str()), Some("7.5"));
        assert_eq!(t.properties().get("type").map(|s| s.as_str()), Some("HFST_OLW"));
    }
}
