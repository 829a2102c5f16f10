//! Reader for HFST optimized-lookup transducers.
pub mod alphabet;
pub mod builder;
pub mod header;
pub mod index_table;
pub mod transition_table;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use log::debug;
use memmap2::Mmap;
use smol_str::SmolStr;

use self::alphabet::TransducerAlphabetParser;
use self::header::TransducerHeader;
pub use self::index_table::MappedIndexTable;
pub use self::transition_table::MappedTransitionTable;
use super::alphabet::TransducerAlphabet;
use super::symbol_transition::SymbolTransition;
use super::{IndexTable, Transducer, TransducerError, TransitionTable};
use crate::constants::{INDEX_TABLE_SIZE, NO_TABLE_INDEX, TARGET_TABLE, TRANS_TABLE_SIZE};
use crate::types::{HeaderFlag, SymbolNumber, TransitionTableIndex, Weight};
use crate::vfs::{self, Filesystem, Memory};

const TARGET_TABLE_INDEX: TransitionTableIndex = TransitionTableIndex(TARGET_TABLE);

/// An optimized-lookup transducer over memory-mapped (or owned) bytes.
pub struct HfstTransducer<M: Memory = Mmap> {
    buf: Arc<M>,
    header: TransducerHeader,
    alphabet: TransducerAlphabet,
    pub(crate) index_table: MappedIndexTable<M>,
    pub(crate) transition_table: MappedTransitionTable<M>,
}

impl<M: Memory> fmt::Debug for HfstTransducer<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:?}", self.header)?;
        writeln!(f, "{:?}", self.alphabet)?;
        writeln!(f, "{:?}", self.index_table)?;
        writeln!(f, "{:?}", self.transition_table)?;
        Ok(())
    }
}

fn malformed(msg: String) -> TransducerError {
    TransducerError::Malformed(msg)
}

impl<M: Memory> HfstTransducer<M> {
    pub fn from_mapped_memory(buf: Arc<M>) -> Result<HfstTransducer<M>, TransducerError> {
        let bytes = buf.bytes();
        let header = TransducerHeader::new(bytes)?;

        if !header.has_flag(HeaderFlag::Weighted) {
            return Err(TransducerError::Header(
                "unweighted optimized-lookup tables are not supported".into(),
            ));
        }

        let alphabet_offset = header.len();
        let alphabet = TransducerAlphabetParser::parse(
            &bytes[alphabet_offset..],
            header.symbol_count(),
            header.input_symbol_count(),
        )?;

        let index_table_offset = alphabet_offset + alphabet.len();
        let index_table_end =
            index_table_offset + INDEX_TABLE_SIZE * header.index_table_size().0 as usize;
        let trans_table_end =
            index_table_end + TRANS_TABLE_SIZE * header.target_table_size().0 as usize;

        if trans_table_end > buf.byte_len() {
            return Err(malformed(format!(
                "tables need {} bytes but the file has {}",
                trans_table_end,
                buf.byte_len()
            )));
        }

        let index_table =
            MappedIndexTable::new(buf.clone(), index_table_offset, header.index_table_size());
        let transition_table =
            MappedTransitionTable::new(buf.clone(), index_table_end, header.target_table_size());

        let transducer = HfstTransducer {
            buf,
            header,
            alphabet,
            index_table,
            transition_table,
        };

        transducer.validate()?;

        debug!(
            "Loaded transducer: {} symbols, {} index entries, {} transitions",
            transducer.header.symbol_count(),
            transducer.header.index_table_size(),
            transducer.header.target_table_size()
        );

        Ok(transducer)
    }

    /// Check every table reference and weight once so traversal can trust them.
    fn validate(&self) -> Result<(), TransducerError> {
        let symbols = self.header.symbol_count();
        let index_size = self.index_table.size();
        let trans_size = self.transition_table.size();

        let valid_target = |target: TransitionTableIndex| {
            if target >= TARGET_TABLE_INDEX {
                target - TARGET_TABLE_INDEX < trans_size
            } else {
                target < index_size
            }
        };

        for i in (0..index_size.0).map(TransitionTableIndex) {
            match self.index_table.input_symbol(i) {
                Some(sym) => {
                    if sym >= symbols {
                        return Err(malformed(format!("index {} has unknown symbol {}", i, sym)));
                    }
                    // Points at the first arc of a block, which may be the end of the table
                    // only when the block is empty.
                    match self.index_table.target(i) {
                        Some(t)
                            if t >= TARGET_TABLE_INDEX && t - TARGET_TABLE_INDEX <= trans_size => {}
                        _ => {
                            return Err(malformed(format!("index {} has an invalid target", i)));
                        }
                    }
                }
                None => {
                    if self.index_table.raw_target(i) != NO_TABLE_INDEX {
                        let weight = self.index_table.final_weight(i).unwrap_or(Weight::ZERO);
                        if !weight.is_valid() {
                            return Err(malformed(format!(
                                "index {} has final weight {}",
                                i, weight
                            )));
                        }
                    }
                }
            }
        }

        for i in (0..trans_size.0).map(TransitionTableIndex) {
            let weight = self.transition_table.weight(i).unwrap_or(Weight::ZERO);

            match self.transition_table.input_symbol(i) {
                Some(sym) => {
                    if sym >= symbols {
                        return Err(malformed(format!("arc {} has unknown symbol {}", i, sym)));
                    }

                    match self.transition_table.output_symbol(i) {
                        Some(out) if out < symbols => {}
                        _ => {
                            return Err(malformed(format!("arc {} has an invalid output", i)));
                        }
                    }

                    match self.transition_table.target(i) {
                        Some(t) if valid_target(t) => {}
                        _ => {
                            return Err(malformed(format!("arc {} has an invalid target", i)));
                        }
                    }

                    if !weight.is_valid() {
                        return Err(malformed(format!("arc {} has weight {}", i, weight)));
                    }
                }
                None => {
                    if self.transition_table.is_final(i) && !weight.is_valid() {
                        return Err(malformed(format!("state {} has final weight {}", i, weight)));
                    }
                }
            }
        }

        Ok(())
    }

    #[inline(always)]
    pub fn buffer(&self) -> &[u8] {
        self.buf.bytes()
    }

    #[inline(always)]
    pub fn is_weighted(&self) -> bool {
        self.header.has_flag(HeaderFlag::Weighted)
    }

    #[inline(always)]
    pub fn header(&self) -> &TransducerHeader {
        &self.header
    }
}

impl HfstTransducer<Vec<u8>> {
    /// Read a transducer held entirely in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TransducerError> {
        HfstTransducer::from_mapped_memory(Arc::new(bytes))
    }
}

impl<M: Memory> Transducer for HfstTransducer<M> {
    const FILE_EXT: &'static str = "hfst";

    fn from_path<P, FS>(fs: &FS, path: P) -> Result<HfstTransducer<M>, TransducerError>
    where
        P: AsRef<Path>,
        FS: Filesystem,
    {
        let mut file = fs.open(path).map_err(TransducerError::Io)?;
        let memory = <M as Memory>::load(&mut file).map_err(TransducerError::Memmap)?;
        HfstTransducer::from_mapped_memory(Arc::new(memory))
    }

    #[inline(always)]
    fn alphabet(&self) -> &TransducerAlphabet {
        &self.alphabet
    }

    #[inline(always)]
    fn mut_alphabet(&mut self) -> &mut TransducerAlphabet {
        &mut self.alphabet
    }

    #[inline(always)]
    fn properties(&self) -> &HashMap<SmolStr, SmolStr> {
        self.header.properties()
    }

    fn output_symbols(&self) -> HashSet<SymbolNumber> {
        (0..self.transition_table.size().0)
            .map(TransitionTableIndex)
            .filter(|i| self.transition_table.input_symbol(*i).is_some())
            .filter_map(|i| self.transition_table.output_symbol(i))
            .collect()
    }

    #[inline(always)]
    fn is_final(&self, i: TransitionTableIndex) -> bool {
        if i >= TARGET_TABLE_INDEX {
            self.transition_table.is_final(i - TARGET_TABLE_INDEX)
        } else {
            self.index_table.is_final(i)
        }
    }

    #[inline(always)]
    fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        if i >= TARGET_TABLE_INDEX {
            self.transition_table.weight(i - TARGET_TABLE_INDEX)
        } else {
            self.index_table.final_weight(i)
        }
    }

    #[inline(always)]
    fn has_transitions(&self, i: TransitionTableIndex, s: Option<SymbolNumber>) -> bool {
        let sym = match s {
            Some(v) => v,
            None => return false,
        };

        if i >= TARGET_TABLE_INDEX {
            match self.transition_table.input_symbol(i - TARGET_TABLE_INDEX) {
                Some(res) => sym == res,
                None => false,
            }
        } else {
            match self.index_table.input_symbol(i.offset(sym)) {
                Some(res) => sym == res,
                None => false,
            }
        }
    }

    #[inline(always)]
    fn has_epsilons_or_flags(&self, i: TransitionTableIndex) -> bool {
        if i >= TARGET_TABLE_INDEX {
            match self.transition_table.input_symbol(i - TARGET_TABLE_INDEX) {
                Some(sym) => sym == SymbolNumber::ZERO || self.alphabet.is_flag(sym),
                None => false,
            }
        } else {
            self.index_table.input_symbol(i) == Some(SymbolNumber::ZERO)
        }
    }

    #[inline(always)]
    fn take_epsilons(&self, i: TransitionTableIndex) -> Option<SymbolTransition> {
        if let Some(SymbolNumber::ZERO) = self.transition_table.input_symbol(i) {
            Some(self.transition_table.symbol_transition(i))
        } else {
            None
        }
    }

    #[inline(always)]
    fn take_epsilons_and_flags(&self, i: TransitionTableIndex) -> Option<SymbolTransition> {
        let sym = self.transition_table.input_symbol(i)?;

        if sym != SymbolNumber::ZERO && !self.alphabet.is_flag(sym) {
            None
        } else {
            Some(self.transition_table.symbol_transition(i))
        }
    }

    #[inline(always)]
    fn take_non_epsilons(
        &self,
        i: TransitionTableIndex,
        symbol: SymbolNumber,
    ) -> Option<SymbolTransition> {
        let input_sym = self.transition_table.input_symbol(i)?;

        if input_sym != symbol {
            None
        } else {
            Some(self.transition_table.symbol_transition(i))
        }
    }

    #[inline(always)]
    fn next(&self, i: TransitionTableIndex, symbol: SymbolNumber) -> Option<TransitionTableIndex> {
        if i >= TARGET_TABLE_INDEX {
            Some(i - TARGET_TABLE_INDEX + TransitionTableIndex::ONE)
        } else {
            self.index_table
                .target(i.incr().offset(symbol))
                .map(|v| v - TARGET_TABLE_INDEX)
        }
    }

    #[inline(always)]
    fn transition_input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        self.transition_table.input_symbol(i)
    }
}

/// Load a transducer from disk, mapping it into memory.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HfstTransducer, TransducerError> {
    HfstTransducer::from_path(&vfs::Fs, path)
}

#[cfg(test)]
mod tests {
    use super::builder::TransducerBuilder;
    use super::*;

    fn abc() -> TransducerBuilder {
        let mut b = TransducerBuilder::new();
        let s0 = 0;
        let s1 = b.add_state();
        let s2 = b.add_state();
        b.add_arc(s0, s1, "a", "A", 0.5);
        b.add_arc(s1, s2, "b", "", 0.25);
        b.add_arc(s0, s2, "", "x", 1.0);
        b.set_final(s2, 2.0);
        b
    }

    #[test]
    fn walks_built_tables() {
        let t = abc().build().unwrap();
        let a = t.alphabet().input_symbol("a").unwrap();

        let arcs: Vec<_> = t.transitions(TransitionTableIndex::ZERO, a).collect();
        assert_eq!(arcs.len(), 1);
        assert_eq!(t.alphabet().key_table()[arcs[0].output.0 as usize], "A");
        assert_eq!(arcs[0].weight, Weight(0.5));
        assert_eq!(t.final_weight_of(arcs[0].target), None);

        let eps: Vec<_> = t
            .transitions(TransitionTableIndex::ZERO, SymbolNumber::ZERO)
            .collect();
        assert_eq!(eps.len(), 1);
        assert_eq!(t.final_weight_of(eps[0].target), Some(Weight(2.0)));

        let b = t.alphabet().input_symbol("b").unwrap();
        assert_eq!(t.transitions(TransitionTableIndex::ZERO, b).count(), 0);
    }

    #[test]
    fn reports_output_symbols() {
        let t = abc().build().unwrap();
        let keys: HashSet<_> = t
            .output_symbols()
            .into_iter()
            .map(|s| t.alphabet().key_table()[s.0 as usize].clone())
            .collect();

        assert!(keys.contains("A"));
        assert!(keys.contains("x"));
        assert!(keys.contains(""));
        assert!(!keys.contains("a"));
    }

    #[test]
    fn rejects_truncated_tables() {
        let bytes = abc().to_bytes();
        let cut = bytes[..bytes.len() - 4].to_vec();

        assert!(matches!(
            HfstTransducer::from_bytes(cut),
            Err(TransducerError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_negative_weights() {
        let mut b = abc();
        b.set_final(1, -1.0);

        assert!(matches!(
            b.build(),
            Err(TransducerError::Malformed(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&abc().to_bytes()).unwrap();
        tmp.flush().unwrap();

        let mapped = load(tmp.path()).unwrap();
        assert!(mapped.is_weighted());
        assert!(mapped.alphabet().input_symbol("b").is_some());

        let owned = HfstTransducer::<Vec<u8>>::from_path(&vfs::Fs, tmp.path()).unwrap();
        assert_eq!(owned.buffer(), mapped.buffer());
    }
}
