use std::fmt;
use std::mem;
use std::sync::Arc;

use memmap2::Mmap;

use crate::constants::{NO_SYMBOL, NO_TABLE_INDEX, TRANS_TABLE_SIZE};
use crate::transducer::TransitionTable;
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};
use crate::vfs::Memory;

/// The transition table of an optimized-lookup transducer, read in place.
pub struct MappedTransitionTable<M: Memory = Mmap> {
    pub(crate) size: TransitionTableIndex,
    pub(crate) buf: Arc<M>,
    pub(crate) offset: usize,
}

impl<M: Memory> fmt::Debug for MappedTransitionTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Transition table index: {}", self.size)?;
        Ok(())
    }
}

impl<M: Memory> MappedTransitionTable<M> {
    pub fn new(buf: Arc<M>, offset: usize, size: TransitionTableIndex) -> MappedTransitionTable<M> {
        MappedTransitionTable { size, buf, offset }
    }

    #[inline(always)]
    pub fn size(&self) -> TransitionTableIndex {
        self.size
    }

    /// Byte length of the table.
    #[inline(always)]
    pub fn len(&self) -> usize {
        TRANS_TABLE_SIZE * self.size.0 as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.size == TransitionTableIndex::ZERO
    }

    #[inline(always)]
    fn position(&self, i: TransitionTableIndex) -> usize {
        self.offset + TRANS_TABLE_SIZE * i.0 as usize
    }

    #[inline(always)]
    fn read_symbol(&self, index: usize) -> Option<SymbolNumber> {
        match self.buf.read_u16_at(index) {
            NO_SYMBOL => None,
            sym => Some(SymbolNumber(sym)),
        }
    }
}

impl<M: Memory> TransitionTable for MappedTransitionTable<M> {
    #[inline(always)]
    fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        if i >= self.size {
            return None;
        }

        self.read_symbol(self.position(i))
    }

    #[inline(always)]
    fn output_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        if i >= self.size {
            return None;
        }

        self.read_symbol(self.position(i) + mem::size_of::<SymbolNumber>())
    }

    #[inline(always)]
    fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex> {
        if i >= self.size {
            return None;
        }

        let index = self.position(i) + 2 * mem::size_of::<SymbolNumber>();

        match self.buf.read_u32_at(index) {
            NO_TABLE_INDEX => None,
            target => Some(TransitionTableIndex(target)),
        }
    }

    #[inline(always)]
    fn weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        if i >= self.size {
            return None;
        }

        let index = self.position(i)
            + 2 * mem::size_of::<SymbolNumber>()
            + mem::size_of::<TransitionTableIndex>();

        Some(Weight(self.buf.read_f32_at(index)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian, WriteBytesExt};

    fn entry(buf: &mut Vec<u8>, input: u16, output: u16, target: u32, weight: f32) {
        buf.write_u16::<LittleEndian>(input).unwrap();
        buf.write_u16::<LittleEndian>(output).unwrap();
        buf.write_u32::<LittleEndian>(target).unwrap();
        buf.write_f32::<LittleEndian>(weight).unwrap();
    }

    #[test]
    fn reads_arcs_and_finality() {
        let mut buf = vec![];
        entry(&mut buf, 3, 4, 12, 0.5);
        entry(&mut buf, NO_SYMBOL, NO_SYMBOL, 1, 2.0);
        entry(&mut buf, NO_SYMBOL, NO_SYMBOL, NO_TABLE_INDEX, 0.0);

        let table = MappedTransitionTable::new(Arc::new(buf), 0, TransitionTableIndex(3));
        let first = TransitionTableIndex(0);

        assert_eq!(table.input_symbol(first), Some(SymbolNumber(3)));
        assert_eq!(table.output_symbol(first), Some(SymbolNumber(4)));
        assert_eq!(table.target(first), Some(TransitionTableIndex(12)));
        assert_eq!(table.weight(first), Some(Weight(0.5)));
        assert!(!table.is_final(first));

        assert!(table.is_final(TransitionTableIndex(1)));
        assert_eq!(table.weight(TransitionTableIndex(1)), Some(Weight(2.0)));

        assert!(!table.is_final(TransitionTableIndex(2)));
        assert_eq!(table.target(TransitionTableIndex(2)), None);
        assert_eq!(table.input_symbol(TransitionTableIndex(3)), None);

        let parts = table.symbol_transition(first).parts();
        assert_eq!(parts, Some((TransitionTableIndex(12), SymbolNumber(4), Weight(0.5))));
    }
}
