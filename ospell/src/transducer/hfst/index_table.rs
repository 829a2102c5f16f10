use std::fmt;
use std::mem;
use std::sync::Arc;

use memmap2::Mmap;

use crate::constants::{INDEX_TABLE_SIZE, NO_SYMBOL, NO_TABLE_INDEX};
use crate::transducer::IndexTable;
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};
use crate::vfs::Memory;

/// The index table of an optimized-lookup transducer, read in place.
pub struct MappedIndexTable<M: Memory = Mmap> {
    pub(crate) size: TransitionTableIndex,
    pub(crate) buf: Arc<M>,
    pub(crate) offset: usize,
}

impl<M: Memory> fmt::Debug for MappedIndexTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Index table index: {}", self.size)?;
        Ok(())
    }
}

impl<M: Memory> MappedIndexTable<M> {
    pub fn new(buf: Arc<M>, offset: usize, size: TransitionTableIndex) -> MappedIndexTable<M> {
        MappedIndexTable { size, buf, offset }
    }

    #[inline(always)]
    pub fn size(&self) -> TransitionTableIndex {
        self.size
    }

    /// Byte length of the table.
    #[inline(always)]
    pub fn len(&self) -> usize {
        INDEX_TABLE_SIZE * self.size.0 as usize
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.size == TransitionTableIndex::ZERO
    }

    #[inline(always)]
    fn position(&self, i: TransitionTableIndex) -> usize {
        self.offset + INDEX_TABLE_SIZE * i.0 as usize
    }

    /// Raw target field, including the marker values.
    #[inline(always)]
    pub(crate) fn raw_target(&self, i: TransitionTableIndex) -> u32 {
        self.buf
            .read_u32_at(self.position(i) + mem::size_of::<SymbolNumber>())
    }
}

impl<M: Memory> IndexTable for MappedIndexTable<M> {
    #[inline(always)]
    fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        if i >= self.size {
            return None;
        }

        match self.buf.read_u16_at(self.position(i)) {
            NO_SYMBOL => None,
            sym => Some(SymbolNumber(sym)),
        }
    }

    #[inline(always)]
    fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex> {
        if i >= self.size {
            return None;
        }

        match self.raw_target(i) {
            NO_TABLE_INDEX => None,
            target => Some(TransitionTableIndex(target)),
        }
    }

    // Final weight reads from the same position as target, but for a different tuple
    #[inline(always)]
    fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        if i >= self.size {
            return None;
        }

        Some(Weight(
            self.buf
                .read_f32_at(self.position(i) + mem::size_of::<SymbolNumber>()),
        ))
    }
}
