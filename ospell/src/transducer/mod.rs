//! Transducer is a Finite-State Automaton with two tapes / two symbols per
//! transition.
//!
//! The traversal interface mirrors the optimized-lookup layout: a state is an
//! index into either the index table or the transition table, and its arcs are
//! found by jumping to the block for a given input symbol and reading entries
//! until the symbol changes.
pub mod alphabet;
pub mod error_model;
pub mod hfst;
pub mod symbol_transition;
pub(crate) mod tree_node;

use hashbrown::{HashMap, HashSet};
use smol_str::SmolStr;

use crate::types::{SymbolNumber, TransitionTableIndex, Weight};
use crate::vfs::Filesystem;

pub use self::alphabet::TransducerAlphabet;
pub use self::error_model::{EditArc, EditOperation, ErrorModel};
pub use self::hfst::HfstTransducer;
use self::symbol_transition::SymbolTransition;

/// Error with transducer reading or processing.
#[derive(Debug, thiserror::Error)]
pub enum TransducerError {
    /// Error with mmapping
    #[error("Memory mapping error")]
    Memmap(#[source] std::io::Error),
    /// Error with input/output.
    #[error("IO error")]
    Io(#[source] std::io::Error),
    /// The header could not be read.
    #[error("Invalid transducer header: {0}")]
    Header(String),
    /// Error with FSA alphabets.
    #[error("Alphabet error: {0}")]
    Alphabet(String),
    /// The HFST3 header declares a type other than optimized lookup.
    #[error("Incompatible transducer type `{0}`, expected HFST_OL or HFST_OLW")]
    IncompatibleType(SmolStr),
    /// The tables are truncated or reference states that do not exist.
    #[error("Malformed transducer: {0}")]
    Malformed(String),
}

impl TransducerError {
    /// Wrap into i/o error.
    pub fn into_io_error(self) -> std::io::Error {
        match self {
            TransducerError::Memmap(v) => v,
            TransducerError::Io(v) => v,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

/// One outgoing arc of a state, as returned by [`Transducer::transitions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub input: SymbolNumber,
    pub output: SymbolNumber,
    pub target: TransitionTableIndex,
    pub weight: Weight,
}

/// A file-based finite-state transducer.
///
/// The required methods are the low-level table walk used by the search
/// engines; [`Transducer::transitions`] and [`Transducer::final_weight_of`] are
/// the convenient, safe view of the same data.
pub trait Transducer: Sized + Send + Sync {
    /// file extension.
    const FILE_EXT: &'static str;

    /// read a transducer from a file.
    fn from_path<P, FS>(fs: &FS, path: P) -> Result<Self, TransducerError>
    where
        P: AsRef<std::path::Path>,
        FS: Filesystem;

    /// get transducer's alphabet.
    fn alphabet(&self) -> &TransducerAlphabet;
    /// get transducer's alphabet as mutable reference.
    fn mut_alphabet(&mut self) -> &mut TransducerAlphabet;
    /// key/value properties declared by the model file.
    fn properties(&self) -> &HashMap<SmolStr, SmolStr>;
    /// every symbol written on the output side of some arc.
    fn output_symbols(&self) -> HashSet<SymbolNumber>;

    /// get input symbol number of given transition arc.
    fn transition_input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber>;
    /// check if there are transitions at given index.
    fn has_transitions(&self, i: TransitionTableIndex, s: Option<SymbolNumber>) -> bool;
    /// get next transition with a symbol.
    fn next(&self, i: TransitionTableIndex, symbol: SymbolNumber) -> Option<TransitionTableIndex>;
    /// check if there are free transitions at index.
    fn has_epsilons_or_flags(&self, i: TransitionTableIndex) -> bool;
    /// follow free transitions.
    fn take_epsilons_and_flags(&self, i: TransitionTableIndex) -> Option<SymbolTransition>;
    /// follow epsilon transitions.
    fn take_epsilons(&self, i: TransitionTableIndex) -> Option<SymbolTransition>;
    /// follow transitions with given symbol.
    fn take_non_epsilons(
        &self,
        i: TransitionTableIndex,
        symbol: SymbolNumber,
    ) -> Option<SymbolTransition>;
    /// check if given index is an end state.
    fn is_final(&self, i: TransitionTableIndex) -> bool;
    /// get end state weight of a state.
    fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight>;

    /// The final weight of `state`, or `None` when it is not accepting.
    #[inline]
    fn final_weight_of(&self, state: TransitionTableIndex) -> Option<Weight> {
        if self.is_final(state) {
            self.final_weight(state)
        } else {
            None
        }
    }

    /// All arcs leaving `state` on `symbol`.
    ///
    /// Asking for the epsilon symbol also yields flag diacritic arcs, which
    /// share the epsilon block.
    fn transitions(
        &self,
        state: TransitionTableIndex,
        symbol: SymbolNumber,
    ) -> Transitions<'_, Self> {
        let present = if symbol == SymbolNumber::ZERO {
            self.has_epsilons_or_flags(state.incr())
        } else {
            self.has_transitions(state.incr(), Some(symbol))
        };

        let index = if present {
            self.next(state, symbol)
        } else {
            None
        };

        Transitions {
            transducer: self,
            index,
            symbol,
        }
    }
}

/// Iterator over the arcs of one state for one input symbol.
pub struct Transitions<'a, T: Transducer> {
    transducer: &'a T,
    index: Option<TransitionTableIndex>,
    symbol: SymbolNumber,
}

impl<'a, T: Transducer> Iterator for Transitions<'a, T> {
    type Item = Transition;

    fn next(&mut self) -> Option<Transition> {
        let index = self.index?;

        let transition = if self.symbol == SymbolNumber::ZERO {
            self.transducer.take_epsilons_and_flags(index)
        } else {
            self.transducer.take_non_epsilons(index, self.symbol)
        };

        let transition = match transition {
            Some(t) => t,
            None => {
                self.index = None;
                return None;
            }
        };

        self.index = Some(index.incr());

        Some(Transition {
            input: self
                .transducer
                .transition_input_symbol(index)
                .unwrap_or(self.symbol),
            output: transition.symbol().unwrap_or(SymbolNumber::ZERO),
            target: transition.target()?,
            weight: transition.weight().unwrap_or(Weight::ZERO),
        })
    }
}

/// Index table contains the dense, symbol-addressed part of the automaton.
pub trait IndexTable: Sized {
    fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber>;
    fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex>;
    fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight>;

    #[inline(always)]
    fn is_final(&self, i: TransitionTableIndex) -> bool {
        self.input_symbol(i).is_none() && self.target(i).is_some()
    }
}

/// Transition table contains the arcs of the automaton (and states).
pub trait TransitionTable: Sized {
    /// get input symbol of a transition.
    fn input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber>;
    /// get output symbol of a transition.
    fn output_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber>;
    /// get the target state in the index.
    fn target(&self, i: TransitionTableIndex) -> Option<TransitionTableIndex>;
    /// get the weight of the transition.
    fn weight(&self, i: TransitionTableIndex) -> Option<Weight>;

    /// check if the state is a final state.
    #[inline(always)]
    fn is_final(&self, i: TransitionTableIndex) -> bool {
        self.input_symbol(i).is_none()
            && self.output_symbol(i).is_none()
            && self.target(i) == Some(TransitionTableIndex::ONE)
    }

    #[inline(always)]
    fn symbol_transition(&self, i: TransitionTableIndex) -> SymbolTransition {
        SymbolTransition::new(self.target(i), self.output_symbol(i), self.weight(i))
    }
}
