//! Error models: transducers whose arcs are edit operations.
use std::ops::Deref;
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use smol_str::SmolStr;

use super::alphabet::TransducerAlphabet;
use super::symbol_transition::SymbolTransition;
use super::{Transducer, TransducerError, Transition};
use crate::types::{SymbolNumber, TransitionTableIndex, Weight};
use crate::vfs::Filesystem;

/// The edit an error model arc performs on the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOperation {
    /// `x:x`, or an identity/unknown arc copying the input.
    Identity,
    /// `x:y`
    Substitution,
    /// `x:ε`
    Deletion,
    /// `ε:y`
    Insertion,
    /// `ε:ε` or a flag diacritic.
    Epsilon,
}

/// An error model arc with its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct EditArc {
    pub input: SmolStr,
    pub output: SmolStr,
    pub operation: EditOperation,
    pub target: TransitionTableIndex,
    pub weight: Weight,
}

/// A transducer used as an error model.
///
/// Traversal goes through [`Deref`] to the underlying transducer; this type
/// only adds inspection of the edits it encodes. Transpositions appear as two
/// substitutions through an intermediate state.
#[derive(Debug)]
pub struct ErrorModel<T: Transducer>(T);

impl<T: Transducer> ErrorModel<T> {
    pub fn new(transducer: T) -> ErrorModel<T> {
        ErrorModel(transducer)
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    fn classify(&self, transition: &Transition) -> EditOperation {
        let alphabet = self.0.alphabet();
        let copies = |s: SymbolNumber| {
            Some(s) == alphabet.identity() || Some(s) == alphabet.unknown()
        };
        let is_eps = |s: SymbolNumber| s == SymbolNumber::ZERO || alphabet.is_flag(s);

        match (is_eps(transition.input), is_eps(transition.output)) {
            (true, true) => EditOperation::Epsilon,
            (true, false) => EditOperation::Insertion,
            (false, true) => EditOperation::Deletion,
            (false, false) if transition.input == transition.output => EditOperation::Identity,
            (false, false) if copies(transition.input) => EditOperation::Identity,
            (false, false) => EditOperation::Substitution,
        }
    }

    /// Every arc leaving `state`, classified.
    pub fn edits(&self, state: TransitionTableIndex) -> Vec<EditArc> {
        let alphabet = self.0.alphabet();
        let key = |s: SymbolNumber| {
            alphabet
                .key_table()
                .get(s.0 as usize)
                .cloned()
                .unwrap_or_default()
        };

        (0..alphabet.input_symbol_count().0)
            .map(SymbolNumber)
            .filter(|s| *s == SymbolNumber::ZERO || !alphabet.is_flag(*s))
            .flat_map(|s| self.0.transitions(state, s))
            .map(|t| EditArc {
                input: key(t.input),
                output: key(t.output),
                operation: self.classify(&t),
                target: t.target,
                weight: t.weight,
            })
            .collect()
    }
}

impl<T: Transducer> Deref for ErrorModel<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Transducer> Transducer for ErrorModel<T> {
    const FILE_EXT: &'static str = T::FILE_EXT;

    fn from_path<P, FS>(fs: &FS, path: P) -> Result<Self, TransducerError>
    where
        P: AsRef<Path>,
        FS: Filesystem,
    {
        T::from_path(fs, path).map(ErrorModel)
    }

    #[inline(always)]
    fn alphabet(&self) -> &TransducerAlphabet {
        self.0.alphabet()
    }

    #[inline(always)]
    fn mut_alphabet(&mut self) -> &mut TransducerAlphabet {
        self.0.mut_alphabet()
    }

    #[inline(always)]
    fn properties(&self) -> &HashMap<SmolStr, SmolStr> {
        self.0.properties()
    }

    #[inline(always)]
    fn output_symbols(&self) -> HashSet<SymbolNumber> {
        self.0.output_symbols()
    }

    #[inline(always)]
    fn transition_input_symbol(&self, i: TransitionTableIndex) -> Option<SymbolNumber> {
        self.0.transition_input_symbol(i)
    }

    #[inline(always)]
    fn has_transitions(&self, i: TransitionTableIndex, s: Option<SymbolNumber>) -> bool {
        self.0.has_transitions(i, s)
    }

    #[inline(always)]
    fn next(&self, i: TransitionTableIndex, symbol: SymbolNumber) -> Option<TransitionTableIndex> {
        self.0.next(i, symbol)
    }

    #[inline(always)]
    fn has_epsilons_or_flags(&self, i: TransitionTableIndex) -> bool {
        self.0.has_epsilons_or_flags(i)
    }

    #[inline(always)]
    fn take_epsilons_and_flags(&self, i: TransitionTableIndex) -> Option<SymbolTransition> {
        self.0.take_epsilons_and_flags(i)
    }

    #[inline(always)]
    fn take_epsilons(&self, i: TransitionTableIndex) -> Option<SymbolTransition> {
        self.0.take_epsilons(i)
    }

    #[inline(always)]
    fn take_non_epsilons(
        &self,
        i: TransitionTableIndex,
        symbol: SymbolNumber,
    ) -> Option<SymbolTransition> {
        self.0.take_non_epsilons(i, symbol)
    }

    #[inline(always)]
    fn is_final(&self, i: TransitionTableIndex) -> bool {
        self.0.is_final(i)
    }

    #[inline(always)]
    fn final_weight(&self, i: TransitionTableIndex) -> Option<Weight> {
        self.0.final_weight(i)
    }
}
