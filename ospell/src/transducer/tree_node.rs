use std::cmp::Ordering;

use crate::types::{
    FlagDiacriticOperation, FlagDiacriticOperator, FlagDiacriticState, InputIndex, SymbolNumber,
    TransitionTableIndex, ValueNumber, Weight,
};

/// One configuration of a search: where each machine is, how much input has
/// been read and what has been written so far.
///
/// `surface` collects the lexicon's input side (the corrected word) and
/// `string` its output side (the analysis).
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub lexicon_state: TransitionTableIndex,
    pub mutator_state: TransitionTableIndex,
    pub input_state: InputIndex,
    pub weight: Weight,
    pub flag_state: FlagDiacriticState,
    pub surface: Vec<SymbolNumber>,
    pub string: Vec<SymbolNumber>,
}

/// Everything about a node except its weight. Two nodes with the same key
/// have identical futures, so only the cheaper one needs exploring.
///
/// Wider than the (error model, lexicon, input position) triple: the flag state
/// and both written strings are part of it, so distinct corrections meeting in
/// one lexicon state stay apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    mutator_state: TransitionTableIndex,
    lexicon_state: TransitionTableIndex,
    input_state: InputIndex,
    flag_state: FlagDiacriticState,
    surface: Vec<SymbolNumber>,
    string: Vec<SymbolNumber>,
}

impl PartialEq for TreeNode {
    fn eq(&self, other: &TreeNode) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TreeNode {}

impl Ord for TreeNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| self.surface.cmp(&other.surface))
            .then_with(|| self.string.cmp(&other.string))
            .then_with(|| self.input_state.cmp(&other.input_state))
            .then_with(|| self.mutator_state.cmp(&other.mutator_state))
            .then_with(|| self.lexicon_state.cmp(&other.lexicon_state))
            .then_with(|| self.flag_state.cmp(&other.flag_state))
    }
}

impl PartialOrd for TreeNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[inline(always)]
fn push_symbol(string: &mut Vec<SymbolNumber>, symbol: SymbolNumber) {
    if symbol != SymbolNumber::ZERO {
        string.push(symbol);
    }
}

impl TreeNode {
    #[inline(always)]
    pub fn empty(start_state: FlagDiacriticState) -> TreeNode {
        TreeNode {
            lexicon_state: TransitionTableIndex::ZERO,
            mutator_state: TransitionTableIndex::ZERO,
            input_state: InputIndex::ZERO,
            weight: Weight::ZERO,
            flag_state: start_state,
            surface: vec![],
            string: vec![],
        }
    }

    pub fn key(&self) -> NodeKey {
        NodeKey {
            mutator_state: self.mutator_state,
            lexicon_state: self.lexicon_state,
            input_state: self.input_state,
            flag_state: self.flag_state.clone(),
            surface: self.surface.clone(),
            string: self.string.clone(),
        }
    }

    /// Number of symbols written on either tape.
    #[inline(always)]
    pub fn path_len(&self) -> usize {
        self.surface.len().max(self.string.len())
    }

    /// Follow a lexicon arc, writing `surface` and `output`.
    #[inline(always)]
    pub fn update_lexicon(
        &self,
        surface: SymbolNumber,
        output: SymbolNumber,
        target: TransitionTableIndex,
        weight: Weight,
    ) -> TreeNode {
        let mut node = self.clone();
        push_symbol(&mut node.surface, surface);
        push_symbol(&mut node.string, output);
        node.lexicon_state = target;
        node.weight = self.weight + weight;
        node
    }

    /// Follow an error model arc that writes nothing.
    #[inline(always)]
    pub fn update_mutator(
        &self,
        next_input: InputIndex,
        target: TransitionTableIndex,
        weight: Weight,
    ) -> TreeNode {
        let mut node = self.clone();
        node.input_state = next_input;
        node.mutator_state = target;
        node.weight = self.weight + weight;
        node
    }

    /// Follow an error model arc and a lexicon arc together.
    #[allow(clippy::too_many_arguments)]
    #[inline(always)]
    pub fn update(
        &self,
        surface: SymbolNumber,
        output: SymbolNumber,
        next_input: InputIndex,
        next_mutator: TransitionTableIndex,
        next_lexicon: TransitionTableIndex,
        weight: Weight,
    ) -> TreeNode {
        let mut node = self.clone();
        push_symbol(&mut node.surface, surface);
        push_symbol(&mut node.string, output);
        node.input_state = next_input;
        node.mutator_state = next_mutator;
        node.lexicon_state = next_lexicon;
        node.weight = self.weight + weight;
        node
    }

    /// Follow a lexicon arc that writes nothing.
    #[inline(always)]
    pub fn follow(&self, target: TransitionTableIndex, weight: Weight) -> TreeNode {
        self.update_lexicon(SymbolNumber::ZERO, SymbolNumber::ZERO, target, weight)
    }

    #[inline(always)]
    fn update_flag(
        &self,
        feature: SymbolNumber,
        value: ValueNumber,
        target: TransitionTableIndex,
        weight: Weight,
    ) -> TreeNode {
        let mut node = self.follow(target, weight);
        node.flag_state[feature.0 as usize] = value;
        node
    }

    /// Follow a lexicon flag diacritic arc if the flag state allows it.
    pub fn apply_operation(
        &self,
        op: &FlagDiacriticOperation,
        target: TransitionTableIndex,
        weight: Weight,
    ) -> Option<TreeNode> {
        let feature = op.feature.0 as usize;
        let f = *self.flag_state.get(feature)?;

        match op.operation {
            FlagDiacriticOperator::PositiveSet => {
                Some(self.update_flag(op.feature, op.value, target, weight))
            }
            FlagDiacriticOperator::NegativeSet => {
                Some(self.update_flag(op.feature, op.value.invert(), target, weight))
            }
            FlagDiacriticOperator::Require => {
                let res = if op.value == ValueNumber::ZERO {
                    f != ValueNumber::ZERO
                } else {
                    f == op.value
                };

                if res {
                    Some(self.follow(target, weight))
                } else {
                    None
                }
            }
            FlagDiacriticOperator::Disallow => {
                let res = if op.value == ValueNumber::ZERO {
                    f == ValueNumber::ZERO
                } else {
                    f != op.value
                };

                if res {
                    Some(self.follow(target, weight))
                } else {
                    None
                }
            }
            FlagDiacriticOperator::Clear => {
                Some(self.update_flag(op.feature, ValueNumber::ZERO, target, weight))
            }
            FlagDiacriticOperator::Unification => {
                // if the feature is unset OR the feature is to this value already OR
                // the feature is negatively set to something else than this value
                if f == ValueNumber::ZERO || f == op.value || (f.0 < 0 && f.invert() != op.value) {
                    Some(self.update_flag(op.feature, op.value, target, weight))
                } else {
                    None
                }
            }
        }
    }
}
