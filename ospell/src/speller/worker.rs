use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use itertools::Itertools;
use log::{trace, warn};
use smol_str::SmolStr;

use super::{HfstSpeller, SpellerConfig};
use crate::constants::MIN_PATH_LENGTH;
use crate::speller::suggestion::Suggestion;
use crate::tokenizer::EncodedInput;
use crate::transducer::tree_node::{NodeKey, TreeNode};
use crate::transducer::Transducer;
use crate::types::{SymbolNumber, TransitionTableIndex, ValueNumber, Weight};

const MAX_ITERATIONS: usize = 10_000_000;

/// How finished paths are merged into results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dedupe {
    /// One result per corrected word-form.
    Surface,
    /// One result per word-form and analysis pair.
    Correction,
}

/// A heap entry. Finished paths carry their final weights and sort ahead of
/// unfinished ones of equal weight.
#[derive(Debug, PartialEq, Eq)]
struct Queued {
    node: TreeNode,
    goal: bool,
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.node
            .weight
            .total_cmp(&other.node.weight)
            .then_with(|| other.goal.cmp(&self.goal))
            .then_with(|| self.node.cmp(&other.node))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The priority queue with the cheapest weight seen for every node key.
struct Frontier {
    heap: BinaryHeap<Reverse<Queued>>,
    best: HashMap<NodeKey, Weight>,
}

impl Frontier {
    fn new() -> Frontier {
        Frontier {
            heap: BinaryHeap::with_capacity(256),
            best: HashMap::new(),
        }
    }

    fn push(&mut self, node: TreeNode, limit: Weight) {
        if node.weight > limit {
            return;
        }

        let key = node.key();
        if let Some(w) = self.best.get(&key) {
            if *w <= node.weight {
                return;
            }
        }

        self.best.insert(key, node.weight);
        self.heap.push(Reverse(Queued { node, goal: false }));
    }

    fn push_goal(&mut self, node: TreeNode, limit: Weight) {
        if node.weight <= limit {
            self.heap.push(Reverse(Queued { node, goal: true }));
        }
    }

    fn is_stale(&self, node: &TreeNode) -> bool {
        match self.best.get(&node.key()) {
            Some(w) => *w < node.weight,
            None => false,
        }
    }
}

/// Best-first search over the error model composed with the lexicon.
///
/// Input symbols are numbered in the error model's alphabet. Symbols neither
/// alphabet knows are numbered past the end of the lexicon's alphabet for the
/// lifetime of the worker.
pub(crate) struct SpellerWorker<T: Transducer, U: Transducer> {
    speller: Arc<HfstSpeller<T, U>>,
    input: EncodedInput,
    extra_symbols: Vec<SymbolNumber>,
    config: SpellerConfig,
    max_path_len: usize,
}

impl<T: Transducer, U: Transducer> SpellerWorker<T, U> {
    pub(crate) fn new(
        speller: Arc<HfstSpeller<T, U>>,
        input: EncodedInput,
        config: SpellerConfig,
    ) -> Option<SpellerWorker<T, U>> {
        let lexicon = speller.lexicon().alphabet();
        let base = lexicon.key_table().len();

        if base + input.extra.len() >= u16::MAX as usize {
            return None;
        }

        let extra_symbols = input
            .extra
            .iter()
            .enumerate()
            .map(|(i, s)| match lexicon.input_symbol(s) {
                Some(sym) => sym,
                None => SymbolNumber((base + i) as u16),
            })
            .collect();

        let max_path_len = ((input.len() + 1) * config.max_path_factor).max(MIN_PATH_LENGTH);

        Some(SpellerWorker {
            speller,
            input,
            extra_symbols,
            config,
            max_path_len,
        })
    }

    /// The lexicon symbol for an error model symbol.
    #[inline(always)]
    fn translate(&self, sym: SymbolNumber) -> SymbolNumber {
        let translator = self.speller.alphabet_translator();

        match translator.get(sym.0 as usize) {
            Some(s) => *s,
            None => (sym.0 as usize)
                .checked_sub(self.input.base)
                .and_then(|i| self.extra_symbols.get(i))
                .copied()
                .unwrap_or(SymbolNumber::MAX),
        }
    }

    #[inline(always)]
    fn lexicon_epsilons(&self, frontier: &mut Frontier, limit: Weight, next_node: &TreeNode) {
        let lexicon = self.speller.lexicon();
        let operations = lexicon.alphabet().operations();

        for arc in lexicon.transitions(next_node.lexicon_state, SymbolNumber::ZERO) {
            if arc.input == SymbolNumber::ZERO {
                let node =
                    next_node.update_lexicon(SymbolNumber::ZERO, arc.output, arc.target, arc.weight);
                frontier.push(node, limit);
            } else if let Some(op) = operations.get(&arc.input) {
                if let Some(node) = next_node.apply_operation(op, arc.target, arc.weight) {
                    frontier.push(node, limit);
                }
            }
        }
    }

    #[inline(always)]
    fn mutator_epsilons(&self, frontier: &mut Frontier, limit: Weight, next_node: &TreeNode) {
        let mutator = self.speller.mutator();

        for arc in mutator.transitions(next_node.mutator_state, SymbolNumber::ZERO) {
            // Flags carry no meaning in an error model; follow them as epsilons.
            if arc.output == SymbolNumber::ZERO || mutator.alphabet().is_flag(arc.input) {
                let node = next_node.update_mutator(next_node.input_state, arc.target, arc.weight);
                frontier.push(node, limit);
                continue;
            }

            self.queue_lexicon_arcs(
                frontier,
                limit,
                next_node,
                self.translate(arc.output),
                arc.target,
                arc.weight,
                0,
            );
        }
    }

    /// Follow every lexicon arc reading `input_sym`, together with an error
    /// model arc that wrote it.
    #[allow(clippy::too_many_arguments)]
    #[inline(always)]
    fn queue_lexicon_arcs(
        &self,
        frontier: &mut Frontier,
        limit: Weight,
        next_node: &TreeNode,
        input_sym: SymbolNumber,
        mutator_state: TransitionTableIndex,
        mutator_weight: Weight,
        input_increment: u32,
    ) {
        let lexicon = self.speller.lexicon();
        let alphabet = lexicon.alphabet();
        let identity = alphabet.identity();
        let next_input = next_node.input_state.incr(input_increment);

        let mut follow = |arc_sym: SymbolNumber| {
            for arc in lexicon.transitions(next_node.lexicon_state, arc_sym) {
                // Symbol replacement here is unfortunate but necessary.
                let output = if Some(arc.output) == identity {
                    input_sym
                } else {
                    arc.output
                };

                let node = next_node.update(
                    input_sym,
                    output,
                    next_input,
                    mutator_state,
                    arc.target,
                    mutator_weight + arc.weight,
                );
                frontier.push(node, limit);
            }
        };

        if input_sym < alphabet.initial_symbol_count() {
            follow(input_sym);
            return;
        }

        // this input was not originally in the alphabet, so unknown or identity may apply
        if let Some(unknown) = alphabet.unknown() {
            follow(unknown);
        }
        if let Some(identity) = identity {
            follow(identity);
        }
    }

    /// Follow every error model arc reading `arc_sym`, which stands for the
    /// input symbol `input_sym`.
    #[inline(always)]
    fn queue_mutator_arcs(
        &self,
        frontier: &mut Frontier,
        limit: Weight,
        next_node: &TreeNode,
        arc_sym: SymbolNumber,
        input_sym: SymbolNumber,
    ) {
        let mutator = self.speller.mutator();
        let identity = mutator.alphabet().identity();

        for arc in mutator.transitions(next_node.mutator_state, arc_sym) {
            let output = if Some(arc.output) == identity {
                input_sym
            } else {
                arc.output
            };

            if output == SymbolNumber::ZERO {
                let node = next_node.update_mutator(
                    next_node.input_state.incr(1),
                    arc.target,
                    arc.weight,
                );
                frontier.push(node, limit);
                continue;
            }

            self.queue_lexicon_arcs(
                frontier,
                limit,
                next_node,
                self.translate(output),
                arc.target,
                arc.weight,
                1,
            );
        }
    }

    #[inline(always)]
    fn consume_input(&self, frontier: &mut Frontier, limit: Weight, next_node: &TreeNode) {
        let mutator = self.speller.mutator();
        let input_sym = match self.input.symbols.get(next_node.input_state.as_usize()) {
            Some(sym) => *sym,
            None => return,
        };

        if input_sym < mutator.alphabet().initial_symbol_count() {
            self.queue_mutator_arcs(frontier, limit, next_node, input_sym, input_sym);
            return;
        }

        if let Some(identity) = mutator.alphabet().identity() {
            self.queue_mutator_arcs(frontier, limit, next_node, identity, input_sym);
        }

        // Check for unknown transition
        if let Some(unknown) = mutator.alphabet().unknown() {
            self.queue_mutator_arcs(frontier, limit, next_node, unknown, input_sym);
        }
    }

    /// The weight above which nothing can make it into the results any more.
    #[inline(always)]
    fn update_weight_limit(&self, best_weight: Option<Weight>, accepted: &[Weight]) -> Weight {
        let c = &self.config;
        let mut max_weight = c.max_weight.unwrap_or(Weight::INFINITE);

        if let (Some(beam), Some(best)) = (c.beam, best_weight) {
            max_weight = max_weight.min(best + beam);
        }

        if let Some(n) = c.n_best {
            if n > 0 && accepted.len() >= n {
                max_weight = max_weight.min(accepted[n - 1]);
            }
        }

        max_weight
    }

    #[inline(always)]
    fn state_size(&self) -> usize {
        self.speller.lexicon().alphabet().state_size().0 as usize
    }

    fn deadline(&self) -> Option<Instant> {
        let seconds = self.config.time_limit?;

        if seconds.is_finite() && seconds >= 0.0 {
            Some(Instant::now() + Duration::from_secs_f32(seconds))
        } else {
            None
        }
    }

    fn finish(&self, node: &TreeNode) -> Option<Weight> {
        if node.input_state.as_usize() != self.input.len() {
            return None;
        }

        let m = self.speller.mutator().final_weight_of(node.mutator_state)?;
        let l = self.speller.lexicon().final_weight_of(node.lexicon_state)?;
        Some(node.weight + m + l)
    }

    pub(crate) fn suggest(&self, dedupe: Dedupe) -> Vec<Suggestion> {
        trace!("Beginning suggest");

        if self.config.n_best == Some(0) {
            return vec![];
        }

        let lexicon = self.speller.lexicon().alphabet();
        let deadline = self.deadline();
        let mut frontier = Frontier::new();
        let mut corrections: HashMap<(SmolStr, Option<SmolStr>), (Weight, SmolStr)> =
            HashMap::new();
        let mut accepted: Vec<Weight> = vec![];
        let mut best_weight: Option<Weight> = None;
        let mut iteration_count = 0usize;

        let start = TreeNode::empty(vec![ValueNumber::ZERO; self.state_size()]);
        frontier.push(start, self.update_weight_limit(None, &accepted));

        while let Some(Reverse(Queued { node, goal })) = frontier.heap.pop() {
            iteration_count += 1;

            if iteration_count >= MAX_ITERATIONS {
                warn!("{:?}: iteration count at {}", self.input.symbols, iteration_count);
                warn!("Node count: {}", frontier.heap.len());
                break;
            }

            if deadline.map_or(false, |d| Instant::now() >= d) {
                trace!("Time limit reached after {} iterations", iteration_count);
                break;
            }

            let limit = self.update_weight_limit(best_weight, &accepted);

            if node.weight > limit {
                break;
            }

            if goal {
                let value = lexicon.string_from_symbols(&node.surface, &self.input.extra);
                let analysis = lexicon.string_from_symbols(&node.string, &self.input.extra);
                let key = match dedupe {
                    Dedupe::Surface => (value, None),
                    Dedupe::Correction => (value, Some(analysis.clone())),
                };

                match corrections.get_mut(&key) {
                    // Popped in weight order, so only an equal weight can still compete
                    Some(entry) => {
                        if entry.0 == node.weight && analysis < entry.1 {
                            entry.1 = analysis;
                        }
                    }
                    None => {
                        corrections.insert(key, (node.weight, analysis));
                        accepted.push(node.weight);
                        best_weight.get_or_insert(node.weight);
                    }
                }

                continue;
            }

            if frontier.is_stale(&node) {
                continue;
            }

            if let Some(weight) = self.finish(&node) {
                let mut finished = node.clone();
                finished.weight = weight;
                frontier.push_goal(finished, limit);
            }

            if node.path_len() >= self.max_path_len {
                continue;
            }

            self.lexicon_epsilons(&mut frontier, limit, &node);
            self.mutator_epsilons(&mut frontier, limit, &node);
            self.consume_input(&mut frontier, limit, &node);
        }

        trace!(
            "Finished suggest after {} iterations with {} results",
            iteration_count,
            corrections.len()
        );

        corrections
            .into_iter()
            .map(|((value, _), (weight, analysis))| Suggestion::new(value, analysis, weight))
            .sorted()
            .take(self.config.n_best.unwrap_or(usize::MAX))
            .collect()
    }
}
