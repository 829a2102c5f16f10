//! Exact lookup: every analysis a transducer gives a word.
use std::cmp::Ordering;

use hashbrown::HashMap;
use log::trace;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::constants::{DEFAULT_MAX_PATH_FACTOR, MIN_PATH_LENGTH};
use crate::tokenizer::EncodedInput;
use crate::transducer::tree_node::{NodeKey, TreeNode};
use crate::transducer::Transducer;
use crate::types::{SymbolNumber, ValueNumber, Weight};

/// An output string of a transducer with the weight of its best path.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Analysis {
    pub value: SmolStr,
    pub weight: Weight,
}

impl Analysis {
    pub fn new(value: SmolStr, weight: Weight) -> Analysis {
        Analysis { value, weight }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }
}

impl PartialOrd for Analysis {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Analysis {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialEq for Analysis {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.weight == other.weight
    }
}

impl Eq for Analysis {}

/// Depth-first walk of one transducer over one encoded word.
pub(crate) struct LookupWorker<'t, T: Transducer> {
    transducer: &'t T,
    input: EncodedInput,
    max_depth: usize,
}

impl<'t, T: Transducer> LookupWorker<'t, T> {
    pub(crate) fn new(transducer: &'t T, input: EncodedInput, max_path_factor: usize) -> Self {
        let max_depth = ((input.len() + 1) * max_path_factor).max(MIN_PATH_LENGTH);

        LookupWorker {
            transducer,
            input,
            max_depth,
        }
    }

    /// Calls `visit` with every accepting path and its total weight until it
    /// returns `true`. Returns whether the walk was stopped that way.
    pub(crate) fn traverse<F>(&self, mut visit: F) -> bool
    where
        F: FnMut(&TreeNode, Weight) -> bool,
    {
        let size = self.transducer.alphabet().state_size().0 as usize;
        let mut stack = vec![(TreeNode::empty(vec![ValueNumber::ZERO; size]), 0usize)];
        let mut seen: HashMap<NodeKey, (Weight, usize)> = HashMap::new();
        let mut truncated = 0usize;

        while let Some((node, depth)) = stack.pop() {
            // A node already reached no heavier and no deeper has the same future
            match seen.get(&node.key()) {
                Some((w, d)) if *w <= node.weight && *d <= depth => continue,
                _ => {
                    seen.insert(node.key(), (node.weight, depth));
                }
            }

            if node.input_state.as_usize() == self.input.len() {
                if let Some(w) = self.transducer.final_weight_of(node.lexicon_state) {
                    if visit(&node, node.weight + w) {
                        return true;
                    }
                }
            }

            if depth >= self.max_depth {
                truncated += 1;
                continue;
            }

            self.epsilons(&node, depth, &mut stack);
            self.consume(&node, depth, &mut stack);
        }

        if truncated > 0 {
            trace!("lookup cut {} paths at depth {}", truncated, self.max_depth);
        }

        false
    }

    fn epsilons(&self, node: &TreeNode, depth: usize, stack: &mut Vec<(TreeNode, usize)>) {
        let operations = self.transducer.alphabet().operations();

        for arc in self.transducer.transitions(node.lexicon_state, SymbolNumber::ZERO) {
            if arc.input == SymbolNumber::ZERO {
                let next =
                    node.update_lexicon(SymbolNumber::ZERO, arc.output, arc.target, arc.weight);
                stack.push((next, depth + 1));
            } else if let Some(op) = operations.get(&arc.input) {
                if let Some(next) = node.apply_operation(op, arc.target, arc.weight) {
                    stack.push((next, depth + 1));
                }
            }
        }
    }

    fn consume(&self, node: &TreeNode, depth: usize, stack: &mut Vec<(TreeNode, usize)>) {
        let sym = match self.input.symbols.get(node.input_state.as_usize()) {
            Some(sym) => *sym,
            None => return,
        };

        let alphabet = self.transducer.alphabet();
        let next_input = node.input_state.incr(1);
        let mut push = |input: SymbolNumber| {
            for arc in self.transducer.transitions(node.lexicon_state, input) {
                let output = if Some(arc.output) == alphabet.identity() {
                    sym
                } else {
                    arc.output
                };

                let next = node.update(
                    sym,
                    output,
                    next_input,
                    node.mutator_state,
                    arc.target,
                    arc.weight,
                );
                stack.push((next, depth + 1));
            }
        };

        if self.input.extra_symbol(sym).is_none() {
            push(sym);
            return;
        }

        // Not in the alphabet: only identity and unknown arcs can take it
        if let Some(identity) = alphabet.identity() {
            push(identity);
        }
        if let Some(unknown) = alphabet.unknown() {
            push(unknown);
        }
    }

    pub(crate) fn render(&self, node: &TreeNode) -> SmolStr {
        self.transducer
            .alphabet()
            .string_from_symbols(&node.string, &self.input.extra)
    }
}

/// All analyses of `word`, best first; distinct outputs keep their lowest weight.
pub fn analyse<T: Transducer>(
    transducer: &T,
    word: &str,
    max_path_factor: usize,
) -> Vec<Analysis> {
    let input = match EncodedInput::new(transducer.alphabet(), word) {
        Some(input) => input,
        None => return vec![],
    };

    let worker = LookupWorker::new(transducer, input, max_path_factor);
    let mut best: HashMap<SmolStr, Weight> = HashMap::new();

    worker.traverse(|node, weight| {
        let entry = best.entry(worker.render(node)).or_insert(weight);
        if weight < *entry {
            *entry = weight;
        }
        false
    });

    let mut analyses: Vec<Analysis> = best
        .into_iter()
        .map(|(value, weight)| Analysis::new(value, weight))
        .collect();
    analyses.sort();
    analyses
}

/// Whether `word` has at least one analysis.
pub fn accepts<T: Transducer>(transducer: &T, word: &str, max_path_factor: usize) -> bool {
    match EncodedInput::new(transducer.alphabet(), word) {
        Some(input) => {
            LookupWorker::new(transducer, input, max_path_factor).traverse(|_, _| true)
        }
        None => false,
    }
}

/// Output strings of [`analyse`] with the default path limit.
pub fn lookup<T: Transducer>(transducer: &T, word: &str) -> Vec<SmolStr> {
    analyse(transducer, word, DEFAULT_MAX_PATH_FACTOR)
        .into_iter()
        .map(|a| a.value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transducer::alphabet::IDENTITY_SYMBOL;
    use crate::transducer::hfst::builder::TransducerBuilder;

    fn verbs() -> (TransducerBuilder, usize) {
        let mut b = TransducerBuilder::new();
        let stem = b.add_state();
        let verb = b.add_state();
        let end = b.add_state();

        b.add_path(0, stem, &["k", "e", "t"], &["k", "e", "t"], 0.0);
        b.add_arc(stem, verb, "@P.POS.VB@", "@P.POS.VB@", 0.0);
        b.add_path(verb, end, &["m", "o", "q"], &["<VB><moq>"], 0.0);
        b.add_arc(0, end, "ch", "<ch>", 2.0);
        b.add_arc(0, end, "ch", "<CH>", 1.0);
        b.add_arc(0, end, "ch", "<ch>", 0.5);
        b.set_final(end, 0.25);
        (b, end)
    }

    #[test]
    fn finds_analyses_in_weight_order() {
        let t = verbs().0.build().unwrap();

        assert_eq!(lookup(&t, "ketmoq"), vec!["ket<VB><moq>"]);

        let ch = analyse(&t, "ch", DEFAULT_MAX_PATH_FACTOR);
        assert_eq!(ch.len(), 2);
        assert_eq!(ch[0], Analysis::new("<ch>".into(), Weight(0.75)));
        assert_eq!(ch[1], Analysis::new("<CH>".into(), Weight(1.25)));
    }

    #[test]
    fn rejects_partial_and_unknown_input() {
        let t = verbs().0.build().unwrap();

        assert!(lookup(&t, "ket").is_empty());
        assert!(lookup(&t, "chmo").is_empty());
        assert!(lookup(&t, "ketmoqx").is_empty());
        assert!(lookup(&t, "").is_empty());
        assert!(!accepts(&t, "ketmo", DEFAULT_MAX_PATH_FACTOR));
        assert!(accepts(&t, "ketmoq", DEFAULT_MAX_PATH_FACTOR));
    }

    #[test]
    fn flags_block_paths() {
        let (mut b, end) = verbs();
        let noun = b.add_state();
        let verb_suffix = b.add_state();
        let noun_suffix = b.add_state();
        b.add_path(0, noun, &["b", "o", "l", "a"], &["b", "o", "l", "a"], 0.0);
        b.add_arc(noun, verb_suffix, "@R.POS.VB@", "@R.POS.VB@", 0.0);
        b.add_path(verb_suffix, end, &["m", "o", "q"], &[], 0.0);
        b.add_arc(noun, noun_suffix, "@P.POS.NN@", "@P.POS.NN@", 0.0);
        b.add_path(noun_suffix, end, &["s", "h"], &["<sh>"], 0.0);
        let t = b.build().unwrap();

        assert!(lookup(&t, "bolamoq").is_empty());
        assert_eq!(lookup(&t, "bolash"), vec!["bola<sh>"]);
    }

    #[test]
    fn identity_arcs_copy_unknown_symbols() {
        let mut b = TransducerBuilder::new();
        b.add_arc(0, 0, IDENTITY_SYMBOL, IDENTITY_SYMBOL, 1.0);
        b.add_arc(0, 0, "a", "A", 0.0);
        b.set_final(0, 0.0);
        let t = b.build().unwrap();

        let result = analyse(&t, "xax", DEFAULT_MAX_PATH_FACTOR);
        assert_eq!(result, vec![Analysis::new("xAx".into(), Weight(2.0))]);
    }

    #[test]
    fn repeated_epsilon_and_flag_loops_finish() {
        let mut b = TransducerBuilder::new();
        b.add_arc(0, 0, "", "", 0.0);
        b.add_arc(0, 0, "", "", 0.5);
        b.add_arc(0, 0, "", "", 1.0);
        b.add_arc(0, 0, "@P.CASE.NOM@", "@P.CASE.NOM@", 0.0);
        b.add_arc(0, 0, "@C.CASE@", "@C.CASE@", 0.0);
        b.add_arc(0, 1, "a", "a", 0.25);
        b.add_arc(1, 1, "", "", 0.0);
        b.add_arc(1, 1, "", "", 2.0);
        b.set_final(1, 0.0);
        let t = b.build().unwrap();

        assert_eq!(analyse(&t, "a", 1), vec![Analysis::new("a".into(), Weight(0.25))]);
        assert_eq!(lookup(&t, "a"), vec!["a"]);
        assert!(accepts(&t, "a", 1));
        assert!(!accepts(&t, "b", 1));
        assert!(lookup(&t, "aa").is_empty());
    }

    #[test]
    fn epsilon_cycles_terminate() {
        let mut b = TransducerBuilder::new();
        b.add_arc(0, 0, "", "x", 0.0);
        b.add_arc(0, 1, "a", "a", 0.0);
        b.set_final(1, 0.0);
        let t = b.build().unwrap();

        let result = lookup(&t, "a");
        assert!(result.contains(&SmolStr::from("a")));
        assert!(result.contains(&SmolStr::from("xa")));
        assert!(result.iter().all(|s| s.len() <= MIN_PATH_LENGTH + 1));
    }
}
