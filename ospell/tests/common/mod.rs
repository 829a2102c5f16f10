#![allow(dead_code)]

use std::sync::Arc;

use ospell::speller::{HfstSpeller, SpellerConfig};
use ospell::transducer::hfst::builder::TransducerBuilder;
use ospell::transducer::HfstTransducer;

pub type MemorySpeller = HfstSpeller<HfstTransducer<Vec<u8>>, HfstTransducer<Vec<u8>>>;

pub const LETTERS: &[&str] = &[
    "a", "b", "e", "h", "i", "j", "k", "l", "m", "n", "o", "q", "r", "s", "t", "y",
];

fn letters(word: &str) -> Vec<String> {
    word.chars().map(|c| c.to_string()).collect()
}

fn spell_out(
    b: &mut TransducerBuilder,
    from: usize,
    to: usize,
    word: &str,
    tags: &[&str],
    weight: f32,
) {
    let input = letters(word);
    let input: Vec<&str> = input.iter().map(String::as_str).collect();
    let mut output = input.clone();
    output.extend_from_slice(tags);
    b.add_path(from, to, &input, &output, weight);
}

/// A tiny Uzbek lexicon.
///
/// Verbs take `-moq` and `-ish(moq)` after `<VB>`; nouns are tagged `<NN>` and
/// a flag keeps verb suffixes off them.
pub fn lexicon() -> TransducerBuilder {
    let mut b = TransducerBuilder::new();
    let end = b.add_state();
    let verb = b.add_state();
    let verb_tag = b.add_state();
    let suffixes = b.add_state();
    let ish = b.add_state();
    let noun = b.add_state();
    let noun_tag = b.add_state();
    let noun_end = b.add_state();

    for stem in &["ket", "kel", "bor"] {
        spell_out(&mut b, 0, verb, stem, &[], 0.0);
    }
    b.add_arc(verb, verb_tag, "", "<VB>", 0.0);
    b.add_arc(verb_tag, suffixes, "@P.POS.VB@", "@P.POS.VB@", 0.0);
    b.add_path(suffixes, end, &["m", "o", "q"], &["<moq>"], 0.0);
    b.add_path(suffixes, ish, &["i", "s", "h"], &["<Ish>"], 0.0);
    b.add_path(ish, end, &["m", "o", "q"], &["<moq>"], 0.0);
    b.set_final(ish, 0.0);

    for stem in &["bola", "jala"] {
        spell_out(&mut b, 0, noun, stem, &[], 0.0);
    }
    b.add_arc(noun, noun_tag, "", "<NN>", 0.0);
    b.add_arc(noun_tag, noun_end, "@P.POS.NN@", "@P.POS.NN@", 0.0);
    b.add_arc(noun_end, suffixes, "@R.POS.VB@", "@R.POS.VB@", 0.0);
    b.set_final(noun_end, 0.0);

    spell_out(&mut b, 0, end, "nima", &["<Pron>"], 0.0);
    spell_out(&mut b, 0, end, "nima", &["<Adv>"], 1.5);
    spell_out(&mut b, 0, end, "qalaysan", &["<Interj>"], 0.0);
    b.add_path(
        0,
        end,
        &["ch", "i", "r", "o", "q"],
        &["ch", "i", "r", "o", "q", "<NN>"],
        0.0,
    );

    b.set_final(end, 0.0);
    b
}

/// One edit costs one: substitution, deletion or insertion of any letter.
pub fn error_model() -> TransducerBuilder {
    let mut b = TransducerBuilder::new();

    for x in LETTERS {
        b.add_arc(0, 0, x, x, 0.0);
    }
    for x in LETTERS {
        for y in LETTERS {
            if x != y {
                b.add_arc(0, 0, x, y, 1.0);
            }
        }
        b.add_arc(0, 0, x, "", 1.0);
        b.add_arc(0, 0, "", x, 1.0);
    }

    b.set_final(0, 0.0);
    b
}

pub fn speller_with(config: Option<SpellerConfig>) -> Arc<MemorySpeller> {
    HfstSpeller::new(
        error_model().build().unwrap(),
        lexicon().build().unwrap(),
        config,
    )
    .unwrap()
}

pub fn speller() -> Arc<MemorySpeller> {
    speller_with(None)
}
