//! Spell-checking with a lexicon and an error model.
use std::path::Path;
use std::sync::Arc;

use log::debug;
use smol_str::SmolStr;

use self::error::LoadError;
use self::suggestion::Suggestion;
use self::worker::{Dedupe, SpellerWorker};
use crate::lookup::{self, Analysis};
use crate::tokenizer::EncodedInput;
use crate::transducer::{ErrorModel, HfstTransducer, Transducer};
use crate::types::{SymbolNumber, Weight};
use crate::vfs::Fs;

pub mod config;
pub mod error;
pub mod suggestion;
mod worker;

pub use self::config::SpellerConfig;

/// Checking and correcting words.
///
/// Methods take `self: Arc<Self>` so a speller can be shared freely between
/// threads; every call is independent and never mutates the speller.
pub trait Speller {
    /// Whether the lexicon accepts `word`.
    fn spell(self: Arc<Self>, word: &str) -> bool;
    /// The lexicon's analyses of `word`, best first.
    fn lookup(self: Arc<Self>, word: &str) -> Vec<SmolStr>;
    /// Like [`Speller::lookup`], keeping the weights.
    fn analyse(self: Arc<Self>, word: &str) -> Vec<Analysis>;
    /// Corrections for `word` with the speller's own limits.
    fn suggest(self: Arc<Self>, word: &str) -> Vec<Suggestion>;
    /// Corrections for `word` with the given result count and weight limit.
    fn suggest_with(
        self: Arc<Self>,
        word: &str,
        max_results: Option<usize>,
        max_weight: Option<Weight>,
    ) -> Vec<Suggestion>;
    /// Corrections for `word` under an explicit config.
    fn suggest_with_config(self: Arc<Self>, word: &str, config: &SpellerConfig)
        -> Vec<Suggestion>;
    /// Like [`Speller::suggest`], but one result per word-form and analysis
    /// pair rather than per word-form.
    fn suggest_corrections(self: Arc<Self>, word: &str) -> Vec<Suggestion>;
}

/// A speller over two HFST optimized-lookup transducers.
#[derive(Debug)]
pub struct HfstSpeller<T: Transducer = HfstTransducer, U: Transducer = HfstTransducer> {
    mutator: ErrorModel<T>,
    lexicon: U,
    alphabet_translator: Vec<SymbolNumber>,
    config: SpellerConfig,
}

impl<T: Transducer, U: Transducer> HfstSpeller<T, U> {
    /// Put a speller together from loaded models.
    ///
    /// Without an explicit `config`, limits declared in the model headers are
    /// applied over [`SpellerConfig::default`].
    pub fn new(
        mutator: T,
        mut lexicon: U,
        config: Option<SpellerConfig>,
    ) -> Result<Arc<HfstSpeller<T, U>>, LoadError> {
        let lex = lexicon.alphabet();
        let missing = lex.missing_symbols_from(&mutator);

        if !missing.is_empty() && lex.identity().is_none() && lex.unknown().is_none() {
            return Err(LoadError::IncompatibleAlphabet { missing });
        }

        let config = config.unwrap_or_else(|| {
            SpellerConfig::from_model_properties(vec![lexicon.properties(), mutator.properties()])
        });

        let alphabet_translator = lexicon.mut_alphabet().create_translator_from(&mutator);

        debug!(
            "Speller ready: {} lexicon symbols, {} error model symbols, {:?}",
            lexicon.alphabet().initial_symbol_count(),
            mutator.alphabet().initial_symbol_count(),
            config
        );

        Ok(Arc::new(HfstSpeller {
            mutator: ErrorModel::new(mutator),
            lexicon,
            alphabet_translator,
            config,
        }))
    }

    /// Load both models from disk.
    pub fn from_paths<P: AsRef<Path>, Q: AsRef<Path>>(
        lexicon: P,
        error_model: Q,
        config: Option<SpellerConfig>,
    ) -> Result<Arc<HfstSpeller<T, U>>, LoadError> {
        let lexicon = U::from_path(&Fs, lexicon).map_err(LoadError::Lexicon)?;
        let mutator = T::from_path(&Fs, error_model).map_err(LoadError::ErrorModel)?;

        HfstSpeller::new(mutator, lexicon, config)
    }

    pub fn mutator(&self) -> &ErrorModel<T> {
        &self.mutator
    }

    pub fn lexicon(&self) -> &U {
        &self.lexicon
    }

    /// The limits used when a call does not pass its own.
    pub fn config(&self) -> &SpellerConfig {
        &self.config
    }

    fn alphabet_translator(&self) -> &Vec<SymbolNumber> {
        &self.alphabet_translator
    }

    fn run(
        self: Arc<Self>,
        word: &str,
        config: &SpellerConfig,
        dedupe: Dedupe,
    ) -> Vec<Suggestion> {
        if word.is_empty() {
            return vec![];
        }

        let input = match EncodedInput::new(self.mutator.alphabet(), word) {
            Some(input) => input,
            None => return vec![],
        };

        match SpellerWorker::new(self, input, config.clone()) {
            Some(worker) => worker.suggest(dedupe),
            None => vec![],
        }
    }
}

impl<T: Transducer, U: Transducer> Speller for HfstSpeller<T, U> {
    fn spell(self: Arc<Self>, word: &str) -> bool {
        lookup::accepts(&self.lexicon, word, self.config.max_path_factor)
    }

    fn lookup(self: Arc<Self>, word: &str) -> Vec<SmolStr> {
        self.analyse(word).into_iter().map(|a| a.value).collect()
    }

    fn analyse(self: Arc<Self>, word: &str) -> Vec<Analysis> {
        lookup::analyse(&self.lexicon, word, self.config.max_path_factor)
    }

    #[inline]
    fn suggest(self: Arc<Self>, word: &str) -> Vec<Suggestion> {
        let config = self.config.clone();
        self.run(word, &config, Dedupe::Surface)
    }

    fn suggest_with(
        self: Arc<Self>,
        word: &str,
        max_results: Option<usize>,
        max_weight: Option<Weight>,
    ) -> Vec<Suggestion> {
        let config = self
            .config
            .clone()
            .with_n_best(max_results)
            .with_max_weight(max_weight);
        self.run(word, &config, Dedupe::Surface)
    }

    #[inline]
    fn suggest_with_config(
        self: Arc<Self>,
        word: &str,
        config: &SpellerConfig,
    ) -> Vec<Suggestion> {
        self.run(word, config, Dedupe::Surface)
    }

    #[inline]
    fn suggest_corrections(self: Arc<Self>, word: &str) -> Vec<Suggestion> {
        let config = self.config.clone();
        self.run(word, &config, Dedupe::Correction)
    }
}
