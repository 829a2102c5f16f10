use smol_str::SmolStr;

use crate::transducer::TransducerError;

/// A speller could not be put together from its models.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to load lexicon")]
    Lexicon(#[source] TransducerError),
    #[error("Failed to load error model")]
    ErrorModel(#[source] TransducerError),
    #[error("Error model writes symbols the lexicon cannot read: {}", .missing.join(", "))]
    IncompatibleAlphabet { missing: Vec<SmolStr> },
}
