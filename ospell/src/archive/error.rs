use crate::speller::error::LoadError;
use crate::transducer::TransducerError;
use std::io::Error;

/// A speller archive could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum SpellerArchiveError {
    #[error("File error")]
    File(#[source] Error),

    #[error("IO error reading `{0}`")]
    Io(String, #[source] Error),

    #[error("Archive is not a valid zip file")]
    Zip(#[source] ::zip::result::ZipError),

    #[error("Invalid metadata")]
    Metadata(#[source] serde_xml_rs::Error),

    #[error("Transducer error in `{0}`")]
    Transducer(String, #[source] TransducerError),

    #[error("Error loading speller")]
    Speller(#[source] LoadError),

    #[error("Entry `{0}` is compressed; enable the `compression` feature to read it")]
    UnsupportedCompressed(String),
}

impl SpellerArchiveError {
    pub fn into_io_error(self) -> Error {
        match self {
            SpellerArchiveError::File(e) => e,
            SpellerArchiveError::Io(_, e) => e,
            SpellerArchiveError::Transducer(_, e) => e.into_io_error(),
            other => Error::new(std::io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}
