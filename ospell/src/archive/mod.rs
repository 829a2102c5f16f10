//! Speller archives: a lexicon, an error model and their metadata in one file.
use memmap2::Mmap;
use std::path::Path;
use std::sync::Arc;

pub mod error;
pub mod meta;
pub mod zip;

use self::error::SpellerArchiveError;
use self::meta::SpellerMetadata;
pub use self::zip::ZipSpellerArchive;
use crate::speller::Speller;

pub(crate) struct TempMmap {
    mmap: Arc<Mmap>,

    // Not really dead, needed to drop when TempMmap drops
    _tempdir: tempfile::TempDir,
}

pub(crate) enum MmapRef {
    Direct(Arc<Mmap>),
    Temp(TempMmap),
}

impl MmapRef {
    pub fn map(&self) -> Arc<Mmap> {
        match self {
            MmapRef::Direct(mmap) => Arc::clone(mmap),
            MmapRef::Temp(tmmap) => Arc::clone(&tmmap.mmap),
        }
    }
}

pub trait SpellerArchive {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self, SpellerArchiveError>
    where
        Self: Sized;

    fn speller(&self) -> Arc<dyn Speller + Send + Sync>;
    fn metadata(&self) -> &SpellerMetadata;
}
