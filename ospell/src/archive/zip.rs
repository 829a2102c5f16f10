use ::zip::{CompressionMethod, ZipArchive};
use std::fs::File;
use std::io::prelude::*;
use std::io::Seek;
use std::path::Path;
use std::sync::Arc;

use log::debug;

use super::error::SpellerArchiveError;
use super::meta::SpellerMetadata;
use super::{MmapRef, SpellerArchive, TempMmap};
use crate::speller::{HfstSpeller, Speller, SpellerConfig};
use crate::transducer::hfst::HfstTransducer;
use crate::vfs::File as _;

pub type HfstZipSpeller = HfstSpeller<HfstTransducer, HfstTransducer>;

/// A `.zhfst` archive: `index.xml` plus the two transducers it names.
pub struct ZipSpellerArchive {
    metadata: SpellerMetadata,
    speller: Arc<HfstZipSpeller>,
}

fn mmap_by_name<R: Read + Seek>(
    zipfile: &File,
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<MmapRef, SpellerArchiveError> {
    let io_error = |e: std::io::Error| SpellerArchiveError::Io(name.into(), e);
    let mut index = archive.by_name(name).map_err(SpellerArchiveError::Zip)?;

    if index.compression() != CompressionMethod::Stored {
        if !cfg!(feature = "compression") {
            return Err(SpellerArchiveError::UnsupportedCompressed(name.into()));
        }

        debug!("Extracting compressed entry `{}`", name);

        let tempdir = tempfile::Builder::new()
            .prefix("ospell")
            .tempdir()
            .map_err(io_error)?;
        let outpath = tempdir.path().join(index.mangled_name());

        let mut outfile = File::create(&outpath).map_err(io_error)?;
        std::io::copy(&mut index, &mut outfile).map_err(io_error)?;

        let outfile = File::open(&outpath).map_err(io_error)?;
        let mmap = unsafe { outfile.memory_map() }.map_err(io_error)?;

        return Ok(MmapRef::Temp(TempMmap {
            mmap: Arc::new(mmap),
            _tempdir: tempdir,
        }));
    }

    let mmap = unsafe { zipfile.partial_memory_map(index.data_start(), index.size() as usize) }
        .map_err(io_error)?;

    Ok(MmapRef::Direct(Arc::new(mmap)))
}

impl ZipSpellerArchive {
    /// Open an archive, configuring the speller explicitly instead of from
    /// the model headers.
    pub fn open_with_config<P: AsRef<Path>>(
        file_path: P,
        config: Option<SpellerConfig>,
    ) -> Result<ZipSpellerArchive, SpellerArchiveError> {
        let file_path = file_path.as_ref();
        let file = File::open(file_path).map_err(SpellerArchiveError::File)?;
        let reader = std::io::BufReader::new(&file);
        let mut archive = ZipArchive::new(reader).map_err(SpellerArchiveError::Zip)?;

        // Open file a second time to get around borrow checker
        let file = File::open(file_path).map_err(SpellerArchiveError::File)?;

        let metadata_mmap = mmap_by_name(&file, &mut archive, "index.xml")?;
        let metadata = SpellerMetadata::from_bytes(&metadata_mmap.map())
            .map_err(SpellerArchiveError::Metadata)?;

        let acceptor_id = metadata.acceptor_id();
        let errmodel_id = metadata.errmodel_id();

        let acceptor_mmap = mmap_by_name(&file, &mut archive, acceptor_id)?;
        let errmodel_mmap = mmap_by_name(&file, &mut archive, errmodel_id)?;
        drop(archive);

        let acceptor = HfstTransducer::from_mapped_memory(acceptor_mmap.map())
            .map_err(|e| SpellerArchiveError::Transducer(acceptor_id.into(), e))?;
        let errmodel = HfstTransducer::from_mapped_memory(errmodel_mmap.map())
            .map_err(|e| SpellerArchiveError::Transducer(errmodel_id.into(), e))?;

        let speller =
            HfstSpeller::new(errmodel, acceptor, config).map_err(SpellerArchiveError::Speller)?;

        debug!(
            "Opened speller archive {} for locale `{}`",
            file_path.display(),
            metadata.locale()
        );

        Ok(ZipSpellerArchive { metadata, speller })
    }

    pub fn hfst_speller(&self) -> Arc<HfstZipSpeller> {
        self.speller.clone()
    }
}

impl SpellerArchive for ZipSpellerArchive {
    fn open<P: AsRef<Path>>(file_path: P) -> Result<ZipSpellerArchive, SpellerArchiveError> {
        ZipSpellerArchive::open_with_config(file_path, None)
    }

    fn speller(&self) -> Arc<dyn Speller + Send + Sync> {
        self.speller.clone()
    }

    fn metadata(&self) -> &SpellerMetadata {
        &self.metadata
    }
}
