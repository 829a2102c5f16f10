//! Minimal filesystem and memory abstraction for loading transducers.
//!
//! Transducer tables are read through [`Memory`], so the same code serves
//! memory-mapped model files and transducers assembled in memory.
use byteorder::{ByteOrder, LittleEndian};
use memmap2::{Mmap, MmapOptions};
use std::fmt::Debug;
use std::io::{Read, Result};
use std::path::Path;

/// Something that can open files by path.
pub trait Filesystem {
    type File: File;

    fn open<P: AsRef<Path>>(&self, path: P) -> Result<Self::File>;
}

/// An open file that can be memory mapped.
pub trait File: Read + Debug {
    fn len(&self) -> Result<u64>;
    fn is_empty(&self) -> Result<bool>;

    /// Map the whole file.
    ///
    /// # Safety
    ///
    /// The file must not be truncated or modified while the map is alive.
    unsafe fn memory_map(&self) -> Result<Mmap>;

    /// Map `len` bytes starting at `offset`.
    ///
    /// # Safety
    ///
    /// Same as [`File::memory_map`].
    unsafe fn partial_memory_map(&self, offset: u64, len: usize) -> Result<Mmap>;
}

impl File for std::fs::File {
    fn len(&self) -> Result<u64> {
        self.metadata().map(|m| m.len())
    }

    fn is_empty(&self) -> Result<bool> {
        self.len().map(|x| x == 0)
    }

    unsafe fn memory_map(&self) -> Result<Mmap> {
        MmapOptions::new().map(self)
    }

    unsafe fn partial_memory_map(&self, offset: u64, len: usize) -> Result<Mmap> {
        MmapOptions::new().offset(offset).len(len).map(self)
    }
}

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fs;

impl Filesystem for Fs {
    type File = std::fs::File;

    #[inline(always)]
    fn open<P: AsRef<Path>>(&self, path: P) -> Result<Self::File> {
        std::fs::File::open(&path)
    }
}

/// Little-endian reads from a byte store.
///
/// Offsets are validated against [`Memory::byte_len`] when a transducer is
/// loaded; reads past the end panic.
pub trait Memory: Send + Sync + Sized {
    /// Bring an open file into memory.
    fn load<F: File>(file: &mut F) -> Result<Self>;
    fn byte_len(&self) -> usize;
    fn bytes(&self) -> &[u8];

    #[inline(always)]
    fn read_u16_at(&self, offset: usize) -> u16 {
        LittleEndian::read_u16(&self.bytes()[offset..offset + 2])
    }

    #[inline(always)]
    fn read_u32_at(&self, offset: usize) -> u32 {
        LittleEndian::read_u32(&self.bytes()[offset..offset + 4])
    }

    #[inline(always)]
    fn read_f32_at(&self, offset: usize) -> f32 {
        LittleEndian::read_f32(&self.bytes()[offset..offset + 4])
    }
}

impl Memory for Mmap {
    fn load<F: File>(file: &mut F) -> Result<Self> {
        unsafe { file.memory_map() }
    }

    #[inline(always)]
    fn byte_len(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl Memory for Vec<u8> {
    fn load<F: File>(file: &mut F) -> Result<Self> {
        let mut buf = Vec::with_capacity(file.len()? as usize);
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    #[inline(always)]
    fn byte_len(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn bytes(&self) -> &[u8] {
        self
    }
}
