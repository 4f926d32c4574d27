//! Memory-mapped weight file
//!
//! The weight file is mapped read-only and parsed straight out of the
//! mapping, so the only copy of the parameter data is the decoded `f32`
//! buffers.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{io_context, LiteCnnResult};

/// Read-only mapping of a weight file
///
/// `MmapWeights` is `Send + Sync` because `memmap2::Mmap` is, and only
/// shared access to the mapped bytes is exposed.
#[derive(Debug)]
pub struct MmapWeights {
    _file: File,
    mmap: Mmap,
}

impl MmapWeights {
    /// Open and memory-map a weight file
    pub fn open(path: &Path) -> LiteCnnResult<Self> {
        tracing::debug!("Memory-mapping weight file {:?}", path);

        let file = File::open(path)
            .map_err(|e| io_context(e, &format!("opening weight file '{}'", path.display())))?;

        // SAFETY: the mapping is read-only and never outlives `file`. Truncating
        // the file underneath a running process is outside what we support.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            io_context(e, &format!("memory-mapping weight file '{}'", path.display()))
        })?;

        tracing::debug!("Mapped weight file: {} bytes", mmap.len());

        Ok(Self { _file: file, mmap })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }
}
