//! LCNN binary weight container
//!
//! Layout (all integers little-endian `u32`, all values little-endian `f32`):
//!
//! ```text
//! magic    "LCNN"
//! version  u32
//! count    u32
//! count × {
//!     name_len u32, name (UTF-8, name_len bytes),
//!     ndim u32, dims ndim × u32,
//!     data product(dims) × f32, row-major
//! }
//! ```
//!
//! Decoding is single-pass and all-or-nothing: any short read or malformed
//! field fails the whole load and no partial store is returned.

use std::io::Write;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{io_context, LiteCnnError, LiteCnnResult};
use crate::format_error;
use crate::loader::mmap::MmapWeights;
use crate::loader::store::WeightStore;
use crate::tensor::{checked_element_count, Tensor};

/// File magic
pub const LCNN_MAGIC: [u8; 4] = *b"LCNN";

/// Version written by [`WeightWriter`]
pub const LCNN_VERSION: u32 = 1;

const U32_BYTES: usize = 4;
const F32_BYTES: usize = 4;

/// Fixed-size file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LcnnHeader {
    pub version: u32,
    pub count: u32,
}

/// Bounds-checked little-endian cursor over a byte slice
struct WeightReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WeightReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        WeightReader { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Take `len` bytes, or fail before allocating anything
    fn take(&mut self, len: usize, what: &str) -> LiteCnnResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(LiteCnnError::TruncatedWeightFile {
                what: what.to_string(),
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &str) -> LiteCnnResult<u32> {
        Ok(LittleEndian::read_u32(self.take(U32_BYTES, what)?))
    }

    fn read_header(&mut self) -> LiteCnnResult<LcnnHeader> {
        let found = &self.bytes[..self.bytes.len().min(LCNN_MAGIC.len())];
        if found != LCNN_MAGIC {
            return Err(LiteCnnError::InvalidMagic {
                expected: LCNN_MAGIC,
                found: found.to_vec(),
            });
        }
        self.take(LCNN_MAGIC.len(), "magic")?;

        let version = self.read_u32("version")?;
        let count = self.read_u32("parameter count")?;
        Ok(LcnnHeader { version, count })
    }

    fn read_entry(&mut self, index: u32) -> LiteCnnResult<(String, Tensor)> {
        let name_len = self.read_u32("name length")? as usize;
        let raw_name = self.take(name_len, "parameter name")?;
        let name = std::str::from_utf8(raw_name)
            .map_err(|e| format_error!("parameter {} name is not valid UTF-8: {}", index, e))?
            .to_string();

        let ndim = self.read_u32("dimension count")? as usize;
        let dim_bytes = ndim
            .checked_mul(U32_BYTES)
            .ok_or_else(|| format_error!("parameter '{}' has too many dimensions: {}", name, ndim))?;
        let raw_dims = self.take(dim_bytes, "dimensions")?;
        let shape: Vec<usize> = raw_dims
            .chunks_exact(U32_BYTES)
            .map(|d| LittleEndian::read_u32(d) as usize)
            .collect();

        let count = checked_element_count(&shape)
            .map_err(|_| format_error!("parameter '{}' shape {:?} overflows", name, shape))?;
        let data_bytes = count
            .checked_mul(F32_BYTES)
            .ok_or_else(|| format_error!("parameter '{}' shape {:?} overflows", name, shape))?;
        let raw_data = self.take(data_bytes, "tensor data")?;

        let mut data = vec![0.0f32; count];
        LittleEndian::read_f32_into(raw_data, &mut data);

        let tensor = Tensor::from_vec(&shape, data)?;
        tracing::debug!("Loaded parameter '{}' {:?}", name, shape);
        Ok((name, tensor))
    }
}

/// Read only the header of an LCNN buffer
pub fn read_header(bytes: &[u8]) -> LiteCnnResult<LcnnHeader> {
    WeightReader::new(bytes).read_header()
}

/// Decode an LCNN buffer into a [`WeightStore`]
pub fn load_weights(bytes: &[u8]) -> LiteCnnResult<WeightStore> {
    let mut reader = WeightReader::new(bytes);
    let header = reader.read_header()?;
    tracing::debug!(
        "LCNN header: version {}, {} parameters",
        header.version,
        header.count
    );

    let mut store = WeightStore::default().with_version(header.version);
    for index in 0..header.count {
        let (name, tensor) = reader.read_entry(index)?;
        store.insert(&name, tensor);
    }

    if reader.remaining() > 0 {
        tracing::warn!(
            "Ignoring {} trailing bytes after {} parameters",
            reader.remaining(),
            header.count
        );
    }

    tracing::info!(
        "Loaded {} weight tensors ({} values, format version {})",
        store.len(),
        store.parameter_count(),
        header.version
    );
    Ok(store)
}

/// Memory-map a weight file and decode it
pub fn load_weights_from_path(path: impl AsRef<Path>) -> LiteCnnResult<WeightStore> {
    let path = path.as_ref();
    let mmap = MmapWeights::open(path)?;
    tracing::info!("Loading weights from {} ({} bytes)", path.display(), mmap.len());
    load_weights(mmap.as_bytes())
}

/// Map a weight file once and return both its header and decoded contents
pub fn load_weights_with_header(
    path: impl AsRef<Path>,
) -> LiteCnnResult<(LcnnHeader, WeightStore)> {
    let mmap = MmapWeights::open(path.as_ref())?;
    let bytes = mmap.as_bytes();
    let header = read_header(bytes)?;
    let store = load_weights(bytes)?;
    Ok((header, store))
}

/// Serializer for the LCNN layout
///
/// Entries are written in insertion order, so duplicate names keep the
/// reader's last-write-wins behavior.
#[derive(Debug, Default)]
pub struct WeightWriter {
    version: u32,
    entries: Vec<(String, Tensor)>,
}

impl WeightWriter {
    pub fn new() -> Self {
        WeightWriter {
            version: LCNN_VERSION,
            entries: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn add(&mut self, name: impl Into<String>, tensor: Tensor) -> &mut Self {
        self.entries.push((name.into(), tensor));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize into any writer
    pub fn write_to<W: Write>(&self, mut out: W) -> LiteCnnResult<()> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| format_error!("too many parameters: {}", self.entries.len()))?;

        out.write_all(&LCNN_MAGIC)?;
        out.write_u32::<LittleEndian>(self.version)?;
        out.write_u32::<LittleEndian>(count)?;

        for (name, tensor) in &self.entries {
            out.write_u32::<LittleEndian>(to_u32(name.len(), name)?)?;
            out.write_all(name.as_bytes())?;
            out.write_u32::<LittleEndian>(to_u32(tensor.rank(), name)?)?;
            for &dim in tensor.shape() {
                out.write_u32::<LittleEndian>(to_u32(dim, name)?)?;
            }
            for &v in tensor.data() {
                out.write_f32::<LittleEndian>(v)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> LiteCnnResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> LiteCnnResult<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .map_err(|e| io_context(e, &format!("creating weight file '{}'", path.display())))?;
        self.write_to(std::io::BufWriter::new(file))
    }
}

fn to_u32(value: usize, name: &str) -> LiteCnnResult<u32> {
    u32::try_from(value)
        .map_err(|_| format_error!("parameter '{}': value {} does not fit in u32", name, value))
}
