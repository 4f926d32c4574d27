//! Weight loading: LCNN container, memory mapping and the weight store

pub mod lcnn;
pub mod mmap;
pub mod store;

pub use lcnn::{
    load_weights, load_weights_from_path, load_weights_with_header, read_header, LcnnHeader, WeightWriter, LCNN_MAGIC,
    LCNN_VERSION,
};
pub use mmap::MmapWeights;
pub use store::{canonical_name, WeightStore, COMPILED_MODULE_PREFIX};
