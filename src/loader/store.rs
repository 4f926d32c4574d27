//! Immutable name → tensor mapping

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{LiteCnnError, LiteCnnResult};
use crate::tensor::Tensor;

/// Prefix added by `torch.compile` to every parameter of a compiled module
pub const COMPILED_MODULE_PREFIX: &str = "_orig_mod.";

/// Strip the compiled-module prefix, if any
pub fn canonical_name(name: &str) -> &str {
    name.strip_prefix(COMPILED_MODULE_PREFIX).unwrap_or(name)
}

/// Weight store built once by the loader and only read afterwards
///
/// Tensors sit behind `Arc` so execution plans can hold them without
/// copying; the store itself can be shared across threads the same way.
#[derive(Debug, Clone, Default)]
pub struct WeightStore {
    tensors: HashMap<String, Arc<Tensor>>,
    version: u32,
}

impl WeightStore {
    /// Build a store from `(name, tensor)` pairs
    ///
    /// Names are canonicalized; when two entries map to the same canonical
    /// name the later one wins.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Tensor)>,
        S: AsRef<str>,
    {
        let mut store = WeightStore::default();
        for (name, tensor) in entries {
            store.insert(name.as_ref(), tensor);
        }
        store
    }

    pub(crate) fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub(crate) fn insert(&mut self, name: &str, tensor: Tensor) {
        let canonical = canonical_name(name);
        if self
            .tensors
            .insert(canonical.to_string(), Arc::new(tensor))
            .is_some()
        {
            tracing::warn!(
                "Duplicate parameter '{}' (raw name '{}'), keeping the later entry",
                canonical,
                name
            );
        }
    }

    /// Look up a parameter by exact canonical name
    pub fn get(&self, name: &str) -> LiteCnnResult<Arc<Tensor>> {
        self.tensors
            .get(name)
            .cloned()
            .ok_or_else(|| LiteCnnError::MissingParameters(vec![name.to_string()]))
    }

    /// Borrow a parameter without touching its reference count
    pub fn tensor(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name).map(|t| t.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tensors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Format version recorded in the file header (0 for in-memory stores)
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Parameter names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sorted `(name, tensor)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.names()
            .into_iter()
            .filter_map(move |name| self.tensor(name).map(|t| (name, t)))
    }

    /// Total number of `f32` values held
    pub fn parameter_count(&self) -> usize {
        self.tensors.values().map(|t| t.element_count()).sum()
    }
}
