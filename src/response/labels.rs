//! Class label metadata
//!
//! The label file is a JSON object keyed by class id:
//! `{"0": {"en": "Chihuahua", "ko": "치와와"}, ...}`. The Korean name is
//! optional.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_context, LiteCnnError, LiteCnnResult};

/// Display names of one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ko: Option<String>,
}

/// Class id → label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMap {
    labels: HashMap<usize, Label>,
}

impl LabelMap {
    pub fn from_json_str(json: &str) -> LiteCnnResult<Self> {
        let raw: HashMap<String, Label> =
            serde_json::from_str(json).map_err(|e| LiteCnnError::LabelMapInvalid(e.to_string()))?;

        let mut labels = HashMap::with_capacity(raw.len());
        for (key, label) in raw {
            let id = key.trim().parse::<usize>().map_err(|_| {
                LiteCnnError::LabelMapInvalid(format!("class id '{}' is not an integer", key))
            })?;
            labels.insert(id, label);
        }
        Ok(LabelMap { labels })
    }

    pub fn from_path(path: impl AsRef<Path>) -> LiteCnnResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| io_context(e, &format!("reading label file '{}'", path.display())))?;
        let map = Self::from_json_str(&json)?;
        tracing::info!("Loaded {} class labels from {}", map.len(), path.display());
        Ok(map)
    }

    pub fn insert(&mut self, class_id: usize, label: Label) {
        self.labels.insert(class_id, label);
    }

    pub fn get(&self, class_id: usize) -> Option<&Label> {
        self.labels.get(&class_id)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Class ids in `0..num_classes` without a label
    pub fn unlabeled(&self, num_classes: usize) -> Vec<usize> {
        (0..num_classes)
            .filter(|id| !self.labels.contains_key(id))
            .collect()
    }
}
