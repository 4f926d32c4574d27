//! Network topology and parameter naming
//!
//! Parameter names are the join key with trained weight files, so every
//! name built here mirrors the module paths of the training code exactly.

use serde::{Deserialize, Serialize};

use crate::error::{LiteCnnError, LiteCnnResult};

/// Stem convolution prefix
pub const STEM_CONV: &str = "stem.0";
/// Stem batch-norm prefix
pub const STEM_BN: &str = "stem.1";
/// Hidden classifier projection prefix
pub const CLASSIFIER_HIDDEN: &str = "classifier.2";
/// Output classifier projection prefix
pub const CLASSIFIER_OUT: &str = "classifier.5";

/// Suffixes of a batch-norm stage, in file order
pub const BN_SUFFIXES: [&str; 4] = ["weight", "bias", "running_mean", "running_var"];

/// Strides of `features.0` .. `features.6`
pub const DEFAULT_BLOCK_STRIDES: [usize; 7] = [2, 1, 2, 1, 2, 1, 2];

/// Stride of the stem convolution
pub const STEM_STRIDE: usize = 2;
/// Padding of every 3×3 convolution in the network
pub const SPATIAL_PADDING: usize = 1;

/// One depthwise-separable block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub stride: usize,
    pub use_se: bool,
}

/// Block list of the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub blocks: Vec<BlockConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            blocks: DEFAULT_BLOCK_STRIDES
                .iter()
                .map(|&stride| BlockConfig {
                    stride,
                    use_se: true,
                })
                .collect(),
        }
    }
}

impl NetworkConfig {
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Reject an empty block list or a zero stride
    pub fn validate(&self) -> LiteCnnResult<()> {
        if self.blocks.is_empty() {
            return Err(LiteCnnError::InvalidConfiguration(
                "network must have at least one block".to_string(),
            ));
        }
        if let Some(i) = self.blocks.iter().position(|b| b.stride == 0) {
            return Err(LiteCnnError::InvalidConfiguration(format!(
                "block features.{} has stride 0",
                i
            )));
        }
        Ok(())
    }

    /// Every parameter name the graph reads, in execution order
    pub fn parameter_names(&self) -> Vec<String> {
        let mut names = vec![param(STEM_CONV, "weight")];
        names.extend(bn_names(STEM_BN));
        for (i, block) in self.blocks.iter().enumerate() {
            let names_of = BlockNames::new(i);
            names.push(names_of.depthwise());
            names.extend(bn_names(&names_of.bn1()));
            names.push(names_of.pointwise());
            names.extend(bn_names(&names_of.bn2()));
            if block.use_se {
                names.push(names_of.se_reduce());
                names.push(names_of.se_expand());
            }
        }
        for prefix in [CLASSIFIER_HIDDEN, CLASSIFIER_OUT] {
            names.push(param(prefix, "weight"));
            names.push(param(prefix, "bias"));
        }
        names
    }
}

/// `<prefix>.<suffix>`
pub fn param(prefix: &str, suffix: &str) -> String {
    format!("{}.{}", prefix, suffix)
}

/// The four batch-norm parameter names under `prefix`
pub fn bn_names(prefix: &str) -> [String; 4] {
    BN_SUFFIXES.map(|suffix| param(prefix, suffix))
}

/// Name builder for `features.<i>`
#[derive(Debug, Clone)]
pub struct BlockNames {
    prefix: String,
}

impl BlockNames {
    pub fn new(index: usize) -> Self {
        BlockNames {
            prefix: format!("features.{}", index),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn depthwise(&self) -> String {
        param(&self.prefix, "depthwise.weight")
    }

    pub fn bn1(&self) -> String {
        param(&self.prefix, "bn1")
    }

    pub fn pointwise(&self) -> String {
        param(&self.prefix, "pointwise.weight")
    }

    pub fn bn2(&self) -> String {
        param(&self.prefix, "bn2")
    }

    pub fn se_reduce(&self) -> String {
        param(&self.prefix, "se.excitation.0.weight")
    }

    pub fn se_expand(&self) -> String {
        param(&self.prefix, "se.excitation.2.weight")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_topology() {
        let config = NetworkConfig::default();
        assert_eq!(config.num_blocks(), 7);
        let strides: Vec<usize> = config.blocks.iter().map(|b| b.stride).collect();
        assert_eq!(strides, vec![2, 1, 2, 1, 2, 1, 2]);
        assert!(config.blocks.iter().all(|b| b.use_se));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_configs() {
        let empty = NetworkConfig { blocks: vec![] };
        assert!(empty.validate().is_err());

        let mut zero = NetworkConfig::default();
        zero.blocks[3].stride = 0;
        let err = zero.validate().unwrap_err();
        assert!(err.to_string().contains("features.3"));
    }

    #[test]
    fn test_block_names() {
        let names = BlockNames::new(4);
        assert_eq!(names.depthwise(), "features.4.depthwise.weight");
        assert_eq!(names.pointwise(), "features.4.pointwise.weight");
        assert_eq!(names.se_reduce(), "features.4.se.excitation.0.weight");
        assert_eq!(names.se_expand(), "features.4.se.excitation.2.weight");
        assert_eq!(bn_names(&names.bn2())[3], "features.4.bn2.running_var");
    }

    #[test]
    fn test_parameter_names_count() {
        // stem: 1 + 4; block: 1 + 4 + 1 + 4 + 2; classifier: 4
        let names = NetworkConfig::default().parameter_names();
        assert_eq!(names.len(), 5 + 7 * 12 + 4);
        assert_eq!(names[0], "stem.0.weight");
        assert_eq!(names.last().map(String::as_str), Some("classifier.5.bias"));

        let no_se = NetworkConfig {
            blocks: vec![BlockConfig {
                stride: 1,
                use_se: false,
            }],
        };
        assert_eq!(no_se.parameter_names().len(), 5 + 10 + 4);
    }
}
