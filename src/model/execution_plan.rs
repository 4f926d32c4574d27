//! Execution plan for the LiteCNN graph
//!
//! Every parameter the graph reads is resolved from the [`WeightStore`] once,
//! up front. Construction walks the whole topology before failing, so a
//! weight file with several absent parameters is reported in a single
//! `MissingParameters` error instead of one name per attempt.

use std::sync::Arc;

use crate::error::{LiteCnnError, LiteCnnResult};
use crate::loader::WeightStore;
use crate::model::architecture::{
    param, BlockNames, NetworkConfig, CLASSIFIER_HIDDEN, CLASSIFIER_OUT, STEM_BN, STEM_CONV,
};
use crate::ops::{BatchNormParams, DEFAULT_BN_EPS};
use crate::tensor::Tensor;

/// Batch-norm parameter set of one stage
#[derive(Debug, Clone)]
pub struct BatchNormWeights {
    pub weight: Arc<Tensor>,
    pub bias: Arc<Tensor>,
    pub running_mean: Arc<Tensor>,
    pub running_var: Arc<Tensor>,
}

impl BatchNormWeights {
    pub fn params(&self, eps: f32) -> BatchNormParams<'_> {
        BatchNormParams::new(
            &self.weight,
            &self.bias,
            &self.running_mean,
            &self.running_var,
        )
        .with_eps(eps)
    }
}

/// Stem: 3×3 stride-2 convolution followed by batch norm
#[derive(Debug, Clone)]
pub struct StemPlan {
    pub conv: Arc<Tensor>,
    pub bn: BatchNormWeights,
}

/// Squeeze-excite projections (no bias)
#[derive(Debug, Clone)]
pub struct SePlan {
    /// `[C / r, C]`
    pub reduce: Arc<Tensor>,
    /// `[C, C / r]`
    pub expand: Arc<Tensor>,
}

/// One depthwise-separable block `features.<i>`
#[derive(Debug, Clone)]
pub struct BlockPlan {
    pub prefix: String,
    pub stride: usize,
    pub depthwise: Arc<Tensor>,
    pub bn1: BatchNormWeights,
    pub pointwise: Arc<Tensor>,
    pub bn2: BatchNormWeights,
    pub se: Option<SePlan>,
}

/// Two-layer classifier head
#[derive(Debug, Clone)]
pub struct ClassifierPlan {
    pub hidden_weight: Arc<Tensor>,
    pub hidden_bias: Arc<Tensor>,
    pub out_weight: Arc<Tensor>,
    pub out_bias: Arc<Tensor>,
}

/// Fully resolved, immutable plan for the whole network
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub stem: StemPlan,
    pub blocks: Vec<BlockPlan>,
    pub classifier: ClassifierPlan,
    pub bn_eps: f32,
}

/// Collects lookups so that every failure is reported at once
struct Resolver<'a> {
    store: &'a WeightStore,
    placeholder: Arc<Tensor>,
    missing: Vec<String>,
    bad_rank: Vec<String>,
}

impl<'a> Resolver<'a> {
    fn new(store: &'a WeightStore) -> Self {
        Resolver {
            store,
            placeholder: Arc::new(Tensor::zeros(&[0])),
            missing: Vec::new(),
            bad_rank: Vec::new(),
        }
    }

    fn tensor(&mut self, name: String, rank: usize) -> Arc<Tensor> {
        match self.store.get(&name) {
            Ok(tensor) => {
                if tensor.rank() != rank {
                    self.bad_rank.push(format!(
                        "{} has shape {:?}, expected rank {}",
                        name,
                        tensor.shape(),
                        rank
                    ));
                }
                tensor
            }
            Err(_) => {
                self.missing.push(name);
                Arc::clone(&self.placeholder)
            }
        }
    }

    fn batch_norm(&mut self, prefix: &str) -> BatchNormWeights {
        BatchNormWeights {
            weight: self.tensor(param(prefix, "weight"), 1),
            bias: self.tensor(param(prefix, "bias"), 1),
            running_mean: self.tensor(param(prefix, "running_mean"), 1),
            running_var: self.tensor(param(prefix, "running_var"), 1),
        }
    }

    fn finish(self) -> LiteCnnResult<()> {
        if !self.missing.is_empty() {
            return Err(LiteCnnError::MissingParameters(self.missing));
        }
        if !self.bad_rank.is_empty() {
            return Err(LiteCnnError::ShapeMismatch(self.bad_rank.join("; ")));
        }
        Ok(())
    }
}

impl ExecutionPlan {
    /// Resolve the default topology
    pub fn from_store(store: &WeightStore) -> LiteCnnResult<Self> {
        Self::build(store, &NetworkConfig::default(), DEFAULT_BN_EPS)
    }

    /// Resolve a topology from the store
    ///
    /// Fails with `MissingParameters` listing every absent name, or with a
    /// shape error when a parameter has the wrong rank.
    pub fn build(store: &WeightStore, config: &NetworkConfig, bn_eps: f32) -> LiteCnnResult<Self> {
        config.validate()?;
        if !(bn_eps.is_finite() && bn_eps >= 0.0) {
            return Err(LiteCnnError::InvalidConfiguration(format!(
                "batch-norm epsilon must be finite and non-negative, got {}",
                bn_eps
            )));
        }

        let mut r = Resolver::new(store);

        let stem = StemPlan {
            conv: r.tensor(param(STEM_CONV, "weight"), 4),
            bn: r.batch_norm(STEM_BN),
        };

        let blocks = config
            .blocks
            .iter()
            .enumerate()
            .map(|(i, block)| {
                let names = BlockNames::new(i);
                BlockPlan {
                    prefix: names.prefix().to_string(),
                    stride: block.stride,
                    depthwise: r.tensor(names.depthwise(), 4),
                    bn1: r.batch_norm(&names.bn1()),
                    pointwise: r.tensor(names.pointwise(), 4),
                    bn2: r.batch_norm(&names.bn2()),
                    se: block.use_se.then(|| SePlan {
                        reduce: r.tensor(names.se_reduce(), 2),
                        expand: r.tensor(names.se_expand(), 2),
                    }),
                }
            })
            .collect();

        let classifier = ClassifierPlan {
            hidden_weight: r.tensor(param(CLASSIFIER_HIDDEN, "weight"), 2),
            hidden_bias: r.tensor(param(CLASSIFIER_HIDDEN, "bias"), 1),
            out_weight: r.tensor(param(CLASSIFIER_OUT, "weight"), 2),
            out_bias: r.tensor(param(CLASSIFIER_OUT, "bias"), 1),
        };

        r.finish()?;

        let plan = ExecutionPlan {
            stem,
            blocks,
            classifier,
            bn_eps,
        };
        tracing::debug!(
            "Execution plan built: {} blocks, {} classes",
            plan.blocks.len(),
            plan.num_classes()
        );
        Ok(plan)
    }

    /// Number of output classes, read from the final projection
    pub fn num_classes(&self) -> usize {
        self.classifier.out_weight.shape().first().copied().unwrap_or(0)
    }

    /// Input channel count expected by the stem
    pub fn input_channels(&self) -> usize {
        self.stem.conv.shape().get(1).copied().unwrap_or(0)
    }
}
