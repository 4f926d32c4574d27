//! LiteCNN forward pass
//!
//! Stem → depthwise-separable blocks with squeeze-excite → global average
//! pool → two-layer classifier. The graph returns raw logits; ranking and
//! softmax happen in response synthesis.

use std::sync::Arc;

use crate::error::LiteCnnResult;
use crate::loader::WeightStore;
use crate::model::architecture::{NetworkConfig, SPATIAL_PADDING, STEM_STRIDE};
use crate::model::execution_plan::{BlockPlan, ClassifierPlan, ExecutionPlan, SePlan, StemPlan};
use crate::ops::{
    adaptive_avg_pool2d, batch_norm2d, conv2d, linear, relu6, scale_channels, sigmoid,
    Conv2dParams,
};
use crate::shape_error;
use crate::tensor::Tensor;

impl StemPlan {
    fn execute(&self, input: &Tensor, eps: f32) -> LiteCnnResult<Tensor> {
        let x = conv2d(
            input,
            &self.conv,
            Conv2dParams::new(STEM_STRIDE, SPATIAL_PADDING, 1),
        )?;
        let x = batch_norm2d(x, &self.bn.params(eps))?;
        Ok(relu6(x))
    }
}

impl SePlan {
    /// Pool → reduce → ReLU6 → expand → sigmoid → channel gate
    fn execute(&self, x: Tensor) -> LiteCnnResult<Tensor> {
        let (n, c, _, _) = x.dims4()?;
        let squeezed = adaptive_avg_pool2d(&x, 1, 1)?.into_reshaped(&[n, c])?;
        let y = relu6(linear(&squeezed, &self.reduce, None)?);
        let y = sigmoid(linear(&y, &self.expand, None)?);
        let gate = y.into_reshaped(&[n, c, 1, 1])?;
        scale_channels(x, &gate)
    }
}

impl BlockPlan {
    fn execute(&self, x: Tensor, eps: f32) -> LiteCnnResult<Tensor> {
        let (_, channels, _, _) = x.dims4()?;
        let dw = conv2d(
            &x,
            &self.depthwise,
            Conv2dParams::depthwise(channels, self.stride, SPATIAL_PADDING),
        )?;
        let dw = relu6(batch_norm2d(dw, &self.bn1.params(eps))?);

        let pw = conv2d(&dw, &self.pointwise, Conv2dParams::pointwise())?;
        let pw = relu6(batch_norm2d(pw, &self.bn2.params(eps))?);

        match &self.se {
            Some(se) => se.execute(pw),
            None => Ok(pw),
        }
    }
}

impl ClassifierPlan {
    fn execute(&self, features: &Tensor) -> LiteCnnResult<Tensor> {
        let hidden = linear(features, &self.hidden_weight, Some(&*self.hidden_bias))?;
        let hidden = relu6(hidden);
        linear(&hidden, &self.out_weight, Some(&*self.out_bias))
    }
}

impl ExecutionPlan {
    /// Run the graph on a `[N, C, H, W]` input, returning `[N, num_classes]` logits
    pub fn forward(&self, input: &Tensor) -> LiteCnnResult<Tensor> {
        let (_, channels, _, _) = input.dims4()?;
        if channels != self.input_channels() {
            return Err(shape_error!(
                "input has {} channels, stem expects {}",
                channels,
                self.input_channels()
            ));
        }

        let mut x = self.stem.execute(input, self.bn_eps)?;
        tracing::trace!("stem -> {:?}", x.shape());

        for block in &self.blocks {
            x = block.execute(x, self.bn_eps)?;
            tracing::trace!("{} -> {:?}", block.prefix, x.shape());
        }

        let (n, c, _, _) = x.dims4()?;
        let pooled = adaptive_avg_pool2d(&x, 1, 1)?.into_reshaped(&[n, c])?;
        self.classifier.execute(&pooled)
    }
}

/// Validated network ready for repeated inference
///
/// Cheap to clone; clones share the resolved plan.
#[derive(Debug, Clone)]
pub struct LiteCnn {
    plan: Arc<ExecutionPlan>,
}

impl LiteCnn {
    /// Resolve the default topology from `store`
    pub fn from_store(store: &WeightStore) -> LiteCnnResult<Self> {
        Ok(Self::from_plan(ExecutionPlan::from_store(store)?))
    }

    pub fn with_config(
        store: &WeightStore,
        config: &NetworkConfig,
        bn_eps: f32,
    ) -> LiteCnnResult<Self> {
        Ok(Self::from_plan(ExecutionPlan::build(store, config, bn_eps)?))
    }

    pub fn from_plan(plan: ExecutionPlan) -> Self {
        LiteCnn {
            plan: Arc::new(plan),
        }
    }

    pub fn forward(&self, input: &Tensor) -> LiteCnnResult<Tensor> {
        self.plan.forward(input)
    }

    pub fn num_classes(&self) -> usize {
        self.plan.num_classes()
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }
}

/// One-shot inference: resolve the default graph from `store` and run it
///
/// Long-lived callers should build a [`LiteCnn`] once instead.
pub fn forward(store: &WeightStore, input: &Tensor) -> LiteCnnResult<Tensor> {
    ExecutionPlan::from_store(store)?.forward(input)
}
