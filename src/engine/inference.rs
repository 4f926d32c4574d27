//! InferenceEngine: preprocess → forward → ranking for one request
//!
//! The engine owns the validated network, the optional label map and the
//! image decoder. Everything it holds is immutable after construction, so a
//! single `Arc<InferenceEngine>` serves any number of concurrent requests.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::stats::{Classification, HealthStatus, InferenceTimings};
use crate::error::{LiteCnnError, LiteCnnResult};
use crate::loader::{load_weights_from_path, WeightStore};
use crate::model::LiteCnn;
use crate::preprocess::{pixels_to_tensor, preprocess_image, ImageCrateDecoder, ImageDecoder, RgbPixels};
use crate::response::{rank_predictions, LabelMap, Prediction};
use crate::tensor::Tensor;

/// Image classification engine
pub struct InferenceEngine {
    config: EngineConfig,
    network: LiteCnn,
    labels: Option<Arc<LabelMap>>,
    decoder: Arc<dyn ImageDecoder>,
    requests_served: AtomicU64,
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("config", &self.config)
            .field("num_classes", &self.network.num_classes())
            .field("labels", &self.labels.as_ref().map(|l| l.len()))
            .finish()
    }
}

impl InferenceEngine {
    /// Validate `config` and resolve the network from `store`
    pub fn new(store: &WeightStore, config: EngineConfig) -> LiteCnnResult<Self> {
        config.validate()?;
        let network = LiteCnn::with_config(store, &config.network, config.bn_eps)?;
        info!(
            "Inference engine ready: {} blocks, {} classes, {}x{} input",
            network.plan().blocks.len(),
            network.num_classes(),
            config.image_size,
            config.image_size
        );
        Ok(InferenceEngine {
            config,
            network,
            labels: None,
            decoder: Arc::new(ImageCrateDecoder),
            requests_served: AtomicU64::new(0),
        })
    }

    /// Load weights (and optionally labels) from disk
    pub fn from_paths(
        weights: &Path,
        labels: Option<&Path>,
        config: EngineConfig,
    ) -> LiteCnnResult<Self> {
        let store = load_weights_from_path(weights)?;
        let engine = Self::new(&store, config)?;
        match labels {
            Some(path) => Ok(engine.with_labels(LabelMap::from_path(path)?)),
            None => Ok(engine),
        }
    }

    /// Attach class labels
    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        let unlabeled = labels.unlabeled(self.num_classes());
        if !unlabeled.is_empty() {
            warn!(
                "{} of {} classes have no label (first: {})",
                unlabeled.len(),
                self.num_classes(),
                unlabeled[0]
            );
        }
        self.labels = Some(Arc::new(labels));
        self
    }

    /// Replace the image decoder
    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn network(&self) -> &LiteCnn {
        &self.network
    }

    pub fn labels(&self) -> Option<&LabelMap> {
        self.labels.as_deref()
    }

    pub fn num_classes(&self) -> usize {
        self.network.num_classes()
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
            model_loaded: true,
            num_classes: self.num_classes(),
            model: Some(self.config.model_name.clone()),
        }
    }

    /// Run `warmup_iterations` forward passes on a blank image
    ///
    /// Touches every weight page and spins up the rayon pool before the first
    /// request. Does not count towards `requests_served`.
    pub fn warm_up(&self) -> LiteCnnResult<Duration> {
        let start = Instant::now();
        let iterations = self.config.warmup_iterations;
        if iterations == 0 {
            return Ok(start.elapsed());
        }
        let size = self.config.image_size;
        let input = Tensor::try_zeros(&[1, self.network.plan().input_channels(), size, size])?;
        for _ in 0..iterations {
            self.network.forward(&input)?;
        }
        let elapsed = start.elapsed();
        info!(
            "Warm-up complete: {} passes in {:.1} ms",
            iterations,
            elapsed.as_secs_f64() * 1000.0
        );
        Ok(elapsed)
    }

    fn resolve_top_k(&self, top_k: Option<usize>) -> LiteCnnResult<usize> {
        match top_k.unwrap_or(self.config.top_k) {
            0 => Err(LiteCnnError::InvalidTopK(0)),
            k => Ok(k),
        }
    }

    /// Raw logits for a preprocessed `[N, 3, H, W]` input
    pub fn logits(&self, input: &Tensor) -> LiteCnnResult<Tensor> {
        self.network.forward(input)
    }

    /// Rank each row of a `[N, num_classes]` logit tensor
    pub fn rank(&self, logits: &Tensor, top_k: Option<usize>) -> LiteCnnResult<Vec<Vec<Prediction>>> {
        let k = self.resolve_top_k(top_k)?;
        let (rows, classes) = logits.dims2()?;
        (0..rows)
            .map(|r| {
                let row = &logits.data()[r * classes..(r + 1) * classes];
                rank_predictions(row, k, self.labels())
            })
            .collect()
    }

    /// Classify encoded image bytes (JPEG, PNG, ...)
    pub fn classify_bytes(&self, bytes: &[u8], top_k: Option<usize>) -> LiteCnnResult<Classification> {
        let k = self.resolve_top_k(top_k)?;
        let start = Instant::now();
        let input = preprocess_image(bytes, self.decoder.as_ref(), self.config.image_size)?;
        let preprocessed = Instant::now();
        self.finish(input, k, start, preprocessed)
    }

    /// Classify an already-decoded RGB8 buffer
    pub fn classify_pixels(&self, pixels: &RgbPixels, top_k: Option<usize>) -> LiteCnnResult<Classification> {
        let k = self.resolve_top_k(top_k)?;
        let start = Instant::now();
        let input = pixels_to_tensor(pixels)?;
        let preprocessed = Instant::now();
        self.finish(input, k, start, preprocessed)
    }

    fn finish(
        &self,
        input: Tensor,
        k: usize,
        start: Instant,
        preprocessed: Instant,
    ) -> LiteCnnResult<Classification> {
        debug!("Running forward pass on {:?}", input.shape());
        let logits = self.network.forward(&input)?;
        let inferred = Instant::now();

        let predictions = self
            .rank(&logits, Some(k))?
            .into_iter()
            .next()
            .ok_or(LiteCnnError::EmptyScores)?;
        let done = Instant::now();

        let timings = InferenceTimings::new(
            preprocessed - start,
            inferred - preprocessed,
            done - start,
        );
        let served = self.requests_served.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(top) = predictions.first() {
            info!(
                "Request {}: class {} ({:.1}%) in {:.3}ms (preprocess {:.3}ms, inference {:.3}ms)",
                served,
                top.class_id,
                top.score * 100.0,
                timings.total_ms,
                timings.preprocess_ms,
                timings.inference_ms
            );
        }

        Ok(Classification {
            predictions,
            timings,
        })
    }
}
