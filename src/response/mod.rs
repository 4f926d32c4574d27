//! Score vector → ranked predictions
//!
//! Ranking is a deterministic total order: descending score under
//! `f32::total_cmp`, ties broken by ascending class id. Probabilities are a
//! softmax over the selected scores only, so they sum to one across the
//! returned predictions.

pub mod labels;

pub use labels::{Label, LabelMap};

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{LiteCnnError, LiteCnnResult};

/// Number of predictions returned when the caller does not ask otherwise
pub const DEFAULT_TOP_K: usize = 5;

/// One ranked class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub class_id: usize,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
}

fn rank_order(scores: &[f32], a: usize, b: usize) -> Ordering {
    scores[b].total_cmp(&scores[a]).then(a.cmp(&b))
}

/// Indices of the `k` best scores, best first
///
/// `k` larger than the vector is clamped to its length.
pub fn top_k_indices(scores: &[f32], k: usize) -> LiteCnnResult<Vec<usize>> {
    if k == 0 {
        return Err(LiteCnnError::InvalidTopK(k));
    }
    if scores.is_empty() {
        return Err(LiteCnnError::EmptyScores);
    }
    let k = k.min(scores.len());

    let mut indices: Vec<usize> = (0..scores.len()).collect();
    if k < indices.len() {
        indices.select_nth_unstable_by(k - 1, |&a, &b| rank_order(scores, a, b));
        indices.truncate(k);
    }
    indices.sort_unstable_by(|&a, &b| rank_order(scores, a, b));
    Ok(indices)
}

/// Numerically stable softmax (max subtracted before exponentiation)
///
/// When the maximum is `+inf` the mass is split evenly across the `+inf`
/// entries and every finite entry gets zero.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max == f32::INFINITY {
        let winners = values.iter().filter(|&&v| v == f32::INFINITY).count() as f32;
        return values
            .iter()
            .map(|&v| if v == f32::INFINITY { 1.0 / winners } else { 0.0 })
            .collect();
    }
    let exps: Vec<f32> = values.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Top-k predictions with softmax probabilities and optional labels
pub fn rank_predictions(
    scores: &[f32],
    k: usize,
    labels: Option<&LabelMap>,
) -> LiteCnnResult<Vec<Prediction>> {
    let indices = top_k_indices(scores, k)?;
    let selected: Vec<f32> = indices.iter().map(|&i| scores[i]).collect();
    let probs = softmax(&selected);

    Ok(indices
        .into_iter()
        .zip(probs)
        .map(|(class_id, score)| Prediction {
            class_id,
            score,
            label: labels.and_then(|l| l.get(class_id)).cloned(),
        })
        .collect())
}
