//! End-to-end forward pass over the tiny network

mod common;

use litecnn::loader::{load_weights, WeightStore};
use litecnn::model::architecture::{bn_names, param, BlockNames};
use litecnn::model::{forward, BlockConfig, ExecutionPlan, LiteCnn, NetworkConfig};
use litecnn::tensor::Tensor;
use litecnn::{ErrorCategory, LiteCnnError};

use common::{tiny_entries, tiny_input, tiny_store, tiny_writer, TINY_CLASSES, TINY_IMAGE_SIZE};

#[test]
fn test_forward_produces_logits() -> anyhow::Result<()> {
    let network = LiteCnn::from_store(&tiny_store())?;
    let logits = network.forward(&tiny_input(2))?;

    assert_eq!(logits.shape(), &[2, TINY_CLASSES]);
    assert!(logits.data().iter().all(|v| v.is_finite()));
    assert_eq!(network.num_classes(), TINY_CLASSES);
    Ok(())
}

#[test]
fn test_forward_is_deterministic() -> anyhow::Result<()> {
    let network = LiteCnn::from_store(&tiny_store())?;
    let input = tiny_input(1);
    let first = network.forward(&input)?;
    let second = network.forward(&input)?;
    assert_eq!(first.data(), second.data());
    Ok(())
}

#[test]
fn test_batch_rows_are_independent() -> anyhow::Result<()> {
    let network = LiteCnn::from_store(&tiny_store())?;
    let batch = tiny_input(2);
    let logits = network.forward(&batch)?;

    let plane = 3 * TINY_IMAGE_SIZE * TINY_IMAGE_SIZE;
    let second = Tensor::from_vec(
        &[1, 3, TINY_IMAGE_SIZE, TINY_IMAGE_SIZE],
        batch.data()[plane..].to_vec(),
    )?;
    let alone = network.forward(&second)?;
    for (a, b) in logits.data()[TINY_CLASSES..].iter().zip(alone.data()) {
        assert!((a - b).abs() < 1e-5);
    }
    Ok(())
}

#[test]
fn test_free_forward_matches_network() -> anyhow::Result<()> {
    let store = tiny_store();
    let input = tiny_input(1);
    let via_fn = forward(&store, &input)?;
    let via_network = LiteCnn::from_store(&store)?.forward(&input)?;
    assert_eq!(via_fn.data(), via_network.data());
    Ok(())
}

#[test]
fn test_prefixed_file_runs_like_plain_file() -> anyhow::Result<()> {
    let plain = load_weights(&tiny_writer("").to_bytes()?)?;
    let compiled = load_weights(&tiny_writer("_orig_mod.").to_bytes()?)?;
    let input = tiny_input(1);
    assert_eq!(forward(&plain, &input)?.data(), forward(&compiled, &input)?.data());
    Ok(())
}

#[test]
fn test_missing_parameter_named_and_store_reusable() -> anyhow::Result<()> {
    let removed = "features.3.se.excitation.2.weight";
    let entries: Vec<_> = tiny_entries()
        .into_iter()
        .filter(|(name, _)| name != removed)
        .collect();
    let store = WeightStore::from_entries(entries);

    let err = LiteCnn::from_store(&store).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Model);
    assert_eq!(err.missing_parameters(), Some(&[removed.to_string()][..]));
    assert!(err.to_string().contains(removed));

    // The failed build leaves the store untouched.
    assert_eq!(store.len(), tiny_entries().len() - 1);
    assert!(store.contains("features.3.se.excitation.0.weight"));
    Ok(())
}

#[test]
fn test_default_topology_needs_every_block() -> anyhow::Result<()> {
    let expected = NetworkConfig::default().parameter_names();
    let store = tiny_store();
    for name in &expected {
        assert!(store.contains(name), "fixture lacks {}", name);
    }
    assert_eq!(expected.len(), store.len());
    Ok(())
}

#[test]
fn test_wrong_input_channels_rejected() -> anyhow::Result<()> {
    let network = LiteCnn::from_store(&tiny_store())?;
    let err = network
        .forward(&Tensor::zeros(&[1, 1, TINY_IMAGE_SIZE, TINY_IMAGE_SIZE]))
        .unwrap_err();
    assert!(matches!(err, LiteCnnError::ShapeMismatch(_)));
    Ok(())
}

#[test]
fn test_inconsistent_channels_fail_at_forward() -> anyhow::Result<()> {
    // Right rank, wrong width: the plan builds, the forward pass rejects it.
    let entries: Vec<_> = tiny_entries()
        .into_iter()
        .map(|(name, tensor)| {
            if name == "classifier.2.weight" {
                (name, Tensor::zeros(&[6, 3]))
            } else {
                (name, tensor)
            }
        })
        .collect();
    let plan = ExecutionPlan::from_store(&WeightStore::from_entries(entries))?;
    let err = plan.forward(&tiny_input(1)).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Shape);
    Ok(())
}

#[test]
fn test_network_shared_across_threads() -> anyhow::Result<()> {
    let network = LiteCnn::from_store(&tiny_store())?;
    let expected = network.forward(&tiny_input(1))?;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let network = network.clone();
            std::thread::spawn(move || network.forward(&tiny_input(1)))
        })
        .collect();
    for handle in handles {
        let logits = handle
            .join()
            .map_err(|_| anyhow::anyhow!("forward thread panicked"))??;
        assert_eq!(logits.data(), expected.data());
    }
    Ok(())
}

fn t(shape: &[usize], data: &[f32]) -> Tensor {
    Tensor::from_vec(shape, data.to_vec()).expect("golden shape")
}

fn push_golden_bn(entries: &mut Vec<(String, Tensor)>, prefix: &str, gamma: f32, beta: f32) {
    let [w, b, mean, var] = bn_names(prefix);
    entries.push((w, t(&[1], &[gamma])));
    entries.push((b, t(&[1], &[beta])));
    entries.push((mean, t(&[1], &[0.0])));
    entries.push((var, t(&[1], &[1.0])));
}

/// Single-channel network with hand-picked weights
///
/// With eps = 0 every batch norm reduces to `gamma·x + beta`:
/// - stem: 3×3 kernel taps centre and right neighbour, bn `x − 1`
/// - blocks: `depthwise` kernel, bn1 `4x`, pointwise `0.5x`, bn2 `x − 1`,
///   squeeze-excite reduce and expand weights both 1
/// - classifier: hidden `[x, −x]`, out `[h0 + h1 + 0.5, −2·h1 + 0.1]`
fn golden_store(config: &NetworkConfig, depthwise: [f32; 9]) -> WeightStore {
    let mut entries = Vec::new();
    entries.push((
        param("stem.0", "weight"),
        t(&[1, 1, 3, 3], &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0]),
    ));
    push_golden_bn(&mut entries, "stem.1", 1.0, -1.0);

    for (i, block) in config.blocks.iter().enumerate() {
        let names = BlockNames::new(i);
        entries.push((names.depthwise(), t(&[1, 1, 3, 3], &depthwise)));
        push_golden_bn(&mut entries, &names.bn1(), 4.0, 0.0);
        entries.push((names.pointwise(), t(&[1, 1, 1, 1], &[0.5])));
        push_golden_bn(&mut entries, &names.bn2(), 1.0, -1.0);
        if block.use_se {
            entries.push((names.se_reduce(), t(&[1, 1], &[1.0])));
            entries.push((names.se_expand(), t(&[1, 1], &[1.0])));
        }
    }

    entries.push((param("classifier.2", "weight"), t(&[2, 1], &[1.0, -1.0])));
    entries.push((param("classifier.2", "bias"), t(&[2], &[0.0, 0.0])));
    entries.push((param("classifier.5", "weight"), t(&[2, 2], &[1.0, 1.0, 0.0, -2.0])));
    entries.push((param("classifier.5", "bias"), t(&[2], &[0.5, 0.1])));
    WeightStore::from_entries(entries)
}

/// 4×4 single-channel ramp, `x[r][c] = (4r + c) / 10`
fn golden_input() -> Tensor {
    t(&[1, 1, 4, 4], &(0..16).map(|v| v as f32 / 10.0).collect::<Vec<_>>())
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[test]
fn test_single_block_logits_match_hand_computation() -> anyhow::Result<()> {
    let config = NetworkConfig {
        blocks: vec![BlockConfig {
            stride: 1,
            use_se: true,
        }],
    };
    // Depthwise taps centre and right neighbour, like the stem.
    let depthwise = [0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0];
    let network = LiteCnn::with_config(&golden_store(&config, depthwise), &config, 0.0)?;
    let logits = network.forward(&golden_input())?;

    // stem conv, stride 2:    [0.1, 0.5, 1.7, 2.1]
    // bn x − 1, relu6:        [0, 0, 0.7, 1.1]
    // depthwise:              [0, 0, 1.8, 1.1]
    // bn1 4x, relu6:          [0, 0, 6, 4.4]    (7.2 clamps)
    // pointwise 0.5x:         [0, 0, 3, 2.2]
    // bn2 x − 1, relu6:       [0, 0, 2, 1.2]
    // se: mean 0.8, gate g = sigmoid(0.8), output [0, 0, 2g, 1.2g]
    // pool: 0.8g; hidden [0.8g, −0.8g] → relu6 → [0.8g, 0]
    // logits: [0.8g + 0.5, 0.1]
    let g = sigmoid(0.8);
    assert_eq!(logits.shape(), &[1, 2]);
    assert!((logits.data()[0] - (0.8 * g + 0.5)).abs() < 1e-5, "{:?}", logits);
    assert!((logits.data()[1] - 0.1).abs() < 1e-5, "{:?}", logits);
    Ok(())
}

#[test]
fn test_default_topology_logits_match_hand_computation() -> anyhow::Result<()> {
    let config = NetworkConfig::default();
    let network = LiteCnn::with_config(&golden_store(&config, [1.0; 9]), &config, 0.0)?;
    let logits = network.forward(&golden_input())?;

    // stem as above:          2×2 [0, 0, 0.7, 1.1]
    // features.0, stride 2:   1×1 window sum 1.8 → bn1 7.2 → relu6 6
    //                         → pointwise 3 → bn2 2 → se gate sigmoid(2)
    // features.1..6 on 1×1:   only the centre tap is inside the padding, so
    //                         v → 4v ≥ 6 clamps to 6 → 3 → 2 → 2·sigmoid(2)
    // pool v = 2·sigmoid(2); hidden [v, 0]; logits [v + 0.5, 0.1]
    let v = 2.0 * sigmoid(2.0);
    assert_eq!(logits.shape(), &[1, 2]);
    assert!((logits.data()[0] - (v + 0.5)).abs() < 1e-5, "{:?}", logits);
    assert!((logits.data()[1] - 0.1).abs() < 1e-5, "{:?}", logits);
    Ok(())
}
