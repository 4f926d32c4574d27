//! Tiny LiteCNN fixture
//!
//! Same topology and parameter names as the production network (stem,
//! `features.0..6` with squeeze-excite, two-layer classifier) but with a
//! handful of channels so a 32×32 forward pass takes microseconds.

use litecnn::loader::{WeightStore, WeightWriter};
use litecnn::model::architecture::{bn_names, param, BlockNames, DEFAULT_BLOCK_STRIDES};
use litecnn::tensor::Tensor;

/// Side length of fixture inputs
pub const TINY_IMAGE_SIZE: usize = 32;
/// Stem output channels
pub const TINY_STEM_CHANNELS: usize = 4;
/// Output channels of each block
pub const TINY_BLOCK_CHANNELS: [usize; 7] = [8, 8, 8, 8, 8, 8, 8];
/// Squeeze-excite bottleneck width
pub const TINY_SE_REDUCED: usize = 2;
/// Hidden classifier width
pub const TINY_HIDDEN: usize = 6;
/// Number of output classes
pub const TINY_CLASSES: usize = 5;

/// Deterministic pseudo-random values in [-scale, scale]
pub fn pseudo_random(len: usize, seed: u64, scale: f32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 40) as f32 / (1u64 << 24) as f32;
            (unit * 2.0 - 1.0) * scale
        })
        .collect()
}

fn random_tensor(shape: &[usize], seed: u64, scale: f32) -> Tensor {
    let len = shape.iter().product();
    Tensor::from_vec(shape, pseudo_random(len, seed, scale)).expect("fixture shape")
}

fn push_bn(entries: &mut Vec<(String, Tensor)>, prefix: &str, channels: usize, seed: u64) {
    let [gamma, beta, mean, var] = bn_names(prefix);
    let gamma_data = pseudo_random(channels, seed, 0.2).iter().map(|v| 1.0 + v).collect();
    let var_data = pseudo_random(channels, seed + 3, 0.2).iter().map(|v| 1.0 + v).collect();
    entries.push((gamma, Tensor::from_vec(&[channels], gamma_data).expect("bn gamma")));
    entries.push((beta, random_tensor(&[channels], seed + 1, 0.1)));
    entries.push((mean, random_tensor(&[channels], seed + 2, 0.1)));
    entries.push((var, Tensor::from_vec(&[channels], var_data).expect("bn var")));
}

/// Every parameter of the tiny network, in execution order
pub fn tiny_entries() -> Vec<(String, Tensor)> {
    let mut entries = Vec::new();
    let mut seed = 1u64;
    let mut next_seed = || {
        seed += 10;
        seed
    };

    entries.push((
        param("stem.0", "weight"),
        random_tensor(&[TINY_STEM_CHANNELS, 3, 3, 3], next_seed(), 0.5),
    ));
    push_bn(&mut entries, "stem.1", TINY_STEM_CHANNELS, next_seed());

    let mut in_channels = TINY_STEM_CHANNELS;
    for (i, &out_channels) in TINY_BLOCK_CHANNELS.iter().enumerate() {
        let names = BlockNames::new(i);
        entries.push((
            names.depthwise(),
            random_tensor(&[in_channels, 1, 3, 3], next_seed(), 0.5),
        ));
        push_bn(&mut entries, &names.bn1(), in_channels, next_seed());
        entries.push((
            names.pointwise(),
            random_tensor(&[out_channels, in_channels, 1, 1], next_seed(), 0.5),
        ));
        push_bn(&mut entries, &names.bn2(), out_channels, next_seed());
        entries.push((
            names.se_reduce(),
            random_tensor(&[TINY_SE_REDUCED, out_channels], next_seed(), 0.5),
        ));
        entries.push((
            names.se_expand(),
            random_tensor(&[out_channels, TINY_SE_REDUCED], next_seed(), 0.5),
        ));
        in_channels = out_channels;
    }

    entries.push((
        "classifier.2.weight".to_string(),
        random_tensor(&[TINY_HIDDEN, in_channels], next_seed(), 0.5),
    ));
    entries.push((
        "classifier.2.bias".to_string(),
        random_tensor(&[TINY_HIDDEN], next_seed(), 0.1),
    ));
    entries.push((
        "classifier.5.weight".to_string(),
        random_tensor(&[TINY_CLASSES, TINY_HIDDEN], next_seed(), 0.5),
    ));
    entries.push((
        "classifier.5.bias".to_string(),
        random_tensor(&[TINY_CLASSES], next_seed(), 0.1),
    ));
    assert_eq!(DEFAULT_BLOCK_STRIDES.len(), TINY_BLOCK_CHANNELS.len());
    entries
}

pub fn tiny_store() -> WeightStore {
    WeightStore::from_entries(tiny_entries())
}

/// Writer holding the tiny network, optionally with a name prefix
pub fn tiny_writer(prefix: &str) -> WeightWriter {
    let mut writer = WeightWriter::new();
    for (name, tensor) in tiny_entries() {
        writer.add(format!("{}{}", prefix, name), tensor);
    }
    writer
}

/// Deterministic `[n, 3, size, size]` input
pub fn tiny_input(n: usize) -> Tensor {
    random_tensor(&[n, 3, TINY_IMAGE_SIZE, TINY_IMAGE_SIZE], 99, 1.0)
}

/// Encode a solid-color PNG
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub const TINY_LABELS_JSON: &str = r#"{
    "0": {"en": "cat", "ko": "고양이"},
    "1": {"en": "dog", "ko": "개"},
    "2": {"en": "bird"},
    "3": {"en": "fish", "ko": "물고기"},
    "4": {"en": "frog"}
}"#;
