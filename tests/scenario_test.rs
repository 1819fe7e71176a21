//! End-to-end scenarios on seeded random data
//!
//! Each scenario builds a layer the way a caller would: one shared
//! [`TransformCache`], one engine per variant, caller-owned scratch.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use winoconv::reference::conv2d_direct;
use winoconv::{ConvolutionConfig, TransformCache, WinogradConv, WinogradError, WinogradVariant};

const SEED: u64 = 0x5eed_0003;

/// 3 → 7 channels on a 25×25 image, same padding, with bias
fn layer() -> ConvolutionConfig {
    ConvolutionConfig::new(3, 7, 25, 25).with_padding(1)
}

fn random_vec<T>(rng: &mut StdRng, len: usize, f: impl Fn(f64) -> T) -> Vec<T> {
    (0..len).map(|_| f(rng.gen_range(0.0..10.0))).collect()
}

fn assert_close_f32(actual: &[f32], expected: &[f32], tol: f32) {
    assert_eq!(actual.len(), expected.len());
    let scale = expected.iter().fold(1.0f32, |m, e| m.max(e.abs()));
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tol * scale,
            "index {i}: {a} vs {e} (scale {scale})"
        );
    }
}

#[test]
fn scenario_both_variants_match_direct_f32() {
    let config = layer();
    let mut rng = StdRng::seed_from_u64(SEED);
    let input = random_vec(&mut rng, config.input_len(), |v| v as f32);
    let weights = random_vec(&mut rng, config.weight_len(), |v| v as f32);
    let expected = conv2d_direct(&config, &input, &weights).unwrap();

    let cache = TransformCache::new();
    let mut outputs = Vec::new();
    for variant in WinogradVariant::ALL {
        let mut conv = WinogradConv::new(variant, config, &cache).unwrap();
        let mut scratch = vec![0.0f32; conv.scratch_len()];
        let out = conv.infer(&input, &weights, &mut scratch).unwrap();
        assert_eq!(out.shape(), (1, 7, 25, 25));
        assert_close_f32(out.as_slice(), expected.as_slice(), 1e-3);
        outputs.push(out);
    }

    // Leading and trailing elements agree across variants
    let (a, b) = (outputs[0].as_slice(), outputs[1].as_slice());
    let last = a.len() - 1;
    for i in [0, 1, 2, last] {
        assert!((a[i] - b[i]).abs() <= 1e-3 * a[i].abs().max(1.0), "index {i}");
    }
}

#[test]
fn scenario_both_variants_match_direct_f64() {
    let config = layer().with_batch(2);
    let mut rng = StdRng::seed_from_u64(SEED + 1);
    let input = random_vec(&mut rng, config.input_len(), |v| v - 5.0);
    let weights = random_vec(&mut rng, config.weight_len(), |v| v / 10.0);
    let expected = conv2d_direct(&config, &input, &weights).unwrap();

    let cache = TransformCache::new();
    for variant in WinogradVariant::ALL {
        let mut conv = WinogradConv::new(variant, config, &cache).unwrap();
        let out = conv.infer_alloc(&input, &weights).unwrap();
        for (a, e) in out.as_slice().iter().zip(expected.as_slice()) {
            assert!((a - e).abs() < 1e-9 * e.abs().max(1.0), "{variant}: {a} vs {e}");
        }
    }
}

#[test]
fn scenario_same_seed_same_output() {
    let config = layer();
    let cache = TransformCache::<f32>::new();
    let run = || {
        let mut rng = StdRng::seed_from_u64(SEED);
        let input = random_vec(&mut rng, config.input_len(), |v| v as f32);
        let weights = random_vec(&mut rng, config.weight_len(), |v| v as f32);
        let mut conv = WinogradConv::new(WinogradVariant::F6x6, config, &cache).unwrap();
        conv.infer_alloc(&input, &weights).unwrap()
    };
    assert_eq!(run(), run());
    assert_eq!(cache.populated(), 3);
}

#[test]
fn scenario_zero_input_yields_bias() {
    let config = layer();
    let mut rng = StdRng::seed_from_u64(SEED + 2);
    let weights = random_vec(&mut rng, config.weight_len(), |v| v as f32);
    let bias = &weights[config.kernel_len()..];

    let cache = TransformCache::new();
    for variant in WinogradVariant::ALL {
        let mut conv = WinogradConv::new(variant, config, &cache).unwrap();
        let out = conv
            .infer_alloc(&vec![0.0; config.input_len()], &weights)
            .unwrap();
        let plane = config.out_height() * config.out_width();
        for (channel, &b) in out.as_slice().chunks(plane).zip(bias) {
            assert!(channel.iter().all(|&v| v == b), "{variant}");
        }
    }
}

#[test]
fn scenario_no_bias_zero_input_yields_zero() {
    let config = layer().with_bias(false);
    let mut rng = StdRng::seed_from_u64(SEED + 3);
    let weights = random_vec(&mut rng, config.weight_len(), |v| v as f32);
    assert_eq!(weights.len(), config.kernel_len());

    let cache = TransformCache::new();
    let mut conv = WinogradConv::new(WinogradVariant::F4x4, config, &cache).unwrap();
    let out = conv
        .infer_alloc(&vec![0.0; config.input_len()], &weights)
        .unwrap();
    assert!(out.as_slice().iter().all(|&v| v == 0.0));
}

#[test]
fn scenario_batch_elements_are_independent() {
    let single = ConvolutionConfig::new(2, 4, 17, 11).with_padding(2);
    let batched = single.with_batch(3);
    let mut rng = StdRng::seed_from_u64(SEED + 4);
    let input = random_vec(&mut rng, batched.input_len(), |v| v as f32);
    let weights = random_vec(&mut rng, batched.weight_len(), |v| v as f32);

    let cache = TransformCache::new();
    for variant in WinogradVariant::ALL {
        let mut whole = WinogradConv::new(variant, batched, &cache).unwrap();
        let mut one = WinogradConv::new(variant, single, &cache).unwrap();
        let out = whole.infer_alloc(&input, &weights).unwrap();
        for (n, chunk) in input.chunks(single.input_len()).enumerate() {
            let expected = one.infer_alloc(chunk, &weights).unwrap();
            assert_eq!(out.plane(n), expected.as_slice(), "{variant} batch {n}");
        }
    }
}

#[test]
fn scenario_every_output_pixel_is_written() {
    // Extents that are not multiples of either tile size
    let config = ConvolutionConfig::new(1, 2, 23, 19)
        .with_padding(1)
        .with_bias(false);
    let cache = TransformCache::<f64>::new();
    let mut weights = vec![0.0; config.kernel_len()];
    // Centre tap of both output channels
    weights[4] = 1.0;
    weights[9 + 4] = -1.0;
    let input: Vec<f64> = (0..config.input_len()).map(|i| i as f64 + 1.0).collect();

    for variant in WinogradVariant::ALL {
        let mut conv = WinogradConv::new(variant, config, &cache).unwrap();
        let out = conv.infer_alloc(&input, &weights).unwrap();
        let (first, second) = out.as_slice().split_at(config.out_height() * config.out_width());
        for (i, (&a, &b)) in first.iter().zip(second).enumerate() {
            assert!((a - input[i]).abs() < 1e-9, "{variant} pixel {i}");
            assert!((b + input[i]).abs() < 1e-9, "{variant} pixel {i}");
        }
    }
}

#[test]
fn scenario_undersized_scratch_is_rejected() {
    let config = layer();
    let cache = TransformCache::<f32>::new();
    let mut conv = WinogradConv::new(WinogradVariant::F6x6, config, &cache).unwrap();
    assert_eq!(conv.scratch_len(), 7 * 5 * 5 * 64);

    let mut scratch = vec![0.0; conv.scratch_len() / 2];
    let err = conv
        .infer(
            &vec![0.0; config.input_len()],
            &vec![0.0; config.weight_len()],
            &mut scratch,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        WinogradError::BufferTooSmall { buffer: "scratch", .. }
    ));
    assert!(!err.is_configuration());
}

#[test]
fn scenario_variant_from_tile_size() {
    let config = layer();
    let cache = TransformCache::<f32>::new();
    for (tile, expected) in [(8, WinogradVariant::F6x6), (6, WinogradVariant::F4x4)] {
        let variant = WinogradVariant::from_tile_size(tile).unwrap();
        assert_eq!(variant, expected);
        let conv = WinogradConv::new(variant, config, &cache).unwrap();
        assert_eq!(conv.geometry().tile_in, tile);
    }
    assert!(matches!(
        WinogradVariant::from_tile_size(4),
        Err(WinogradError::UnsupportedVariant(_))
    ));
}
