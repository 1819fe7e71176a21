//! Direct convolution
//!
//! Straightforward nested-loop convolution with zero padding. It accepts any
//! kernel size and stride, uses the same weight and bias layout as the Winograd
//! engine, and serves as the correctness oracle for it.

use crate::config::ConvolutionConfig;
use crate::{Element, Result, Tensor, WinogradError};

/// Convolves `input` (NCHW) with `weights` (OIHW kernel block, then optional bias)
///
/// # Errors
///
/// - `UnsupportedGroups` if `config.groups != 1`
/// - `InvalidConfig` if the padded input is smaller than the kernel or the stride is zero
/// - `SizeMismatch` if `input` or `weights` disagree with `config`
///
/// # Example
///
/// ```
/// use winoconv::{reference::conv2d_direct, ConvolutionConfig};
///
/// // 1x1x3x3 input of ones, one 3x3 kernel of ones, bias 0.5
/// let config = ConvolutionConfig::new(1, 1, 3, 3);
/// let mut weights = vec![1.0f32; 9];
/// weights.push(0.5);
/// let out = conv2d_direct(&config, &[1.0f32; 9], &weights).unwrap();
/// assert_eq!(out.shape(), (1, 1, 1, 1));
/// assert_eq!(out.as_slice(), &[9.5]);
/// ```
pub fn conv2d_direct<T: Element>(
    config: &ConvolutionConfig,
    input: &[T],
    weights: &[T],
) -> Result<Tensor<T>> {
    if config.groups != 1 {
        return Err(WinogradError::UnsupportedGroups(config.groups));
    }
    if config.stride_h == 0 || config.stride_w == 0 {
        return Err(WinogradError::InvalidConfig("stride must be non-zero".to_string()));
    }
    let (out_h, out_w) = (config.out_height(), config.out_width());
    if out_h == 0 || out_w == 0 {
        return Err(WinogradError::InvalidConfig(
            "padded input is smaller than the kernel".to_string(),
        ));
    }
    for (expected, actual) in [
        (config.input_len(), input.len()),
        (config.weight_len(), weights.len()),
    ] {
        if expected != actual {
            return Err(WinogradError::SizeMismatch { expected, actual });
        }
    }

    let (ic, oc) = (config.in_channels, config.out_channels);
    let (h, w) = (config.height, config.width);
    let (kh, kw) = (config.kernel_h, config.kernel_w);
    let pad = config.padding;
    let bias = config.bias.then(|| &weights[config.kernel_len()..]);

    let mut output = Tensor::zeros(config.batch, oc, out_h, out_w);
    for n in 0..config.batch {
        let src = &input[n * config.input_plane_len()..(n + 1) * config.input_plane_len()];
        let dst = output.plane_mut(n);
        for o in 0..oc {
            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut sum = T::zero();
                    for i in 0..ic {
                        for ky in 0..kh {
                            let Some(iy) = (oy * config.stride_h + ky).checked_sub(pad) else {
                                continue;
                            };
                            if iy >= h {
                                continue;
                            }
                            for kx in 0..kw {
                                let Some(ix) = (ox * config.stride_w + kx).checked_sub(pad) else {
                                    continue;
                                };
                                if ix >= w {
                                    continue;
                                }
                                let wv = weights[((o * ic + i) * kh + ky) * kw + kx];
                                sum += src[(i * h + iy) * w + ix] * wv;
                            }
                        }
                    }
                    if let Some(bias) = bias {
                        sum += bias[o];
                    }
                    dst[(o * out_h + oy) * out_w + ox] = sum;
                }
            }
        }
    }
    Ok(output)
}
