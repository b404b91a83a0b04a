//! Strided convolutions with "same" padding
//!
//! Tensors use the `(batch, channels, height, width)` layout. The backend layers only pad
//! symmetrically, so the asymmetric padding of a strided "same" convolution is applied to the
//! input beforehand and the output of a transposed convolution is cropped afterwards.
use burn::nn::conv::{Conv2d, ConvTranspose2d};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Padding of one axis of a strided convolution with "same" padding
///
/// The convolution maps `input` positions to `output = ceil(input / stride)` positions. The
/// total padding `max((output - 1) * stride + kernel - input, 0)` is split with the smaller
/// half going before the first position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamePadding {
    pub output: usize,
    pub before: usize,
    pub after: usize,
}

impl SamePadding {
    pub fn new(input: usize, kernel: usize, stride: usize) -> Self {
        let output = (input + stride - 1) / stride;
        let total = (output.saturating_sub(1) * stride + kernel).saturating_sub(input);

        SamePadding {
            output,
            before: total / 2,
            after: total - total / 2,
        }
    }
}

/// Zero pad the two spatial axes by `(before, after)` rows and columns
pub(crate) fn pad_spatial<B: Backend>(x: Tensor<B, 4>, rows: (usize, usize), cols: (usize, usize)) -> Tensor<B, 4> {
    if rows == (0, 0) && cols == (0, 0) {
        return x;
    }

    let [n, c, h, w] = x.dims();
    let device = x.device();
    Tensor::zeros([n, c, h + rows.0 + rows.1, w + cols.0 + cols.1], &device).slice_assign(
        [0..n, 0..c, rows.0..rows.0 + h, cols.0..cols.0 + w],
        x,
    )
}

/// Apply a convolution without padding of its own to the "same" padded input
pub fn conv2d_same<B: Backend>(layer: &Conv2d<B>, x: Tensor<B, 4>, stride: usize) -> Tensor<B, 4> {
    let [_, _, h, w] = x.dims();
    let [_, _, kh, kw] = layer.weight.val().dims();
    let rows = SamePadding::new(h, kh, stride);
    let cols = SamePadding::new(w, kw, stride);

    layer.forward(pad_spatial(x, (rows.before, rows.after), (cols.before, cols.after)))
}

/// Transposed "same" convolution producing a `target` sized output
///
/// This is the adjoint of [`conv2d_same`] on a `target` sized input: the full transposed
/// convolution is computed and the padded border is cut off.
pub fn conv_transpose2d_same<B: Backend>(
    layer: &ConvTranspose2d<B>,
    x: Tensor<B, 4>,
    target: (usize, usize),
    stride: usize,
) -> Tensor<B, 4> {
    let [_, _, kh, kw] = layer.weight.val().dims();
    let rows = SamePadding::new(target.0, kh, stride);
    let cols = SamePadding::new(target.1, kw, stride);

    let full = layer.forward(x);
    let [_, _, h, w] = full.dims();
    // kernels smaller than the stride leave the last positions uncovered
    let full = pad_spatial(
        full,
        (0, (rows.before + target.0).saturating_sub(h)),
        (0, (cols.before + target.1).saturating_sub(w)),
    );

    let [n, c, _, _] = full.dims();
    full.slice([
        0..n,
        0..c,
        rows.before..rows.before + target.0,
        cols.before..cols.before + target.1,
    ])
}
