//! Convolutional autoencoder with a self-expressive layer between encoder and decoder
use crate::conv::{conv2d_same, conv_transpose2d_same};
use crate::errors::{NnError, Result};

use burn::module::{Module, Param};
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{Initializer, PaddingConfig2d};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::{Element, ElementConversion, Tensor};

pub(crate) fn xavier() -> Initializer {
    Initializer::XavierUniform { gain: 1.0 }
}

/// Stack of strided convolutions with ReLU activations
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    layers: Vec<Conv2d<B>>,
    stride: usize,
}

impl<B: Backend> Encoder<B> {
    /// Single channel input, layer `i` has `channels[i]` filters of size `kernels[i]`
    pub fn new(channels: &[usize], kernels: &[usize], stride: usize, device: &B::Device) -> Self {
        let mut inputs = 1;
        let layers = channels
            .iter()
            .zip(kernels.iter())
            .map(|(&filters, &kernel)| {
                let layer = Conv2dConfig::new([inputs, filters], [kernel, kernel])
                    .with_stride([stride, stride])
                    .with_padding(PaddingConfig2d::Valid)
                    .with_initializer(xavier())
                    .init::<B>(device);
                inputs = filters;
                layer
            })
            .collect();

        Encoder { layers, stride }
    }

    pub fn layers(&self) -> &[Conv2d<B>] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Conv2d<B>] {
        &mut self.layers
    }

    /// Shape `(channels, height, width)` of the encoding of a `height x width` image
    pub fn output_shape(&self, (mut h, mut w): (usize, usize)) -> (usize, usize, usize) {
        let mut channels = 1;
        for layer in &self.layers {
            h = (h + self.stride - 1) / self.stride;
            w = (w + self.stride - 1) / self.stride;
            channels = layer.weight.val().dims()[0];
        }
        (channels, h, w)
    }

    /// Encoding of `x` and the spatial input size of every layer, in encoder order
    pub fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 4>, Vec<(usize, usize)>) {
        let mut input_dims = Vec::with_capacity(self.layers.len());
        let mut current = x;
        for layer in &self.layers {
            let [_, _, h, w] = current.dims();
            input_dims.push((h, w));
            current = relu(conv2d_same(layer, current, self.stride));
        }

        (current, input_dims)
    }
}

/// Stack of transposed convolutions with ReLU activations mirroring an [`Encoder`]
#[derive(Module, Debug)]
pub struct Decoder<B: Backend> {
    layers: Vec<ConvTranspose2d<B>>,
    stride: usize,
}

impl<B: Backend> Decoder<B> {
    /// Mirror of `Encoder::new(channels, kernels, stride)`, ending in a single channel
    pub fn new(channels: &[usize], kernels: &[usize], stride: usize, device: &B::Device) -> Self {
        let layers = (0..channels.len())
            .rev()
            .map(|i| {
                let filters = if i == 0 { 1 } else { channels[i - 1] };
                ConvTranspose2dConfig::new([channels[i], filters], [kernels[i], kernels[i]])
                    .with_stride([stride, stride])
                    .with_initializer(xavier())
                    .init::<B>(device)
            })
            .collect();

        Decoder { layers, stride }
    }

    pub fn layers(&self) -> &[ConvTranspose2d<B>] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [ConvTranspose2d<B>] {
        &mut self.layers
    }

    /// Decode `z`, the output of layer `i` takes the shape of the input of encoder layer
    /// `n - 1 - i`
    pub fn forward(&self, z: Tensor<B, 4>, encoder_dims: &[(usize, usize)]) -> Result<Tensor<B, 4>> {
        if encoder_dims.len() != self.layers.len() {
            return Err(NnError::TensorShape {
                name: "decoder shapes".into(),
                expected: vec![self.layers.len()],
                found: vec![encoder_dims.len()],
            });
        }

        let mut current = z;
        for (layer, &dims) in self.layers.iter().zip(encoder_dims.iter().rev()) {
            current = relu(conv_transpose2d_same(layer, current, dims, self.stride));
        }

        Ok(current)
    }
}

/// Square coefficient matrix expressing every latent vector by the others of its batch
#[derive(Module, Debug)]
pub struct SelfExpressive<B: Backend> {
    coef: Param<Tensor<B, 2>>,
}

impl<B: Backend> SelfExpressive<B> {
    /// Coefficients of a batch of `batch_size` samples, all set to `init`
    pub fn new(batch_size: usize, init: f64, device: &B::Device) -> Self {
        let coef = Tensor::full([batch_size, batch_size], init, device).require_grad();
        SelfExpressive {
            coef: Param::from_tensor(coef),
        }
    }

    /// Set every coefficient to `value`, the parameter keeps its id
    pub fn reset(&mut self, value: f64) {
        let current = self.coef.val();
        let coef = Tensor::full(current.dims(), value, &current.device()).require_grad();
        self.coef = Param::initialized(self.coef.id.clone(), coef);
    }

    pub fn coefficients(&self) -> Tensor<B, 2> {
        self.coef.val()
    }

    pub fn batch_size(&self) -> usize {
        self.coef.val().dims()[0]
    }

    /// `C Z`
    pub fn forward(&self, latent: Tensor<B, 2>) -> Tensor<B, 2> {
        self.coef.val().matmul(latent)
    }
}

/// The three terms of the autoencoder objective
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Eqn3Losses<F> {
    /// `0.5 * |X_r - X|^2`
    pub reconstruction: F,
    /// `|C|^2`
    pub sparsity: F,
    /// `0.5 * |C Z - Z|^2`
    pub self_expression: F,
}

impl<F: dscgan::Float> Eqn3Losses<F> {
    /// `reconstruction + lambda1 * sparsity + lambda2 * self_expression`
    pub fn total(&self, lambda1: F, lambda2: F) -> F {
        self.reconstruction + lambda1 * self.sparsity + lambda2 * self.self_expression
    }
}

/// The loss terms as scalar tensors, still attached to the autodiff graph
#[derive(Clone, Debug)]
pub struct Eqn3Terms<B: Backend> {
    pub reconstruction: Tensor<B, 1>,
    pub sparsity: Tensor<B, 1>,
    pub self_expression: Tensor<B, 1>,
}

impl<B: Backend> Eqn3Terms<B> {
    pub fn total(&self, lambda1: f64, lambda2: f64) -> Tensor<B, 1> {
        self.reconstruction.clone()
            + self.sparsity.clone().mul_scalar(lambda1)
            + self.self_expression.clone().mul_scalar(lambda2)
    }

    pub fn values<F: Element>(&self) -> Eqn3Losses<F> {
        Eqn3Losses {
            reconstruction: self.reconstruction.clone().into_scalar().elem(),
            sparsity: self.sparsity.clone().into_scalar().elem(),
            self_expression: self.self_expression.clone().into_scalar().elem(),
        }
    }
}

/// Everything computed by one pass through the autoencoder
#[derive(Clone, Debug)]
pub struct AutoencoderPass<B: Backend> {
    /// Flattened encodings `Z` with shape `(batch, latent width)`
    pub latent: Tensor<B, 2>,
    /// Self-expressed encodings `C Z`
    pub mixed: Tensor<B, 2>,
    pub reconstruction: Tensor<B, 4>,
}

/// Encoder, self-expressive layer and decoder
///
/// All three components are trained jointly by the autoencoder objectives.
#[derive(Module, Debug)]
pub struct ConvAutoencoder<B: Backend> {
    pub encoder: Encoder<B>,
    pub self_expressive: SelfExpressive<B>,
    pub decoder: Decoder<B>,
}

impl<B: Backend> ConvAutoencoder<B> {
    /// Flattened encodings of any number of images
    pub fn encode(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let (encoding, _) = self.encoder.forward(x);
        let [n, c, h, w] = encoding.dims();
        encoding.reshape([n, c * h * w])
    }

    /// Encode, self-express and decode a batch of `(batch, 1, height, width)` images
    ///
    /// The batch has to match the size of the coefficient matrix.
    pub fn forward(&self, x: Tensor<B, 4>) -> Result<AutoencoderPass<B>> {
        let batch = x.dims()[0];
        if batch != self.self_expressive.batch_size() {
            return Err(NnError::BatchSize {
                expected: self.self_expressive.batch_size(),
                found: batch,
            });
        }

        let (encoding, input_dims) = self.encoder.forward(x);
        let [n, c, h, w] = encoding.dims();
        let latent = encoding.reshape([n, c * h * w]);
        let mixed = self.self_expressive.forward(latent.clone());
        let reconstruction = self
            .decoder
            .forward(mixed.clone().reshape([n, c, h, w]), &input_dims)?;

        Ok(AutoencoderPass {
            latent,
            mixed,
            reconstruction,
        })
    }

    pub fn losses(&self, x: Tensor<B, 4>, pass: &AutoencoderPass<B>) -> Eqn3Terms<B> {
        let reconstruction = (pass.reconstruction.clone() - x).powf_scalar(2.0).sum().mul_scalar(0.5);
        let sparsity = self.self_expressive.coefficients().powf_scalar(2.0).sum();
        let self_expression = (pass.mixed.clone() - pass.latent.clone())
            .powf_scalar(2.0)
            .sum()
            .mul_scalar(0.5);

        Eqn3Terms {
            reconstruction,
            sparsity,
            self_expression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::NetBackend;
    use approx::assert_abs_diff_eq;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type Cpu = NdArray<f64>;

    fn small_autoencoder<B: Backend>(batch: usize, device: &B::Device) -> ConvAutoencoder<B> {
        ConvAutoencoder {
            encoder: Encoder::new(&[3, 4], &[3, 3], 2, device),
            self_expressive: SelfExpressive::new(batch, 1e-1, device),
            decoder: Decoder::new(&[3, 4], &[3, 3], 2, device),
        }
    }

    #[test]
    fn decoder_restores_input_shape() {
        let device = Default::default();
        let ae = ConvAutoencoder::<Cpu> {
            encoder: Encoder::new(&[10, 20, 30], &[5, 3, 3], 2, &device),
            self_expressive: SelfExpressive::new(2, 1e-4, &device),
            decoder: Decoder::new(&[10, 20, 30], &[5, 3, 3], 2, &device),
        };
        assert_eq!(ae.encoder.output_shape((48, 42)), (30, 6, 6));

        let x = Tensor::<Cpu, 4>::random([2, 1, 48, 42], Distribution::Uniform(0., 1.), &device);
        let (_, input_dims) = ae.encoder.forward(x.clone());
        assert_eq!(input_dims, vec![(48, 42), (24, 21), (12, 11)]);

        let pass = ae.forward(x).unwrap();
        assert_eq!(pass.latent.dims(), [2, 1080]);
        assert_eq!(pass.reconstruction.dims(), [2, 1, 48, 42]);
    }

    #[test]
    fn rejects_wrong_batch() {
        let device = Default::default();
        let ae = small_autoencoder::<Cpu>(3, &device);
        let x = Tensor::<Cpu, 4>::zeros([2, 1, 7, 6], &device);

        assert!(matches!(
            ae.forward(x),
            Err(NnError::BatchSize {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn coefficient_gradient_includes_sparsity() {
        let device = Default::default();
        let mut ae = small_autoencoder::<NetBackend<f64>>(2, &device);
        ae.self_expressive = SelfExpressive::new(2, 0.25, &device);

        let x = Tensor::zeros([2, 1, 7, 6], &device);
        let pass = ae.forward(x.clone()).unwrap();
        let terms = ae.losses(x, &pass);
        let values: Eqn3Losses<f64> = terms.values();
        assert_abs_diff_eq!(values.sparsity, 4.0 * 0.25 * 0.25, epsilon = 1e-12);

        // d |C|^2 / dC = 2 C
        let mut grads = terms.sparsity.backward();
        let coef_grad = ae
            .self_expressive
            .coefficients()
            .grad_remove(&mut grads)
            .unwrap();
        let expected = Tensor::<Cpu, 2>::full([2, 2], 0.5, &device);
        assert!(coef_grad.equal(expected).all().into_scalar());
    }

    #[test]
    fn losses_vanish_for_a_perfect_reconstruction() {
        let device = Default::default();
        let ae = small_autoencoder::<Cpu>(2, &device);
        let x = Tensor::<Cpu, 4>::random([2, 1, 7, 6], Distribution::Uniform(0., 1.), &device);
        let pass = ae.forward(x).unwrap();

        let terms = ae.losses(pass.reconstruction.clone(), &pass);
        let values: Eqn3Losses<f64> = terms.values();
        assert_abs_diff_eq!(values.reconstruction, 0.0);
        assert_abs_diff_eq!(
            values.total(1.0, 2.0),
            values.sparsity + 2.0 * values.self_expression
        );
    }
}
