//! Latent space critic
use crate::autoencoder::xavier;
use crate::errors::{NnError, Result};
use crate::tensor::{to_array, NetFloat};

use burn::module::{Module, ModuleMapper, ParamId};
use burn::nn::{Linear, LinearConfig};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use ndarray::ArrayD;

/// Two hidden ReLU layers followed by a linear output unit without bias
///
/// The critic scores latent vectors, higher scores mean "looks like a real sample". It is
/// trained in the Wasserstein setting, its weights are kept in a box by a [`WeightClipper`].
#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    hidden: Linear<B>,
    bottleneck: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> Discriminator<B> {
    pub fn new(inputs: usize, hidden: (usize, usize), device: &B::Device) -> Self {
        Discriminator {
            hidden: LinearConfig::new(inputs, hidden.0)
                .with_initializer(xavier())
                .init(device),
            bottleneck: LinearConfig::new(hidden.0, hidden.1)
                .with_initializer(xavier())
                .init(device),
            output: LinearConfig::new(hidden.1, 1)
                .with_bias(false)
                .with_initializer(xavier())
                .init(device),
        }
    }

    /// Width of the latent vectors scored by the critic
    pub fn inputs(&self) -> usize {
        self.hidden.weight.val().dims()[0]
    }

    /// Score every row of `x`, the result has shape `(rows, 1)`
    pub fn forward(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let [rows, width] = x.dims();
        if width != self.inputs() {
            return Err(NnError::TensorShape {
                name: "critic input".into(),
                expected: vec![rows, self.inputs()],
                found: vec![rows, width],
            });
        }

        let x = relu(self.hidden.forward(x));
        let x = relu(self.bottleneck.forward(x));
        Ok(self.output.forward(x))
    }

    /// `mean D(real) - mean D(fake)`, both sets are scored in one pass
    pub fn score(&self, real: Tensor<B, 2>, fake: Tensor<B, 2>) -> Result<Tensor<B, 1>> {
        let n_real = real.dims()[0];
        let n_fake = fake.dims()[0];

        let scores = self.forward(Tensor::cat(vec![real, fake], 0))?;
        let real_mean = scores.clone().slice([0..n_real, 0..1]).mean();
        let fake_mean = scores.slice([n_real..n_real + n_fake, 0..1]).mean();

        Ok(real_mean - fake_mean)
    }

    /// Copies of all weights and biases, layer by layer
    pub fn weights<F: NetFloat>(&self) -> Result<Vec<ArrayD<F>>> {
        let mut weights = Vec::with_capacity(5);
        for layer in [&self.hidden, &self.bottleneck, &self.output] {
            weights.push(to_array(layer.weight.val())?);
            if let Some(bias) = &layer.bias {
                weights.push(to_array(bias.val())?);
            }
        }
        Ok(weights)
    }
}

/// Clamps every parameter of a module into `[-bound, bound]`
///
/// Parameters keep their ids, so optimizer state attached to them survives the clipping.
#[derive(Clone, Copy, Debug)]
pub struct WeightClipper {
    pub bound: f64,
}

impl<B: Backend> ModuleMapper<B> for WeightClipper {
    fn map_float<const D: usize>(&mut self, _id: &ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        tensor.clamp(-self.bound, self.bound).detach().require_grad()
    }
}
