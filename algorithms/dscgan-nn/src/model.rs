//! Deep subspace clustering network with an adversarially trained latent space
use crate::autoencoder::{ConvAutoencoder, Decoder, Encoder, Eqn3Losses, SelfExpressive};
use crate::discriminator::{Discriminator, WeightClipper};
use crate::errors::{NnError, Result};
use crate::fakes::FakeBatch;
use crate::hyperparams::{DscNetParams, DscNetValidParams};
use crate::tensor::{to_array, to_tensor, NetBackend, NetFloat};

use burn::backend::ndarray::{NdArray, NdArrayDevice};
use burn::module::{AutodiffModule, Module};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use dscgan::{Float, ParamGuard};
use log::debug;
use ndarray::{Array2, Array4, ArrayBase, ArrayD, ArrayView4, Data, Ix1, Ix2, Ix4};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::fmt;

type AutoencoderOptimizer<F> =
    OptimizerAdaptor<Adam<NdArray<F>>, ConvAutoencoder<NetBackend<F>>, NetBackend<F>>;
type CriticOptimizer<F> = OptimizerAdaptor<Adam<NdArray<F>>, Discriminator<NetBackend<F>>, NetBackend<F>>;

/// Values reported after every autoencoder update
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepSummary<F> {
    /// Number of autoencoder updates so far, including this one
    pub step: usize,
    /// Loss terms before the update
    pub losses: Eqn3Losses<F>,
    /// Critic score before the update, only present for adversarial updates
    pub score: Option<F>,
}

impl<F: Float> StepSummary<F> {
    /// Reconstruction loss, the cost reported per update
    pub fn cost(&self) -> F {
        self.losses.reconstruction
    }
}

/// Deep subspace clustering network
///
/// A convolutional autoencoder whose latent vectors pass through a self-expressive layer
/// `Z_c = C Z`, together with a critic that compares real latent vectors with random convex
/// combinations of latent vectors of the same cluster. Three objectives are trained, each
/// with its own Adam optimizer:
///
/// * [`partial_fit_eqn3`](DscNet::partial_fit_eqn3) minimizes reconstruction, sparsity and
///   self-expression loss over the autoencoder,
/// * [`partial_fit_disc`](DscNet::partial_fit_disc) maximizes the critic score
///   `mean D(real) - mean D(fake)` over the critic, followed by weight clipping,
/// * [`partial_fit_eqn3plus`](DscNet::partial_fit_eqn3plus) minimizes the autoencoder loss
///   plus `lambda3` times the critic score over the autoencoder.
///
/// The coefficient matrix covers exactly one batch, all updates therefore expect batches of
/// `batch_size` images.
///
/// ```
/// use dscgan_nn::DscNet;
/// use ndarray::Array4;
///
/// let mut net = DscNet::<f32>::params(1, 4)
///     .image_shape(8, 6)
///     .layers(vec![3], vec![2])
///     .critic_hidden(4, 3)
///     .fakes_per_cluster(2)
///     .build()
///     .unwrap();
///
/// let images = Array4::from_elem((4, 1, 8, 6), 0.5);
/// let summary = net.partial_fit_eqn3(&images).unwrap();
/// assert_eq!(summary.step, 1);
/// assert_eq!(net.latent_width(), 2 * 4 * 3);
/// ```
pub struct DscNet<F: NetFloat, R: Rng = Xoshiro256Plus> {
    params: DscNetValidParams<F, R>,
    pub(crate) device: NdArrayDevice,
    pub(crate) autoencoder: ConvAutoencoder<NetBackend<F>>,
    discriminator: Discriminator<NetBackend<F>>,
    eqn3_optimizer: AutoencoderOptimizer<F>,
    disc_optimizer: CriticOptimizer<F>,
    eqn3plus_optimizer: AutoencoderOptimizer<F>,
    rng: R,
    n_steps: usize,
}

impl<F: NetFloat> DscNet<F, Xoshiro256Plus> {
    /// Hyperparameters with a seeded default random generator
    pub fn params(n_clusters: usize, batch_size: usize) -> DscNetParams<F, Xoshiro256Plus> {
        DscNetParams::new(n_clusters, batch_size, Xoshiro256Plus::seed_from_u64(42))
    }
}

impl<F: NetFloat, R: Rng + Clone> DscNet<F, R> {
    pub fn params_with_rng(n_clusters: usize, batch_size: usize, rng: R) -> DscNetParams<F, R> {
        DscNetParams::new(n_clusters, batch_size, rng)
    }

    /// Randomly initialized network
    pub fn new(params: DscNetValidParams<F, R>) -> Self {
        let mut rng = params.rng().clone();
        let device = NdArrayDevice::default();
        let (autoencoder, discriminator) = initialize(&params, &mut rng, &device);

        DscNet {
            params,
            device,
            autoencoder,
            discriminator,
            eqn3_optimizer: adam(),
            disc_optimizer: adam(),
            eqn3plus_optimizer: adam(),
            rng,
            n_steps: 0,
        }
    }

    pub fn hyperparams(&self) -> &DscNetValidParams<F, R> {
        &self.params
    }

    pub fn autoencoder(&self) -> &ConvAutoencoder<NetBackend<F>> {
        &self.autoencoder
    }

    pub fn discriminator(&self) -> &Discriminator<NetBackend<F>> {
        &self.discriminator
    }

    /// Copy of the self-expressive coefficient matrix
    pub fn coefficients(&self) -> Result<Array2<F>> {
        let coef = to_array(self.autoencoder.self_expressive.coefficients())?;
        Ok(coef.into_dimensionality::<Ix2>()?)
    }

    /// Copies of the critic weights and biases
    pub fn critic_weights(&self) -> Result<Vec<ArrayD<F>>> {
        self.discriminator.weights()
    }

    /// Number of autoencoder updates since construction or the last reinitialization
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// Width of a flattened latent vector
    pub fn latent_width(&self) -> usize {
        let (c, h, w) = self.autoencoder.encoder.output_shape(self.params.image_shape());
        c * h * w
    }

    /// Set every coefficient back to its initial value
    pub fn reset_coefficients(&mut self) {
        self.autoencoder
            .self_expressive
            .reset(self.params.coef_init().elem());
    }

    /// Draw new weights for all layers, reset the coefficients and the optimizer states
    ///
    /// The random generator keeps its state, so consecutive calls produce different weights.
    pub fn reinitialize(&mut self) {
        let (autoencoder, discriminator) = initialize(&self.params, &mut self.rng, &self.device);
        self.autoencoder = autoencoder;
        self.discriminator = discriminator;
        self.reset_optimizers();
        self.n_steps = 0;
    }

    pub(crate) fn reset_optimizers(&mut self) {
        self.eqn3_optimizer = adam();
        self.disc_optimizer = adam();
        self.eqn3plus_optimizer = adam();
    }

    /// Loss terms of a batch without updating anything
    pub fn evaluate(&self, x: &ArrayBase<impl Data<Elem = F>, Ix4>) -> Result<Eqn3Losses<F>> {
        let x: Tensor<NdArray<F>, 4> = to_tensor(&self.check_batch(x)?, &self.device);
        let autoencoder = self.autoencoder.valid();
        let pass = autoencoder.forward(x.clone())?;

        Ok(autoencoder.losses(x, &pass).values())
    }

    /// Reconstruct a batch of `batch_size` images
    pub fn reconstruct(&self, x: &ArrayBase<impl Data<Elem = F>, Ix4>) -> Result<Array4<F>> {
        let x: Tensor<NdArray<F>, 4> = to_tensor(&self.check_batch(x)?, &self.device);
        let pass = self.autoencoder.valid().forward(x)?;

        Ok(to_array(pass.reconstruction)?.into_dimensionality::<Ix4>()?)
    }

    /// Flattened encodings of any number of images
    pub fn transform(&self, x: &ArrayBase<impl Data<Elem = F>, Ix4>) -> Result<Array2<F>> {
        self.check_images(x)?;
        let x: Tensor<NdArray<F>, 4> = to_tensor(x, &self.device);
        let latent = self.autoencoder.valid().encode(x);

        Ok(to_array(latent)?.into_dimensionality::<Ix2>()?)
    }

    /// One Adam step on `reconstruction + lambda1 * sparsity + lambda2 * self_expression`
    pub fn partial_fit_eqn3(&mut self, x: &ArrayBase<impl Data<Elem = F>, Ix4>) -> Result<StepSummary<F>> {
        let x: Tensor<NetBackend<F>, 4> = to_tensor(&self.check_batch(x)?, &self.device);

        let pass = self.autoencoder.forward(x.clone())?;
        let terms = self.autoencoder.losses(x, &pass);
        let losses = terms.values();
        let loss = terms.total(self.params.lambda1().elem(), self.params.lambda2().elem());

        let lr = self.learning_rate();
        let grads = GradientsParams::from_grads(loss.backward(), &self.autoencoder);
        self.autoencoder = self.eqn3_optimizer.step(lr, self.autoencoder.clone(), grads);

        self.n_steps += 1;
        Ok(StepSummary {
            step: self.n_steps,
            losses,
            score: None,
        })
    }

    /// One Adam step of the critic towards a larger score, followed by weight clipping
    ///
    /// The latent vectors are treated as constants. Returns the score before the update.
    pub fn partial_fit_disc(
        &mut self,
        x: &ArrayBase<impl Data<Elem = F>, Ix4>,
        labels: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    ) -> Result<F> {
        let x: Tensor<NetBackend<F>, 4> = to_tensor(&self.check_batch(x)?, &self.device);
        self.check_labels(labels)?;

        let latent = self.autoencoder.encode(x).detach();
        let fakes = self.synthesize(latent.clone(), labels)?;
        let score = self.discriminator.score(latent, fakes)?;
        let value: F = score.clone().into_scalar().elem();

        let lr = self.learning_rate();
        let grads = GradientsParams::from_grads(score.neg().backward(), &self.discriminator);
        let critic = self.disc_optimizer.step(lr, self.discriminator.clone(), grads);
        self.discriminator = critic.map(&mut WeightClipper {
            bound: self.params.clip_bound().elem(),
        });

        debug!("critic score {:.6}", value);
        Ok(value)
    }

    /// One Adam step of the autoencoder on its loss plus `lambda3` times the critic score
    ///
    /// The critic weights stay fixed. The gradient of the score reaches the encoder through the
    /// real latent vectors and through the fakes built from them.
    pub fn partial_fit_eqn3plus(
        &mut self,
        x: &ArrayBase<impl Data<Elem = F>, Ix4>,
        labels: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    ) -> Result<StepSummary<F>> {
        let x: Tensor<NetBackend<F>, 4> = to_tensor(&self.check_batch(x)?, &self.device);
        self.check_labels(labels)?;

        let pass = self.autoencoder.forward(x.clone())?;
        let terms = self.autoencoder.losses(x, &pass);
        let fakes = self.synthesize(pass.latent.clone(), labels)?;
        let score = self.discriminator.score(pass.latent, fakes)?;
        let value: F = score.clone().into_scalar().elem();

        let loss = terms.total(self.params.lambda1().elem(), self.params.lambda2().elem())
            + score.mul_scalar(self.params.lambda3().elem::<f64>());
        let lr = self.learning_rate();
        let grads = GradientsParams::from_grads(loss.backward(), &self.autoencoder);
        self.autoencoder = self.eqn3plus_optimizer.step(lr, self.autoencoder.clone(), grads);

        self.n_steps += 1;
        Ok(StepSummary {
            step: self.n_steps,
            losses: terms.values(),
            score: Some(value),
        })
    }

    fn learning_rate(&self) -> f64 {
        self.params.learning_rate().elem()
    }

    /// Fakes of every cluster mixed from the rows of `latent`
    fn synthesize(
        &mut self,
        latent: Tensor<NetBackend<F>, 2>,
        labels: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    ) -> Result<Tensor<NetBackend<F>, 2>> {
        let fakes = FakeBatch::<F>::synthesize(
            labels,
            self.params.n_clusters(),
            self.params.fakes_per_cluster(),
            &mut self.rng,
        )?;
        let selector: Tensor<NetBackend<F>, 2> = to_tensor(fakes.selector(), &self.device);

        Ok(selector.matmul(latent))
    }

    fn check_images<S: Data<Elem = F>>(&self, x: &ArrayBase<S, Ix4>) -> Result<()> {
        let (height, width) = self.params.image_shape();
        let (_, c, h, w) = x.dim();
        if (c, h, w) != (1, height, width) {
            return Err(NnError::ImageShape {
                expected: (1, height, width),
                found: (c, h, w),
            });
        }
        Ok(())
    }

    fn check_batch<'a, S: Data<Elem = F>>(&self, x: &'a ArrayBase<S, Ix4>) -> Result<ArrayView4<'a, F>> {
        self.check_images(x)?;
        if x.shape()[0] != self.params.batch_size() {
            return Err(NnError::BatchSize {
                expected: self.params.batch_size(),
                found: x.shape()[0],
            });
        }
        Ok(x.view())
    }

    fn check_labels(&self, labels: &ArrayBase<impl Data<Elem = usize>, Ix1>) -> Result<()> {
        if labels.len() != self.params.batch_size() {
            return Err(dscgan::error::Error::MismatchedLabels(self.params.batch_size(), labels.len()).into());
        }
        Ok(())
    }
}

impl<F: NetFloat, R: Rng + fmt::Debug> fmt::Debug for DscNet<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DscNet")
            .field("params", &self.params)
            .field("autoencoder", &self.autoencoder)
            .field("discriminator", &self.discriminator)
            .field("n_steps", &self.n_steps)
            .finish_non_exhaustive()
    }
}

impl<F: NetFloat, R: Rng + Clone> DscNetParams<F, R> {
    /// Check the hyperparameters and initialize a network
    pub fn build(self) -> Result<DscNet<F, R>> {
        Ok(DscNet::new(self.check()?))
    }
}

fn adam<M: AutodiffModule<NetBackend<F>>, F: NetFloat>() -> OptimizerAdaptor<Adam<NdArray<F>>, M, NetBackend<F>> {
    AdamConfig::new().with_epsilon(1e-8).init()
}

/// Fresh layers, the backend generator is seeded from `rng`
fn initialize<F: NetFloat, R: Rng>(
    params: &DscNetValidParams<F, R>,
    rng: &mut impl Rng,
    device: &NdArrayDevice,
) -> (ConvAutoencoder<NetBackend<F>>, Discriminator<NetBackend<F>>) {
    NetBackend::<F>::seed(rng.gen());
    let (kernels, channels, stride) = (params.kernels(), params.channels(), params.stride());

    let encoder = Encoder::new(channels, kernels, stride, device);
    let decoder = Decoder::new(channels, kernels, stride, device);
    let (c, h, w) = encoder.output_shape(params.image_shape());
    let autoencoder = ConvAutoencoder {
        encoder,
        self_expressive: SelfExpressive::new(params.batch_size(), params.coef_init().elem(), device),
        decoder,
    };
    let discriminator = Discriminator::new(c * h * w, params.critic_hidden(), device);

    (autoencoder, discriminator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn small_net(n_clusters: usize, batch_size: usize) -> DscNet<f64> {
        DscNet::params(n_clusters, batch_size)
            .image_shape(12, 10)
            .layers(vec![3, 3], vec![3, 4])
            .critic_hidden(8, 4)
            .fakes_per_cluster(6)
            .build()
            .unwrap()
    }

    fn images(n: usize, seed: u64) -> Array4<f64> {
        let mut rng = Xoshiro256Plus::seed_from_u64(seed);
        Array::random_using((n, 1, 12, 10), Uniform::new(0., 1.), &mut rng)
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sized>() {}
        has_autotraits::<DscNet<f64>>();
        has_autotraits::<StepSummary<f64>>();
    }

    #[test]
    fn default_layout() {
        let net = DscNet::<f32>::params(2, 4).build().unwrap();
        assert_eq!(net.latent_width(), 1080);
        assert_eq!(net.discriminator().inputs(), 1080);

        let coef = net.coefficients().unwrap();
        assert_eq!(coef.dim(), (4, 4));
        assert!(coef.iter().all(|&c| c == 1e-4));
    }

    #[test]
    fn shape_errors() {
        let net = small_net(2, 4);

        assert!(matches!(
            net.reconstruct(&images(3, 0)),
            Err(NnError::BatchSize {
                expected: 4,
                found: 3
            })
        ));
        assert!(matches!(
            net.reconstruct(&Array4::<f64>::zeros((4, 1, 10, 12))),
            Err(NnError::ImageShape { .. })
        ));
        assert_eq!(net.transform(&images(7, 0)).unwrap().dim(), (7, 4 * 3 * 3));
    }

    #[test]
    fn critic_step_leaves_autoencoder_alone() {
        let mut net = small_net(2, 4);
        let x = images(4, 1);
        let labels = ndarray::array![0, 0, 1, 1];
        let critic = net.critic_weights().unwrap();
        let before = net.evaluate(&x).unwrap();

        let score = net.partial_fit_disc(&x, &labels).unwrap();
        assert!(score.is_finite());
        assert_ne!(net.critic_weights().unwrap(), critic);
        assert_eq!(net.evaluate(&x).unwrap(), before);
        assert_eq!(net.n_steps(), 0);
    }

    #[test]
    fn adversarial_step_changes_autoencoder_only() {
        let mut net = small_net(2, 4);
        let x = images(4, 2);
        let labels = ndarray::array![0, 1, 0, 1];
        let critic = net.critic_weights().unwrap();
        let coef = net.coefficients().unwrap();

        let summary = net.partial_fit_eqn3plus(&x, &labels).unwrap();
        assert_eq!(summary.step, 1);
        assert!(summary.score.is_some());
        assert_eq!(net.critic_weights().unwrap(), critic);
        assert_ne!(net.coefficients().unwrap(), coef);
    }

    #[test]
    fn labels_are_validated() {
        let mut net = small_net(2, 4);
        let x = images(4, 3);

        assert!(matches!(
            net.partial_fit_disc(&x, &ndarray::array![1, 1, 2, 2]),
            Err(NnError::DscganError(dscgan::error::Error::NotZeroBased(1)))
        ));
        assert!(matches!(
            net.partial_fit_eqn3plus(&x, &ndarray::array![0, 0, 0, 0]),
            Err(NnError::DscganError(dscgan::error::Error::EmptyCluster(1)))
        ));
        assert!(matches!(
            net.partial_fit_disc(&x, &ndarray::array![0, 1]),
            Err(NnError::DscganError(dscgan::error::Error::MismatchedLabels(4, 2)))
        ));
    }

    #[test]
    fn reinitialize_resets_state() {
        let mut net = small_net(1, 4);
        let x = images(4, 4);
        net.partial_fit_eqn3(&x).unwrap();
        let trained = net.evaluate(&x).unwrap();

        net.reinitialize();
        assert_eq!(net.n_steps(), 0);
        assert_ne!(net.evaluate(&x).unwrap(), trained);
        assert!(net.coefficients().unwrap().iter().all(|&c| c == 1e-4));
    }

    #[test]
    fn reset_coefficients_restores_initial_value() {
        let mut net = small_net(1, 4);
        let x = images(4, 6);
        net.partial_fit_eqn3(&x).unwrap();
        assert!(net.coefficients().unwrap().iter().any(|&c| c != 1e-4));

        net.reset_coefficients();
        assert!(net.coefficients().unwrap().iter().all(|&c| c == 1e-4));
        assert_eq!(net.n_steps(), 1);
    }

    #[test]
    fn step_summary_reports_reconstruction_as_cost() {
        let mut net = small_net(1, 4);
        let x = images(4, 5);
        let before = net.evaluate(&x).unwrap();
        let summary = net.partial_fit_eqn3(&x).unwrap();

        assert_abs_diff_eq!(summary.cost(), before.reconstruction, epsilon = 1e-9);
        assert_abs_diff_eq!(summary.losses.sparsity, before.sparsity, epsilon = 1e-12);
    }
}
