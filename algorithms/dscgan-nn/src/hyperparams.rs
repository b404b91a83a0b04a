use crate::DscNetParamsError;

use dscgan::{Float, ParamGuard};
use ndarray_rand::rand::Rng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters that can be specified for a [deep subspace clustering
/// network](crate::DscNet).
pub struct DscNetValidParams<F: Float, R: Rng> {
    /// Number of clusters, sets the default of `lambda2` and the number of fake groups
    n_clusters: usize,
    /// Number of images per batch, which is also the size of the coefficient matrix
    batch_size: usize,
    /// Height and width of the input images
    image_shape: (usize, usize),
    /// Kernel size of every encoder layer
    kernels: Vec<usize>,
    /// Number of filters of every encoder layer
    channels: Vec<usize>,
    /// Stride of every (transposed) convolution
    stride: usize,
    /// Initial value of every self-expressive coefficient
    coef_init: F,
    /// Weight of the squared norm of the coefficient matrix
    lambda1: F,
    /// Weight of the self-expression error
    lambda2: F,
    /// Weight of the critic score in the adversarial objective
    lambda3: F,
    /// Learning rate of all three optimizers
    learning_rate: F,
    /// Bound of the box the critic weights are clipped into
    clip_bound: F,
    /// Number of fake samples synthesized per cluster
    fakes_per_cluster: usize,
    /// Widths of the two hidden critic layers
    critic_hidden: (usize, usize),
    /// The random number generator
    rng: R,
}

#[derive(Clone, Debug, PartialEq)]
/// A helper struct used to construct a set of [valid hyperparameters](DscNetValidParams) for a
/// [deep subspace clustering network](crate::DscNet) (using the builder pattern).
pub struct DscNetParams<F: Float, R: Rng>(DscNetValidParams<F, R>);

impl<F: Float, R: Rng> DscNetParams<F, R> {
    /// Configure a network clustering batches of `batch_size` images into `n_clusters` groups
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `image_shape = (48, 42)`
    /// * `kernels = [5, 3, 3]`
    /// * `channels = [10, 20, 30]`
    /// * `stride = 2`
    /// * `coef_init = 1e-4`
    /// * `lambda1 = 1.0`
    /// * `lambda2 = 10^(n_clusters / 10 - 3)`
    /// * `lambda3 = 1.0`
    /// * `learning_rate = 1e-3`
    /// * `clip_bound = 0.02`
    /// * `fakes_per_cluster = 64`
    /// * `critic_hidden = (200, 50)`
    pub fn new(n_clusters: usize, batch_size: usize, rng: R) -> Self {
        Self(DscNetValidParams {
            n_clusters,
            batch_size,
            image_shape: (48, 42),
            kernels: vec![5, 3, 3],
            channels: vec![10, 20, 30],
            stride: 2,
            coef_init: F::cast(1e-4),
            lambda1: F::one(),
            lambda2: default_lambda2(n_clusters),
            lambda3: F::one(),
            learning_rate: F::cast(1e-3),
            clip_bound: F::cast(0.02),
            fakes_per_cluster: 64,
            critic_hidden: (200, 50),
            rng,
        })
    }

    /// Change the height and width of the input images
    pub fn image_shape(mut self, height: usize, width: usize) -> Self {
        self.0.image_shape = (height, width);
        self
    }

    /// Change the kernel sizes and filter counts of the encoder, the decoder mirrors them
    pub fn layers(mut self, kernels: Vec<usize>, channels: Vec<usize>) -> Self {
        self.0.kernels = kernels;
        self.0.channels = channels;
        self
    }

    /// Change the value of `stride`
    pub fn stride(mut self, stride: usize) -> Self {
        self.0.stride = stride;
        self
    }

    /// Change the value of `coef_init`
    pub fn coef_init(mut self, coef_init: F) -> Self {
        self.0.coef_init = coef_init;
        self
    }

    /// Change the value of `lambda1`
    pub fn lambda1(mut self, lambda1: F) -> Self {
        self.0.lambda1 = lambda1;
        self
    }

    /// Change the value of `lambda2`
    pub fn lambda2(mut self, lambda2: F) -> Self {
        self.0.lambda2 = lambda2;
        self
    }

    /// Change the value of `lambda3`
    pub fn lambda3(mut self, lambda3: F) -> Self {
        self.0.lambda3 = lambda3;
        self
    }

    /// Change the value of `learning_rate`
    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.0.learning_rate = learning_rate;
        self
    }

    /// Change the value of `clip_bound`
    pub fn clip_bound(mut self, clip_bound: F) -> Self {
        self.0.clip_bound = clip_bound;
        self
    }

    /// Change the value of `fakes_per_cluster`
    pub fn fakes_per_cluster(mut self, fakes_per_cluster: usize) -> Self {
        self.0.fakes_per_cluster = fakes_per_cluster;
        self
    }

    /// Change the widths of the hidden critic layers
    pub fn critic_hidden(mut self, first: usize, second: usize) -> Self {
        self.0.critic_hidden = (first, second);
        self
    }

    /// Change the random number generator
    pub fn with_rng<R2: Rng>(self, rng: R2) -> DscNetParams<F, R2> {
        let p = self.0;
        DscNetParams(DscNetValidParams {
            n_clusters: p.n_clusters,
            batch_size: p.batch_size,
            image_shape: p.image_shape,
            kernels: p.kernels,
            channels: p.channels,
            stride: p.stride,
            coef_init: p.coef_init,
            lambda1: p.lambda1,
            lambda2: p.lambda2,
            lambda3: p.lambda3,
            learning_rate: p.learning_rate,
            clip_bound: p.clip_bound,
            fakes_per_cluster: p.fakes_per_cluster,
            critic_hidden: p.critic_hidden,
            rng,
        })
    }
}

/// Weight of the self-expression error for `n_clusters` clusters, `10^(n_clusters / 10 - 3)`
pub fn default_lambda2<F: Float>(n_clusters: usize) -> F {
    F::cast(10.0f64.powf(n_clusters as f64 / 10.0 - 3.0))
}

impl<F: Float, R: Rng> ParamGuard for DscNetParams<F, R> {
    type Checked = DscNetValidParams<F, R>;
    type Error = DscNetParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        self.0.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> DscNetValidParams<F, R> {
    fn validate(&self) -> Result<(), DscNetParamsError> {
        let non_negative = |x: F| x.is_finite() && x >= F::zero();

        if self.n_clusters == 0 {
            Err(DscNetParamsError::NClusters)
        } else if self.batch_size == 0 {
            Err(DscNetParamsError::BatchSize)
        } else if self.image_shape.0 == 0 || self.image_shape.1 == 0 {
            Err(DscNetParamsError::ImageShape(self.image_shape.0, self.image_shape.1))
        } else if self.kernels.len() != self.channels.len() || self.kernels.is_empty() {
            Err(DscNetParamsError::Layers {
                kernels: self.kernels.len(),
                layers: self.channels.len(),
            })
        } else if self.stride == 0
            || self.kernels.iter().chain(self.channels.iter()).any(|&x| x == 0)
        {
            Err(DscNetParamsError::LayerSize)
        } else if !self.coef_init.is_finite() {
            Err(DscNetParamsError::CoefInit)
        } else if !(non_negative(self.lambda1) && non_negative(self.lambda2) && non_negative(self.lambda3)) {
            Err(DscNetParamsError::Lambda)
        } else if !self.learning_rate.is_finite() || self.learning_rate <= F::zero() {
            Err(DscNetParamsError::LearningRate)
        } else if !self.clip_bound.is_finite() || self.clip_bound <= F::zero() {
            Err(DscNetParamsError::ClipBound)
        } else if self.fakes_per_cluster == 0 {
            Err(DscNetParamsError::FakesPerCluster)
        } else if self.critic_hidden.0 == 0 || self.critic_hidden.1 == 0 {
            Err(DscNetParamsError::CriticWidth)
        } else {
            Ok(())
        }
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn image_shape(&self) -> (usize, usize) {
        self.image_shape
    }

    pub fn kernels(&self) -> &[usize] {
        &self.kernels
    }

    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn coef_init(&self) -> F {
        self.coef_init
    }

    pub fn lambda1(&self) -> F {
        self.lambda1
    }

    pub fn lambda2(&self) -> F {
        self.lambda2
    }

    pub fn lambda3(&self) -> F {
        self.lambda3
    }

    pub fn learning_rate(&self) -> F {
        self.learning_rate
    }

    pub fn clip_bound(&self) -> F {
        self.clip_bound
    }

    pub fn fakes_per_cluster(&self) -> usize {
        self.fakes_per_cluster
    }

    pub fn critic_hidden(&self) -> (usize, usize) {
        self.critic_hidden
    }

    /// Returns the random generator
    pub fn rng(&self) -> &R {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn params(n_clusters: usize) -> DscNetParams<f64, Xoshiro256Plus> {
        DscNetParams::new(n_clusters, 64 * n_clusters, Xoshiro256Plus::seed_from_u64(42))
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<DscNetParams<f64, Xoshiro256Plus>>();
        has_autotraits::<DscNetValidParams<f64, Xoshiro256Plus>>();
        has_autotraits::<DscNetParamsError>();
    }

    #[test]
    fn lambda2_grows_with_clusters() {
        assert_abs_diff_eq!(default_lambda2::<f64>(10), 1e-2, epsilon = 1e-12);
        assert_abs_diff_eq!(default_lambda2::<f64>(20), 1e-1, epsilon = 1e-12);

        let checked = params(10).check().unwrap();
        assert_abs_diff_eq!(checked.lambda2(), 1e-2, epsilon = 1e-12);
        assert_eq!(checked.batch_size(), 640);
    }

    #[test]
    fn invalid_values() {
        assert!(matches!(
            params(0).check(),
            Err(DscNetParamsError::NClusters)
        ));
        assert!(matches!(
            params(2).layers(vec![5, 3], vec![10, 20, 30]).check(),
            Err(DscNetParamsError::Layers {
                kernels: 2,
                layers: 3
            })
        ));
        assert!(matches!(
            params(2).lambda3(-1.0).check(),
            Err(DscNetParamsError::Lambda)
        ));
        assert!(matches!(
            params(2).learning_rate(0.0).check(),
            Err(DscNetParamsError::LearningRate)
        ));
        assert!(matches!(
            params(2).clip_bound(f64::NAN).check(),
            Err(DscNetParamsError::ClipBound)
        ));
        assert!(matches!(
            params(2).image_shape(0, 42).check(),
            Err(DscNetParamsError::ImageShape(0, 42))
        ));
    }
}
