use crate::affinity::Affinity;
use crate::threshold::threshold_for_classes;
use crate::PostProcessParamsError;

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
/// The set of hyperparameters that can be specified for the execution of
/// [spectral clustering](crate::SpectralClustering) on a precomputed affinity.
pub struct SpectralClusteringValidParams<F: Float, R: Rng> {
    /// The number of clusters, which is also the dimension of the spectral embedding
    n_clusters: usize,
    /// Number of random rotations tried when the discretization fails to decompose
    max_svd_restarts: usize,
    /// Maximum number of rotation updates per restart
    n_iter_max: usize,
    /// The discretization is complete once the normalized cut changes by less than `tolerance`
    tolerance: F,
    /// The random number generator
    rng: R,
}

#[derive(Clone, Debug, PartialEq)]
/// A helper struct used to construct a set of [valid hyperparameters](SpectralClusteringValidParams)
/// for [spectral clustering](crate::SpectralClustering) (using the builder pattern).
pub struct SpectralClusteringParams<F: Float, R: Rng>(SpectralClusteringValidParams<F, R>);

impl<F: Float, R: Rng> SpectralClusteringParams<F, R> {
    /// Configure spectral clustering for `n_clusters` clusters
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `max_svd_restarts = 30`
    /// * `n_iter_max = 20`
    /// * `tolerance = F::epsilon()`
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(SpectralClusteringValidParams {
            n_clusters,
            max_svd_restarts: 30,
            n_iter_max: 20,
            tolerance: F::epsilon(),
            rng,
        })
    }

    /// Change the value of `max_svd_restarts`
    pub fn max_svd_restarts(mut self, max_svd_restarts: usize) -> Self {
        self.0.max_svd_restarts = max_svd_restarts;
        self
    }

    /// Change the value of `n_iter_max`
    pub fn n_iter_max(mut self, n_iter_max: usize) -> Self {
        self.0.n_iter_max = n_iter_max;
        self
    }

    /// Change the value of `tolerance`
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for SpectralClusteringParams<F, R> {
    type Checked = SpectralClusteringValidParams<F, R>;
    type Error = PostProcessParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        self.0.validate()?;
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> SpectralClusteringValidParams<F, R> {
    fn validate(&self) -> Result<(), PostProcessParamsError> {
        if self.n_clusters == 0 {
            Err(PostProcessParamsError::NClusters)
        } else if self.max_svd_restarts == 0 {
            Err(PostProcessParamsError::SvdRestarts)
        } else if self.n_iter_max == 0 {
            Err(PostProcessParamsError::MaxIterations)
        } else {
            Ok(())
        }
    }

    /// The number of clusters we will be looking for
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Number of random rotations tried by the discretization
    pub fn max_svd_restarts(&self) -> usize {
        self.max_svd_restarts
    }

    /// Maximum number of rotation updates per restart
    pub fn n_iter_max(&self) -> usize {
        self.n_iter_max
    }

    /// Convergence tolerance on the normalized cut
    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    /// Returns the random generator
    pub fn rng(&self) -> &R {
        &self.rng
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The set of hyperparameters of the [post-processing pipeline](crate::SubspaceClustering) which
/// turns a coefficient matrix into cluster labels.
pub struct PostProcessValidParams<F: Float, R: Rng> {
    /// Dimension assumed for every subspace, `subspace_dim * n_clusters + 1` singular vectors
    /// are kept
    subspace_dim: usize,
    /// Exponent applied to the similarities, larger values sharpen the affinity
    alpha: F,
    /// Fraction of the L1 energy kept in every column of the coefficient matrix
    threshold: F,
    /// How the thresholded coefficients become an affinity
    affinity: Affinity,
    /// Parameters of the final spectral clustering step
    spectral: SpectralClusteringValidParams<F, R>,
}

#[derive(Clone, Debug, PartialEq)]
/// A helper struct used to construct a set of [valid hyperparameters](PostProcessValidParams)
/// for the [post-processing pipeline](crate::SubspaceClustering) (using the builder pattern).
pub struct PostProcessParams<F: Float, R: Rng>(PostProcessValidParams<F, R>);

impl<F: Float, R: Rng> PostProcessParams<F, R> {
    /// Configure the post-processing of a coefficient matrix into `n_clusters` clusters
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `subspace_dim = 10`
    /// * `alpha = 3.5`
    /// * `threshold` from [`threshold_for_classes`](crate::threshold_for_classes)
    /// * `affinity = Affinity::LowRank`
    /// * the defaults of [`SpectralClusteringParams`]
    pub fn new(n_clusters: usize, rng: R) -> Self {
        Self(PostProcessValidParams {
            subspace_dim: 10,
            alpha: F::cast(3.5),
            threshold: threshold_for_classes(n_clusters),
            affinity: Affinity::default(),
            spectral: SpectralClusteringParams::new(n_clusters, rng).0,
        })
    }

    /// Change the value of `subspace_dim`
    pub fn subspace_dim(mut self, subspace_dim: usize) -> Self {
        self.0.subspace_dim = subspace_dim;
        self
    }

    /// Change the value of `alpha`
    pub fn alpha(mut self, alpha: F) -> Self {
        self.0.alpha = alpha;
        self
    }

    /// Change the value of `threshold`
    pub fn threshold(mut self, threshold: F) -> Self {
        self.0.threshold = threshold;
        self
    }

    /// Change the construction of the affinity
    pub fn affinity(mut self, affinity: Affinity) -> Self {
        self.0.affinity = affinity;
        self
    }

    /// Change the value of `max_svd_restarts` of the spectral clustering step
    pub fn max_svd_restarts(mut self, max_svd_restarts: usize) -> Self {
        self.0.spectral.max_svd_restarts = max_svd_restarts;
        self
    }

    /// Change the value of `n_iter_max` of the spectral clustering step
    pub fn n_iter_max(mut self, n_iter_max: usize) -> Self {
        self.0.spectral.n_iter_max = n_iter_max;
        self
    }

    /// Replace the random generator of the spectral clustering step
    pub fn with_rng<R2: Rng>(self, rng: R2) -> PostProcessParams<F, R2> {
        let PostProcessValidParams {
            subspace_dim,
            alpha,
            threshold,
            affinity,
            spectral,
        } = self.0;

        PostProcessParams(PostProcessValidParams {
            subspace_dim,
            alpha,
            threshold,
            affinity,
            spectral: SpectralClusteringValidParams {
                n_clusters: spectral.n_clusters,
                max_svd_restarts: spectral.max_svd_restarts,
                n_iter_max: spectral.n_iter_max,
                tolerance: spectral.tolerance,
                rng,
            },
        })
    }
}

impl<F: Float, R: Rng> ParamGuard for PostProcessParams<F, R> {
    type Checked = PostProcessValidParams<F, R>;
    type Error = PostProcessParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        self.0.spectral.validate()?;

        if self.0.subspace_dim == 0 {
            Err(PostProcessParamsError::SubspaceDim)
        } else if self.0.alpha <= F::zero() {
            Err(PostProcessParamsError::Alpha)
        } else if self.0.threshold <= F::zero() {
            Err(PostProcessParamsError::Threshold)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float, R: Rng> PostProcessValidParams<F, R> {
    /// The number of clusters we will be looking for
    pub fn n_clusters(&self) -> usize {
        self.spectral.n_clusters
    }

    /// Dimension assumed for every subspace
    pub fn subspace_dim(&self) -> usize {
        self.subspace_dim
    }

    /// Exponent applied to the similarities
    pub fn alpha(&self) -> F {
        self.alpha
    }

    /// Fraction of the L1 energy kept in every column
    pub fn threshold(&self) -> F {
        self.threshold
    }

    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    /// Parameters of the spectral clustering step
    pub fn spectral(&self) -> &SpectralClusteringValidParams<F, R> {
        &self.spectral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubspaceClustering;
    use approx::assert_abs_diff_eq;

    #[test]
    fn defaults() {
        let params = SubspaceClustering::<f64>::params(5).check().unwrap();

        assert_eq!(params.n_clusters(), 5);
        assert_eq!(params.subspace_dim(), 10);
        assert_abs_diff_eq!(params.alpha(), 3.5);
        assert_abs_diff_eq!(params.threshold(), 0.4);
        assert_eq!(params.affinity(), Affinity::LowRank);
        assert_eq!(params.spectral().max_svd_restarts(), 30);
        assert_eq!(params.spectral().n_iter_max(), 20);
    }

    #[test]
    fn invalid_params() {
        let res = SubspaceClustering::<f64>::params(0).check();
        assert!(matches!(res, Err(PostProcessParamsError::NClusters)));

        let res = SubspaceClustering::<f64>::params(2).subspace_dim(0).check();
        assert!(matches!(res, Err(PostProcessParamsError::SubspaceDim)));

        let res = SubspaceClustering::params(2).alpha(0.0).check();
        assert!(matches!(res, Err(PostProcessParamsError::Alpha)));

        let res = SubspaceClustering::params(2).threshold(-0.1).check();
        assert!(matches!(res, Err(PostProcessParamsError::Threshold)));

        let res = SubspaceClustering::<f64>::params(2).n_iter_max(0).check();
        assert!(matches!(res, Err(PostProcessParamsError::MaxIterations)));

        let res = SubspaceClustering::<f64>::params(2)
            .max_svd_restarts(0)
            .check();
        assert!(matches!(res, Err(PostProcessParamsError::SvdRestarts)));
    }
}
