use crate::affinity::{column_normalized_affinity, low_rank_affinity, random_walk_laplacian, symmetrize, Affinity};
use crate::hyperparams::{PostProcessParams, PostProcessValidParams};
use crate::pool::DecompositionPool;
use crate::threshold::threshold_coefficients;
use crate::{Result, SpectralError};

use dscgan::traits::Fit;
use dscgan::Float;
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::time::Instant;

/// Clusters recovered from a self-expressive coefficient matrix
///
/// Fitting runs the complete post-processing of a coefficient matrix `C` with shape
/// `(n_samples, n_samples)`:
///
/// 1. every column of `C` is [thresholded](crate::threshold_coefficients) to its dominant
///    entries,
/// 2. the thresholded matrix is turned into an affinity, by default the
///    [low-rank affinity](crate::low_rank_affinity), see [`Affinity`] for the alternatives,
/// 3. the affinity is partitioned by [spectral clustering](crate::SpectralClustering).
///
/// Labels are in `0..n_clusters`.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct SubspaceClustering<F> {
    labels: Array1<usize>,
    affinity: Array2<F>,
}

impl<F: Float> SubspaceClustering<F> {
    /// Post-processing into `n_clusters` clusters with a fixed seed for the discretization
    pub fn params(n_clusters: usize) -> PostProcessParams<F, Xoshiro256Plus> {
        PostProcessParams::new(n_clusters, Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> PostProcessParams<F, R> {
        PostProcessParams::new(n_clusters, rng)
    }

    /// Cluster index of every sample
    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    /// Symmetric affinity the labels were derived from
    pub fn affinity(&self) -> &Array2<F> {
        &self.affinity
    }

    pub fn into_labels(self) -> Array1<usize> {
        self.labels
    }
}

impl<F: Float, R: Rng + Clone> PostProcessValidParams<F, R> {
    /// Run the post-processing with scratch memory from `pool`
    ///
    /// Keeping the pool alive between calls avoids reallocating the decomposition buffer when
    /// the same problem is clustered repeatedly.
    pub fn fit_with_pool(
        &self,
        coef: &ArrayBase<impl Data<Elem = F>, Ix2>,
        pool: &mut DecompositionPool<F>,
    ) -> Result<SubspaceClustering<F>> {
        let (n, m) = coef.dim();
        if n != m {
            return Err(SpectralError::NotSquare(n, m));
        }
        if n < self.n_clusters() {
            return Err(SpectralError::TooFewSamples {
                n_samples: n,
                n_clusters: self.n_clusters(),
            });
        }

        let start = Instant::now();
        let thresholded = threshold_coefficients(coef, self.threshold());
        let affinity = match self.affinity() {
            Affinity::LowRank => low_rank_affinity(
                &thresholded,
                self.n_clusters(),
                self.subspace_dim(),
                self.alpha(),
                pool,
            )?,
            Affinity::ColumnNormalized => column_normalized_affinity(&thresholded),
            Affinity::RandomWalk => symmetrize(&random_walk_laplacian(&thresholded)),
        };
        debug!(
            "{:?} affinity of {} samples took {:?}",
            self.affinity(),
            n,
            start.elapsed()
        );

        let start = Instant::now();
        let labels = self.spectral().fit(&affinity)?.into_labels();
        debug!("spectral clustering took {:?}", start.elapsed());

        Ok(SubspaceClustering { labels, affinity })
    }
}

impl<F: Float, R: Rng + Clone, D: Data<Elem = F>> Fit<&ArrayBase<D, Ix2>, SpectralError>
    for PostProcessValidParams<F, R>
{
    type Object = SubspaceClustering<F>;

    fn fit(&self, coef: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let mut pool = DecompositionPool::with_dimension(coef.nrows());
        self.fit_with_pool(coef, &mut pool)
    }
}
