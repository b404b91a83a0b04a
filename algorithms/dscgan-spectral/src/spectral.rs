use crate::discretize::discretize;
use crate::hyperparams::{SpectralClusteringParams, SpectralClusteringValidParams};
use crate::{Result, SpectralError};

use dscgan::traits::Fit;
use dscgan::Float;
use linfa_linalg::eigh::{EigSort, Eigh};
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Spectral clustering of a precomputed affinity
///
/// The affinity is treated as the weighted adjacency matrix of a graph. Self loops are
/// removed and the symmetric normalization `D^-1/2 A D^-1/2` is decomposed. The eigenvectors of
/// the `n_clusters` largest eigenvalues, rescaled by `D^-1/2`, embed every sample in a
/// `n_clusters` dimensional space where it is assigned to a cluster by
/// [discretization](crate::discretize).
///
/// ```
/// use dscgan::traits::Fit;
/// use dscgan_spectral::SpectralClustering;
/// use ndarray::array;
///
/// let affinity = array![
///     [1.0, 0.9, 0.0, 0.0],
///     [0.9, 1.0, 0.0, 0.0],
///     [0.0, 0.0, 1.0, 0.8],
///     [0.0, 0.0, 0.8, 1.0],
/// ];
/// let model = SpectralClustering::params(2).fit(&affinity).unwrap();
///
/// assert_eq!(model.labels()[0], model.labels()[1]);
/// assert_ne!(model.labels()[1], model.labels()[2]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralClustering<F> {
    embedding: Array2<F>,
    eigenvalues: Array1<F>,
    labels: Array1<usize>,
}

impl<F: Float> SpectralClustering<F> {
    pub fn params(n_clusters: usize) -> SpectralClusteringParams<F, Xoshiro256Plus> {
        SpectralClusteringParams::new(n_clusters, Xoshiro256Plus::seed_from_u64(42))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> SpectralClusteringParams<F, R> {
        SpectralClusteringParams::new(n_clusters, rng)
    }

    /// Cluster index of every sample
    pub fn labels(&self) -> &Array1<usize> {
        &self.labels
    }

    /// Spectral embedding with shape `(n_samples, n_clusters)`
    pub fn embedding(&self) -> &Array2<F> {
        &self.embedding
    }

    /// Eigenvalues of the normalized adjacency belonging to the embedding, in descending order
    pub fn eigenvalues(&self) -> &Array1<F> {
        &self.eigenvalues
    }

    pub fn into_labels(self) -> Array1<usize> {
        self.labels
    }
}

impl<F: Float, R: Rng + Clone, D: Data<Elem = F>> Fit<&ArrayBase<D, Ix2>, SpectralError>
    for SpectralClusteringValidParams<F, R>
{
    type Object = SpectralClustering<F>;

    fn fit(&self, affinity: &ArrayBase<D, Ix2>) -> Result<Self::Object> {
        let (n, m) = affinity.dim();
        if n != m {
            return Err(SpectralError::NotSquare(n, m));
        }
        if n < self.n_clusters() {
            return Err(SpectralError::TooFewSamples {
                n_samples: n,
                n_clusters: self.n_clusters(),
            });
        }

        let (embedding, eigenvalues) = spectral_embedding(affinity, self.n_clusters())?;

        let mut rng = self.rng().clone();
        let labels = discretize(
            &embedding,
            self.max_svd_restarts(),
            self.n_iter_max(),
            self.tolerance(),
            &mut rng,
        )?;

        Ok(SpectralClustering {
            embedding,
            eigenvalues,
            labels,
        })
    }
}

/// Embed the nodes of a weighted graph with the leading eigenvectors of its normalized adjacency
///
/// Returns the embedding with shape `(n_samples, n_components)` and the corresponding
/// eigenvalues. The sign of every eigenvector is fixed such that its entry of largest magnitude
/// is positive. Isolated nodes are treated as having unit degree.
pub fn spectral_embedding<F: Float>(
    affinity: &ArrayBase<impl Data<Elem = F>, Ix2>,
    n_components: usize,
) -> Result<(Array2<F>, Array1<F>)> {
    let mut adjacency = affinity.to_owned();
    adjacency.diag_mut().fill(F::zero());

    let sqrt_degree = adjacency
        .sum_axis(Axis(0))
        .mapv(|d| if d > F::zero() { d.sqrt() } else { F::one() });

    for ((i, j), x) in adjacency.indexed_iter_mut() {
        *x /= sqrt_degree[i] * sqrt_degree[j];
    }

    let (eigenvalues, eigenvectors) = adjacency.eigh()?.sort_eig_desc();

    let mut embedding = eigenvectors.slice(s![.., ..n_components]).to_owned();
    embedding /= &sqrt_degree.insert_axis(Axis(1));

    for mut col in embedding.columns_mut() {
        let pivot = col.iter().fold(F::zero(), |acc, &x| if x.abs() > acc.abs() { x } else { acc });
        if pivot < F::zero() {
            col.mapv_inplace(|x| -x);
        }
    }

    Ok((embedding, eigenvalues.slice(s![..n_components]).to_owned()))
}
