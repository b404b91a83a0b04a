use crate::pool::DecompositionPool;
use crate::{Result, SpectralError};

use dscgan::Float;
use linfa_linalg::svd::{SvdSort, SVD};
use log::debug;
use ndarray::{s, Array2, ArrayBase, Axis, Data, Ix2, Zip};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Construction of the affinity that is handed to spectral clustering
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Affinity {
    /// [`low_rank_affinity`] of the thresholded coefficients
    LowRank,
    /// [`column_normalized_affinity`] of the thresholded coefficients
    ColumnNormalized,
    /// [`random_walk_laplacian`] of the thresholded coefficients, symmetrized
    RandomWalk,
}

impl Default for Affinity {
    fn default() -> Self {
        Affinity::LowRank
    }
}

/// Low-rank affinity of a coefficient matrix
///
/// The matrix is symmetrized to `(C + C^T) / 2` and decomposed. The leading
/// `subspace_dim * n_clusters + 1` left singular vectors, each scaled by the square root of its
/// singular value, form one embedding row per sample. Rows are normalized to unit length and
/// their pairwise inner products, clipped at zero and raised to the power `alpha`, make up the
/// affinity. The result is symmetric, has entries in `[0, 1]` and a maximum of one unless it is
/// all zeros.
///
/// The symmetrized matrix is written into memory borrowed from `pool`.
pub fn low_rank_affinity<F: Float>(
    coef: &ArrayBase<impl Data<Elem = F>, Ix2>,
    n_clusters: usize,
    subspace_dim: usize,
    alpha: F,
    pool: &mut DecompositionPool<F>,
) -> Result<Array2<F>> {
    let (n, m) = coef.dim();
    if n != m {
        return Err(SpectralError::NotSquare(n, m));
    }
    let rank = (subspace_dim * n_clusters + 1).min(n);

    let embedding = {
        let mut symmetric = pool.acquire(n, n).map_err(dscgan::error::Error::from)?;
        Zip::from(symmetric.view_mut())
            .and(coef)
            .and(coef.t())
            .for_each(|s, &a, &b| *s = (a + b) * F::cast(0.5));

        let (u, sigma, _) = symmetric.view().svd(true, false)?.sort_svd_desc();
        let u = u.ok_or_else(|| {
            dscgan::error::Error::Parameters("decomposition returned no singular vectors".into())
        })?;
        debug!(
            "keeping {} of {} singular values, largest {:?}",
            rank,
            sigma.len(),
            sigma.get(0)
        );

        // ascending order of the kept singular values
        let mut embedding = u.slice(s![.., ..rank;-1]).to_owned();
        let scale = sigma.slice(s![..rank;-1]).mapv(|x| x.max(F::zero()).sqrt());
        embedding *= &scale;
        embedding
    };

    let embedding = normalize_rows(embedding);
    let mut affinity = embedding.dot(&embedding.t());
    affinity.mapv_inplace(|z| z.max(F::zero()).powf(alpha));

    let max = affinity.fold(F::zero(), |acc, &x| acc.max(x));
    if max > F::zero() {
        affinity.mapv_inplace(|x| x / max);
    }

    Ok(symmetrize(&affinity))
}

/// Affinity from column-normalized coefficient magnitudes
///
/// Every column of `|C|` is divided by its largest entry (plus `1e-6`), the result is
/// summed with its transpose.
pub fn column_normalized_affinity<F: Float>(coef: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    let mut magnitude = coef.mapv(|x| x.abs());
    for mut col in magnitude.columns_mut() {
        let max = col.fold(F::zero(), |acc, &x| acc.max(x));
        col.mapv_inplace(|x| x / (max + F::cast(1e-6)));
    }

    &magnitude + &magnitude.t()
}

/// Random-walk normalization `D^-1 W` of the symmetric magnitude `W = (|C| + |C^T|) / 2`
///
/// `D` holds the column sums of `W`. Rows of isolated samples stay zero.
pub fn random_walk_laplacian<F: Float>(coef: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    let magnitude = coef.mapv(|x| x.abs());
    let mut weights = symmetrize(&magnitude);
    let degree = weights.sum_axis(Axis(0));

    for (mut row, &d) in weights.axis_iter_mut(Axis(0)).zip(degree.iter()) {
        if d > F::zero() {
            row.mapv_inplace(|x| x / d);
        }
    }

    weights
}

pub(crate) fn symmetrize<F: Float>(x: &Array2<F>) -> Array2<F> {
    (x + &x.t()) * F::cast(0.5)
}

fn normalize_rows<F: Float>(mut x: Array2<F>) -> Array2<F> {
    for mut row in x.rows_mut() {
        let norm = row.dot(&row).sqrt();
        if norm > F::zero() {
            row.mapv_inplace(|v| v / norm);
        }
    }
    x
}
