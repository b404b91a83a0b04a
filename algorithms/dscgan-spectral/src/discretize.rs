use crate::{Result, SpectralError};

use dscgan::Float;
use linfa_linalg::svd::SVD;
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2};
use ndarray_rand::rand::Rng;

/// Assign discrete cluster labels to a spectral embedding
///
/// Searches for the rotation of the embedding which is closest to a discrete partition matrix
/// (Yu and Shi, "Multiclass spectral clustering"). Columns are scaled to norm `sqrt(n)` with a
/// fixed sign, rows to unit length. Starting from a rotation spanned by mutually distant
/// samples, labels and rotation are refined alternately until the normalized cut changes by
/// less than `tolerance` or `n_iter_max` updates were made. A failed decomposition restarts the
/// search from a different random sample, at most `max_svd_restarts` times.
pub fn discretize<F: Float, R: Rng>(
    embedding: &ArrayBase<impl Data<Elem = F>, Ix2>,
    max_svd_restarts: usize,
    n_iter_max: usize,
    tolerance: F,
    rng: &mut R,
) -> Result<Array1<usize>> {
    let (n_samples, n_components) = embedding.dim();
    if n_samples == 0 || n_components == 0 {
        return Err(SpectralError::TooFewSamples {
            n_samples,
            n_clusters: n_components,
        });
    }

    let vectors = normalize(embedding);

    let mut restarts = 0;
    while restarts < max_svd_restarts {
        let mut rotation = Array2::zeros((n_components, n_components));
        rotation
            .column_mut(0)
            .assign(&vectors.row(rng.gen_range(0..n_samples)));

        let mut closeness = Array1::<F>::zeros(n_samples);
        for j in 1..n_components {
            closeness += &vectors.dot(&rotation.column(j - 1)).mapv(|x| x.abs());
            rotation
                .column_mut(j)
                .assign(&vectors.row(argmin(&closeness)));
        }

        let mut last_ncut = F::zero();
        let mut n_iter = 0;
        loop {
            n_iter += 1;

            let labels = vectors
                .dot(&rotation)
                .rows()
                .into_iter()
                .map(|row| argmax(&row))
                .collect::<Array1<_>>();

            let mut partition = Array2::<F>::zeros((n_samples, n_components));
            for (i, &label) in labels.iter().enumerate() {
                partition[[i, label]] = F::one();
            }

            let (u, sigma, vt) = match partition.t().dot(&vectors).svd(true, true) {
                Ok((Some(u), sigma, Some(vt))) => (u, sigma, vt),
                Ok(_) => {
                    restarts += 1;
                    debug!("decomposition returned no singular vectors, restarting");
                    break;
                }
                Err(err) => {
                    restarts += 1;
                    debug!("decomposition failed ({}), restarting", err);
                    break;
                }
            };

            let ncut = F::cast(2.0) * (F::cast(n_samples) - sigma.sum());
            if (ncut - last_ncut).abs() < tolerance || n_iter > n_iter_max {
                debug!("discretization finished after {} iterations, ncut {}", n_iter, ncut);
                return Ok(labels);
            }

            last_ncut = ncut;
            rotation = vt.t().dot(&u.t());
        }
    }

    Err(SpectralError::NotConverged)
}

fn normalize<F: Float>(embedding: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
    let mut vectors = embedding.to_owned();
    let norm_ones = F::cast(vectors.nrows()).sqrt();

    for mut col in vectors.columns_mut() {
        let norm = col.dot(&col).sqrt() + F::epsilon();
        col.mapv_inplace(|x| x / norm * norm_ones);
        // first entry of every column is made non-positive
        let first = col[0];
        if first != F::zero() {
            col.mapv_inplace(|x| -x * first.signum());
        }
    }

    for mut row in vectors.rows_mut() {
        let norm = row.dot(&row).sqrt() + F::epsilon();
        row.mapv_inplace(|x| x / norm);
    }

    vectors
}

fn argmin<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> usize {
    let mut best = 0;
    for (i, &v) in x.iter().enumerate() {
        if v < x[best] {
            best = i;
        }
    }
    best
}

fn argmax<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> usize {
    let mut best = 0;
    for (i, &v) in x.iter().enumerate() {
        if v > x[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn indicator_embedding() {
        // orthogonal block indicators are already a discrete partition
        let embedding = array![
            [1.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0],
            [0.0, 2.0],
            [0.0, 2.0]
        ];
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let labels = discretize(&embedding, 30, 20, f64::EPSILON, &mut rng).unwrap();

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn single_component() {
        let embedding = array![[0.3], [-0.2], [0.5]];
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let labels = discretize(&embedding, 30, 20, f64::EPSILON, &mut rng).unwrap();

        assert_eq!(labels, array![0, 0, 0]);
    }

    #[test]
    fn empty_embedding() {
        let embedding = Array2::<f64>::zeros((0, 2));
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        assert!(matches!(
            discretize(&embedding, 30, 20, f64::EPSILON, &mut rng),
            Err(SpectralError::TooFewSamples { .. })
        ));
    }

    #[test]
    fn argmin_and_argmax_take_first() {
        let x = array![2.0, 1.0, 1.0, 3.0, 3.0];
        assert_eq!(argmin(&x), 1);
        assert_eq!(argmax(&x), 3);
    }
}
