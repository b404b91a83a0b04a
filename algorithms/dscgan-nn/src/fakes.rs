//! Synthesis of fake latent samples as random convex combinations within a cluster
use crate::errors::Result;

use dscgan::dataset::group_by_label;
use dscgan::Float;
use ndarray::{Array2, ArrayBase, Data, Ix1, Ix2};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

/// Mixing weights of the fake samples of every cluster
///
/// The fakes of a batch are `selector Z` for the latent matrix `Z`. Row `k * per_cluster + j`
/// of the selector holds the weights of fake `j` of cluster `k`, it is zero outside the members
/// of `k` and sums to one.
#[derive(Clone, Debug)]
pub struct FakeBatch<F> {
    selector: Array2<F>,
    members: Vec<Vec<usize>>,
}

impl<F: Float> FakeBatch<F> {
    /// Draw `per_cluster` fakes for every cluster `0..n_clusters` of the `labels.len()` samples
    ///
    /// Weights are drawn uniformly from `[0, 1)` and normalized to sum to one. Fails if a
    /// cluster has no members.
    pub fn synthesize<R: Rng>(
        labels: &ArrayBase<impl Data<Elem = usize>, Ix1>,
        n_clusters: usize,
        per_cluster: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let members = group_by_label(labels, n_clusters)?;

        let mut selector = Array2::zeros((n_clusters * per_cluster, labels.len()));
        for (k, cluster) in members.iter().enumerate() {
            let weights =
                Array2::random_using((per_cluster, cluster.len()), Uniform::new(F::zero(), F::one()), rng);
            for (j, row) in weights.rows().into_iter().enumerate() {
                let total = row.sum();
                let mut target = selector.row_mut(k * per_cluster + j);
                for (&sample, &w) in cluster.iter().zip(row.iter()) {
                    target[sample] = if total > F::zero() {
                        w / total
                    } else {
                        F::one() / F::cast(cluster.len())
                    };
                }
            }
        }

        Ok(FakeBatch { selector, members })
    }

    /// `(n_clusters * per_cluster, n_samples)` mixing matrix
    pub fn selector(&self) -> &Array2<F> {
        &self.selector
    }

    /// Samples of cluster `k`
    pub fn members(&self, k: usize) -> Option<&[usize]> {
        self.members.get(k).map(|m| m.as_slice())
    }

    /// Fakes built from the rows of `latent`
    pub fn mix(&self, latent: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Array2<F> {
        self.selector.dot(latent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NnError;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn fakes_are_convex_combinations() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let latent = array![[0., 0.], [1., 0.], [10., 10.], [0., 1.], [11., 10.]];
        let labels = array![0, 0, 1, 0, 1];

        let fakes = FakeBatch::synthesize(&labels, 2, 16, &mut rng).unwrap();
        assert_eq!(fakes.selector().dim(), (32, 5));
        assert_eq!(fakes.members(0), Some(&[0, 1, 3][..]));
        assert_eq!(fakes.members(2), None);

        for (i, row) in fakes.selector().rows().into_iter().enumerate() {
            assert!(row.iter().all(|&w| w >= 0.));
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-12);
            let outside = if i < 16 { [2, 4] } else { [0, 1] };
            assert!(outside.iter().all(|&j| row[j] == 0.));
        }

        // first cluster lies in the unit simplex, second on the segment from (10, 10) to (11, 10)
        let samples = fakes.mix(&latent);
        for fake in samples.rows().into_iter().take(16) {
            assert!(fake[0] >= 0. && fake[1] >= 0. && fake[0] + fake[1] <= 1. + 1e-12);
        }
        for fake in samples.rows().into_iter().skip(16) {
            assert!(fake[0] >= 10. && fake[0] <= 11.);
            assert_abs_diff_eq!(fake[1], 10.);
        }
    }

    #[test]
    fn empty_cluster() {
        let mut rng = Xoshiro256Plus::seed_from_u64(1);
        let res = FakeBatch::<f64>::synthesize(&array![0, 0, 2], 3, 4, &mut rng);

        assert!(matches!(
            res,
            Err(NnError::DscganError(dscgan::error::Error::EmptyCluster(1)))
        ));
    }
}
