use dscgan::Float;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use std::cmp::Ordering;

/// Default energy threshold for a problem with `n_clusters` subjects
///
/// Starts at `0.4` and drops by `0.1` for every full ten subjects beyond the first, never going
/// below `0.1`.
pub fn threshold_for_classes<F: Float>(n_clusters: usize) -> F {
    let steps = n_clusters.saturating_sub(1) / 10;
    let rho = F::cast(0.4) - F::cast(steps) * F::cast(0.1);
    rho.max(F::cast(0.1))
}

/// Keep the dominant entries of every column of a coefficient matrix
///
/// Entries of a column are visited in descending order of magnitude and copied to the output
/// until their cumulative absolute sum exceeds `rho` times the L1 norm of the column. All other
/// entries are zero. With `rho >= 1` the matrix is returned unchanged.
pub fn threshold_coefficients<F: Float>(coef: &ArrayBase<impl Data<Elem = F>, Ix2>, rho: F) -> Array2<F> {
    if rho >= F::one() {
        return coef.to_owned();
    }

    let mut out = Array2::zeros(coef.raw_dim());
    for (col, mut out_col) in coef.columns().into_iter().zip(out.columns_mut()) {
        let mut order = (0..col.len()).collect::<Vec<_>>();
        // stable sort keeps ties in row order
        order.sort_by(|&a, &b| {
            col[b]
                .abs()
                .partial_cmp(&col[a].abs())
                .unwrap_or(Ordering::Equal)
        });

        let energy = col.iter().map(|x| x.abs()).sum::<F>();
        let mut cumulative = F::zero();
        for idx in order {
            cumulative += col[idx].abs();
            out_col[idx] = col[idx];
            if cumulative > rho * energy {
                break;
            }
        }
    }

    out
}
