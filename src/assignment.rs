//! Optimal assignment on a square cost matrix
use ndarray::{ArrayBase, Data, Ix2};

use crate::error::{Error, Result};
use crate::Float;

/// Solves the linear sum assignment problem with the Hungarian method
///
/// Given a square cost matrix with shape `(n, n)`, returns for every row the column it is
/// assigned to, such that the total cost of the assignment is minimal. Runs in `O(n^3)` using
/// the shortest augmenting path formulation with row and column potentials.
///
/// Fails if the matrix is not square or contains non-finite entries.
pub fn linear_sum_assignment<F: Float>(cost: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Vec<usize>> {
    let (n, m) = cost.dim();
    if n != m {
        return Err(Error::Parameters(format!(
            "cost matrix has to be square, got {}x{}",
            n, m
        )));
    }
    if cost.iter().any(|x| !x.is_finite()) {
        return Err(Error::Parameters(
            "cost matrix contains non-finite entries".into(),
        ));
    }

    // potentials and matching use 1-based indices, index 0 is the virtual source column
    let mut u = vec![F::zero(); n + 1];
    let mut v = vec![F::zero(); m + 1];
    let mut matched_row = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for row in 1..=n {
        matched_row[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![F::infinity(); m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[col0] = true;
            let row0 = matched_row[col0];
            let mut delta = F::infinity();
            let mut col1 = 0;

            for col in 1..=m {
                if used[col] {
                    continue;
                }
                let slack = cost[[row0 - 1, col - 1]] - u[row0] - v[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=m {
                if used[col] {
                    u[matched_row[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if matched_row[col0] == 0 {
                break;
            }
        }

        // augment along the alternating path
        loop {
            let col1 = way[col0];
            matched_row[col0] = matched_row[col1];
            col0 = col1;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0; n];
    for col in 1..=m {
        if matched_row[col] != 0 {
            assignment[matched_row[col] - 1] = col - 1;
        }
    }

    Ok(assignment)
}
