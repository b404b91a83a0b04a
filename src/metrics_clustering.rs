//! Common metrics for clustering
use crate::assignment::linear_sum_assignment;
use crate::dataset::unique_labels;
use crate::error::{Error, Result};
use crate::Float;
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::collections::HashMap;

/// Co-occurrence counts between ground truth and predicted labels
///
/// Returns the matrix `G` with `G[i, j]` the number of samples carrying the `i`-th ground truth
/// label and the `j`-th predicted label (labels sorted in ascending order), padded with zeros to
/// a square matrix, together with the sorted ground truth and predicted label alphabets.
pub fn contingency_table(
    ground_truth: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    predicted: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<(Array2<usize>, Vec<usize>, Vec<usize>)> {
    if ground_truth.len() != predicted.len() {
        return Err(Error::MismatchedLabels(ground_truth.len(), predicted.len()));
    }

    let truth_labels = unique_labels(ground_truth);
    let pred_labels = unique_labels(predicted);
    let n_classes = truth_labels.len().max(pred_labels.len());

    let truth_index: HashMap<usize, usize> = truth_labels
        .iter()
        .enumerate()
        .map(|(i, &l)| (l, i))
        .collect();
    let pred_index: HashMap<usize, usize> = pred_labels
        .iter()
        .enumerate()
        .map(|(i, &l)| (l, i))
        .collect();

    let mut table = Array2::zeros((n_classes, n_classes));
    for (t, p) in ground_truth.iter().zip(predicted.iter()) {
        table[[truth_index[t], pred_index[p]]] += 1;
    }

    Ok((table, truth_labels, pred_labels))
}

/// Relabel a clustering such that it agrees best with the ground truth
///
/// Every predicted cluster is mapped to a distinct ground truth label, chosen by the Hungarian
/// method to maximize the number of samples on which both labelings agree. When there are more
/// predicted clusters than ground truth classes, the surplus clusters receive fresh labels
/// larger than any ground truth label, so they are counted as misclassified.
pub fn best_map(
    ground_truth: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    predicted: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<Array1<usize>> {
    let (table, truth_labels, pred_labels) = contingency_table(ground_truth, predicted)?;
    if pred_labels.is_empty() {
        return Ok(Array1::zeros(0));
    }

    // rows are predicted clusters, columns ground truth classes
    let cost = table.t().mapv(|x| -(x as f64));
    let assignment = linear_sum_assignment(&cost)?;

    let fresh = truth_labels.last().map(|l| l + 1).unwrap_or(0);
    let mapping: HashMap<usize, usize> = pred_labels
        .iter()
        .enumerate()
        .map(|(j, &label)| {
            let target = match truth_labels.get(assignment[j]) {
                Some(&truth) => truth,
                None => fresh + j,
            };
            (label, target)
        })
        .collect();

    Ok(predicted.mapv(|p| mapping[&p]))
}

/// Misclassification rate of a clustering after optimal label matching
///
/// The rate is the number of samples whose matched label differs from the ground truth divided
/// by the number of samples.
pub fn error_rate<F: Float>(
    ground_truth: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    predicted: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<F> {
    if ground_truth.is_empty() {
        return Err(Error::NotEnoughSamples);
    }

    let mapped = best_map(ground_truth, predicted)?;
    let errors = ground_truth
        .iter()
        .zip(mapped.iter())
        .filter(|(t, p)| t != p)
        .count();

    Ok(F::cast(errors) / F::cast(ground_truth.len()))
}

/// Mean and median of a series of error rates
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorSummary<F> {
    pub mean: F,
    pub median: F,
}

impl<F: Float> ErrorSummary<F> {
    /// Summarize a list of error rates
    pub fn from_errors(errors: &[F]) -> Result<Self> {
        if errors.is_empty() {
            return Err(Error::NotEnoughSamples);
        }

        let mut sorted = errors.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let mean = sorted.iter().copied().sum::<F>() / F::cast(n);
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / F::cast(2.0)
        };

        Ok(ErrorSummary { mean, median })
    }

    /// Summarize a list of accuracies, reported as error rates `1 - accuracy`
    pub fn from_accuracies(accuracies: &[F]) -> Result<Self> {
        let errors = accuracies.iter().map(|a| F::one() - *a).collect::<Vec<_>>();
        Self::from_errors(&errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn contingency_counts() {
        let truth = array![0, 0, 1, 1, 2];
        let pred = array![5, 5, 3, 5, 3];
        let (table, truth_labels, pred_labels) = contingency_table(&truth, &pred).unwrap();

        assert_eq!(truth_labels, vec![0, 1, 2]);
        assert_eq!(pred_labels, vec![3, 5]);
        assert_eq!(table, array![[0, 2, 0], [1, 1, 0], [1, 0, 0]]);
    }

    #[test]
    fn best_map_relabels_permutation() {
        let truth = array![0, 0, 1, 1, 2, 2];
        let pred = array![2, 2, 0, 0, 1, 1];
        assert_eq!(best_map(&truth, &pred).unwrap(), truth);
    }

    #[test]
    fn best_map_is_idempotent() {
        let truth = array![0, 0, 0, 1, 1, 1, 2, 2, 2, 2];
        let pred = array![1, 1, 2, 0, 0, 2, 2, 2, 0, 2];
        let mapped = best_map(&truth, &pred).unwrap();
        let remapped = best_map(&truth, &mapped).unwrap();

        assert_eq!(mapped, remapped);
    }

    #[test]
    fn error_rate_ignores_label_alphabet() {
        let truth = array![0, 0, 0, 1, 1, 1, 2, 2, 2];
        let pred = array![0, 0, 1, 1, 1, 1, 2, 2, 0];
        let permuted = pred.mapv(|p| [7, 3, 5][p]);

        let err: f64 = error_rate(&truth, &pred).unwrap();
        let err_permuted: f64 = error_rate(&truth, &permuted).unwrap();

        assert_abs_diff_eq!(err, 2. / 9.);
        assert_abs_diff_eq!(err, err_permuted);
    }

    #[test]
    fn surplus_clusters_count_as_errors() {
        let truth = array![0, 0, 0, 0];
        let pred = array![0, 0, 1, 1];
        let mapped = best_map(&truth, &pred).unwrap();
        assert_eq!(mapped.iter().filter(|&&l| l == 0).count(), 2);

        let err: f64 = error_rate(&truth, &pred).unwrap();
        assert_abs_diff_eq!(err, 0.5);
    }

    #[test]
    fn mismatched_lengths() {
        let res = best_map(&array![0, 1], &array![0]);
        assert!(matches!(res, Err(Error::MismatchedLabels(2, 1))));
    }

    #[test]
    fn summary() {
        let summary = ErrorSummary::from_accuracies(&[0.9, 0.8, 1.0, 0.7]).unwrap();
        assert_abs_diff_eq!(summary.mean, 0.15, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.median, 0.15, epsilon = 1e-12);

        let summary = ErrorSummary::from_errors(&[0.3, 0.1, 0.2]).unwrap();
        assert_abs_diff_eq!(summary.median, 0.2);
        assert!(ErrorSummary::<f64>::from_errors(&[]).is_err());
    }
}
