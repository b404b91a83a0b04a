use ndarray::{ArrayBase, Data, Ix1};
use std::collections::BTreeSet;

use crate::error::{Error, Result};

/// Sorted list of distinct labels
pub fn unique_labels(labels: &ArrayBase<impl Data<Elem = usize>, Ix1>) -> Vec<usize> {
    labels
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of distinct labels
pub fn count_labels(labels: &ArrayBase<impl Data<Elem = usize>, Ix1>) -> usize {
    labels.iter().collect::<BTreeSet<_>>().len()
}

/// Checks that the smallest label is zero
pub fn check_zero_based(labels: &ArrayBase<impl Data<Elem = usize>, Ix1>) -> Result<()> {
    match labels.iter().min() {
        Some(0) => Ok(()),
        Some(&min) => Err(Error::NotZeroBased(min)),
        None => Err(Error::NotEnoughSamples),
    }
}

/// Row indices of the members of each cluster `0..n_clusters`
///
/// Fails if the labels are not 0-based, if a label is larger than `n_clusters - 1` or if any
/// cluster is left without members.
pub fn group_by_label(
    labels: &ArrayBase<impl Data<Elem = usize>, Ix1>,
    n_clusters: usize,
) -> Result<Vec<Vec<usize>>> {
    check_zero_based(labels)?;

    let mut groups = vec![Vec::new(); n_clusters];
    for (idx, &label) in labels.iter().enumerate() {
        match groups.get_mut(label) {
            Some(group) => group.push(idx),
            None => {
                return Err(Error::Parameters(format!(
                    "label {} exceeds the number of clusters {}",
                    label, n_clusters
                )))
            }
        }
    }

    if let Some(empty) = groups.iter().position(|g| g.is_empty()) {
        return Err(Error::EmptyCluster(empty));
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn groups_members() {
        let groups = group_by_label(&array![1, 0, 1, 2, 0], 3).unwrap();
        assert_eq!(groups, vec![vec![1, 4], vec![0, 2], vec![3]]);
    }

    #[test]
    fn empty_cluster_is_rejected() {
        let res = group_by_label(&array![0, 0, 2], 3);
        assert!(matches!(res, Err(Error::EmptyCluster(1))));
    }

    #[test]
    fn labels_have_to_be_zero_based() {
        let res = group_by_label(&array![1, 2, 2], 2);
        assert!(matches!(res, Err(Error::NotZeroBased(1))));
    }

    #[test]
    fn label_out_of_range() {
        let res = group_by_label(&array![0, 3], 2);
        assert!(matches!(res, Err(Error::Parameters(_))));
    }

    #[test]
    fn unique_and_count() {
        let labels = array![4, 2, 4, 9];
        assert_eq!(unique_labels(&labels), vec![2, 4, 9]);
        assert_eq!(count_labels(&labels), 3);
    }
}
