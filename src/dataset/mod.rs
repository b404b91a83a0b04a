//! Datasets
//!
//! This module implements the image container consumed by the training loop and a few helper
//! functions on cluster label vectors.
use ndarray::{s, Array1, Array4, ArrayView1, ArrayView4, NdFloat};

use num_traits::{AsPrimitive, FromPrimitive, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use std::iter::Sum;

use crate::error::{Error, Result};

mod impl_labels;
pub use impl_labels::*;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. The network is usually trained with
/// `f32`, the post-processing runs with `f64`.
pub trait Float:
    NdFloat + FromPrimitive + Default + Signed + Sum + AsPrimitive<usize> + SampleUniform
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).expect("Failed to cast value into the float type")
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// A batch of single channel images together with their subject labels
///
/// The records are stored with layout `(n_samples, 1, height, width)`, the targets hold one
/// subject index per image. Images of the same subject are expected to be stored contiguously
/// and every subject contributes the same number of images, so that a subset of subjects is a
/// contiguous slice of the records.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct ImageDataset<F> {
    records: Array4<F>,
    targets: Array1<usize>,
}

impl<F: Float> ImageDataset<F> {
    /// Create a new image dataset
    ///
    /// Fails if the records are not single channel or the number of targets does not match the
    /// number of images.
    pub fn new(records: Array4<F>, targets: Array1<usize>) -> Result<Self> {
        if records.shape()[1] != 1 {
            return Err(Error::Parameters(format!(
                "expected single channel images, got {} channels",
                records.shape()[1]
            )));
        }
        if records.shape()[0] != targets.len() {
            return Err(Error::MismatchedLabels(records.shape()[0], targets.len()));
        }

        Ok(ImageDataset { records, targets })
    }

    /// Number of images
    pub fn nsamples(&self) -> usize {
        self.targets.len()
    }

    /// Height and width of every image
    pub fn image_shape(&self) -> (usize, usize) {
        let shape = self.records.shape();
        (shape[2], shape[3])
    }

    /// Number of distinct subjects in this dataset
    pub fn n_classes(&self) -> usize {
        count_labels(&self.targets.view())
    }

    pub fn records(&self) -> ArrayView4<F> {
        self.records.view()
    }

    pub fn targets(&self) -> ArrayView1<usize> {
        self.targets.view()
    }

    /// Select `n_subjects` consecutive subjects starting with subject number `first`
    ///
    /// Every subject is assumed to contribute `per_subject` images. The targets of the subset
    /// are shifted such that the smallest label is zero.
    pub fn subject_subset(
        &self,
        first: usize,
        n_subjects: usize,
        per_subject: usize,
    ) -> Result<ImageDataset<F>> {
        if n_subjects == 0 || per_subject == 0 {
            return Err(Error::Parameters(
                "a subset needs at least one subject and one image per subject".into(),
            ));
        }

        let (start, end) = (first * per_subject, (first + n_subjects) * per_subject);
        if end > self.nsamples() {
            return Err(Error::NotEnoughSamples);
        }

        let records = self.records.slice(s![start..end, .., .., ..]).to_owned();
        let targets = self.targets.slice(s![start..end]);
        let offset = targets.iter().copied().min().unwrap_or(0);
        let targets = targets.mapv(|t| t - offset);

        Ok(ImageDataset { records, targets })
    }

    /// Cast the pixel values into another floating point type
    pub fn cast<G: Float>(&self) -> ImageDataset<G> {
        ImageDataset {
            records: self.records.mapv(|x| G::cast(x)),
            targets: self.targets.clone(),
        }
    }

    pub fn into_parts(self) -> (Array4<F>, Array1<usize>) {
        (self.records, self.targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn dataset(n_subjects: usize, per_subject: usize) -> ImageDataset<f64> {
        let n = n_subjects * per_subject;
        let records = Array::from_shape_fn((n, 1, 4, 3), |(i, _, h, w)| (i * 100 + h * 3 + w) as f64);
        let targets = Array1::from_shape_fn(n, |i| i / per_subject);
        ImageDataset::new(records, targets).unwrap()
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<ImageDataset<f64>>();
    }

    #[test]
    fn rejects_mismatched_targets() {
        let records = Array4::<f32>::zeros((3, 1, 2, 2));
        let res = ImageDataset::new(records, array![0, 1]);
        assert!(matches!(res, Err(Error::MismatchedLabels(3, 2))));
    }

    #[test]
    fn rejects_multi_channel_images() {
        let records = Array4::<f32>::zeros((2, 3, 2, 2));
        let res = ImageDataset::new(records, array![0, 1]);
        assert!(matches!(res, Err(Error::Parameters(_))));
    }

    #[test]
    fn subset_is_rebased() {
        let data = dataset(5, 4);
        let subset = data.subject_subset(2, 2, 4).unwrap();

        assert_eq!(subset.nsamples(), 8);
        assert_eq!(subset.n_classes(), 2);
        assert_eq!(subset.targets(), array![0, 0, 0, 0, 1, 1, 1, 1]);
        assert_eq!(subset.records()[[0, 0, 0, 0]], 800.);
        assert_eq!(subset.image_shape(), (4, 3));
    }

    #[test]
    fn cast_between_float_types() {
        assert_eq!(<f32 as Float>::cast(0.5f64), 0.5f32);
        assert_eq!(<f64 as Float>::cast(3usize), 3.0);
    }

    /// Number without any primitive representation
    struct Opaque;

    impl num_traits::ToPrimitive for Opaque {
        fn to_i64(&self) -> Option<i64> {
            None
        }

        fn to_u64(&self) -> Option<u64> {
            None
        }
    }

    impl NumCast for Opaque {
        fn from<T: num_traits::ToPrimitive>(_: T) -> Option<Self> {
            None
        }
    }

    #[test]
    #[should_panic(expected = "Failed to cast value into the float type")]
    fn unrepresentable_cast_panics() {
        let _ = <f32 as Float>::cast(Opaque);
    }

    #[test]
    fn subset_out_of_range() {
        let data = dataset(3, 2);
        assert!(matches!(
            data.subject_subset(2, 2, 2),
            Err(Error::NotEnoughSamples)
        ));
    }
}
