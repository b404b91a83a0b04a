//! `dscgan-datasets` provides the image collections used to train and evaluate deep subspace
//! clustering.
//!
//! ## Current State
//!
//! Currently the following datasets are provided:
//!
//! * [`yaleb`]: the cropped Extended YaleB faces, 38 subjects with 64 images of 48x42 pixels
//!   each, read from an `.npz` archive,
//! * [`generate::toy_subjects`]: synthetic subjects whose images lie close to a low-dimensional
//!   subspace, for tests and demos.
//!
//! Both return a [`dscgan::ImageDataset`] with one subject label per image.
//!
//! ## Using a dataset
//!
//! The YaleB archive is not distributed with this crate. Convert `YaleBCrop025.mat` to an
//! `.npz` archive holding the array `Y` and load it with
//! ```no_run
//! let faces = dscgan_datasets::yaleb("data/YaleBCrop025.npz").unwrap();
//! assert_eq!(faces.image_shape(), (48, 42));
//! ```

pub mod generate;

use dscgan::ImageDataset;
use ndarray::{Array1, Array3, Array4, ArrayBase, Data, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, ReadNpzError};
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Height of a cropped YaleB image
pub const YALEB_HEIGHT: usize = 48;
/// Width of a cropped YaleB image
pub const YALEB_WIDTH: usize = 42;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("cannot open dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read dataset archive: {0}")]
    Read(#[from] ReadNpzError),
    #[error("expected {expected} pixels per image, got {found}")]
    PixelCount { expected: usize, found: usize },
    #[error(transparent)]
    Dscgan(#[from] dscgan::error::Error),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Read the cropped Extended YaleB faces from an `.npz` archive
///
/// The archive has to contain the array `Y` with layout `(pixel, image, subject)`, stored as
/// `f64` or `f32`. Images are returned subject by subject with the subject index as target.
pub fn yaleb<P: AsRef<Path>>(path: P) -> Result<ImageDataset<f32>> {
    let mut npz = NpzReader::new(File::open(path)?)?;

    let y = match npz.by_name::<OwnedRepr<f64>, Ix3>("Y.npy") {
        Ok(y) => y.mapv(|v| v as f32),
        Err(_) => npz.by_name::<OwnedRepr<f32>, Ix3>("Y.npy")?,
    };

    images_from_columns(&y, YALEB_HEIGHT, YALEB_WIDTH)
}

/// Assemble images from pixel columns of shape `(height * width, images, subjects)`
///
/// Every pixel column stores an image width-major: pixel `(h, w)` is entry `w * height + h`.
pub fn images_from_columns(
    columns: &ArrayBase<impl Data<Elem = f32>, Ix3>,
    height: usize,
    width: usize,
) -> Result<ImageDataset<f32>> {
    let (n_pixels, per_subject, n_subjects) = columns.dim();
    if n_pixels != height * width {
        return Err(DatasetError::PixelCount {
            expected: height * width,
            found: n_pixels,
        });
    }

    let records = Array4::from_shape_fn((n_subjects * per_subject, 1, height, width), |(i, _, h, w)| {
        columns[[w * height + h, i % per_subject, i / per_subject]]
    });
    let targets = Array1::from_shape_fn(n_subjects * per_subject, |i| i / per_subject);

    Ok(ImageDataset::new(records, targets)?)
}

/// Inverse of [`images_from_columns`] for a dataset whose subjects all have the same size
pub fn columns_from_images(dataset: &ImageDataset<f32>, per_subject: usize) -> Array3<f32> {
    let (height, width) = dataset.image_shape();
    let n_subjects = dataset.nsamples() / per_subject.max(1);
    let records = dataset.records();

    Array3::from_shape_fn((height * width, per_subject, n_subjects), |(p, j, s)| {
        records[[s * per_subject + j, 0, p % height, p / height]]
    })
}
