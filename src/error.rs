//! Error types in dscgan
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("labels must be 0-based, smallest label is {0}")]
    NotZeroBased(usize),
    #[error("cluster {0} has no members")]
    EmptyCluster(usize),
    #[error("label vectors differ in length: {0} != {1}")]
    MismatchedLabels(usize, usize),
    #[error("not enough samples to form the requested subset")]
    NotEnoughSamples,
}
