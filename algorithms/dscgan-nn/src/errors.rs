use ndarray::ShapeError;
use ndarray_npy::{ReadNpzError, WriteNpzError};
use thiserror::Error;

/// An error when building a network with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum DscNetParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("batch_size cannot be 0")]
    BatchSize,
    #[error("image dimensions must be positive, got {0}x{1}")]
    ImageShape(usize, usize),
    #[error("need one kernel size per encoder layer, got {kernels} kernels for {layers} layers")]
    Layers { kernels: usize, layers: usize },
    #[error("kernel sizes, channel counts and stride must be positive")]
    LayerSize,
    #[error("regularization weights must be non-negative")]
    Lambda,
    #[error("coef_init must be finite")]
    CoefInit,
    #[error("learning_rate must be greater than 0")]
    LearningRate,
    #[error("clip_bound must be greater than 0")]
    ClipBound,
    #[error("fakes_per_cluster cannot be 0")]
    FakesPerCluster,
    #[error("critic hidden widths must be positive")]
    CriticWidth,
}

/// An error when running or persisting the network
#[derive(Error, Debug)]
pub enum NnError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] DscNetParamsError),
    #[error("expected a batch of {expected} images, got {found}")]
    BatchSize { expected: usize, found: usize },
    #[error("expected images of shape {expected:?}, got {found:?}")]
    ImageShape {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    #[error("tensor {name} has shape {found:?}, expected {expected:?}")]
    TensorShape {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("tensor conversion failed: {0}")]
    Tensor(String),
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("checkpoint i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("reading checkpoint failed: {0}")]
    ReadCheckpoint(#[from] ReadNpzError),
    #[error("writing checkpoint failed: {0}")]
    WriteCheckpoint(#[from] WriteNpzError),
    #[error(transparent)]
    DscganError(#[from] dscgan::error::Error),
}

pub type Result<T> = std::result::Result<T, NnError>;
