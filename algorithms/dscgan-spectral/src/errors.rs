use linfa_linalg::LinalgError;
use thiserror::Error;

/// An error when fitting with an invalid hyperparameter
#[derive(Error, Debug)]
pub enum PostProcessParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("subspace_dim cannot be 0")]
    SubspaceDim,
    #[error("alpha must be greater than 0")]
    Alpha,
    #[error("threshold must be greater than 0")]
    Threshold,
    #[error("max_svd_restarts cannot be 0")]
    SvdRestarts,
    #[error("n_iter_max cannot be 0")]
    MaxIterations,
}

/// An error when clustering a coefficient matrix
#[derive(Error, Debug)]
pub enum SpectralError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] PostProcessParamsError),
    #[error("coefficient matrix has to be square, got {0}x{1}")]
    NotSquare(usize, usize),
    #[error("cannot form {n_clusters} clusters out of {n_samples} samples")]
    TooFewSamples { n_samples: usize, n_clusters: usize },
    #[error("decomposition failed: {0}")]
    Linalg(#[from] LinalgError),
    /// When the discretization of the embedding fails for every restart
    #[error("Discretization failed: SVD did not converge after all restarts")]
    NotConverged,
    #[error(transparent)]
    DscganError(#[from] dscgan::error::Error),
}

pub type Result<T> = std::result::Result<T, SpectralError>;
