//! `dscgan-spectral` turns a learned self-expressive coefficient matrix into a clustering.
//!
//! ## The big picture
//!
//! A deep subspace clustering network learns a coefficient matrix `C` whose entry `(i, j)`
//! describes how much sample `j` contributes to the reconstruction of sample `i` in latent
//! space. Samples of the same subspace use each other, samples of different subspaces should
//! not. This crate implements the post-processing pipeline which extracts the clusters:
//!
//! * [thresholding](threshold_coefficients) of every column of `C` by cumulative energy,
//! * a [low-rank affinity](low_rank_affinity) built from the leading singular vectors of the
//!   symmetrized matrix,
//! * [spectral clustering](SpectralClustering) of the affinity with a normalized Laplacian
//!   embedding and discretized label assignment.
//!
//! The whole pipeline is available as [`SubspaceClustering`], the singular value decomposition draws
//! its scratch memory from a [`DecompositionPool`] which can be kept alive across calls.
//!
//! ```
//! use dscgan::traits::Fit;
//! use dscgan_spectral::SubspaceClustering;
//! use ndarray::Array2;
//!
//! // two perfectly separated groups of samples
//! let coef = Array2::from_shape_fn((10, 10), |(i, j)| if (i < 6) == (j < 6) { 1.0 } else { 0.0 });
//!
//! let clustering = SubspaceClustering::params(2)
//!     .subspace_dim(1)
//!     .alpha(1.0)
//!     .threshold(0.5)
//!     .fit(&coef)
//!     .unwrap();
//!
//! let labels = clustering.labels();
//! assert!(labels.iter().take(6).all(|&l| l == labels[0]));
//! assert!(labels.iter().skip(6).all(|&l| l != labels[0]));
//! ```
mod affinity;
mod algorithm;
mod discretize;
mod errors;
mod hyperparams;
mod pool;
mod spectral;
mod threshold;

pub use affinity::*;
pub use algorithm::*;
pub use discretize::discretize;
pub use errors::*;
pub use hyperparams::*;
pub use pool::*;
pub use spectral::*;
pub use threshold::*;
