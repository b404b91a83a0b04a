//! `dscgan` is the core crate of a deep subspace clustering pipeline with adversarial
//! regularization of the latent space.
//!
//! The pipeline learns a convolutional autoencoder together with a self-expressive
//! coefficient matrix `C`, such that every latent vector is (approximately) a linear
//! combination of the latent vectors of its own subspace. A small critic network pushes the
//! latent distribution towards convex combinations of members of the same cluster. The
//! coefficient matrix is finally turned into an affinity and clustered spectrally.
//!
//! This crate only holds what the member crates have in common:
//!
//! * the [`Float`] bound and the [`ImageDataset`] container,
//! * the error type and the [`ParamGuard`] hyperparameter checking,
//! * the [`Fit`](traits::Fit) trait,
//! * clustering [metrics] based on an optimal label matching.
//!
//! The algorithms live in the workspace members:
//!
//! * `dscgan-nn`: autoencoder, self-expressive layer, critic and fake-sample synthesis,
//! * `dscgan-spectral`: coefficient thresholding, affinity construction and spectral clustering,
//! * `dscgan-train`: the alternating training schedule and the experiment runner,
//! * `dscgan-datasets`: the Extended YaleB loader and synthetic toy subjects.

mod assignment;
pub mod dataset;
pub mod error;
mod metrics_clustering;
pub mod param_guard;
pub mod prelude;
pub mod traits;

pub use assignment::linear_sum_assignment;
pub use dataset::{Float, ImageDataset};
pub use param_guard::ParamGuard;

/// Metrics to score a clustering against the ground truth
pub mod metrics {
    pub use crate::metrics_clustering::{best_map, contingency_table, error_rate, ErrorSummary};
}
