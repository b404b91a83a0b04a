//! `dscgan-nn` holds the networks of deep subspace clustering with an adversarial critic.
//!
//! ## The big picture
//!
//! Images are encoded by a stack of strided convolutions into latent vectors `Z`. A
//! self-expressive layer mixes them as `Z_c = C Z` with a learned coefficient matrix `C` and a
//! mirrored stack of transposed convolutions decodes `Z_c` back into images. Once a clustering
//! of `C` is known, random convex combinations of the latent vectors of every cluster serve as
//! fake samples for a small critic, which learns to tell them from the real latent vectors.
//! Penalizing the critic score pulls every latent vector into the span of its cluster.
//!
//! The layers are [burn](https://burn.dev) modules on the CPU [`NetBackend`], gradients come
//! from its reverse-mode autodiff. The [`DscNet`] ties the pieces together, keeps one Adam
//! optimizer per training objective and exposes one method per objective.
//!
//! ```
//! use dscgan_nn::DscNet;
//! use ndarray::{array, Array4};
//!
//! let mut net = DscNet::<f64>::params(2, 4)
//!     .image_shape(8, 8)
//!     .layers(vec![3, 3], vec![2, 3])
//!     .critic_hidden(6, 4)
//!     .fakes_per_cluster(3)
//!     .build()
//!     .unwrap();
//!
//! let images = Array4::from_shape_fn((4, 1, 8, 8), |(i, _, h, w)| ((i + h * w) % 5) as f64 / 5.);
//! let labels = array![0, 0, 1, 1];
//!
//! net.partial_fit_eqn3(&images).unwrap();
//! let score = net.partial_fit_disc(&images, &labels).unwrap();
//! let summary = net.partial_fit_eqn3plus(&images, &labels).unwrap();
//!
//! assert!(score.is_finite());
//! assert_eq!(summary.step, 2);
//! ```
mod autoencoder;
mod checkpoint;
mod conv;
mod discriminator;
mod errors;
mod fakes;
mod hyperparams;
mod model;
mod tensor;

pub use autoencoder::*;
pub use conv::{conv2d_same, conv_transpose2d_same, SamePadding};
pub use discriminator::*;
pub use errors::*;
pub use fakes::FakeBatch;
pub use hyperparams::*;
pub use model::{DscNet, StepSummary};
pub use tensor::{NetBackend, NetFloat};
