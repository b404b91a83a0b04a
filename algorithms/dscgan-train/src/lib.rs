//! `dscgan-train` runs the alternating optimization of a [`DscNet`](dscgan_nn::DscNet) and
//! scores the resulting clusterings.
//!
//! ## The big picture
//!
//! Training on one subset of subjects follows a two phase [schedule](PhaseSchedule):
//!
//! * during the warm-up the autoencoder and the coefficient matrix are fitted to the
//!   reconstruction, sparsity and self-expression loss,
//! * afterwards every epoch takes one critic step and one adversarial autoencoder step, with
//!   fakes synthesized from the clusters of the latest clustering.
//!
//! At a fixed interval the coefficient matrix is clustered by
//! [`dscgan_spectral::SubspaceClustering`] and scored against the subject labels. An
//! [experiment](ExperimentValidParams::run) repeats this for every subset of consecutive
//! subjects and every configured class count and reports mean and median error rates.
//!
//! ```no_run
//! use dscgan::ParamGuard;
//! use dscgan_train::ExperimentParams;
//!
//! let faces = dscgan_datasets::yaleb("YaleBCrop025.npz").unwrap();
//! let report = ExperimentParams::<f32>::new("baseline")
//!     .class_counts(vec![10])
//!     .check()
//!     .unwrap()
//!     .run(&faces)
//!     .unwrap();
//! println!("{}", report);
//! ```
mod errors;
mod experiment;
mod hyperparams;
mod phase;
mod summary;
mod trainer;

pub use errors::*;
pub use experiment::*;
pub use hyperparams::*;
pub use phase::*;
pub use summary::*;
pub use trainer::*;
