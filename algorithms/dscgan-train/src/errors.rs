use dscgan_datasets::DatasetError;
use dscgan_nn::NnError;
use dscgan_spectral::SpectralError;
use thiserror::Error;

/// An error when configuring the training schedule or an experiment
#[derive(Error, Debug)]
pub enum TrainParamsError {
    #[error("n_clusters cannot be 0")]
    NClusters,
    #[error("per_subject cannot be 0")]
    PerSubject,
    #[error("the schedule needs at least one epoch")]
    EmptySchedule,
    #[error("update_interval cannot be 0")]
    UpdateInterval,
    #[error("update_interval {update_interval} exceeds the {warmup} warm-up epochs, the first adversarial epoch would run without a clustering")]
    ClusteringBeforeAdversarial { update_interval: usize, warmup: usize },
    #[error("update_interval {update_interval} exceeds the {total} epochs of the schedule, no clustering would be computed")]
    UpdateAfterSchedule { update_interval: usize, total: usize },
    #[error("name of experiment must be specified")]
    EmptyName,
    #[error("at least one class count has to be given")]
    NoClassCounts,
    #[error("lambda3 must be finite and non-negative")]
    Lambda3,
}

/// An error when training a network or running an experiment
#[derive(Error, Debug)]
pub enum TrainError {
    /// When any of the hyperparameters are set the wrong value
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] TrainParamsError),
    #[error("no clustering available at epoch {0}")]
    NoClustering(usize),
    #[error("{n_clusters} classes requested, the dataset has only {n_subjects} subjects")]
    TooFewSubjects { n_subjects: usize, n_clusters: usize },
    #[error("cannot write summaries: {0}")]
    Summary(#[from] std::io::Error),
    #[error(transparent)]
    Nn(#[from] NnError),
    #[error(transparent)]
    Spectral(#[from] SpectralError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    DscganError(#[from] dscgan::error::Error),
}

impl TrainError {
    /// Whether a clustering left one of the clusters without members
    pub fn is_degenerate_clustering(&self) -> bool {
        matches!(
            self,
            TrainError::Nn(NnError::DscganError(dscgan::error::Error::EmptyCluster(_)))
                | TrainError::DscganError(dscgan::error::Error::EmptyCluster(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, TrainError>;
