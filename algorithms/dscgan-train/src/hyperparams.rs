use crate::phase::PhaseSchedule;
use crate::TrainParamsError;

use dscgan::ParamGuard;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq, Eq)]
/// The set of hyperparameters of the alternating [training schedule](crate::SubsetTrainer)
/// on one subset of subjects.
pub struct TrainValidParams {
    /// Number of subjects in every subset
    n_clusters: usize,
    /// Number of images per subject
    per_subject: usize,
    /// Epochs which only minimize the autoencoder loss
    warmup_epochs: usize,
    /// Epochs alternating between critic and adversarial autoencoder steps
    adversarial_epochs: usize,
    /// The clustering is recomputed every `update_interval` epochs
    update_interval: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A helper struct used to construct a set of [valid hyperparameters](TrainValidParams) for
/// the training schedule (using the builder pattern).
pub struct TrainParams(TrainValidParams);

impl TrainParams {
    /// Schedule for subsets of `n_clusters` subjects
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `per_subject = 64`
    /// * `warmup_epochs = 50 + 25 * n_clusters`
    /// * `adversarial_epochs = 2000`
    /// * `update_interval = 100`
    pub fn new(n_clusters: usize) -> Self {
        Self(TrainValidParams {
            n_clusters,
            per_subject: 64,
            warmup_epochs: 50 + 25 * n_clusters,
            adversarial_epochs: 2000,
            update_interval: 100,
        })
    }

    /// Change the value of `per_subject`
    pub fn per_subject(mut self, per_subject: usize) -> Self {
        self.0.per_subject = per_subject;
        self
    }

    /// Change the value of `warmup_epochs`
    pub fn warmup_epochs(mut self, warmup_epochs: usize) -> Self {
        self.0.warmup_epochs = warmup_epochs;
        self
    }

    /// Change the value of `adversarial_epochs`
    pub fn adversarial_epochs(mut self, adversarial_epochs: usize) -> Self {
        self.0.adversarial_epochs = adversarial_epochs;
        self
    }

    /// Change the value of `update_interval`
    pub fn update_interval(mut self, update_interval: usize) -> Self {
        self.0.update_interval = update_interval;
        self
    }
}

impl ParamGuard for TrainParams {
    type Checked = TrainValidParams;
    type Error = TrainParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let p = &self.0;
        let total = p.warmup_epochs + p.adversarial_epochs;

        if p.n_clusters == 0 {
            Err(TrainParamsError::NClusters)
        } else if p.per_subject == 0 {
            Err(TrainParamsError::PerSubject)
        } else if total == 0 {
            Err(TrainParamsError::EmptySchedule)
        } else if p.update_interval == 0 {
            Err(TrainParamsError::UpdateInterval)
        } else if p.adversarial_epochs > 0 && p.update_interval > p.warmup_epochs {
            Err(TrainParamsError::ClusteringBeforeAdversarial {
                update_interval: p.update_interval,
                warmup: p.warmup_epochs,
            })
        } else if p.update_interval > total {
            Err(TrainParamsError::UpdateAfterSchedule {
                update_interval: p.update_interval,
                total,
            })
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl TrainValidParams {
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn per_subject(&self) -> usize {
        self.per_subject
    }

    /// Number of images in a subset, which is the batch size of the network
    pub fn batch_size(&self) -> usize {
        self.n_clusters * self.per_subject
    }

    pub fn warmup_epochs(&self) -> usize {
        self.warmup_epochs
    }

    pub fn adversarial_epochs(&self) -> usize {
        self.adversarial_epochs
    }

    pub fn update_interval(&self) -> usize {
        self.update_interval
    }

    /// The epoch schedule described by these parameters
    pub fn schedule(&self) -> PhaseSchedule {
        PhaseSchedule::new(self.warmup_epochs, self.adversarial_epochs, self.update_interval)
    }
}
