//! Two-state epoch schedule of the alternating training
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::fmt;

/// What a training epoch optimizes
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// One step on reconstruction, sparsity and self-expression loss
    WarmReconstruct,
    /// One critic step followed by one adversarial autoencoder step
    Adversarial,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Phase::WarmReconstruct => write!(f, "warm-up"),
            Phase::Adversarial => write!(f, "adversarial"),
        }
    }
}

/// Epochs `1..=warmup` are [`Phase::WarmReconstruct`], the following `adversarial` epochs are
/// [`Phase::Adversarial`]
///
/// Independent of the phase, every `update_interval`-th epoch ends with a new clustering.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseSchedule {
    warmup: usize,
    adversarial: usize,
    update_interval: usize,
}

impl PhaseSchedule {
    pub fn new(warmup: usize, adversarial: usize, update_interval: usize) -> Self {
        PhaseSchedule {
            warmup,
            adversarial,
            update_interval,
        }
    }

    pub fn total_epochs(&self) -> usize {
        self.warmup + self.adversarial
    }

    /// Phase of the 1-based `epoch`, `None` outside of the schedule
    pub fn phase(&self, epoch: usize) -> Option<Phase> {
        if epoch == 0 || epoch > self.total_epochs() {
            None
        } else if epoch <= self.warmup {
            Some(Phase::WarmReconstruct)
        } else {
            Some(Phase::Adversarial)
        }
    }

    /// Whether the clustering is recomputed after `epoch`
    pub fn is_update_epoch(&self, epoch: usize) -> bool {
        self.update_interval > 0 && epoch > 0 && epoch % self.update_interval == 0
    }

    /// Number of clusterings computed over the whole schedule
    pub fn n_updates(&self) -> usize {
        if self.update_interval == 0 {
            0
        } else {
            self.total_epochs() / self.update_interval
        }
    }

    /// Iterate over all epochs together with their phase
    pub fn epochs(&self) -> impl Iterator<Item = (usize, Phase)> + '_ {
        (1..=self.total_epochs()).filter_map(move |epoch| self.phase(epoch).map(|p| (epoch, p)))
    }
}
