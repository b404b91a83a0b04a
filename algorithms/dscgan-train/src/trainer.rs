//! Training of one network on one subset of subjects
use crate::hyperparams::TrainValidParams;
use crate::phase::Phase;
use crate::summary::SummaryWriter;
use crate::{Result, TrainError};

use dscgan::metrics::error_rate;
use dscgan::{Float, ImageDataset};
use dscgan_nn::{DscNet, NetFloat};
use dscgan_spectral::{DecompositionPool, PostProcessValidParams};
use indicatif::ProgressBar;
use log::{info, warn};
use ndarray::Array1;
use ndarray_npy::ReadableElement;
use ndarray_rand::rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of training on one subset
#[derive(Clone, Debug, PartialEq)]
pub struct SubsetOutcome {
    /// Labels of the last clustering
    pub labels: Array1<usize>,
    /// Error rate of the last clustering against the subject labels
    pub error_rate: f64,
    /// Number of clusterings computed during training
    pub n_clusterings: usize,
    /// Reconstruction loss per image reported by the last update
    pub final_cost: f64,
}

/// Runs the alternating schedule on subsets of subjects
///
/// For every subset the network is reinitialized and, if a checkpoint is configured, the
/// pretrained autoencoder weights are restored. The epochs then follow the
/// [schedule](crate::PhaseSchedule): warm-up epochs take one autoencoder step, adversarial
/// epochs one critic step followed by one adversarial autoencoder step. Every
/// `update_interval` epochs the coefficient matrix is clustered, the labels serve as cluster
/// assignment of the fakes until the next clustering.
///
/// The scratch memory of the post-processing is kept between subsets.
pub struct SubsetTrainer<R: Rng> {
    params: TrainValidParams,
    post_process: PostProcessValidParams<f64, R>,
    pool: DecompositionPool<f64>,
    checkpoint: Option<PathBuf>,
    progress: ProgressBar,
}

impl<R: Rng + Clone> SubsetTrainer<R> {
    pub fn new(params: TrainValidParams, post_process: PostProcessValidParams<f64, R>) -> Self {
        let pool = DecompositionPool::with_dimension(params.batch_size());

        SubsetTrainer {
            params,
            post_process,
            pool,
            checkpoint: None,
            progress: ProgressBar::hidden(),
        }
    }

    /// Restore the autoencoder from `path` before training a subset
    pub fn with_checkpoint(mut self, path: Option<PathBuf>) -> Self {
        self.checkpoint = path;
        self
    }

    /// Advance `progress` once per epoch
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn params(&self) -> &TrainValidParams {
        &self.params
    }

    pub fn checkpoint(&self) -> Option<&Path> {
        self.checkpoint.as_deref()
    }

    pub fn pool(&self) -> &DecompositionPool<f64> {
        &self.pool
    }

    /// Reset the network to the state every subset starts from
    pub fn prepare<F, R2>(&self, net: &mut DscNet<F, R2>) -> Result<()>
    where
        F: NetFloat + ReadableElement,
        R2: Rng + Clone,
    {
        net.reinitialize();
        match &self.checkpoint {
            Some(path) => net.restore(path)?,
            None => warn!("no checkpoint configured, training from randomly initialized weights"),
        }
        Ok(())
    }

    /// Train `net` on `subset` and cluster it
    pub fn train<F, R2, W>(
        &mut self,
        net: &mut DscNet<F, R2>,
        subset: &ImageDataset<F>,
        writer: &mut W,
    ) -> Result<SubsetOutcome>
    where
        F: NetFloat + ReadableElement,
        R2: Rng + Clone,
        W: SummaryWriter,
    {
        self.prepare(net)?;

        let schedule = self.params.schedule();
        let records = subset.records();
        let targets = subset.targets();
        let batch_size = F::cast(self.params.batch_size());

        let mut clustering: Option<(Array1<usize>, f64)> = None;
        let mut n_clusterings = 0;
        let mut final_cost = f64::NAN;

        for (epoch, phase) in schedule.epochs() {
            let summary = match phase {
                Phase::WarmReconstruct => net.partial_fit_eqn3(&records)?,
                Phase::Adversarial => {
                    let (labels, _) = clustering
                        .as_ref()
                        .ok_or(TrainError::NoClustering(epoch))?;
                    net.partial_fit_disc(&records, labels)?;
                    net.partial_fit_eqn3plus(&records, labels)?
                }
            };
            writer.add_step(&summary)?;
            self.progress.inc(1);

            if !schedule.is_update_epoch(epoch) {
                continue;
            }

            final_cost = <f64 as Float>::cast(summary.cost() / batch_size);
            info!("epoch: {} ({}), cost: {:.8}", epoch, phase, final_cost);

            let start = Instant::now();
            let coef = net.coefficients()?.mapv(|c| <f64 as Float>::cast(c));
            let labels = self
                .post_process
                .fit_with_pool(&coef, &mut self.pool)?
                .into_labels();
            let error: f64 = error_rate(&targets, &labels)?;
            info!(
                "accuracy: {:.4}, post processing time: {:?}",
                1.0 - error,
                start.elapsed()
            );

            clustering = Some((labels, error));
            n_clusterings += 1;
        }
        writer.flush()?;

        let (labels, error_rate) =
            clustering.ok_or_else(|| TrainError::NoClustering(schedule.total_epochs()))?;

        Ok(SubsetOutcome {
            labels,
            error_rate,
            n_clusterings,
            final_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::MemoryWriter;
    use crate::TrainParams;
    use dscgan::ParamGuard;
    use dscgan_datasets::generate::toy_subjects;
    use dscgan_nn::NnError;
    use dscgan_spectral::SubspaceClustering;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    fn toy_net(batch_size: usize) -> DscNet<f32> {
        DscNet::params(2, batch_size)
            .image_shape(12, 10)
            .layers(vec![3, 3], vec![4, 6])
            .critic_hidden(16, 8)
            .fakes_per_cluster(8)
            .build()
            .unwrap()
    }

    fn trainer(warmup: usize, adversarial: usize, update: usize) -> SubsetTrainer<Xoshiro256Plus> {
        let params = TrainParams::new(2)
            .per_subject(6)
            .warmup_epochs(warmup)
            .adversarial_epochs(adversarial)
            .update_interval(update)
            .check()
            .unwrap();
        let post = SubspaceClustering::<f64>::params(2)
            .subspace_dim(2)
            .check()
            .unwrap();

        SubsetTrainer::new(params, post)
    }

    #[test]
    fn alternates_and_clusters() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let subset = toy_subjects(2, 6, (12, 10), 2, 0.01, &mut rng).unwrap();
        let mut net = toy_net(12);
        let mut trainer = trainer(4, 3, 2);
        let mut writer = MemoryWriter::default();

        let outcome = trainer.train(&mut net, &subset, &mut writer).unwrap();

        assert_eq!(outcome.labels.len(), 12);
        assert_eq!(outcome.n_clusterings, 3);
        assert!((0.0..=1.0).contains(&outcome.error_rate));
        assert!(outcome.final_cost.is_finite());

        // every epoch reports one autoencoder update, adversarial ones with a critic score
        assert_eq!(writer.values("loss_recon").len(), 7);
        assert_eq!(writer.values("score_disc").len(), 3);
        assert_eq!(net.n_steps(), 7);
        assert_eq!(trainer.pool().acquisitions(), 3);
    }

    #[test]
    fn missing_checkpoint_fails() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let subset = toy_subjects(2, 6, (12, 10), 2, 0.01, &mut rng).unwrap();
        let mut net = toy_net(12);
        let mut trainer = trainer(2, 0, 2).with_checkpoint(Some(PathBuf::from("does/not/exist.npz")));

        let res = trainer.train(&mut net, &subset, &mut MemoryWriter::default());
        assert!(matches!(res, Err(TrainError::Nn(NnError::Io(_)))));
    }

    #[test]
    fn wrong_subset_size() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let subset = toy_subjects(2, 5, (12, 10), 2, 0.01, &mut rng).unwrap();
        let mut net = toy_net(12);
        let mut trainer = trainer(2, 0, 2);

        let res = trainer.train(&mut net, &subset, &mut MemoryWriter::default());
        assert!(matches!(
            res,
            Err(TrainError::Nn(NnError::BatchSize {
                expected: 12,
                found: 10
            }))
        ));
    }
}
