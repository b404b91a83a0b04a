//! Experiments over consecutive subsets of subjects
use crate::hyperparams::TrainParams;
use crate::summary::{SummaryWriter, TsvWriter};
use crate::trainer::{SubsetOutcome, SubsetTrainer};
use crate::{Result, TrainError, TrainParamsError};

use dscgan::metrics::ErrorSummary;
use dscgan::{Float, ImageDataset, ParamGuard};
use dscgan_nn::{DscNet, NetFloat};
use dscgan_spectral::{Affinity, SpectralError, SubspaceClustering};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use ndarray_npy::{ReadableElement, WritableElement};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use std::fmt;
use std::path::{Path, PathBuf};

/// The set of hyperparameters of an [experiment](ExperimentValidParams::run)
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentValidParams<F> {
    /// Name of the experiment, summaries are written to `logs_dir/name`
    name: String,
    /// Every class count is one configuration
    class_counts: Vec<usize>,
    /// Number of images per subject
    per_subject: usize,
    /// Weight of the critic score in the adversarial objective
    lambda3: F,
    /// Affinity built from the coefficient matrix before spectral clustering
    affinity: Affinity,
    /// Overrides of the default schedule
    warmup_epochs: Option<usize>,
    adversarial_epochs: Option<usize>,
    update_interval: Option<usize>,
    /// Pretrained autoencoder restored for every subset
    restore: Option<PathBuf>,
    /// Destination of the checkpoint written after every configuration
    save: Option<PathBuf>,
    logs_dir: PathBuf,
    seed: u64,
    progress: bool,
}

/// A helper struct used to construct a set of [valid hyperparameters](ExperimentValidParams)
/// for an experiment (using the builder pattern).
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentParams<F>(ExperimentValidParams<F>);

impl<F: Float> ExperimentParams<F> {
    /// Experiment called `name`
    ///
    /// Defaults are provided if optional parameters are not specified:
    /// * `class_counts = [38]`
    /// * `per_subject = 64`
    /// * `lambda3 = 1.0`
    /// * `affinity = Affinity::LowRank`
    /// * the default schedule of [`TrainParams`]
    /// * no checkpoint is restored or saved
    /// * `logs_dir = "logs"`
    /// * `seed = 42`
    /// * no progress bar
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self(ExperimentValidParams {
            name: name.into(),
            class_counts: vec![38],
            per_subject: 64,
            lambda3: F::one(),
            affinity: Affinity::default(),
            warmup_epochs: None,
            adversarial_epochs: None,
            update_interval: None,
            restore: None,
            save: None,
            logs_dir: PathBuf::from("logs"),
            seed: 42,
            progress: false,
        })
    }

    pub fn class_counts(mut self, class_counts: Vec<usize>) -> Self {
        self.0.class_counts = class_counts;
        self
    }

    pub fn per_subject(mut self, per_subject: usize) -> Self {
        self.0.per_subject = per_subject;
        self
    }

    pub fn lambda3(mut self, lambda3: F) -> Self {
        self.0.lambda3 = lambda3;
        self
    }

    pub fn affinity(mut self, affinity: Affinity) -> Self {
        self.0.affinity = affinity;
        self
    }

    /// Override the number of warm-up epochs, which defaults to `50 + 25 * n_clusters`
    pub fn warmup_epochs(mut self, warmup_epochs: Option<usize>) -> Self {
        self.0.warmup_epochs = warmup_epochs;
        self
    }

    pub fn adversarial_epochs(mut self, adversarial_epochs: Option<usize>) -> Self {
        self.0.adversarial_epochs = adversarial_epochs;
        self
    }

    pub fn update_interval(mut self, update_interval: Option<usize>) -> Self {
        self.0.update_interval = update_interval;
        self
    }

    pub fn restore(mut self, path: Option<PathBuf>) -> Self {
        self.0.restore = path;
        self
    }

    pub fn save(mut self, path: Option<PathBuf>) -> Self {
        self.0.save = path;
        self
    }

    pub fn logs_dir<P: Into<PathBuf>>(mut self, logs_dir: P) -> Self {
        self.0.logs_dir = logs_dir.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.0.seed = seed;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.0.progress = progress;
        self
    }
}

impl<F: Float> ParamGuard for ExperimentParams<F> {
    type Checked = ExperimentValidParams<F>;
    type Error = TrainParamsError;

    fn check_ref(&self) -> std::result::Result<&Self::Checked, Self::Error> {
        let p = &self.0;
        if p.name.trim().is_empty() {
            return Err(TrainParamsError::EmptyName);
        }
        if p.class_counts.is_empty() {
            return Err(TrainParamsError::NoClassCounts);
        }
        if !p.lambda3.is_finite() || p.lambda3 < F::zero() {
            return Err(TrainParamsError::Lambda3);
        }
        for &n_clusters in &p.class_counts {
            p.train_params(n_clusters).check()?;
        }
        Ok(p)
    }

    fn check(self) -> std::result::Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float> ExperimentValidParams<F> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_counts(&self) -> &[usize] {
        &self.class_counts
    }

    pub fn lambda3(&self) -> F {
        self.lambda3
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Schedule of the configuration with `n_clusters` subjects per subset
    pub fn train_params(&self, n_clusters: usize) -> TrainParams {
        let mut params = TrainParams::new(n_clusters).per_subject(self.per_subject);
        if let Some(epochs) = self.warmup_epochs {
            params = params.warmup_epochs(epochs);
        }
        if let Some(epochs) = self.adversarial_epochs {
            params = params.adversarial_epochs(epochs);
        }
        if let Some(interval) = self.update_interval {
            params = params.update_interval(interval);
        }
        params
    }

    /// Run every configuration on all subsets of consecutive subjects of `dataset`
    ///
    /// A configuration with `K` classes trains one network per subset of `K` consecutive
    /// subjects, there are `n_subjects + 1 - K` of them. Scalars of all updates are written to
    /// `logs_dir/name/scalars.tsv`.
    pub fn run(&self, dataset: &ImageDataset<F>) -> Result<ExperimentReport>
    where
        F: NetFloat + ReadableElement + WritableElement,
    {
        let mut writer = TsvWriter::create(self.logs_dir.join(&self.name))?;
        let n_subjects = dataset.n_classes();

        let mut report = ExperimentReport {
            name: self.name.clone(),
            configurations: Vec::with_capacity(self.class_counts.len()),
        };
        for &n_clusters in &self.class_counts {
            if n_clusters > n_subjects {
                return Err(TrainError::TooFewSubjects {
                    n_subjects,
                    n_clusters,
                });
            }
            let result = self.run_configuration(dataset, n_subjects, n_clusters, &mut writer)?;
            info!("{}", result);
            report.configurations.push(result);
        }
        writer.flush()?;

        Ok(report)
    }

    fn run_configuration<W: SummaryWriter>(
        &self,
        dataset: &ImageDataset<F>,
        n_subjects: usize,
        n_clusters: usize,
        writer: &mut W,
    ) -> Result<ConfigurationReport>
    where
        F: NetFloat + ReadableElement + WritableElement,
    {
        let train = self.train_params(n_clusters).check()?;
        let (height, width) = dataset.image_shape();
        let mut net = DscNet::params_with_rng(
            n_clusters,
            train.batch_size(),
            Xoshiro256Plus::seed_from_u64(self.seed),
        )
        .image_shape(height, width)
        .lambda3(self.lambda3)
        .build()?;
        let post_process = SubspaceClustering::<f64>::params(n_clusters)
            .affinity(self.affinity)
            .check()
            .map_err(SpectralError::from)?;

        let n_subsets = n_subjects + 1 - n_clusters;
        info!(
            "{} subjects: {} subsets of {} images, {} epochs each, lambda2 = {:.6}",
            n_clusters,
            n_subsets,
            train.batch_size(),
            train.schedule().total_epochs(),
            net.hyperparams().lambda2()
        );

        let progress = self.progress_bar(n_subsets * train.schedule().total_epochs());
        let mut trainer = SubsetTrainer::new(train, post_process)
            .with_checkpoint(self.restore.clone())
            .with_progress(progress.clone());

        let report = train_subsets(&mut trainer, &mut net, dataset, writer)?;
        progress.finish_and_clear();

        if let Some(path) = &self.save {
            net.save(path)?;
        }

        Ok(report)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg:>12} [{bar:25}] {pos:>5}/{len:5} ({elapsed})")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message("Training");
        bar
    }
}

/// Train `net` on every subset of consecutive subjects of `dataset`
///
/// The subsets hold as many subjects as the network has clusters. A subset whose clustering
/// leaves a cluster empty is recorded as failure and the next subset is trained, every other
/// error ends the run.
pub fn train_subsets<F, R, R2, W>(
    trainer: &mut SubsetTrainer<R>,
    net: &mut DscNet<F, R2>,
    dataset: &ImageDataset<F>,
    writer: &mut W,
) -> Result<ConfigurationReport>
where
    F: NetFloat + ReadableElement,
    R: Rng + Clone,
    R2: Rng + Clone,
    W: SummaryWriter,
{
    let n_clusters = net.hyperparams().n_clusters();
    let n_subjects = dataset.n_classes();
    if n_clusters > n_subjects {
        return Err(TrainError::TooFewSubjects {
            n_subjects,
            n_clusters,
        });
    }

    let per_subject = trainer.params().per_subject();
    let mut report = ConfigurationReport::new(n_clusters);
    for first in 0..n_subjects + 1 - n_clusters {
        let subset = dataset.subject_subset(first, n_clusters, per_subject)?;
        let result = trainer.train(net, &subset, writer);
        report.record(first, result)?;
    }

    Ok(report)
}

/// A subset whose training stopped because a clustering left a cluster empty
#[derive(Clone, Debug, PartialEq)]
pub struct SubsetFailure {
    /// Index of the first subject of the subset
    pub first_subject: usize,
    pub reason: String,
}

/// Error rates of all subsets of one class count
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigurationReport {
    pub n_clusters: usize,
    /// Error rate of every clustered subset, in subset order
    pub errors: Vec<f64>,
    /// Subsets without a usable clustering, they are left out of the summary
    pub failures: Vec<SubsetFailure>,
    /// Mean and median error rate, absent if no subset was clustered
    pub summary: Option<ErrorSummary<f64>>,
}

impl ConfigurationReport {
    pub fn new(n_clusters: usize) -> Self {
        ConfigurationReport {
            n_clusters,
            errors: Vec::new(),
            failures: Vec::new(),
            summary: None,
        }
    }

    /// Add the result of the subset starting at subject `first_subject`
    ///
    /// Degenerate clusterings are recorded as failure, any other error is returned.
    pub fn record(&mut self, first_subject: usize, result: Result<SubsetOutcome>) -> Result<()> {
        match result {
            Ok(outcome) => {
                info!(
                    "experiment: {}, our accuracy: {:.4}",
                    first_subject,
                    1.0 - outcome.error_rate
                );
                self.errors.push(outcome.error_rate);
                self.summary = Some(ErrorSummary::from_errors(&self.errors)?);
            }
            Err(err) if err.is_degenerate_clustering() => {
                warn!("experiment: {}, skipped: {}", first_subject, err);
                self.failures.push(SubsetFailure {
                    first_subject,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }
}

impl fmt::Display for ConfigurationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} subjects:", self.n_clusters)?;
        match &self.summary {
            Some(summary) => write!(
                f,
                "Mean: {:.4}% Median: {:.4}%",
                summary.mean * 100.0,
                summary.median * 100.0
            )?,
            None => write!(f, "no subset was clustered")?,
        }
        if !self.failures.is_empty() {
            write!(
                f,
                " ({} of {} subsets skipped)",
                self.failures.len(),
                self.failures.len() + self.errors.len()
            )?;
        }
        Ok(())
    }
}

/// Results of all configurations of an experiment
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentReport {
    pub name: String,
    pub configurations: Vec<ConfigurationReport>,
}

impl fmt::Display for ExperimentReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for configuration in &self.configurations {
            writeln!(f, "{}", configuration)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<ExperimentParams<f32>>();
        has_autotraits::<ExperimentReport>();
    }

    #[test]
    fn name_is_required() {
        assert!(matches!(
            ExperimentParams::<f32>::new("  ").check(),
            Err(TrainParamsError::EmptyName)
        ));
        assert!(ExperimentParams::<f32>::new("baseline").check().is_ok());
    }

    #[test]
    fn schedules_are_checked_per_class_count() {
        // 50 + 25 * 1 warm-up epochs are fewer than the update interval of 100
        let params = ExperimentParams::<f32>::new("short").class_counts(vec![10, 1]);
        assert!(matches!(
            params.check(),
            Err(TrainParamsError::ClusteringBeforeAdversarial {
                update_interval: 100,
                warmup: 75
            })
        ));

        let params = ExperimentParams::<f32>::new("short")
            .class_counts(vec![1])
            .update_interval(Some(25));
        assert!(params.check().is_ok());
    }

    #[test]
    fn invalid_lambda3() {
        assert!(matches!(
            ExperimentParams::<f32>::new("x").lambda3(-1.0).check(),
            Err(TrainParamsError::Lambda3)
        ));
    }

    #[test]
    fn report_format() {
        let report = ConfigurationReport {
            n_clusters: 10,
            errors: vec![0.1, 0.2],
            failures: Vec::new(),
            summary: Some(ErrorSummary {
                mean: 0.15,
                median: 0.15,
            }),
        };

        assert_eq!(
            report.to_string(),
            "10 subjects:\nMean: 15.0000% Median: 15.0000%"
        );
    }

    fn outcome(error_rate: f64) -> Result<SubsetOutcome> {
        Ok(SubsetOutcome {
            labels: ndarray::array![0, 1],
            error_rate,
            n_clusterings: 1,
            final_cost: 0.5,
        })
    }

    #[test]
    fn degenerate_subsets_are_skipped() {
        let mut report = ConfigurationReport::new(2);
        let empty = || {
            Err(TrainError::Nn(dscgan_nn::NnError::DscganError(
                dscgan::error::Error::EmptyCluster(1),
            )))
        };

        report.record(0, outcome(0.25)).unwrap();
        report.record(1, empty()).unwrap();
        report.record(2, outcome(0.75)).unwrap();

        assert_eq!(report.errors, vec![0.25, 0.75]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].first_subject, 1);
        assert_eq!(report.summary.as_ref().map(|s| s.mean), Some(0.5));
        assert_eq!(
            report.to_string(),
            "2 subjects:\nMean: 50.0000% Median: 50.0000% (1 of 3 subsets skipped)"
        );
    }

    #[test]
    fn other_errors_abort() {
        let mut report = ConfigurationReport::new(2);
        let res = report.record(0, Err(TrainError::NoClustering(3)));

        assert!(matches!(res, Err(TrainError::NoClustering(3))));
        assert!(report.errors.is_empty() && report.failures.is_empty());
    }
}
