use clap::{Parser, ValueEnum};
use dscgan::ParamGuard;
use dscgan_spectral::Affinity;
use dscgan_train::{ExperimentParams, Result};
use log::{error, info};
use std::path::PathBuf;
use std::process;

/// Deep subspace clustering of face images with an adversarially regularized latent space
#[derive(Parser)]
#[command(name = "dscgan")]
#[command(version)]
struct Cli {
    /// Name of the experiment, summaries are written to <LOGS>/<NAME>
    name: String,

    /// Weight of the critic score in the adversarial objective
    #[arg(long, default_value_t = 1.0)]
    lambda3: f32,

    /// Extended YaleB archive holding the pixel array `Y`
    #[arg(long, default_value = "YaleBCrop025.npz")]
    data: PathBuf,

    /// Pretrained autoencoder restored for every subset
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Checkpoint written after every class count
    #[arg(long, default_value = "model-102030-48x42-yaleb.npz")]
    save: PathBuf,

    /// Number of subjects per subset, may be repeated
    #[arg(short, long = "classes", default_values_t = vec![38])]
    classes: Vec<usize>,

    /// Images per subject
    #[arg(long, default_value_t = 64)]
    per_subject: usize,

    /// Override the number of warm-up epochs (default 50 + 25 * classes)
    #[arg(long)]
    warmup_epochs: Option<usize>,

    /// Override the number of adversarial epochs (default 2000)
    #[arg(long)]
    adversarial_epochs: Option<usize>,

    /// Override the number of epochs between clusterings (default 100)
    #[arg(long)]
    update_interval: Option<usize>,

    /// Directory receiving the summaries of all experiments
    #[arg(long, default_value = "logs")]
    logs: PathBuf,

    /// Affinity built from the coefficient matrix before spectral clustering
    #[arg(long, value_enum, default_value_t = AffinityArg::LowRank)]
    affinity: AffinityArg,

    /// Seed of the weight initialization and the fake synthesis
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AffinityArg {
    /// Low-rank affinity from the leading singular vectors
    LowRank,
    /// Column-max normalized coefficient magnitudes
    ColumnNormalized,
    /// Random-walk normalized coefficient magnitudes
    RandomWalk,
}

impl From<AffinityArg> for Affinity {
    fn from(arg: AffinityArg) -> Self {
        match arg {
            AffinityArg::LowRank => Affinity::LowRank,
            AffinityArg::ColumnNormalized => Affinity::ColumnNormalized,
            AffinityArg::RandomWalk => Affinity::RandomWalk,
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let experiment = ExperimentParams::new(cli.name)
        .class_counts(cli.classes)
        .per_subject(cli.per_subject)
        .lambda3(cli.lambda3)
        .affinity(cli.affinity.into())
        .warmup_epochs(cli.warmup_epochs)
        .adversarial_epochs(cli.adversarial_epochs)
        .update_interval(cli.update_interval)
        .restore(cli.restore)
        .save(Some(cli.save))
        .logs_dir(cli.logs)
        .seed(cli.seed)
        .progress(!cli.quiet)
        .check()?;

    let faces = dscgan_datasets::yaleb(&cli.data)?;
    info!(
        "loaded {} images of {} subjects from {}",
        faces.nsamples(),
        faces.n_classes(),
        cli.data.display()
    );

    let report = experiment.run(&faces)?;
    print!("{}", report);
    Ok(())
}

fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{}", err);
        process::exit(1);
    }
}
