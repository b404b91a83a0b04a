//! Sinks for the scalars reported during training
use dscgan::Float;
use dscgan_nn::StepSummary;
use log::debug;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Receives named scalars together with the step they belong to
pub trait SummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Record the losses, and the critic score if present, of one autoencoder update
    fn add_step<F: Float>(&mut self, summary: &StepSummary<F>) -> io::Result<()>
    where
        Self: Sized,
    {
        let losses = &summary.losses;
        self.add_scalar("loss_recon", losses.reconstruction.to_f64().unwrap_or(f64::NAN), summary.step)?;
        self.add_scalar("loss_sparsity", losses.sparsity.to_f64().unwrap_or(f64::NAN), summary.step)?;
        self.add_scalar(
            "loss_selfexpress",
            losses.self_expression.to_f64().unwrap_or(f64::NAN),
            summary.step,
        )?;
        if let Some(score) = summary.score {
            self.add_scalar("score_disc", score.to_f64().unwrap_or(f64::NAN), summary.step)?;
        }
        Ok(())
    }
}

/// Emits every scalar as a `debug` log record
#[derive(Clone, Debug, Default)]
pub struct LogWriter;

impl SummaryWriter for LogWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        debug!("step {:>6} {:<18} {:.8}", step, tag, value);
        Ok(())
    }
}

/// Appends `step<TAB>tag<TAB>value` lines to `scalars.tsv` in a log directory
#[derive(Debug)]
pub struct TsvWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl TsvWriter {
    /// Create the directory `logs_dir` if necessary and truncate its scalar file
    pub fn create<P: AsRef<Path>>(logs_dir: P) -> io::Result<Self> {
        fs::create_dir_all(&logs_dir)?;
        let path = logs_dir.as_ref().join("scalars.tsv");
        let out = BufWriter::new(File::create(&path)?);

        Ok(TsvWriter { path, out })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SummaryWriter for TsvWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        writeln!(self.out, "{}\t{}\t{}", step, tag, value)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Keeps all scalars in memory
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryWriter {
    pub scalars: Vec<(String, f64, usize)>,
}

impl MemoryWriter {
    /// Values recorded under `tag`, in the order they were written
    pub fn values(&self, tag: &str) -> Vec<f64> {
        self.scalars
            .iter()
            .filter(|(t, _, _)| t == tag)
            .map(|(_, v, _)| *v)
            .collect()
    }
}

impl SummaryWriter for MemoryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        self.scalars.push((tag.to_string(), value, step));
        Ok(())
    }
}

impl<W: SummaryWriter> SummaryWriter for &mut W {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> io::Result<()> {
        (**self).add_scalar(tag, value, step)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}
