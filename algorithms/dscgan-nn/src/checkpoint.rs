//! Persistence of the autoencoder weights as `.npz` archives
//!
//! Every encoder layer `i` is stored as `enc_w{i}` with shape `(filters, channels, k, k)` and
//! `enc_b{i}`, every decoder layer `i` (counted from the latent side) as `dec_w{i}` with shape
//! `(channels, filters, k, k)` and `dec_b{i}`. The coefficient matrix and the critic are not
//! part of a checkpoint, they depend on the batch and are retrained for every subset.
use crate::errors::{NnError, Result};
use crate::model::DscNet;
use crate::tensor::{to_array, to_tensor, NetBackend, NetFloat};

use burn::module::Param;
use burn::tensor::Tensor;
use log::info;
use ndarray::ArrayD;
use ndarray_npy::{NpzReader, NpzWriter, ReadableElement, WritableElement};
use ndarray_rand::rand::Rng;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

impl<F: NetFloat, R: Rng + Clone> DscNet<F, R> {
    /// Copies of the encoder and decoder weights under their checkpoint names
    pub fn named_weights(&self) -> Result<Vec<(String, ArrayD<F>)>> {
        let mut weights = Vec::new();
        for (i, layer) in self.autoencoder.encoder.layers().iter().enumerate() {
            weights.push((format!("enc_w{}", i), to_array(layer.weight.val())?));
            if let Some(bias) = &layer.bias {
                weights.push((format!("enc_b{}", i), to_array(bias.val())?));
            }
        }
        for (i, layer) in self.autoencoder.decoder.layers().iter().enumerate() {
            weights.push((format!("dec_w{}", i), to_array(layer.weight.val())?));
            if let Some(bias) = &layer.bias {
                weights.push((format!("dec_b{}", i), to_array(bias.val())?));
            }
        }
        Ok(weights)
    }

    /// Write the encoder and decoder weights to `path`, returns the path written
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf>
    where
        F: WritableElement,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut npz = NpzWriter::new(File::create(path)?);
        for (name, weights) in self.named_weights()? {
            npz.add_array(name, &weights)?;
        }
        npz.finish()?;

        info!("model saved in file: {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Replace the encoder and decoder weights by the ones stored in `path`
    ///
    /// Every stored tensor has to match the shape of the current layer. Nothing is changed if
    /// reading fails. The optimizer states start over.
    pub fn restore<P: AsRef<Path>>(&mut self, path: P) -> Result<()>
    where
        F: ReadableElement,
    {
        let path = path.as_ref();
        let mut npz = NpzReader::new(File::open(path)?)?;

        let mut encoder = self.autoencoder.encoder.clone();
        for (i, layer) in encoder.layers_mut().iter_mut().enumerate() {
            layer.weight = load(&mut npz, &format!("enc_w{}", i), &layer.weight)?;
            layer.bias = match &layer.bias {
                Some(bias) => Some(load(&mut npz, &format!("enc_b{}", i), bias)?),
                None => None,
            };
        }

        let mut decoder = self.autoencoder.decoder.clone();
        for (i, layer) in decoder.layers_mut().iter_mut().enumerate() {
            layer.weight = load(&mut npz, &format!("dec_w{}", i), &layer.weight)?;
            layer.bias = match &layer.bias {
                Some(bias) => Some(load(&mut npz, &format!("dec_b{}", i), bias)?),
                None => None,
            };
        }

        self.autoencoder.encoder = encoder;
        self.autoencoder.decoder = decoder;
        self.reset_optimizers();

        info!("model restored from {}", path.display());
        Ok(())
    }
}

/// Stored values of `name` in place of `param`, which keeps its id
fn load<F, const N: usize>(
    npz: &mut NpzReader<File>,
    name: &str,
    param: &Param<Tensor<NetBackend<F>, N>>,
) -> Result<Param<Tensor<NetBackend<F>, N>>>
where
    F: NetFloat + ReadableElement,
{
    let stored: ArrayD<F> = npz.by_name(&format!("{}.npy", name))?;
    let current = param.val();
    let expected = current.dims().to_vec();
    if stored.shape() != expected.as_slice() {
        return Err(NnError::TensorShape {
            name: name.to_string(),
            expected,
            found: stored.shape().to_vec(),
        });
    }

    let values: Tensor<NetBackend<F>, N> = to_tensor(&stored, &current.device());
    Ok(Param::initialized(param.id.clone(), values.require_grad()))
}
