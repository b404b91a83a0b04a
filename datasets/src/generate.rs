//! Utility functions for randomly generating image datasets

use crate::Result;
use dscgan::ImageDataset;
use ndarray::{Array, Array1, Array3, Array4, Axis};
use ndarray_rand::{
    rand::Rng,
    rand_distr::{Normal, Uniform},
    RandomExt,
};

/// Generate `n_subjects` synthetic subjects with `per_subject` images each
///
/// Every subject owns `rank` smooth basis images, random mixtures of low-frequency waves. An
/// image of the subject is a random non-negative combination of its basis plus Gaussian noise
/// with standard deviation `noise`, clamped into `[0, 1]`. Images of one subject therefore lie
/// close to a `rank`-dimensional subspace, which is what subspace clustering assumes of faces
/// under varying illumination.
pub fn toy_subjects(
    n_subjects: usize,
    per_subject: usize,
    (height, width): (usize, usize),
    rank: usize,
    noise: f32,
    rng: &mut impl Rng,
) -> Result<ImageDataset<f32>> {
    let n = n_subjects * per_subject;
    let mut records = Array4::zeros((n, 1, height, width));

    for subject in 0..n_subjects {
        let basis = smooth_basis(rank, height, width, rng);
        let weights = Array::random_using((per_subject, rank), Uniform::new(0.0f32, 1.0), rng);

        for (j, w) in weights.rows().into_iter().enumerate() {
            let total = w.sum().max(f32::EPSILON);
            let mut image = records.index_axis_mut(Axis(0), subject * per_subject + j);
            let mut image = image.index_axis_mut(Axis(0), 0);
            for (b, &weight) in basis.outer_iter().zip(w.iter()) {
                image.scaled_add(weight / total, &b);
            }
        }
    }

    if noise > 0.0 {
        if let Ok(normal) = Normal::new(0.0f32, noise) {
            records += &Array::random_using(records.raw_dim(), normal, rng);
        }
    }
    records.mapv_inplace(|v| v.max(0.0).min(1.0));

    let targets = Array1::from_shape_fn(n, |i| i / per_subject.max(1));
    Ok(ImageDataset::new(records, targets)?)
}

/// `rank` images in `[0, 1]`, each a sum of two random low-frequency waves
fn smooth_basis(rank: usize, height: usize, width: usize, rng: &mut impl Rng) -> Array3<f32> {
    let params = Array::random_using((rank, 2, 3), Uniform::new(0.0f32, 1.0), rng);

    Array3::from_shape_fn((rank, height, width), |(r, h, w)| {
        let (y, x) = (h as f32 / height as f32, w as f32 / width as f32);
        let wave = |k: usize| {
            let (fy, fx, phase) = (params[[r, k, 0]], params[[r, k, 1]], params[[r, k, 2]]);
            (std::f32::consts::TAU * (fy * 2.0 * y + fx * 2.0 * x + phase)).sin()
        };
        0.5 + 0.25 * (wave(0) + wave(1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_rand::rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn toy_subjects_layout() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let data = toy_subjects(3, 5, (12, 10), 2, 0.01, &mut rng).unwrap();

        assert_eq!(data.nsamples(), 15);
        assert_eq!(data.image_shape(), (12, 10));
        assert_eq!(data.n_classes(), 3);
        assert!(data.records().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(data.targets()[5], 1);
    }

    #[test]
    fn subjects_differ() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let data = toy_subjects(2, 4, (8, 8), 1, 0.0, &mut rng).unwrap();
        let records = data.records();

        // rank one subjects without noise repeat the same image
        assert_eq!(records.index_axis(Axis(0), 0), records.index_axis(Axis(0), 3));
        assert_ne!(records.index_axis(Axis(0), 0), records.index_axis(Axis(0), 4));
    }
}
