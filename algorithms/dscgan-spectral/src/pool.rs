use dscgan::Float;
use log::debug;
use ndarray::{ArrayView2, ArrayViewMut2, ShapeError};

/// Reusable scratch memory for the matrix decompositions of the post-processing
///
/// The affinity construction symmetrizes an `n x n` coefficient matrix before decomposing it.
/// Repeated clustering of the same problem size, as done throughout training, reuses a single
/// buffer instead of allocating a fresh matrix each time. The buffer only ever grows.
#[derive(Clone, Debug, Default)]
pub struct DecompositionPool<F> {
    buffer: Vec<F>,
    acquisitions: usize,
    releases: usize,
}

impl<F: Float> DecompositionPool<F> {
    pub fn new() -> Self {
        DecompositionPool {
            buffer: Vec::new(),
            acquisitions: 0,
            releases: 0,
        }
    }

    /// Create a pool which can serve a `n x n` matrix without growing
    pub fn with_dimension(n: usize) -> Self {
        DecompositionPool {
            buffer: vec![F::zero(); n * n],
            acquisitions: 0,
            releases: 0,
        }
    }

    /// Borrow a zeroed `(rows, cols)` matrix from the pool
    ///
    /// The matrix is handed back when the returned guard is dropped.
    pub fn acquire(&mut self, rows: usize, cols: usize) -> Result<PooledMatrix<'_, F>, ShapeError> {
        let len = rows * cols;
        if self.buffer.len() < len {
            debug!(
                "growing decomposition pool from {} to {} elements",
                self.buffer.len(),
                len
            );
            self.buffer.resize(len, F::zero());
        }

        let DecompositionPool {
            buffer,
            acquisitions,
            releases,
        } = self;

        let slice = &mut buffer[..len];
        slice.iter_mut().for_each(|x| *x = F::zero());
        let matrix = ArrayViewMut2::from_shape((rows, cols), slice)?;
        *acquisitions += 1;

        Ok(PooledMatrix { matrix, releases })
    }

    /// Number of elements the pool can hand out without growing
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of matrices handed out so far
    pub fn acquisitions(&self) -> usize {
        self.acquisitions
    }

    /// Number of matrices handed back so far
    pub fn releases(&self) -> usize {
        self.releases
    }
}

/// A matrix borrowed from a [`DecompositionPool`]
#[derive(Debug)]
pub struct PooledMatrix<'a, F> {
    matrix: ArrayViewMut2<'a, F>,
    releases: &'a mut usize,
}

impl<'a, F> PooledMatrix<'a, F> {
    pub fn view(&self) -> ArrayView2<'_, F> {
        self.matrix.view()
    }

    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, F> {
        self.matrix.view_mut()
    }
}

impl<'a, F> Drop for PooledMatrix<'a, F> {
    fn drop(&mut self) {
        *self.releases += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn reuses_buffer() {
        let mut pool = DecompositionPool::<f64>::new();
        {
            let mut matrix = pool.acquire(4, 4).unwrap();
            matrix.view_mut().fill(2.0);
        }
        assert_eq!(pool.capacity(), 16);

        {
            let matrix = pool.acquire(3, 3).unwrap();
            // handed out zeroed even though the previous user left data behind
            assert_eq!(matrix.view(), Array2::<f64>::zeros((3, 3)));
        }
        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.acquisitions(), 2);
        assert_eq!(pool.releases(), 2);
    }

    #[test]
    fn grows_on_demand() {
        let mut pool = DecompositionPool::<f32>::with_dimension(2);
        assert_eq!(pool.capacity(), 4);

        let matrix = pool.acquire(5, 2).unwrap();
        assert_eq!(matrix.view().dim(), (5, 2));
        drop(matrix);

        assert_eq!(pool.capacity(), 10);
    }
}
