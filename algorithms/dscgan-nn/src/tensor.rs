//! Backend selection and conversions between `ndarray` arrays and tensors
use crate::errors::{NnError, Result};

use burn::backend::ndarray::{FloatNdArrayElement, NdArray};
use burn::backend::Autodiff;
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use dscgan::Float;
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};

/// Element types the network can be trained with
pub trait NetFloat: Float + FloatNdArrayElement {}

impl NetFloat for f32 {}

impl NetFloat for f64 {}

/// CPU tensors with reverse-mode automatic differentiation
pub type NetBackend<F> = Autodiff<NdArray<F>>;

/// Copy an array of rank `N` into a tensor on `device`
pub(crate) fn to_tensor<B, F, S, D, const N: usize>(x: &ArrayBase<S, D>, device: &B::Device) -> Tensor<B, N>
where
    B: Backend,
    F: NetFloat,
    S: Data<Elem = F>,
    D: Dimension,
{
    let values = x.iter().copied().collect::<Vec<F>>();
    Tensor::from_data(TensorData::new(values, x.shape().to_vec()), device)
}

/// Copy a tensor back into an array of dynamic rank
pub(crate) fn to_array<B: Backend, F: NetFloat, const N: usize>(x: Tensor<B, N>) -> Result<ArrayD<F>> {
    let dims = x.dims();
    let values = x
        .into_data()
        .convert::<F>()
        .to_vec::<F>()
        .map_err(|err| NnError::Tensor(format!("{:?}", err)))?;

    Ok(ArrayD::from_shape_vec(IxDyn(&dims), values)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Ix2};

    type Cpu = NdArray<f64>;

    #[test]
    fn arrays_survive_the_backend() {
        let device = Default::default();
        let x = array![[1., 2., 3.], [4., 5., 6.]];

        let tensor: Tensor<Cpu, 2> = to_tensor(&x, &device);
        assert_eq!(tensor.dims(), [2, 3]);

        let back = to_array::<_, f64, 2>(tensor).unwrap().into_dimensionality::<Ix2>().unwrap();
        assert_eq!(back, x);
    }

    #[test]
    fn transposed_views_are_copied_in_logical_order() {
        let device = Default::default();
        let x = array![[1., 2.], [3., 4.]];

        let tensor: Tensor<Cpu, 2> = to_tensor(&x.t(), &device);
        let back = to_array::<_, f64, 2>(tensor).unwrap();
        assert_eq!(back, array![[1., 3.], [2., 4.]].into_dyn());
    }
}
