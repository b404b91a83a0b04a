//! Provide the trait shared by all fittable algorithms
//!

/// Fittable algorithms
///
/// A fittable algorithm takes a set of records and creates an object, for example the cluster
/// assignment of a coefficient matrix. Hyperparameters are checked before fitting, the error
/// type therefore has to absorb the core error type as well.
pub trait Fit<R, E: std::error::Error + From<crate::error::Error>> {
    type Object;

    fn fit(&self, records: R) -> Result<Self::Object, E>;
}
