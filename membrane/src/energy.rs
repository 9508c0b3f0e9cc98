/*!
 * Interfaces implemented by the terms of the energy model. Each term acts on the same flat,
 * column-major vector of vertex positions `x` (see `crate::layout`).
 *
 * Every method is fallible because a term may find that `x` has the wrong length or describes a
 * configuration where the term is undefined (e.g. a collapsed triangle).
 */

use crate::matrix::MatrixElementTriplet;
use crate::Error;

/// Energy trait. This trait provides the energy value that contributes to the objective function
/// of an optimization algorithm.
pub trait Energy {
    /// Compute the energy of the configuration `x`.
    fn energy(&self, x: &[f64]) -> Result<f64, Error>;
}

/// The energy gradient is required for optimization methods that use first order derivative
/// information.
pub trait EnergyGradient {
    /// Compute the change in energy with respect to change in configuration and add it to the
    /// given slice of global gradient values.
    fn add_energy_gradient(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Error>;
}

/// A force that is applied directly to the gradient without a corresponding energy.
pub trait ExternalForce {
    /// Add the force evaluated at `x` to the given slice of global gradient values.
    fn add_force(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Error>;
}

/// Energies with an analytic Hessian.
pub trait EnergyHessian {
    /// The number of non-zeros in the Hessian matrix of the energy.
    fn energy_hessian_size(&self) -> usize;

    /// Compute the Hessian matrix triplets at `x` scaled by `scale`.
    ///
    /// `triplets` must have exactly `energy_hessian_size()` entries.
    fn energy_hessian(
        &self,
        x: &[f64],
        scale: f64,
        triplets: &mut [MatrixElementTriplet<f64>],
    ) -> Result<(), Error>;
}

/// Forward difference approximation of the gradient of `f` at `x`.
pub fn finite_difference_gradient<F>(x: &[f64], step: f64, mut f: F) -> Result<Vec<f64>, Error>
where
    F: FnMut(&[f64]) -> Result<f64, Error>,
{
    let f0 = f(x)?;
    let mut x1 = x.to_vec();
    let mut grad = vec![0.0; x.len()];
    for i in 0..x.len() {
        x1[i] = x[i] + step;
        grad[i] = (f(&x1)? - f0) / step;
        x1[i] = x[i];
    }
    Ok(grad)
}

/// Central difference approximation of the gradient of `f` at `x`.
pub fn central_difference_gradient<F>(x: &[f64], step: f64, mut f: F) -> Result<Vec<f64>, Error>
where
    F: FnMut(&[f64]) -> Result<f64, Error>,
{
    let mut x1 = x.to_vec();
    let mut grad = vec![0.0; x.len()];
    for i in 0..x.len() {
        x1[i] = x[i] + step;
        let fp = f(&x1)?;
        x1[i] = x[i] - step;
        let fm = f(&x1)?;
        grad[i] = (fp - fm) / (2.0 * step);
        x1[i] = x[i];
    }
    Ok(grad)
}
