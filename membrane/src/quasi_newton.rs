//! Secant (BFGS style) approximation of the Hessian of the non-quadratic terms.
//!
//! The approximation is accumulated along the sequence of points at which an optimizer queries
//! the Hessian, so it lives in an explicit state value owned by the caller.

use na::DVector;

use crate::matrix::{outer, DenseMatrix};
use crate::params::SingularUpdatePolicy;
use crate::Error;

/// Quasi-Newton state carried between Hessian evaluations along one optimizer trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct OptimizerTrajectoryState {
    prev_gradient: DVector<f64>,
    prev_x: DVector<f64>,
    approximation: DenseMatrix,
    /// Set once a position and gradient have been recorded.
    seeded: bool,
    num_updates: usize,
}

impl OptimizerTrajectoryState {
    /// A fresh state for `size` degrees of freedom: zero previous gradient and position and an
    /// identity approximation.
    pub fn new(size: usize) -> Self {
        OptimizerTrajectoryState {
            prev_gradient: DVector::zeros(size),
            prev_x: DVector::zeros(size),
            approximation: DenseMatrix::identity(size, size),
            seeded: false,
            num_updates: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.prev_x.len()
    }

    /// Whether a position and gradient have been recorded yet.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Number of secant updates applied to the approximation.
    pub fn num_updates(&self) -> usize {
        self.num_updates
    }

    pub fn prev_gradient(&self) -> &[f64] {
        self.prev_gradient.as_slice()
    }

    pub fn prev_x(&self) -> &[f64] {
        self.prev_x.as_slice()
    }

    /// Current Hessian approximation.
    pub fn approximation(&self) -> &DenseMatrix {
        &self.approximation
    }

    /// Forget the trajectory.
    pub fn reset(&mut self) {
        *self = Self::new(self.size());
    }

    /// Advance the trajectory to `x` with gradient `grad` and return the new approximation.
    ///
    /// The first call on a fresh state only records `x` and `grad`. If the secant pair is
    /// degenerate, `policy` decides between failing with the state untouched and recording the
    /// new point while keeping the previous approximation.
    pub fn update(
        &mut self,
        x: &[f64],
        grad: &[f64],
        tolerance: f64,
        policy: SingularUpdatePolicy,
    ) -> Result<&DenseMatrix, Error> {
        for len in [x.len(), grad.len()] {
            if len != self.size() {
                return Err(Error::SizeMismatch {
                    expected: self.size(),
                    actual: len,
                });
            }
        }

        let x = DVector::from_column_slice(x);
        let grad = DVector::from_column_slice(grad);

        if !self.seeded {
            log::debug!("Seeding quasi-Newton trajectory");
            self.record(x, grad);
            return Ok(&self.approximation);
        }

        let s = &x - &self.prev_x;
        let y = &grad - &self.prev_gradient;
        match secant_update(&self.approximation, &s, &y, tolerance) {
            Ok(h) => {
                self.approximation = h;
                self.num_updates += 1;
                log::trace!("Applied secant update #{}", self.num_updates);
            }
            Err(err) if policy == SingularUpdatePolicy::Skip => {
                log::warn!("Skipping secant update: {}", err);
            }
            Err(err) => return Err(err),
        }
        self.record(x, grad);
        Ok(&self.approximation)
    }

    fn record(&mut self, x: DVector<f64>, grad: DVector<f64>) {
        self.prev_x = x;
        self.prev_gradient = grad;
        self.seeded = true;
    }
}

/// Rank-two secant update `H + y yᵗ/(yᵗs) - (Hs)(Hs)ᵗ/(sᵗHs)`.
///
/// The result is symmetric whenever `h` is and maps `s` to `y`. A denominator that is small
/// relative to the norms of its factors makes the update undefined.
pub fn secant_update(
    h: &DenseMatrix,
    s: &DVector<f64>,
    y: &DVector<f64>,
    tolerance: f64,
) -> Result<DenseMatrix, Error> {
    let hs = h * s;
    let curvature = y.dot(s);
    let projected = s.dot(&hs);

    if !(curvature.abs() > tolerance * y.norm() * s.norm())
        || !(projected.abs() > tolerance * s.norm() * hs.norm())
    {
        return Err(Error::SingularSecantUpdate {
            curvature,
            projected,
        });
    }

    Ok(h + outer(y, y) / curvature - outer(&hs, &hs) / projected)
}
