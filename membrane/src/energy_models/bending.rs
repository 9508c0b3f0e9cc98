use crate::energy::*;
use crate::layout::check_len;
use crate::matrix::*;
use crate::Error;

/// Quadratic bending energy `½ xᵗ H x` for the constant block diagonal operator
/// `H = diag(Lᵗ M₀⁻¹ L, Lᵗ M₀⁻¹ L, Lᵗ M₀⁻¹ L)`.
pub struct BendingEnergy<'a> {
    hessian: &'a SparseMatrix,
    num_vertices: usize,
}

impl<'a> BendingEnergy<'a> {
    pub fn new(hessian: &'a SparseMatrix) -> Self {
        debug_assert_eq!(hessian.rows() % 3, 0);
        BendingEnergy {
            hessian,
            num_vertices: hessian.rows() / 3,
        }
    }

    /// The constant Hessian of this energy.
    pub fn hessian(&self) -> &'a SparseMatrix {
        self.hessian
    }
}

impl Energy for BendingEnergy<'_> {
    fn energy(&self, x: &[f64]) -> Result<f64, Error> {
        check_len(x, self.num_vertices)?;
        Ok(0.5 * inner(x, &self.hessian.mul_vec(x)))
    }
}

impl EnergyGradient for BendingEnergy<'_> {
    fn add_energy_gradient(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Error> {
        check_len(x, self.num_vertices)?;
        check_len(grad, self.num_vertices)?;
        self.hessian.add_mul_vec(x, grad);
        Ok(())
    }
}

impl EnergyHessian for BendingEnergy<'_> {
    fn energy_hessian_size(&self) -> usize {
        self.hessian.nnz()
    }

    fn energy_hessian(
        &self,
        x: &[f64],
        scale: f64,
        triplets: &mut [MatrixElementTriplet<f64>],
    ) -> Result<(), Error> {
        check_len(x, self.num_vertices)?;
        if triplets.len() != self.energy_hessian_size() {
            return Err(Error::SizeMismatch {
                expected: self.energy_hessian_size(),
                actual: triplets.len(),
            });
        }
        for (out, (&val, (row, col))) in triplets.iter_mut().zip(self.hessian.iter()) {
            *out = MatrixElementTriplet::new(row, col, scale * val);
        }
        Ok(())
    }
}
