//! A pressure force acting along the discrete mean curvature normals.

use crate::energy::*;
use crate::layout::*;
use crate::matrix::*;
use crate::Error;

/// Force `p · rownormalize(M₀⁻¹ L X)` where `X` is the `V×3` matrix of vertex positions.
///
/// Each vertex is pushed by `p` along the unit direction of its curvature vector. There is no
/// energy associated with this force.
pub struct PressureForce<'a> {
    curvature: &'a SparseMatrix,
    pressure: f64,
    tolerance: f64,
}

impl<'a> PressureForce<'a> {
    pub fn new(curvature: &'a SparseMatrix, pressure: f64, tolerance: f64) -> Self {
        PressureForce {
            curvature,
            pressure,
            tolerance,
        }
    }

    fn num_vertices(&self) -> usize {
        self.curvature.rows()
    }

    /// Curvature vectors `M₀⁻¹ L X` stored in the same column-major layout as `x`.
    pub fn curvature_vectors(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        let n = self.num_vertices();
        check_len(x, n)?;
        let mut out = vec![0.0; 3 * n];
        if n == 0 {
            return Ok(out);
        }
        // Coordinate columns are contiguous in the state vector.
        for (col, out_col) in x.chunks_exact(n).zip(out.chunks_exact_mut(n)) {
            self.curvature.add_mul_vec(col, out_col);
        }
        Ok(out)
    }
}

impl ExternalForce for PressureForce<'_> {
    fn add_force(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Error> {
        let n = self.num_vertices();
        check_len(x, n)?;
        check_len(grad, n)?;
        if self.pressure == 0.0 {
            return Ok(());
        }

        let k = self.curvature_vectors(x)?;
        let norms: Vec<f64> = (0..n)
            .map(|vtx| {
                (0..3)
                    .map(|c| k[dof_index(n, vtx, c)].powi(2))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect();

        let flat: Vec<usize> = norms
            .iter()
            .enumerate()
            .filter(|&(_, &norm)| !(norm > self.tolerance))
            .map(|(vtx, _)| vtx)
            .collect();
        if !flat.is_empty() {
            return Err(Error::ZeroCurvature { vertices: flat });
        }

        for (vtx, &norm) in norms.iter().enumerate() {
            for c in 0..3 {
                let i = dof_index(n, vtx, c);
                grad[i] += self.pressure * k[i] / norm;
            }
        }
        Ok(())
    }
}
