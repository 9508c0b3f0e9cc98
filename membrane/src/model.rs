//! The combined energy model consumed by an external optimizer.

use std::fmt;

use crate::energy::*;
use crate::energy_models::*;
use crate::geometry::MeshGeometryProvider;
use crate::inf_norm;
use crate::layout::check_len;
use crate::matrix::*;
use crate::operators::RestOperators;
use crate::params::ModelParams;
use crate::quasi_newton::OptimizerTrajectoryState;
use crate::{Error, TriMesh};

/// Energy values of the individual terms of the objective.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct EnergyComponents {
    pub bending: f64,
    pub penalty: f64,
    pub global_area: f64,
}

impl EnergyComponents {
    pub fn total(&self) -> f64 {
        self.bending + self.penalty + self.global_area
    }
}

impl fmt::Display for EnergyComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bending = {:e}, penalty = {:e}, global area = {:e}, total = {:e}",
            self.bending,
            self.penalty,
            self.global_area,
            self.total()
        )
    }
}

/// Bending and area penalty energy model on a fixed triangle mesh.
///
/// The objective is `½ xᵗ H x + E_pen(x)` (plus the optional global area penalty). The gradient
/// additionally carries the pressure force, which has no energy, so it is not the derivative of
/// the objective.
pub struct EnergyModel<'a, M: ?Sized = TriMesh> {
    mesh: &'a M,
    params: ModelParams,
    operators: RestOperators,
    vertex_faces: Vec<Vec<usize>>,
}

impl<'a, M: MeshGeometryProvider + ?Sized> EnergyModel<'a, M> {
    /// Validate the parameters and rest mesh and assemble all constant operators.
    pub fn new(mesh: &'a M, params: ModelParams) -> Result<Self, Error> {
        params.validate()?;
        let operators =
            RestOperators::new(&mesh.rest_positions(), mesh.triangles(), params.laplacian)?;
        let vertex_faces = mesh.vertex_to_faces();

        log::debug!(
            "Built energy model with penalty = {}, pressure = {}, {:?} Laplacian",
            params.penalty,
            params.pressure,
            params.laplacian
        );

        Ok(EnergyModel {
            mesh,
            params,
            operators,
            vertex_faces,
        })
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn operators(&self) -> &RestOperators {
        &self.operators
    }

    pub fn num_vertices(&self) -> usize {
        self.operators.mass.len()
    }

    /// Length of the state vector `x`.
    pub fn num_dofs(&self) -> usize {
        3 * self.num_vertices()
    }

    /// Flattened rest positions.
    pub fn rest_x(&self) -> &[f64] {
        &self.operators.rest_x
    }

    /// A fresh quasi-Newton state for this model.
    pub fn new_trajectory(&self) -> OptimizerTrajectoryState {
        OptimizerTrajectoryState::new(self.num_dofs())
    }

    /*
     * Individual terms
     */

    fn bending_term(&self) -> BendingEnergy<'_> {
        BendingEnergy::new(&self.operators.bending)
    }

    fn penalty_term(&self) -> AreaPenalty<'_, M> {
        AreaPenalty::new(
            self.mesh,
            &self.vertex_faces,
            &self.operators.rest_areas,
            self.params.penalty,
        )
    }

    /// The global area penalty, if enabled.
    fn global_area_term(&self) -> Option<GlobalAreaPenalty<'_, M>> {
        if self.params.global_area_penalty > 0.0 {
            Some(GlobalAreaPenalty::new(
                self.mesh,
                &self.vertex_faces,
                &self.operators.rest_areas,
                self.params.global_area_penalty,
            ))
        } else {
            None
        }
    }

    fn pressure_term(&self) -> PressureForce<'_> {
        PressureForce::new(
            &self.operators.curvature,
            self.params.pressure,
            self.params.curvature_tolerance,
        )
    }

    /// `½ xᵗ H x`.
    pub fn bending_energy(&self, x: &[f64]) -> Result<f64, Error> {
        self.bending_term().energy(x)
    }

    /// Relative face area penalty.
    pub fn penalty_energy(&self, x: &[f64]) -> Result<f64, Error> {
        self.penalty_term().energy(x)
    }

    /// Total area penalty. Zero when disabled.
    pub fn global_area_energy(&self, x: &[f64]) -> Result<f64, Error> {
        match self.global_area_term() {
            Some(term) => term.energy(x),
            None => check_len(x, self.num_vertices()).map(|_| 0.0),
        }
    }

    pub fn energy_components(&self, x: &[f64]) -> Result<EnergyComponents, Error> {
        Ok(EnergyComponents {
            bending: self.bending_energy(x)?,
            penalty: self.penalty_energy(x)?,
            global_area: self.global_area_energy(x)?,
        })
    }

    /// The objective `E_bend + E_pen (+ E_global)`.
    pub fn objective(&self, x: &[f64]) -> Result<f64, Error> {
        let components = self.energy_components(x)?;
        log::trace!("Objective: {}", components);
        Ok(components.total())
    }

    /// `H x`.
    pub fn gradient_bending(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        let mut grad = vec![0.0; self.num_dofs()];
        self.bending_term().add_energy_gradient(x, &mut grad)?;
        Ok(grad)
    }

    /// Gradient of the face area penalty.
    pub fn gradient_penalty(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        let mut grad = vec![0.0; self.num_dofs()];
        self.penalty_term().add_energy_gradient(x, &mut grad)?;
        Ok(grad)
    }

    /// Gradient of the total area penalty. Zero when disabled.
    pub fn gradient_global_area(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        let mut grad = vec![0.0; self.num_dofs()];
        match self.global_area_term() {
            Some(term) => term.add_energy_gradient(x, &mut grad)?,
            None => check_len(x, self.num_vertices())?,
        }
        Ok(grad)
    }

    /// Pressure force along the unit curvature normals.
    pub fn force(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        let mut force = vec![0.0; self.num_dofs()];
        self.pressure_term().add_force(x, &mut force)?;
        Ok(force)
    }

    /// The gradient of everything except the bending energy, which is what the secant
    /// approximation tracks.
    fn nonquadratic_gradient(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        let mut grad = self.gradient_penalty(x)?;
        if let Some(term) = self.global_area_term() {
            term.add_energy_gradient(x, &mut grad)?;
        }
        self.pressure_term().add_force(x, &mut grad)?;
        Ok(grad)
    }

    /// `H x + ∇E_pen (+ ∇E_global) + force`.
    pub fn gradient(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        let bending = self.gradient_bending(x)?;
        let penalty = self.gradient_penalty(x)?;
        let global_area = self.gradient_global_area(x)?;
        let force = self.force(x)?;

        log::debug!(
            "Gradient norms: bending = {:e}, penalty = {:e}, global area = {:e}, force = {:e}",
            inf_norm(bending.iter().cloned()),
            inf_norm(penalty.iter().cloned()),
            inf_norm(global_area.iter().cloned()),
            inf_norm(force.iter().cloned())
        );

        Ok(bending
            .iter()
            .zip(penalty.iter())
            .zip(global_area.iter())
            .zip(force.iter())
            .map(|(((b, p), g), f)| b + p + g + f)
            .collect())
    }

    /// The constant bending Hessian `H`.
    pub fn hessian_bending(&self) -> &SparseMatrix {
        self.bending_term().hessian()
    }

    /// `H` plus the secant approximation of the remaining terms, advancing `state` to `x`.
    ///
    /// The result depends on every previous call made with the same `state`.
    pub fn hessian(
        &self,
        x: &[f64],
        state: &mut OptimizerTrajectoryState,
    ) -> Result<DenseMatrix, Error> {
        check_len(x, self.num_vertices())?;

        let bending = self.bending_term();
        let mut triplets =
            vec![MatrixElementTriplet::new(0, 0, 0.0); bending.energy_hessian_size()];
        bending.energy_hessian(x, 1.0, &mut triplets)?;

        let grad = self.nonquadratic_gradient(x)?;
        let mut hess = state
            .update(
                x,
                &grad,
                self.params.secant_tolerance,
                self.params.singular_update,
            )?
            .clone();

        for MatrixElementTriplet { idx, val } in triplets {
            hess[(idx.row, idx.col)] += val;
        }
        Ok(hess)
    }

    /// Forward difference gradient of `f` at `x` using the configured step.
    pub fn finite_difference_gradient<F>(&self, x: &[f64], f: F) -> Result<Vec<f64>, Error>
    where
        F: FnMut(&[f64]) -> Result<f64, Error>,
    {
        check_len(x, self.num_vertices())?;
        finite_difference_gradient(x, self.params.fd_step, f)
    }

    /// Forward difference approximation of the exact derivative of the area penalties.
    pub fn penalty_gradient_fd(&self, x: &[f64]) -> Result<Vec<f64>, Error> {
        self.finite_difference_gradient(x, |x| {
            Ok(self.penalty_energy(x)? + self.global_area_energy(x)?)
        })
    }
}

impl<M: MeshGeometryProvider + ?Sized> Energy for EnergyModel<'_, M> {
    fn energy(&self, x: &[f64]) -> Result<f64, Error> {
        self.objective(x)
    }
}

impl<M: MeshGeometryProvider + ?Sized> EnergyGradient for EnergyModel<'_, M> {
    fn add_energy_gradient(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Error> {
        check_len(grad, self.num_vertices())?;
        for (out, g) in grad.iter_mut().zip(self.gradient(x)?) {
            *out += g;
        }
        Ok(())
    }
}
