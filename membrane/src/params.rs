use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Edge weights used to assemble the mesh Laplacian.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaplacianKind {
    /// Cotangent weights `½(cot α + cot β)` of the two angles opposite each edge.
    Cotangent,
    /// Unit weight for every edge (combinatorial graph Laplacian).
    Uniform,
}

impl Default for LaplacianKind {
    fn default() -> Self {
        LaplacianKind::Cotangent
    }
}

/// What the Hessian evaluator does when a secant pair cannot be used for an update.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SingularUpdatePolicy {
    /// Report `Error::SingularSecantUpdate` and leave the trajectory untouched.
    Fail,
    /// Keep the previous approximation but record the new position and gradient.
    Skip,
}

impl Default for SingularUpdatePolicy {
    fn default() -> Self {
        SingularUpdatePolicy::Fail
    }
}

/// Parameters of the energy model.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Weight of the relative face area penalty. Must be positive.
    pub penalty: f64,
    /// Magnitude of the pressure force applied along the curvature normals.
    pub pressure: f64,
    /// Step size used by the finite difference fallback. The analytic evaluators ignore it.
    pub fd_step: f64,
    /// Edge weights of the Laplacian used by the bending and curvature operators.
    pub laplacian: LaplacianKind,
    /// Weight of the penalty on the total surface area. Zero disables the term.
    pub global_area_penalty: f64,
    /// Curvature vectors with norm at or below this value have no defined direction.
    pub curvature_tolerance: f64,
    /// Relative threshold below which a secant denominator is considered zero.
    pub secant_tolerance: f64,
    pub singular_update: SingularUpdatePolicy,
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            penalty: 1.0,
            pressure: 0.0,
            fd_step: 1e-8,
            laplacian: LaplacianKind::default(),
            global_area_penalty: 0.0,
            curvature_tolerance: 1e-12,
            secant_tolerance: 1e-12,
            singular_update: SingularUpdatePolicy::default(),
        }
    }
}

impl ModelParams {
    pub fn new(penalty: f64, pressure: f64) -> Self {
        ModelParams {
            penalty,
            pressure,
            ..Default::default()
        }
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }
    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }
    pub fn with_fd_step(mut self, fd_step: f64) -> Self {
        self.fd_step = fd_step;
        self
    }
    pub fn with_laplacian(mut self, laplacian: LaplacianKind) -> Self {
        self.laplacian = laplacian;
        self
    }
    pub fn with_global_area_penalty(mut self, weight: f64) -> Self {
        self.global_area_penalty = weight;
        self
    }
    pub fn with_singular_update(mut self, policy: SingularUpdatePolicy) -> Self {
        self.singular_update = policy;
        self
    }

    /// Check that all parameters are usable.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |name: &str| {
            Err(Error::InvalidParameter {
                name: name.to_string(),
            })
        };
        if !(self.penalty.is_finite() && self.penalty > 0.0) {
            return invalid("penalty");
        }
        if !self.pressure.is_finite() {
            return invalid("pressure");
        }
        if !(self.fd_step.is_finite() && self.fd_step > 0.0) {
            return invalid("fd_step");
        }
        if !(self.global_area_penalty.is_finite() && self.global_area_penalty >= 0.0) {
            return invalid("global_area_penalty");
        }
        if !(self.curvature_tolerance >= 0.0) {
            return invalid("curvature_tolerance");
        }
        if !(self.secant_tolerance >= 0.0) {
            return invalid("secant_tolerance");
        }
        Ok(())
    }

    /// Parse parameters from a RON string. Missing fields take their default values.
    pub fn from_ron_str(s: &str) -> Result<Self, Error> {
        ron::from_str(s).map_err(|e| Error::ParamsFormat {
            message: e.to_string(),
        })
    }

    /// Loads the parameters from the given path interpreted as a RON file.
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, Error> {
        let s = std::fs::read_to_string(path)?;
        Self::from_ron_str(&s)
    }

    /// Saves these parameters to the given path interpreted as a RON file.
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let s = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new()).map_err(|e| {
            Error::ParamsFormat {
                message: e.to_string(),
            }
        })?;
        std::fs::write(path, s)?;
        Ok(())
    }
}
