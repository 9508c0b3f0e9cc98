//! Evaluators for a membrane shape optimization problem.
//!
//! The energy model combines a linearized bending energy with a relative face-area penalty and
//! injects a pressure-like surface force into the gradient. The model supplies objective,
//! gradient and (quasi-Newton) Hessian evaluators to be consumed by an external optimizer.
//!
//! All evaluators take the vertex positions as a single flat vector `x` of length `3·V`, laid out
//! column-major: all `x` coordinates first, then all `y`, then all `z` (see [`layout`]).

mod energy;
pub mod energy_models;
pub mod geometry;
pub mod layout;
pub mod matrix;
pub mod model;
pub mod operators;
pub mod params;
pub mod quasi_newton;

// Mesh fixtures are shared with integration tests and benchmarks so they are always compiled in.
pub mod test_utils;

pub type TriMesh = geo::mesh::TriMesh<f64>;

pub use self::energy::*;
pub use self::geometry::MeshGeometryProvider;
pub use self::model::{EnergyComponents, EnergyModel};
pub use self::params::{LaplacianKind, ModelParams, SingularUpdatePolicy};
pub use self::quasi_newton::OptimizerTrajectoryState;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Size mismatch error: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("Invalid parameter: {name:?}")]
    InvalidParameter { name: String },
    #[error("Face {face} references a vertex outside of the mesh")]
    InvalidTopology { face: usize },
    #[error("Degenerate reference element detected: {:?}", .degens[0])]
    DegenerateReferenceElement { degens: Vec<usize> },
    #[error("Vertices not referenced by any face: {vertices:?}")]
    IsolatedVertices { vertices: Vec<usize> },
    #[error("Degenerate element in the deformed configuration: {:?}", .faces[0])]
    DegenerateElement { faces: Vec<usize> },
    #[error("Zero curvature normal at vertex {:?}", .vertices[0])]
    ZeroCurvature { vertices: Vec<usize> },
    #[error("Singular secant update (y's = {curvature:e}, s'Hs = {projected:e})")]
    SingularSecantUpdate { curvature: f64, projected: f64 },
    #[error("Parameter file I/O error")]
    ParamsIO {
        #[from]
        source: std::io::Error,
    },
    #[error("Parameter file format error: {message}")]
    ParamsFormat { message: String },
}

pub(crate) fn inf_norm<I>(iter: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    iter.into_iter()
        .map(|x| x.abs())
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Less))
        .unwrap_or(0.0)
}
