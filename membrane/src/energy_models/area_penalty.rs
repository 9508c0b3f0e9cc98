//! Penalty on the relative change of individual face areas.

use crate::energy::*;
use crate::geometry::*;
use crate::layout::*;
use crate::Error;

/// Area preservation penalty `w Σ_f (A_f - A0_f)² / A0_f` over all faces.
///
/// The accompanying gradient is `w Σ_f 2 d_f (A_f - A0_f) / A0_f` per vertex, where `d_f` is the
/// oriented direction from `area_gradient_direction`. Since `|d_f|` is twice the face area
/// gradient, this is exactly twice the derivative of the energy.
pub struct AreaPenalty<'a, M: ?Sized> {
    mesh: &'a M,
    vertex_faces: &'a [Vec<usize>],
    rest_areas: &'a [f64],
    weight: f64,
}

impl<'a, M: MeshGeometryProvider + ?Sized> AreaPenalty<'a, M> {
    pub fn new(
        mesh: &'a M,
        vertex_faces: &'a [Vec<usize>],
        rest_areas: &'a [f64],
        weight: f64,
    ) -> Self {
        debug_assert_eq!(mesh.triangles().len(), rest_areas.len());
        AreaPenalty {
            mesh,
            vertex_faces,
            rest_areas,
            weight,
        }
    }

    fn num_vertices(&self) -> usize {
        self.vertex_faces.len()
    }

    /// Relative area change `(A_f - A0_f) / A0_f` of every face.
    fn relative_area_change(&self, pos: &[[f64; 3]]) -> Vec<f64> {
        self.mesh
            .face_areas_at(pos)
            .iter()
            .zip(self.rest_areas.iter())
            .map(|(&a, &a0)| (a - a0) / a0)
            .collect()
    }
}

impl<M: MeshGeometryProvider + ?Sized> Energy for AreaPenalty<'_, M> {
    fn energy(&self, x: &[f64]) -> Result<f64, Error> {
        let pos = unflatten_positions(x, self.num_vertices())?;
        let sum: f64 = self
            .relative_area_change(&pos)
            .iter()
            .zip(self.rest_areas.iter())
            .map(|(&rel, &a0)| rel * rel * a0)
            .sum();
        Ok(self.weight * sum)
    }
}

impl<M: MeshGeometryProvider + ?Sized> EnergyGradient for AreaPenalty<'_, M> {
    fn add_energy_gradient(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Error> {
        let n = self.num_vertices();
        let pos = unflatten_positions(x, n)?;
        check_len(grad, n)?;

        let triangles = self.mesh.triangles();
        let normals = self.mesh.face_normals_at(&pos)?;
        let rel = self.relative_area_change(&pos);

        for (vtx, faces) in self.vertex_faces.iter().enumerate() {
            let mut g = na::Vector3::zeros();
            for &f in faces.iter() {
                if let Some(opp) = opposite_verts(&triangles[f], vtx) {
                    let dir = area_gradient_direction(&pos, &normals[f], vtx, opp);
                    g += dir * (2.0 * rel[f]);
                }
            }
            add_to_vertex(grad, n, vtx, (g * self.weight).into());
        }
        Ok(())
    }
}
