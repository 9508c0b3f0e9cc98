//! Penalty on the change of the total surface area.

use crate::energy::*;
use crate::geometry::*;
use crate::layout::*;
use crate::Error;

/// Energy `w (A - A0)² / A0` on the total surface area `A`.
///
/// Unlike the per-face penalty, the gradient of this term is the exact derivative of its energy.
/// Both the energy and the gradient are normalized by the rest area `A0`. Normalizing the gradient
/// by the current area instead would make it disagree with the energy away from rest.
pub struct GlobalAreaPenalty<'a, M: ?Sized> {
    mesh: &'a M,
    vertex_faces: &'a [Vec<usize>],
    rest_area: f64,
    weight: f64,
}

impl<'a, M: MeshGeometryProvider + ?Sized> GlobalAreaPenalty<'a, M> {
    pub fn new(
        mesh: &'a M,
        vertex_faces: &'a [Vec<usize>],
        rest_areas: &[f64],
        weight: f64,
    ) -> Self {
        GlobalAreaPenalty {
            mesh,
            vertex_faces,
            rest_area: rest_areas.iter().sum(),
            weight,
        }
    }

    fn num_vertices(&self) -> usize {
        self.vertex_faces.len()
    }

    fn total_area(&self, pos: &[[f64; 3]]) -> f64 {
        self.mesh.face_areas_at(pos).iter().sum()
    }
}

impl<M: MeshGeometryProvider + ?Sized> Energy for GlobalAreaPenalty<'_, M> {
    fn energy(&self, x: &[f64]) -> Result<f64, Error> {
        let pos = unflatten_positions(x, self.num_vertices())?;
        let diff = self.total_area(&pos) - self.rest_area;
        Ok(self.weight * diff * diff / self.rest_area)
    }
}

impl<M: MeshGeometryProvider + ?Sized> EnergyGradient for GlobalAreaPenalty<'_, M> {
    fn add_energy_gradient(&self, x: &[f64], grad: &mut [f64]) -> Result<(), Error> {
        let n = self.num_vertices();
        let pos = unflatten_positions(x, n)?;
        check_len(grad, n)?;
        if self.weight == 0.0 {
            return Ok(());
        }

        let triangles = self.mesh.triangles();
        let normals = self.mesh.face_normals_at(&pos)?;
        // d_f is twice the area gradient, hence the missing factor of 2.
        let factor = self.weight * (self.total_area(&pos) - self.rest_area) / self.rest_area;

        for (vtx, faces) in self.vertex_faces.iter().enumerate() {
            let mut g = na::Vector3::zeros();
            for &f in faces.iter() {
                if let Some(opp) = opposite_verts(&triangles[f], vtx) {
                    g += area_gradient_direction(&pos, &normals[f], vtx, opp);
                }
            }
            add_to_vertex(grad, n, vtx, (g * factor).into());
        }
        Ok(())
    }
}
