//! Mesh queries needed by the energy model.
//!
//! The energy model never touches mesh storage directly. It asks a `MeshGeometryProvider` for the
//! topology and rest positions, and uses the provided geometric queries to evaluate areas and
//! normals on arbitrary vertex positions.

use geo::mesh::topology::NumVertices;
use geo::mesh::VertexPositions;
use geo::ops::Area;
use geo::prim::Triangle;
use na::Vector3;

use crate::{Error, TriMesh};

/// Capability interface for a triangle mesh.
pub trait MeshGeometryProvider {
    /// Number of vertices in the mesh.
    fn vertex_count(&self) -> usize;
    /// Triangles given as triplets of vertex indices.
    fn triangles(&self) -> &[[usize; 3]];
    /// Vertex positions of the undeformed (rest) configuration.
    fn rest_positions(&self) -> Vec<[f64; 3]>;

    /// Area of every face evaluated at the given positions.
    fn face_areas_at(&self, pos: &[[f64; 3]]) -> Vec<f64> {
        self.triangles()
            .iter()
            .map(|tri| triangle_area(tri, pos))
            .collect()
    }

    /// Unit normal of every face evaluated at the given positions.
    ///
    /// Faces with zero area have no normal and are reported all at once.
    fn face_normals_at(&self, pos: &[[f64; 3]]) -> Result<Vec<Vector3<f64>>, Error> {
        let mut degens = Vec::new();
        let normals = self
            .triangles()
            .iter()
            .enumerate()
            .map(|(fidx, tri)| {
                triangle_unit_normal(tri, pos).unwrap_or_else(|| {
                    degens.push(fidx);
                    Vector3::zeros()
                })
            })
            .collect();
        if degens.is_empty() {
            Ok(normals)
        } else {
            Err(Error::DegenerateElement { faces: degens })
        }
    }

    /// For each vertex, the list of faces containing it in increasing order.
    fn vertex_to_faces(&self) -> Vec<Vec<usize>> {
        vertex_face_adjacency(self.vertex_count(), self.triangles())
    }
}

impl MeshGeometryProvider for TriMesh {
    fn vertex_count(&self) -> usize {
        self.num_vertices()
    }
    fn triangles(&self) -> &[[usize; 3]] {
        self.faces()
    }
    fn rest_positions(&self) -> Vec<[f64; 3]> {
        self.vertex_positions().to_vec()
    }
}

/// Area of the triangle `tri` with vertices taken from `pos`.
#[inline]
pub fn triangle_area(tri: &[usize; 3], pos: &[[f64; 3]]) -> f64 {
    Triangle::from_indexed_slice(tri, pos).area()
}

/// Unit normal of the triangle `tri` or `None` if the triangle is degenerate.
#[inline]
pub fn triangle_unit_normal(tri: &[usize; 3], pos: &[[f64; 3]]) -> Option<Vector3<f64>> {
    let an: [f64; 3] = Triangle::from_indexed_slice(tri, pos).area_normal().into();
    let an = Vector3::from(an);
    let n = an.norm();
    if n > 0.0 {
        Some(an / n)
    } else {
        None
    }
}

/// Build the vertex to face adjacency from a list of triangles.
pub fn vertex_face_adjacency(num_vertices: usize, triangles: &[[usize; 3]]) -> Vec<Vec<usize>> {
    let mut adj = vec![Vec::new(); num_vertices];
    for (fidx, tri) in triangles.iter().enumerate() {
        for &vtx in tri.iter() {
            adj[vtx].push(fidx);
        }
    }
    adj
}

/// The two vertices of `tri` that follow `vtx` in cyclic order.
///
/// Returns `None` if `vtx` is not a vertex of `tri`.
#[inline]
pub fn opposite_verts(tri: &[usize; 3], vtx: usize) -> Option<[usize; 2]> {
    let i = tri.iter().position(|&v| v == vtx)?;
    Some([tri[(i + 1) % 3], tri[(i + 2) % 3]])
}

/// Direction in which moving `vtx` increases the area of its face.
///
/// This is `n × e` for the unit face normal `n` and the opposite edge `e = p_a - p_b`, flipped if
/// needed so that it points from the opposite edge towards `vtx`. Its norm is the length of the
/// opposite edge, which makes it twice the gradient of the face area with respect to `vtx`.
#[inline]
pub fn area_gradient_direction(
    pos: &[[f64; 3]],
    normal: &Vector3<f64>,
    vtx: usize,
    [a, b]: [usize; 2],
) -> Vector3<f64> {
    let pa = Vector3::from(pos[a]);
    let edge = pa - Vector3::from(pos[b]);
    let dir = normal.cross(&edge);
    if dir.dot(&(Vector3::from(pos[vtx]) - pa)) < 0.0 {
        -dir
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use approx::*;

    #[test]
    fn single_triangle_queries() {
        let mesh = make_right_triangle_mesh();
        let pos = mesh.rest_positions();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangles(), vec![[0, 1, 2]]);
        assert_relative_eq!(mesh.face_areas_at(&pos)[0], 0.5);
        let n = mesh.face_normals_at(&pos).unwrap()[0];
        assert_relative_eq!(n, Vector3::new(0.0, 0.0, 1.0));
    }

    /// Areas and normals agree with `½ (p1 - p0) × (p2 - p0)` on a skewed triangle in 3D.
    #[test]
    fn triangle_queries_match_cross_product() {
        let pos = vec![[0.3, -0.2, 1.0], [1.5, 0.4, 0.2], [-0.7, 2.0, 0.9]];
        let tri = [0, 1, 2];
        let [p0, p1, p2] = [pos[0], pos[1], pos[2]].map(Vector3::from);
        let an = (p1 - p0).cross(&(p2 - p0));
        assert_relative_eq!(triangle_area(&tri, &pos), 0.5 * an.norm(), max_relative = 1e-12);
        let n = triangle_unit_normal(&tri, &pos).unwrap();
        assert_relative_eq!(n, an.normalize(), max_relative = 1e-12);

        // Reversing the winding flips the normal but not the area.
        let rev = [0, 2, 1];
        assert_relative_eq!(triangle_area(&rev, &pos), triangle_area(&tri, &pos));
        assert_relative_eq!(triangle_unit_normal(&rev, &pos).unwrap(), -n, max_relative = 1e-12);
    }

    #[test]
    fn collapsed_face_has_no_normal() {
        let mesh = make_right_triangle_mesh();
        let pos = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert_eq!(mesh.face_areas_at(&pos)[0], 0.0);
        match mesh.face_normals_at(&pos) {
            Err(Error::DegenerateElement { faces }) => assert_eq!(faces, vec![0]),
            other => panic!("expected a degenerate element, got {:?}", other),
        }
    }

    #[test]
    fn triangles_borrow_mesh_faces() {
        let mesh = make_icosahedron_mesh();
        assert_eq!(mesh.triangles().len(), 20);
        assert!(std::ptr::eq(mesh.triangles(), mesh.faces()));
    }

    #[test]
    fn adjacency() {
        let mesh = make_tetrahedron_mesh();
        let adj = mesh.vertex_to_faces();
        assert_eq!(adj.len(), 4);
        assert!(adj.iter().all(|faces| faces.len() == 3));
        for (vtx, faces) in adj.iter().enumerate() {
            for &f in faces {
                assert!(mesh.triangles()[f].contains(&vtx));
            }
        }
    }

    #[test]
    fn opposite_vertices_follow_cyclic_order() {
        assert_eq!(opposite_verts(&[4, 7, 9], 4), Some([7, 9]));
        assert_eq!(opposite_verts(&[4, 7, 9], 7), Some([9, 4]));
        assert_eq!(opposite_verts(&[4, 7, 9], 9), Some([4, 7]));
        assert_eq!(opposite_verts(&[4, 7, 9], 1), None);
    }

    /// The oriented direction does not depend on which opposite vertex comes first and has the
    /// length of the opposite edge.
    #[test]
    fn area_gradient_points_away_from_opposite_edge() {
        let pos = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let n = Vector3::new(0.0, 0.0, 1.0);
        let d0 = area_gradient_direction(&pos, &n, 2, [0, 1]);
        let d1 = area_gradient_direction(&pos, &n, 2, [1, 0]);
        assert_relative_eq!(d0, Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(d0, d1);

        // Also consistent with a flipped normal.
        let d2 = area_gradient_direction(&pos, &(-n), 2, [0, 1]);
        assert_relative_eq!(d0, d2);
    }
}
