//! Constant operators assembled once from the rest configuration.

use na::Vector3;

use crate::geometry::triangle_area;
use crate::layout::flatten_positions;
use crate::matrix::*;
use crate::params::LaplacianKind;
use crate::Error;

/// Operators that depend only on the rest shape of the mesh.
#[derive(Clone, Debug)]
pub struct RestOperators {
    /// Diagonal of the lumped mass matrix `M₀`.
    pub mass: Vec<f64>,
    /// Symmetric positive semi-definite Laplacian `L`.
    pub laplacian: SparseMatrix,
    /// Curvature operator `M₀⁻¹ L`.
    pub curvature: SparseMatrix,
    /// Bending block `Lᵗ M₀⁻¹ L` acting on a single coordinate.
    pub bending_block: SparseMatrix,
    /// Block diagonal bending Hessian `diag(Hb, Hb, Hb)` acting on the full state vector.
    pub bending: SparseMatrix,
    /// Face areas of the rest configuration.
    pub rest_areas: Vec<f64>,
    /// Flattened rest positions.
    pub rest_x: Vec<f64>,
}

impl RestOperators {
    /// Assemble all operators, validating the rest mesh on the way.
    pub fn new(
        pos: &[[f64; 3]],
        triangles: &[[usize; 3]],
        kind: LaplacianKind,
    ) -> Result<Self, Error> {
        let num_verts = pos.len();
        check_topology(num_verts, triangles)?;
        let rest_areas = compute_rest_areas(pos, triangles)?;
        let mass = lumped_mass(num_verts, triangles, &rest_areas)?;
        let mass_inv: Vec<f64> = mass.iter().map(|&m| 1.0 / m).collect();

        let laplacian = match kind {
            LaplacianKind::Cotangent => cotangent_laplacian(pos, triangles),
            LaplacianKind::Uniform => uniform_laplacian(num_verts, triangles),
        };
        let curvature = scale_rows(&laplacian, &mass_inv);
        let bending_block = weighted_gram(&laplacian, &mass_inv);
        let bending = block_diag3(&bending_block);

        log::debug!(
            "Assembled rest operators for {} vertices and {} faces ({} bending non-zeros)",
            num_verts,
            triangles.len(),
            bending.nnz()
        );

        Ok(RestOperators {
            mass,
            laplacian,
            curvature,
            bending_block,
            bending,
            rest_areas,
            rest_x: flatten_positions(pos),
        })
    }
}

fn check_topology(num_verts: usize, triangles: &[[usize; 3]]) -> Result<(), Error> {
    match triangles
        .iter()
        .position(|tri| tri.iter().any(|&v| v >= num_verts))
    {
        Some(face) => Err(Error::InvalidTopology { face }),
        None => Ok(()),
    }
}

/// Rest face areas, all of which must be strictly positive.
pub fn compute_rest_areas(pos: &[[f64; 3]], triangles: &[[usize; 3]]) -> Result<Vec<f64>, Error> {
    let areas: Vec<f64> = triangles
        .iter()
        .map(|tri| triangle_area(tri, pos))
        .collect();
    let degens: Vec<usize> = areas
        .iter()
        .enumerate()
        .filter(|&(_, &a)| !(a > 0.0 && a.is_finite()))
        .map(|(i, _)| i)
        .collect();
    if degens.is_empty() {
        Ok(areas)
    } else {
        Err(Error::DegenerateReferenceElement { degens })
    }
}

/// Barycentric lumped mass: each face gives a third of its area to each of its vertices.
pub fn lumped_mass(
    num_verts: usize,
    triangles: &[[usize; 3]],
    areas: &[f64],
) -> Result<Vec<f64>, Error> {
    let mut mass = vec![0.0; num_verts];
    for (tri, &area) in triangles.iter().zip(areas.iter()) {
        for &vtx in tri.iter() {
            mass[vtx] += area / 3.0;
        }
    }
    let isolated: Vec<usize> = mass
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m <= 0.0)
        .map(|(i, _)| i)
        .collect();
    if isolated.is_empty() {
        Ok(mass)
    } else {
        Err(Error::IsolatedVertices { vertices: isolated })
    }
}

/// Push the four entries of a weighted edge `(a, b)` into a list of Laplacian triplets.
fn push_edge(triplets: &mut Vec<MatrixElementTriplet<f64>>, a: usize, b: usize, w: f64) {
    triplets.push(MatrixElementTriplet::new(a, a, w));
    triplets.push(MatrixElementTriplet::new(b, b, w));
    triplets.push(MatrixElementTriplet::new(a, b, -w));
    triplets.push(MatrixElementTriplet::new(b, a, -w));
}

/// Cotangent of the angle at `c` in the triangle `(a, b, c)`.
#[inline]
fn cotangent([a, b, c]: [[f64; 3]; 3]) -> f64 {
    let c = Vector3::from(c);
    let u = Vector3::from(a) - c;
    let v = Vector3::from(b) - c;
    u.dot(&v) / u.cross(&v).norm()
}

/// Cotangent Laplacian with `L[a,b] = -½(cot α + cot β)` for the angles opposite edge `(a, b)`.
///
/// Expects non-degenerate triangles.
pub fn cotangent_laplacian(pos: &[[f64; 3]], triangles: &[[usize; 3]]) -> SparseMatrix {
    let mut triplets = Vec::with_capacity(12 * triangles.len());
    for tri in triangles.iter() {
        for i in 0..3 {
            let [a, b, c] = [tri[(i + 1) % 3], tri[(i + 2) % 3], tri[i]];
            let w = 0.5 * cotangent([pos[a], pos[b], pos[c]]);
            push_edge(&mut triplets, a, b, w);
        }
    }
    csr_from_triplets(pos.len(), triplets)
}

/// Combinatorial graph Laplacian: unit weight for every unique mesh edge.
pub fn uniform_laplacian(num_verts: usize, triangles: &[[usize; 3]]) -> SparseMatrix {
    let mut edges: Vec<[usize; 2]> = triangles
        .iter()
        .flat_map(|tri| {
            (0..3).map(move |i| {
                let (a, b) = (tri[i], tri[(i + 1) % 3]);
                [a.min(b), a.max(b)]
            })
        })
        .collect();
    edges.sort_unstable();
    edges.dedup();

    let mut triplets = Vec::with_capacity(4 * edges.len());
    for [a, b] in edges {
        push_edge(&mut triplets, a, b, 1.0);
    }
    csr_from_triplets(num_verts, triplets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::MeshGeometryProvider;
    use approx::*;

    fn operators(mesh: &crate::TriMesh, kind: LaplacianKind) -> RestOperators {
        RestOperators::new(&mesh.rest_positions(), mesh.triangles(), kind).unwrap()
    }

    #[test]
    fn laplacian_rows_sum_to_zero() {
        for kind in [LaplacianKind::Cotangent, LaplacianKind::Uniform] {
            let ops = operators(&make_icosahedron_mesh(), kind);
            let ones = vec![1.0; ops.laplacian.rows()];
            for val in ops.laplacian.mul_vec(&ones) {
                assert_relative_eq!(val, 0.0, epsilon = 1e-12);
            }
            let dense = to_dense(&ops.laplacian);
            assert_relative_eq!(dense, dense.transpose(), epsilon = 1e-14);
        }
    }

    #[test]
    fn uniform_laplacian_degrees() {
        let ops = operators(&make_icosahedron_mesh(), LaplacianKind::Uniform);
        let dense = to_dense(&ops.laplacian);
        for i in 0..12 {
            assert_eq!(dense[(i, i)], 5.0);
        }
    }

    /// On an equilateral triangle every angle is 60 degrees.
    #[test]
    fn cotangent_weights_of_equilateral_triangle() {
        let pos = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.75_f64.sqrt(), 0.0]];
        let l = to_dense(&cotangent_laplacian(&pos, &[[0, 1, 2]]));
        let w = 0.5 / 3.0_f64.sqrt();
        assert_relative_eq!(l[(0, 1)], -w, max_relative = 1e-12);
        assert_relative_eq!(l[(0, 0)], 2.0 * w, max_relative = 1e-12);
    }

    #[test]
    fn lumped_mass_preserves_area() {
        let mesh = make_grid_mesh(3);
        let ops = operators(&mesh, LaplacianKind::Cotangent);
        let total: f64 = ops.mass.iter().sum();
        assert_relative_eq!(total, 9.0, max_relative = 1e-12);
        assert_relative_eq!(ops.rest_areas.iter().sum::<f64>(), 9.0, max_relative = 1e-12);
    }

    #[test]
    fn bending_block_is_symmetric_and_annihilates_constants() {
        let ops = operators(&make_icosahedron_mesh(), LaplacianKind::Cotangent);
        let hb = to_dense(&ops.bending_block);
        assert_relative_eq!(hb, hb.transpose(), epsilon = 1e-12);
        for val in ops.bending.mul_vec(&vec![1.0; 36]) {
            assert_relative_eq!(val, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn degenerate_rest_faces() {
        let pos = vec![[0.0; 3], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let triangles = [[0, 1, 3], [0, 1, 2]];
        match RestOperators::new(&pos, &triangles, LaplacianKind::Cotangent) {
            Err(Error::DegenerateReferenceElement { degens }) => assert_eq!(degens, vec![1]),
            other => panic!("expected a degenerate element, got {:?}", other),
        }
    }

    #[test]
    fn isolated_vertices() {
        let pos = vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]];
        match RestOperators::new(&pos, &[[0, 1, 2]], LaplacianKind::Uniform) {
            Err(Error::IsolatedVertices { vertices }) => assert_eq!(vertices, vec![3]),
            other => panic!("expected isolated vertices, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_face() {
        let pos = vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert!(matches!(
            RestOperators::new(&pos, &[[0, 1, 2], [0, 2, 3]], LaplacianKind::Uniform),
            Err(Error::InvalidTopology { face: 1 })
        ));
    }
}
