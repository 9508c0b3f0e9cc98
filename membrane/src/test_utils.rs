use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};

use crate::TriMesh;

/*
 * Setup code
 */

/// A single right triangle with unit legs in the `xy` plane.
pub fn make_right_triangle_mesh() -> TriMesh {
    let verts = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    TriMesh::new(verts, vec![[0, 1, 2]])
}

/// A regular tetrahedron centered at the origin.
pub fn make_tetrahedron_mesh() -> TriMesh {
    let verts = vec![
        [1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
    ];
    let indices = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
    TriMesh::new(verts, indices)
}

/// An icosahedron inscribed in the unit sphere.
pub fn make_icosahedron_mesh() -> TriMesh {
    let t = 0.5 * (1.0 + 5.0_f64.sqrt());
    let verts: Vec<[f64; 3]> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .iter()
    .map(|&[x, y, z]| {
        let n = (x * x + y * y + z * z).sqrt();
        [x / n, y / n, z / n]
    })
    .collect();

    let indices = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];
    TriMesh::new(verts, indices)
}

/// A planar `n × n` grid of unit squares in the `xy` plane, each split into two triangles of
/// equal area.
pub fn make_grid_mesh(n: usize) -> TriMesh {
    let mut verts = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            verts.push([i as f64, j as f64, 0.0]);
        }
    }

    let idx = |i: usize, j: usize| j * (n + 1) + i;
    let mut indices = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            indices.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            indices.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }
    TriMesh::new(verts, indices)
}

/// Uniformly distributed values in `[-scale, scale)` generated from a fixed seed.
pub fn random_displacement(n: usize, scale: f64, seed: u8) -> Vec<f64> {
    let mut rng = StdRng::from_seed([seed; 32]);
    let range = Uniform::new(-scale, scale);
    (0..n).map(|_| rng.sample(range)).collect()
}

/// Offset the given state vector by a seeded random displacement.
pub fn perturbed(x: &[f64], scale: f64, seed: u8) -> Vec<f64> {
    x.iter()
        .zip(random_displacement(x.len(), scale, seed))
        .map(|(&x, dx)| x + dx)
        .collect()
}
