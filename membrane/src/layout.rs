//! Conversion between per-vertex positions and the flat state vector.
//!
//! The state vector is the column-major flattening of the `V×3` matrix of vertex coordinates:
//!
//! ```verbatim
//! x = [x_0, x_1, …, x_{V-1}, y_0, …, y_{V-1}, z_0, …, z_{V-1}]
//! ```
//!
//! Every evaluator goes through these functions. Mixing in a row-major (interleaved) layout
//! anywhere would silently evaluate energies on a different geometry.

use crate::Error;

/// Index of coordinate `coord` (`0`, `1` or `2`) of vertex `vtx` in a state vector describing
/// `num_vertices` vertices.
#[inline]
pub fn dof_index(num_vertices: usize, vtx: usize, coord: usize) -> usize {
    debug_assert!(coord < 3);
    coord * num_vertices + vtx
}

/// Flatten vertex positions into a column-major state vector.
pub fn flatten_positions(pos: &[[f64; 3]]) -> Vec<f64> {
    let n = pos.len();
    let mut x = vec![0.0; 3 * n];
    for (vtx, p) in pos.iter().enumerate() {
        for coord in 0..3 {
            x[dof_index(n, vtx, coord)] = p[coord];
        }
    }
    x
}

/// Reconstruct vertex positions from a column-major state vector.
///
/// Fails if `x` does not hold exactly `3 * num_vertices` values.
pub fn unflatten_positions(x: &[f64], num_vertices: usize) -> Result<Vec<[f64; 3]>, Error> {
    check_len(x, num_vertices)?;
    Ok((0..num_vertices)
        .map(|vtx| {
            [
                x[dof_index(num_vertices, vtx, 0)],
                x[dof_index(num_vertices, vtx, 1)],
                x[dof_index(num_vertices, vtx, 2)],
            ]
        })
        .collect())
}

/// Add a per-vertex vector into the three column-major slots of vertex `vtx`.
#[inline]
pub fn add_to_vertex(out: &mut [f64], num_vertices: usize, vtx: usize, val: [f64; 3]) {
    for coord in 0..3 {
        out[dof_index(num_vertices, vtx, coord)] += val[coord];
    }
}

/// Check that the state vector has the length expected for `num_vertices` vertices.
#[inline]
pub fn check_len(x: &[f64], num_vertices: usize) -> Result<(), Error> {
    if x.len() != 3 * num_vertices {
        return Err(Error::SizeMismatch {
            expected: 3 * num_vertices,
            actual: x.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_major_order() {
        let pos = vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        assert_eq!(flatten_positions(&pos), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(unflatten_positions(&flatten_positions(&pos), 2).unwrap(), pos);
    }

    #[test]
    fn wrong_length() {
        let x = vec![0.0; 7];
        match unflatten_positions(&x, 2) {
            Err(Error::SizeMismatch { expected, actual }) => {
                assert_eq!(expected, 6);
                assert_eq!(actual, 7);
            }
            other => panic!("expected a size mismatch, got {:?}", other),
        }
    }

    #[test]
    fn add_to_vertex_slots() {
        let mut out = vec![0.0; 9];
        add_to_vertex(&mut out, 3, 1, [1.0, 2.0, 3.0]);
        assert_eq!(out, vec![0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 3.0, 0.0]);
    }
}
