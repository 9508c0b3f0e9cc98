//! A thin linear algebra layer.
//!
//! Constant operators are stored as `sprs` sparse matrices, while the quasi-Newton Hessian
//! approximation is a dense `nalgebra` matrix. Energies only rely on the `LinearOperator` trait
//! for products so either representation can back an operator.

use na::{DMatrix, DVector};
use sprs::{CsMat, TriMat};

pub type SparseMatrix = CsMat<f64>;
pub type DenseMatrix = DMatrix<f64>;

/// Position of a single entry in a matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MatrixElementIndex {
    pub row: usize,
    pub col: usize,
}

/// A single matrix entry together with its position.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatrixElementTriplet<T> {
    pub idx: MatrixElementIndex,
    pub val: T,
}

impl<T> MatrixElementTriplet<T> {
    pub fn new(row: usize, col: usize, val: T) -> Self {
        MatrixElementTriplet {
            idx: MatrixElementIndex { row, col },
            val,
        }
    }
}

/// Anything that can be applied to a vector.
pub trait LinearOperator {
    fn num_rows(&self) -> usize;
    fn num_cols(&self) -> usize;
    /// Compute `out += self * x`.
    fn add_mul_vec(&self, x: &[f64], out: &mut [f64]);

    /// Compute `self * x` into a new vector.
    fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.num_rows()];
        self.add_mul_vec(x, &mut out);
        out
    }
}

impl LinearOperator for SparseMatrix {
    fn num_rows(&self) -> usize {
        self.rows()
    }
    fn num_cols(&self) -> usize {
        self.cols()
    }
    fn add_mul_vec(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.cols());
        debug_assert_eq!(out.len(), self.rows());
        for (&val, (row, col)) in self.iter() {
            out[row] += val * x[col];
        }
    }
}

impl LinearOperator for DenseMatrix {
    fn num_rows(&self) -> usize {
        self.nrows()
    }
    fn num_cols(&self) -> usize {
        self.ncols()
    }
    fn add_mul_vec(&self, x: &[f64], out: &mut [f64]) {
        debug_assert_eq!(x.len(), self.ncols());
        debug_assert_eq!(out.len(), self.nrows());
        let prod = self * DVector::from_column_slice(x);
        for (o, p) in out.iter_mut().zip(prod.iter()) {
            *o += *p;
        }
    }
}

/// Euclidean inner product.
#[inline]
pub fn inner(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(a, b)| a * b).sum()
}

/// Dense outer product `a bᵗ`.
pub fn outer(a: &DVector<f64>, b: &DVector<f64>) -> DenseMatrix {
    a * b.transpose()
}

/// Build a square CSR matrix from triplets. Duplicate entries are summed.
pub fn csr_from_triplets(
    size: usize,
    triplets: impl IntoIterator<Item = MatrixElementTriplet<f64>>,
) -> SparseMatrix {
    let mut tri = TriMat::new((size, size));
    for MatrixElementTriplet {
        idx: MatrixElementIndex { row, col },
        val,
    } in triplets
    {
        tri.add_triplet(row, col, val);
    }
    tri.to_csr()
}

/// Compute `Aᵗ diag(d) A` for a square matrix `A`.
///
/// Each row `j` of `A` contributes the outer product of that row with itself scaled by `d[j]`.
pub fn weighted_gram(a: &SparseMatrix, d: &[f64]) -> SparseMatrix {
    debug_assert_eq!(a.rows(), d.len());
    let mut triplets = Vec::new();
    for (j, row) in a.outer_iterator().enumerate() {
        for (i, &a_ji) in row.iter() {
            for (k, &a_jk) in row.iter() {
                triplets.push(MatrixElementTriplet::new(i, k, a_ji * d[j] * a_jk));
            }
        }
    }
    csr_from_triplets(a.cols(), triplets)
}

/// Scale row `i` of `a` by `d[i]`.
pub fn scale_rows(a: &SparseMatrix, d: &[f64]) -> SparseMatrix {
    debug_assert_eq!(a.rows(), d.len());
    csr_from_triplets(
        a.rows(),
        a.iter()
            .map(|(&val, (row, col))| MatrixElementTriplet::new(row, col, d[row] * val)),
    )
}

/// Produce the block diagonal matrix `diag(a, a, a)`.
pub fn block_diag3(a: &SparseMatrix) -> SparseMatrix {
    let n = a.rows();
    csr_from_triplets(
        3 * n,
        (0..3).flat_map(|b| {
            a.iter().map(move |(&val, (row, col))| {
                MatrixElementTriplet::new(b * n + row, b * n + col, val)
            })
        }),
    )
}

/// Convert a sparse matrix into a dense one.
pub fn to_dense(a: &SparseMatrix) -> DenseMatrix {
    let mut out = DenseMatrix::zeros(a.rows(), a.cols());
    for (&val, (row, col)) in a.iter() {
        out[(row, col)] += val;
    }
    out
}
