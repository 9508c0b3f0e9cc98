use approx::*;

use membrane::layout::dof_index;
use membrane::matrix::{to_dense, LinearOperator};
use membrane::*;
pub use test_utils::*;

mod test_utils;

/// A flat equal-area mesh at rest has no area change, so only bending contributes.
#[test]
fn planar_grid_at_rest() {
    let mesh = make_grid_mesh(4);
    let model = model(&mesh, ModelParams::new(3.0, 0.0));
    let x = model.rest_x().to_vec();
    assert_eq!(model.penalty_energy(&x).unwrap(), 0.0);
    assert!(model.gradient_penalty(&x).unwrap().iter().all(|&g| g == 0.0));
    assert_eq!(
        model.objective(&x).unwrap(),
        model.bending_energy(&x).unwrap()
    );
    let grad = model.gradient(&x).unwrap();
    let bending = model.gradient_bending(&x).unwrap();
    assert_eq!(grad, bending);
}

#[test]
fn bending_energy_is_quadratic_form() {
    for laplacian in [LaplacianKind::Cotangent, LaplacianKind::Uniform] {
        let mesh = make_icosahedron_mesh();
        let model = model(&mesh, ModelParams::default().with_laplacian(laplacian));
        let h = to_dense(model.hessian_bending());
        for seed in 1..4 {
            let x = perturbed(model.rest_x(), 0.2, seed);
            let xv = na::DVector::from_column_slice(&x);
            let expected = 0.5 * xv.dot(&(&h * &xv));
            assert_relative_eq!(
                model.bending_energy(&x).unwrap(),
                expected,
                max_relative = 1e-10
            );

            let grad = model.gradient_bending(&x).unwrap();
            let fd = central_difference_gradient(&x, 1e-6, |x| model.bending_energy(x)).unwrap();
            for (a, b) in grad.iter().zip(fd.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-4, max_relative = 1e-4);
            }
        }
    }
}

#[test]
fn single_triangle_penalty() {
    let mesh = make_right_triangle_mesh();
    let model = model(&mesh, ModelParams::new(2.0, 0.0));
    let mut x = model.rest_x().to_vec();
    x[dof_index(3, 2, 1)] = 2.0;
    assert_relative_eq!(model.penalty_energy(&x).unwrap(), 1.0, max_relative = 1e-12);
    let grad = model.gradient_penalty(&x).unwrap();
    assert_relative_eq!(grad[dof_index(3, 2, 1)], 4.0, max_relative = 1e-12);
    assert_relative_eq!(grad[dof_index(3, 2, 0)], 0.0, epsilon = 1e-12);
    assert_relative_eq!(grad[dof_index(3, 2, 2)], 0.0, epsilon = 1e-12);
}

#[test]
fn force_is_linear_in_pressure() {
    let mesh = make_icosahedron_mesh();
    let x = perturbed(&layout::flatten_positions(&mesh.rest_positions()), 0.05, 11);
    let f1 = model(&mesh, ModelParams::new(1.0, 1.0)).force(&x).unwrap();
    let f2 = model(&mesh, ModelParams::new(1.0, 2.5)).force(&x).unwrap();
    let f0 = model(&mesh, ModelParams::new(1.0, 0.0)).force(&x).unwrap();
    for i in 0..x.len() {
        assert_relative_eq!(f2[i], 2.5 * f1[i], epsilon = 1e-12);
        assert_eq!(f0[i], 0.0);
    }
}

/// The force enters the gradient without a matching energy.
#[test]
fn gradient_is_not_objective_derivative_under_pressure() {
    let mesh = make_icosahedron_mesh();
    let with = model(&mesh, ModelParams::new(1.0, 1.0));
    let without = model(&mesh, ModelParams::new(1.0, 0.0));
    let x = perturbed(with.rest_x(), 0.05, 12);
    assert_eq!(with.objective(&x).unwrap(), without.objective(&x).unwrap());
    let g1 = with.gradient(&x).unwrap();
    let g0 = without.gradient(&x).unwrap();
    let force = with.force(&x).unwrap();
    for i in 0..x.len() {
        assert_relative_eq!(g1[i] - g0[i], force[i], epsilon = 1e-12);
    }
}

#[test]
fn zero_curvature_is_reported() {
    let mesh = make_grid_mesh(2);
    let model = model(&mesh, ModelParams::new(1.0, 1.0));
    let x = model.rest_x().to_vec();
    assert!(matches!(
        model.force(&x),
        Err(Error::ZeroCurvature { .. })
    ));
    assert!(matches!(
        model.gradient(&x),
        Err(Error::ZeroCurvature { .. })
    ));
    // The objective does not depend on the force.
    assert!(model.objective(&x).is_ok());
}

#[test]
fn wrong_length_is_rejected() {
    let mesh = make_tetrahedron_mesh();
    let model = model(&mesh, ModelParams::new(1.0, 0.5));
    let mut state = model.new_trajectory();
    let x = vec![0.0; 11];
    let is_mismatch = |r: Result<(), Error>| {
        matches!(
            r,
            Err(Error::SizeMismatch {
                expected: 12,
                actual: 11
            })
        )
    };
    assert!(is_mismatch(model.objective(&x).map(|_| ())));
    assert!(is_mismatch(model.gradient(&x).map(|_| ())));
    assert!(is_mismatch(model.force(&x).map(|_| ())));
    assert!(is_mismatch(model.bending_energy(&x).map(|_| ())));
    assert!(is_mismatch(model.hessian(&x, &mut state).map(|_| ())));
    assert!(!state.is_seeded());
}

#[test]
fn bending_operator_is_block_diagonal() {
    let mesh = make_tetrahedron_mesh();
    let model = model(&mesh, ModelParams::default());
    let ops = model.operators();
    let n = 4;
    let mut e = vec![0.0; 3 * n];
    e[dof_index(n, 1, 0)] = 1.0;
    let col = model.hessian_bending().mul_vec(&e);
    let block_col = ops.bending_block.mul_vec(&e[..n]);
    assert_eq!(&col[..n], &block_col[..]);
    assert!(col[n..].iter().all(|&v| v == 0.0));
}
