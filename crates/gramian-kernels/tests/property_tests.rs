//! Property-based tests for kernel evaluation
//!
//! These check the invariants that must hold for arbitrary inputs: outputs
//! stay within the Matérn family's range, the identical-inputs path yields
//! an exactly-unit diagonal, and composition agrees with elementwise
//! arithmetic.

use gramian_kernels::{additive, Kernel, MaternCovariance, MaternKernel};
use ndarray::{ArrayD, IxDyn};
use proptest::prelude::*;

fn points(n: usize, d: usize, data: Vec<f64>) -> ArrayD<f64> {
    ArrayD::from_shape_vec(IxDyn(&[n, d]), data).unwrap()
}

fn matern_with_raw(nu: f64, raw: f64) -> MaternKernel {
    let mut kernel = MaternKernel::new(nu).unwrap();
    kernel.base_mut().raw_lengthscale_mut().unwrap().fill(raw);
    kernel
}

proptest! {
    // Covariances are positive, bounded by 1, and finite everywhere
    #[test]
    fn prop_covariance_in_unit_interval(
        data in prop::collection::vec(-5.0..5.0f64, 12),
        raw in -1.0..1.0f64,
        nu_index in 0usize..3
    ) {
        let nu = [0.5, 1.5, 2.5][nu_index];
        let x = points(4, 3, data);
        let kernel = matern_with_raw(nu, raw);
        let gram = kernel.invoke(&x, None, None).unwrap().evaluate().unwrap();
        for &v in gram.iter() {
            prop_assert!(v.is_finite());
            prop_assert!(v > 0.0 && v <= 1.0, "covariance {v} outside (0, 1]");
        }
    }

    // Self-covariance is exactly 1 and the matrix is symmetric on the
    // identical path
    #[test]
    fn prop_identical_inputs_unit_diagonal(
        data in prop::collection::vec(-5.0..5.0f64, 10),
        raw in -1.0..1.0f64,
        nu_index in 0usize..3
    ) {
        let nu = [0.5, 1.5, 2.5][nu_index];
        let x = points(5, 2, data);
        let kernel = matern_with_raw(nu, raw);
        let gram = kernel.invoke(&x, None, None).unwrap().evaluate().unwrap();
        for i in 0..5 {
            prop_assert_eq!(gram[[i, i]], 1.0);
            for j in 0..5 {
                prop_assert!((gram[[i, j]] - gram[[j, i]]).abs() < 1e-12);
            }
        }
    }

    // Additive composition is elementwise addition
    #[test]
    fn prop_additive_matches_sum(
        data1 in prop::collection::vec(-3.0..3.0f64, 8),
        data2 in prop::collection::vec(-3.0..3.0f64, 6),
        raw_a in -0.5..0.5f64,
        raw_b in -0.5..0.5f64
    ) {
        let x1 = points(4, 2, data1);
        let x2 = points(3, 2, data2);
        let sum = additive(vec![
            Box::new(matern_with_raw(0.5, raw_a)) as Box<dyn Kernel>,
            Box::new(matern_with_raw(2.5, raw_b)) as Box<dyn Kernel>,
        ])
        .unwrap();
        let composed = sum.invoke(&x1, Some(&x2), None).unwrap().evaluate().unwrap();
        let a = matern_with_raw(0.5, raw_a).evaluate(&x1, &x2).unwrap();
        let b = matern_with_raw(2.5, raw_b).evaluate(&x1, &x2).unwrap();
        for ((c, a), b) in composed.iter().zip(a.iter()).zip(b.iter()) {
            prop_assert!((c - (a + b)).abs() < 1e-12);
        }
    }

    // The operator's forward agrees with the scalar closed form per entry
    #[test]
    fn prop_forward_matches_scalar_formula(
        data1 in prop::collection::vec(-3.0..3.0f64, 6),
        data2 in prop::collection::vec(-3.0..3.0f64, 4),
        lengthscale in 0.3..2.0f64,
        nu_index in 0usize..3
    ) {
        let nu = [0.5, 1.5, 2.5][nu_index];
        let x1 = points(3, 2, data1);
        let x2 = points(2, 2, data2);
        let ls = ArrayD::from_elem(IxDyn(&[1, 1, 1]), lengthscale);
        let op = MaternCovariance::new(nu).unwrap();
        let (gram, _) = op.forward(&x1, &x2, &ls).unwrap();
        for i in 0..3 {
            for j in 0..2 {
                let dx = x1[[i, 0]] - x2[[j, 0]];
                let dy = x1[[i, 1]] - x2[[j, 1]];
                let s = (2.0 * nu).sqrt() * (dx * dx + dy * dy).sqrt() / lengthscale;
                let e = (-s).exp();
                let expected = if nu == 0.5 {
                    e
                } else if nu == 1.5 {
                    e * (1.0 + s)
                } else {
                    e * (1.0 + s + s * s / 3.0)
                };
                prop_assert!(
                    (gram[[i, j]] - expected).abs() < 1e-8,
                    "entry ({i}, {j}): {} vs {expected}",
                    gram[[i, j]]
                );
            }
        }
    }
}
