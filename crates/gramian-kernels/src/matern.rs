//! Matérn covariance kernel
//!
//! Kernel-capability wrapper around [`MaternCovariance`]. The shared
//! (non-ARD) lengthscale routes straight through the operator, which divides
//! distances by the scalar scale. With ARD the inputs are pre-divided
//! per-dimension and the operator runs at unit lengthscale; the
//! distance-over-scalar form has no ARD semantics of its own.

use gramian_core::{broadcast, Error, Result};
use ndarray::{ArrayD, IxDyn};

use crate::covariance::{MaternCovariance, MaternNu};
use crate::traits::{Kernel, KernelBase, KernelOptions};

pub struct MaternKernel {
    base: KernelBase,
    covariance: MaternCovariance,
}

impl MaternKernel {
    /// Matérn kernel with a shared lengthscale and default options.
    pub fn new(nu: f64) -> Result<Self> {
        Self::with_options(nu, KernelOptions::default())
    }

    pub fn with_options(nu: f64, options: KernelOptions) -> Result<Self> {
        Ok(Self {
            base: KernelBase::new(true, options)?,
            covariance: MaternCovariance::new(nu)?,
        })
    }

    pub fn nu(&self) -> MaternNu {
        self.covariance.nu()
    }

    /// The underlying two-phase covariance operator.
    pub fn covariance(&self) -> &MaternCovariance {
        &self.covariance
    }
}

impl Kernel for MaternKernel {
    fn base(&self) -> &KernelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut KernelBase {
        &mut self.base
    }

    fn evaluate(&self, x1: &ArrayD<f64>, x2: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        let lengthscale = self
            .base
            .lengthscale()
            .ok_or_else(|| Error::config("matern kernel is missing its lengthscale"))?;
        if self.base.ard_num_dims().is_some() {
            let d = x1.shape()[x1.ndim() - 1];
            let ls_dims = lengthscale.shape()[lengthscale.ndim() - 1];
            if ls_dims != d {
                return Err(Error::shape_mismatch(
                    "ard lengthscale",
                    &[d],
                    lengthscale.shape(),
                ));
            }
            let x1_scaled =
                x1 / &broadcast::broadcast_to(&lengthscale, x1.shape(), "ard lengthscale")?;
            let x2_scaled =
                x2 / &broadcast::broadcast_to(&lengthscale, x2.shape(), "ard lengthscale")?;
            let unit = ArrayD::from_elem(IxDyn(&vec![1; x1.ndim()]), 1.0);
            let (covar, _) = self.covariance.forward(&x1_scaled, &x2_scaled, &unit)?;
            Ok(covar)
        } else {
            let (covar, _) = self.covariance.forward(x1, x2, &lengthscale)?;
            Ok(covar)
        }
    }

    fn name(&self) -> &'static str {
        "MaternKernel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_rejects_unsupported_nu() {
        assert!(MaternKernel::new(0.5).is_ok());
        assert!(MaternKernel::new(1.5).is_ok());
        assert!(MaternKernel::new(2.5).is_ok());
        assert!(matches!(
            MaternKernel::new(3.5),
            Err(Error::UnsupportedParameter(_))
        ));
    }

    #[test]
    fn test_evaluate_unit_lengthscale() {
        let kernel = MaternKernel::new(0.5).unwrap();
        let x1 = array![[0.0]].into_dyn();
        let x2 = array![[1.0]].into_dyn();
        let k = kernel.evaluate(&x1, &x2).unwrap();
        assert_relative_eq!(k[[0, 0]], (-1.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_ard_matches_scalar_when_uniform() {
        // a uniform ARD lengthscale is the same model as the shared one
        let mut ard = MaternKernel::with_options(
            1.5,
            KernelOptions {
                ard_num_dims: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        let mut shared = MaternKernel::new(1.5).unwrap();
        let raw = 0.4_f64;
        ard.base_mut()
            .raw_lengthscale_mut()
            .unwrap()
            .fill(raw);
        shared
            .base_mut()
            .raw_lengthscale_mut()
            .unwrap()
            .fill(raw);

        let x1 = array![[0.1, -0.7], [1.2, 0.3], [0.0, 2.0]].into_dyn();
        let x2 = array![[0.5, 0.5], [-1.0, 0.25]].into_dyn();
        let k_ard = ard.evaluate(&x1, &x2).unwrap();
        let k_shared = shared.evaluate(&x1, &x2).unwrap();
        assert_eq!(k_ard.shape(), &[3, 2]);
        for (a, b) in k_ard.iter().zip(k_shared.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_ard_rejects_mismatched_width() {
        let kernel = MaternKernel::with_options(
            1.5,
            KernelOptions {
                ard_num_dims: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        let x = array![[0.1, -0.7], [1.2, 0.3]].into_dyn();
        assert!(matches!(
            kernel.evaluate(&x, &x),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
