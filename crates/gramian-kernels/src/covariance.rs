//! Manually differentiated Matérn covariance
//!
//! The forward and backward passes are derived by hand rather than obtained
//! by differentiating through the per-order formulas: every branch of
//! `dK/d(scaledDist)` below is free of `1/distance` factors, so the
//! zero-distance limit stays finite where a mechanical derivative would
//! produce NaN. The forward pass returns a [`MaternState`] holding exactly
//! the intermediates the backward pass consumes.

use gramian_core::{
    broadcast,
    distance::{DistanceMetric, DistanceState, EuclideanDistance},
    Error, Result,
};
use ndarray::ArrayD;

/// Supported Matérn smoothness orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaternNu {
    Half,
    ThreeHalves,
    FiveHalves,
}

impl MaternNu {
    /// Validate a raw order; anything outside `{0.5, 1.5, 2.5}` is rejected.
    pub fn try_from_f64(nu: f64) -> Result<Self> {
        match nu {
            v if v == 0.5 => Ok(Self::Half),
            v if v == 1.5 => Ok(Self::ThreeHalves),
            v if v == 2.5 => Ok(Self::FiveHalves),
            _ => Err(Error::unsupported_parameter(format!(
                "nu must be one of 0.5, 1.5, 2.5, got {nu}"
            ))),
        }
    }

    pub fn value(self) -> f64 {
        match self {
            Self::Half => 0.5,
            Self::ThreeHalves => 1.5,
            Self::FiveHalves => 2.5,
        }
    }

    /// `sqrt(2·nu)`, the factor scaling distances before the exponential.
    pub fn dist_scale(self) -> f64 {
        (2.0 * self.value()).sqrt()
    }
}

/// Forward intermediates consumed by [`MaternCovariance::backward`].
#[derive(Debug, Clone)]
pub struct MaternState {
    distance: DistanceState,
    dist: ArrayD<f64>,
    scaled_dist: ArrayD<f64>,
    exp_component: ArrayD<f64>,
    lengthscale: ArrayD<f64>,
    lengthscale_shape: Vec<usize>,
}

/// Gradients produced by [`MaternCovariance::backward`].
#[derive(Debug, Clone)]
pub struct MaternGrads {
    pub x1: ArrayD<f64>,
    pub x2: ArrayD<f64>,
    pub lengthscale: ArrayD<f64>,
}

/// Two-phase Matérn covariance operator.
///
/// Owns its distance metric the way kernels own their compute primitives;
/// the backward pass chains through the metric's saved state, so callers
/// managing their own reverse-mode accumulation get `dL/dx1`, `dL/dx2`, and
/// `dL/dlengthscale` from a single call.
#[derive(Debug, Clone)]
pub struct MaternCovariance<D: DistanceMetric = EuclideanDistance> {
    nu: MaternNu,
    distance: D,
}

impl MaternCovariance<EuclideanDistance> {
    pub fn new(nu: f64) -> Result<Self> {
        Ok(Self::with_metric(
            MaternNu::try_from_f64(nu)?,
            EuclideanDistance::new(),
        ))
    }
}

impl<D: DistanceMetric> MaternCovariance<D> {
    pub fn with_metric(nu: MaternNu, distance: D) -> Self {
        Self { nu, distance }
    }

    pub fn nu(&self) -> MaternNu {
        self.nu
    }

    /// The distance metric used by this operator
    pub fn distance(&self) -> &D {
        &self.distance
    }

    /// Covariance matrix between `[..., n, d]` and `[..., m, d]` point
    /// batches, `[..., n, m]`, plus the saved state for [`Self::backward`].
    ///
    /// `lengthscale` must broadcast against the distance matrix (leading
    /// singleton axes of the parameter are dropped as needed); every element
    /// must be strictly positive.
    pub fn forward(
        &self,
        x1: &ArrayD<f64>,
        x2: &ArrayD<f64>,
        lengthscale: &ArrayD<f64>,
    ) -> Result<(ArrayD<f64>, MaternState)> {
        if lengthscale.iter().any(|&l| !(l > 0.0)) {
            return Err(Error::config(
                "matern lengthscale must be strictly positive",
            ));
        }
        let x1_eq_x2 = x1 == x2;
        let (dist, distance) = self.distance.forward(x1, x2, x1_eq_x2)?;
        let ls = broadcast::broadcast_to(lengthscale, dist.shape(), "matern lengthscale")?;

        let mut scaled_dist = &dist / &ls;
        scaled_dist.mapv_inplace(|s| s * self.nu.dist_scale());
        let exp_component = scaled_dist.mapv(|s| (-s).exp());
        let covar = match self.nu {
            MaternNu::Half => exp_component.clone(),
            MaternNu::ThreeHalves => &exp_component * &scaled_dist.mapv(|s| 1.0 + s),
            MaternNu::FiveHalves => {
                &exp_component * &scaled_dist.mapv(|s| 1.0 + s + s * s / 3.0)
            }
        };
        let state = MaternState {
            distance,
            dist,
            scaled_dist,
            exp_component,
            lengthscale: ls,
            lengthscale_shape: lengthscale.shape().to_vec(),
        };
        Ok((covar, state))
    }

    /// Chain `dL/dK` back to the operator inputs.
    ///
    /// The lengthscale gradient is summed back over every axis the
    /// parameter was broadcast along, so it comes out in the parameter's
    /// own shape.
    pub fn backward(&self, state: &MaternState, upstream: &ArrayD<f64>) -> Result<MaternGrads> {
        if upstream.shape() != state.dist.shape() {
            return Err(Error::shape_mismatch(
                "matern backward",
                state.dist.shape(),
                upstream.shape(),
            ));
        }
        // dK/d(scaledDist): finite at zero distance for every order
        let mut dk_ds = state.exp_component.clone();
        match self.nu {
            MaternNu::Half => dk_ds.mapv_inplace(|e| -e),
            MaternNu::ThreeHalves => {
                dk_ds.zip_mut_with(&state.scaled_dist, |e, &s| *e = -s * *e)
            }
            MaternNu::FiveHalves => {
                dk_ds.zip_mut_with(&state.scaled_dist, |e, &s| *e = -s * (1.0 + s) / 3.0 * *e)
            }
        }

        // scaledDist = sqrt(2·nu)·dist/lengthscale
        let scale = self.nu.dist_scale();
        let mut grad_dist = &dk_ds * upstream;
        grad_dist.zip_mut_with(&state.lengthscale, |g, &l| *g *= scale / l);

        // dK/dlengthscale = dK/ds · (−sqrt(2·nu)·dist/lengthscale²)
        let mut ls_grad = -(&grad_dist) * &state.dist;
        ls_grad.zip_mut_with(&state.lengthscale, |g, &l| *g /= l);
        let lengthscale = broadcast::reduce_like(&ls_grad, &state.lengthscale_shape);

        let (x1, x2) = self.distance.backward(&state.distance, &grad_dist)?;
        Ok(MaternGrads {
            x1,
            x2,
            lengthscale,
        })
    }
}
