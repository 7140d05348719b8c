//! Kernel capability: parameter ownership and the evaluation entry point
//!
//! Every covariance function implements [`Kernel`] and embeds a
//! [`KernelBase`] carrying the shared configuration: the optional
//! lengthscale parameter (with its positivity transform and prior), the
//! active-dimension subset, and the batch size. Structure is fixed at
//! construction; the raw parameter tensor is the only mutable state.

use gramian_core::{bounds_to_prior, Deprecation, Error, PositiveParameter, Prior, Result};
use ndarray::{ArrayD, IxDyn};

use crate::lazy::LazyEvaluatedKernelMatrix;

/// Construction options shared by every kernel.
#[derive(Debug, Default)]
pub struct KernelOptions {
    /// Per-input-dimension lengthscales when set (ARD); a single shared
    /// lengthscale otherwise.
    pub ard_num_dims: Option<usize>,
    /// Column subset this kernel consumes, applied before evaluation.
    pub active_dims: Option<Vec<usize>>,
    /// Leading batch dimension of the parameter tensors. Zero means the
    /// default of 1.
    pub batch_size: usize,
    /// Prior over the lengthscale parameter.
    pub lengthscale_prior: Option<Box<dyn Prior>>,
    /// Deprecated bounds pair, mapped onto a prior at construction.
    pub lengthscale_bounds: Option<(f64, f64)>,
}

/// Configuration and parameter state embedded in every kernel.
#[derive(Debug)]
pub struct KernelBase {
    has_lengthscale: bool,
    ard_num_dims: Option<usize>,
    active_dims: Option<Vec<usize>>,
    batch_size: usize,
    lengthscale: Option<PositiveParameter>,
    diagnostics: Vec<Deprecation>,
}

impl KernelBase {
    pub fn new(has_lengthscale: bool, options: KernelOptions) -> Result<Self> {
        let batch_size = if options.batch_size == 0 {
            1
        } else {
            options.batch_size
        };
        if let Some(dims) = &options.active_dims {
            if dims.is_empty() {
                return Err(Error::config("active dimension list is empty"));
            }
        }
        let mut diagnostics = Vec::new();
        let lengthscale = if has_lengthscale {
            let lengthscale_dims = match options.ard_num_dims {
                Some(0) => return Err(Error::config("ard_num_dims must be at least 1")),
                Some(d) => d,
                None => 1,
            };
            let (prior, deprecation) = bounds_to_prior(
                options.lengthscale_prior,
                options.lengthscale_bounds,
                batch_size,
            )?;
            if let Some(deprecation) = deprecation {
                log::warn!("{}", deprecation.message);
                diagnostics.push(deprecation);
            }
            let raw = ArrayD::zeros(IxDyn(&[batch_size, 1, lengthscale_dims]));
            Some(PositiveParameter::new(raw, prior))
        } else {
            if options.lengthscale_prior.is_some() || options.lengthscale_bounds.is_some() {
                return Err(Error::config(
                    "lengthscale prior configured on a kernel without a lengthscale",
                ));
            }
            None
        };
        Ok(Self {
            has_lengthscale,
            ard_num_dims: options.ard_num_dims,
            active_dims: options.active_dims,
            batch_size,
            lengthscale,
            diagnostics,
        })
    }

    pub fn has_lengthscale(&self) -> bool {
        self.has_lengthscale
    }

    pub fn ard_num_dims(&self) -> Option<usize> {
        self.ard_num_dims
    }

    pub fn active_dims(&self) -> Option<&[usize]> {
        self.active_dims.as_deref()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Constrained lengthscale, `exp(raw)`, when configured.
    pub fn lengthscale(&self) -> Option<ArrayD<f64>> {
        self.lengthscale.as_ref().map(PositiveParameter::value)
    }

    pub fn raw_lengthscale(&self) -> Option<&ArrayD<f64>> {
        self.lengthscale.as_ref().map(PositiveParameter::raw)
    }

    /// The external optimizer's mutation point.
    pub fn raw_lengthscale_mut(&mut self) -> Option<&mut ArrayD<f64>> {
        self.lengthscale.as_mut().map(PositiveParameter::raw_mut)
    }

    pub fn lengthscale_prior(&self) -> Option<&dyn Prior> {
        self.lengthscale.as_ref().and_then(PositiveParameter::prior)
    }

    /// Deprecation records produced at construction; the caller decides
    /// whether to surface them further.
    pub fn diagnostics(&self) -> &[Deprecation] {
        &self.diagnostics
    }
}

/// A covariance function over pairs of point batches.
pub trait Kernel: Send + Sync {
    /// Shared configuration and parameter state.
    fn base(&self) -> &KernelBase;

    fn base_mut(&mut self) -> &mut KernelBase;

    /// Dense covariance between two prepared point batches.
    ///
    /// Inputs have already been column-selected and promoted by the lazy
    /// wrapper; implementations may assume matching last dimensions.
    fn evaluate(&self, x1: &ArrayD<f64>, x2: &ArrayD<f64>) -> Result<ArrayD<f64>>;

    /// Name of this kernel for debugging/logging
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Constrained lengthscale, `exp(raw)`, when configured.
    fn lengthscale(&self) -> Option<ArrayD<f64>> {
        self.base().lengthscale()
    }

    /// Defer evaluation over `(x1, x2)`.
    ///
    /// `x2` defaults to `x1`; a call-site `active_dims` overrides the
    /// configured subset. Selection and promotion happen here, eagerly, so
    /// shape errors surface at the call; the matrix itself is only computed
    /// when the returned descriptor is evaluated.
    fn invoke(
        &self,
        x1: &ArrayD<f64>,
        x2: Option<&ArrayD<f64>>,
        active_dims: Option<&[usize]>,
    ) -> Result<LazyEvaluatedKernelMatrix<'_>>
    where
        Self: Sized,
    {
        LazyEvaluatedKernelMatrix::new(self, x1, x2, active_dims)
    }
}
