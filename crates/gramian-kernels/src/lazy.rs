//! Deferred kernel matrix evaluation

use gramian_core::{broadcast, Error, Result};
use ndarray::ArrayD;

use crate::traits::Kernel;

/// Computation descriptor for a kernel applied to a pair of point batches.
///
/// Holds the prepared operands and a reference to the owning kernel; the
/// dense matrix is only produced by [`Self::evaluate`]. Composite kernels
/// combine these descriptors without forcing children to materialize early,
/// and an additive identity operand never materializes at all.
///
/// There is no memoization: every `evaluate` call recomputes from the
/// kernel's current parameter values, so an optimizer may mutate parameters
/// between calls and observe the update.
pub struct LazyEvaluatedKernelMatrix<'a> {
    kernel: &'a dyn Kernel,
    x1: ArrayD<f64>,
    x2: ArrayD<f64>,
}

impl<'a> LazyEvaluatedKernelMatrix<'a> {
    /// Prepare `(x1, x2)` for `kernel` and defer the matrix computation.
    ///
    /// `x2` defaults to `x1`. Column selection (call-site `active_dims`
    /// first, the kernel's configured subset otherwise) runs before 1-D
    /// inputs are promoted to columns; the prepared operands must then agree
    /// on the feature dimension.
    pub fn new(
        kernel: &'a dyn Kernel,
        x1: &ArrayD<f64>,
        x2: Option<&ArrayD<f64>>,
        active_dims: Option<&[usize]>,
    ) -> Result<Self> {
        let dims = active_dims.or_else(|| kernel.base().active_dims());
        let x1 = prepare(x1, dims)?;
        let x2 = match x2 {
            Some(x2) => prepare(x2, dims)?,
            None => x1.clone(),
        };
        let d1 = x1.shape()[x1.ndim() - 1];
        let d2 = x2.shape()[x2.ndim() - 1];
        if d1 != d2 {
            return Err(Error::shape_mismatch(
                "kernel inputs",
                x1.shape(),
                x2.shape(),
            ));
        }
        Ok(Self { kernel, x1, x2 })
    }

    pub fn x1(&self) -> &ArrayD<f64> {
        &self.x1
    }

    pub fn x2(&self) -> &ArrayD<f64> {
        &self.x2
    }

    /// Run the owning kernel's forward computation over the stored operands.
    pub fn evaluate(&self) -> Result<ArrayD<f64>> {
        self.kernel.evaluate(&self.x1, &self.x2)
    }
}

fn prepare(x: &ArrayD<f64>, dims: Option<&[usize]>) -> Result<ArrayD<f64>> {
    let selected = match dims {
        Some(dims) => broadcast::select_dims(x, dims)?,
        None => x.to_owned(),
    };
    let promoted = broadcast::atleast_2d(selected);
    if promoted.ndim() < 2 {
        return Err(Error::config(
            "kernel inputs must be at least one-dimensional",
        ));
    }
    Ok(promoted)
}
