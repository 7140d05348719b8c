//! Additive and product composition of kernels
//!
//! Composites own their children and evaluate them through the lazy
//! wrapper, so each child still applies its own active-dimension subset.
//! Composition nests without flattening; insertion order is preserved and
//! fixes the floating-point accumulation order.

use gramian_core::{Error, Result};
use ndarray::ArrayD;

use crate::lazy::LazyEvaluatedKernelMatrix;
use crate::traits::{Kernel, KernelBase, KernelOptions};

/// Sum of child kernels, in insertion order.
pub struct AdditiveKernel {
    base: KernelBase,
    kernels: Vec<Box<dyn Kernel>>,
}

impl AdditiveKernel {
    pub fn new(kernels: Vec<Box<dyn Kernel>>) -> Result<Self> {
        if kernels.is_empty() {
            return Err(Error::config(
                "additive kernel requires at least one child",
            ));
        }
        Ok(Self {
            base: KernelBase::new(false, KernelOptions::default())?,
            kernels,
        })
    }

    pub fn kernels(&self) -> &[Box<dyn Kernel>] {
        &self.kernels
    }
}

impl Kernel for AdditiveKernel {
    fn base(&self) -> &KernelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut KernelBase {
        &mut self.base
    }

    fn evaluate(&self, x1: &ArrayD<f64>, x2: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        // the additive identity never materializes; the first child's
        // matrix becomes the accumulator
        let mut acc: Option<ArrayD<f64>> = None;
        for kernel in &self.kernels {
            let term =
                LazyEvaluatedKernelMatrix::new(kernel.as_ref(), x1, Some(x2), None)?.evaluate()?;
            acc = Some(match acc {
                None => term,
                Some(sum) => {
                    if sum.shape() != term.shape() {
                        return Err(Error::shape_mismatch(
                            "additive kernel children",
                            sum.shape(),
                            term.shape(),
                        ));
                    }
                    sum + term
                }
            });
        }
        acc.ok_or_else(|| Error::config("additive kernel requires at least one child"))
    }

    fn name(&self) -> &'static str {
        "AdditiveKernel"
    }
}

/// Elementwise product of child kernels.
pub struct ProductKernel {
    base: KernelBase,
    kernels: Vec<Box<dyn Kernel>>,
}

impl ProductKernel {
    pub fn new(kernels: Vec<Box<dyn Kernel>>) -> Result<Self> {
        if kernels.is_empty() {
            return Err(Error::config(
                "product kernel requires at least one child",
            ));
        }
        Ok(Self {
            base: KernelBase::new(false, KernelOptions::default())?,
            kernels,
        })
    }

    pub fn kernels(&self) -> &[Box<dyn Kernel>] {
        &self.kernels
    }
}

impl Kernel for ProductKernel {
    fn base(&self) -> &KernelBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut KernelBase {
        &mut self.base
    }

    fn evaluate(&self, x1: &ArrayD<f64>, x2: &ArrayD<f64>) -> Result<ArrayD<f64>> {
        let mut acc: Option<ArrayD<f64>> = None;
        for kernel in &self.kernels {
            let term =
                LazyEvaluatedKernelMatrix::new(kernel.as_ref(), x1, Some(x2), None)?.evaluate()?;
            acc = Some(match acc {
                None => term,
                Some(prod) => {
                    if prod.shape() != term.shape() {
                        return Err(Error::shape_mismatch(
                            "product kernel children",
                            prod.shape(),
                            term.shape(),
                        ));
                    }
                    prod * term
                }
            });
        }
        acc.ok_or_else(|| Error::config("product kernel requires at least one child"))
    }

    fn name(&self) -> &'static str {
        "ProductKernel"
    }
}

/// Build an additive composite from parts.
pub fn additive(kernels: Vec<Box<dyn Kernel>>) -> Result<AdditiveKernel> {
    AdditiveKernel::new(kernels)
}

/// Build a product composite from parts.
pub fn product(kernels: Vec<Box<dyn Kernel>>) -> Result<ProductKernel> {
    ProductKernel::new(kernels)
}
