//! Parameter records for constrained kernel hyperparameters

use ndarray::ArrayD;

use crate::prior::Prior;
use crate::{Error, Result};

/// Unconstrained parameter with a positivity transform applied on read.
///
/// The raw tensor is the external optimizer's mutation point; the
/// constrained value `exp(raw)` is strictly positive for every element, so
/// no constrained-optimization machinery is needed. The attached prior, if
/// any, regularizes the parameter but is never consulted by the forward
/// computation.
#[derive(Debug)]
pub struct PositiveParameter {
    raw: ArrayD<f64>,
    prior: Option<Box<dyn Prior>>,
}

impl PositiveParameter {
    pub fn new(raw: ArrayD<f64>, prior: Option<Box<dyn Prior>>) -> Self {
        Self { raw, prior }
    }

    /// Constrained value, `exp(raw)`.
    pub fn value(&self) -> ArrayD<f64> {
        self.raw.mapv(f64::exp)
    }

    pub fn raw(&self) -> &ArrayD<f64> {
        &self.raw
    }

    pub fn raw_mut(&mut self) -> &mut ArrayD<f64> {
        &mut self.raw
    }

    /// Replace the raw tensor wholesale; the shape is fixed at construction.
    pub fn set_raw(&mut self, raw: ArrayD<f64>) -> Result<()> {
        if raw.shape() != self.raw.shape() {
            return Err(Error::shape_mismatch(
                "parameter update",
                self.raw.shape(),
                raw.shape(),
            ));
        }
        self.raw = raw;
        Ok(())
    }

    pub fn prior(&self) -> Option<&dyn Prior> {
        self.prior.as_deref()
    }
}
