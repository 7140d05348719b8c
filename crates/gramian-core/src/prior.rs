//! Priors over kernel hyperparameters
//!
//! The kernel layer only consumes the [`Prior`] contract; the concrete
//! distributions here exist so that lengthscale parameters can carry a
//! regularizer without dragging in an inference framework. The legacy
//! bounds-pair configuration maps onto the same abstraction through
//! [`bounds_to_prior`], which reports the deprecation as data instead of
//! writing to a process-wide logger.

use ndarray::{Array1, ArrayD};
use statrs::distribution::{Continuous, Gamma, Normal};
use std::f64::consts::PI;

use crate::{Error, Result};

/// Distribution attached to an unconstrained parameter.
pub trait Prior: std::fmt::Debug + Send + Sync {
    /// Whether every element of `value` lies in the prior's support.
    fn is_in_support(&self, value: &ArrayD<f64>) -> bool;

    /// Sum of elementwise log-densities of `value` under this prior.
    fn log_prob(&self, value: &ArrayD<f64>) -> Result<f64>;

    /// Name of this prior for debugging/logging
    fn name(&self) -> &'static str;
}

/// Gamma prior parameterized by concentration and rate.
///
/// `pdf(x) = rate^concentration / Γ(concentration) · x^(concentration−1) ·
/// exp(−rate·x)` with both parameters strictly positive.
#[derive(Debug, Clone)]
pub struct GammaPrior {
    concentration: Array1<f64>,
    rate: Array1<f64>,
    distributions: Vec<Gamma>,
    log_transform: bool,
}

impl GammaPrior {
    /// Build from scalar parameters, broadcast to `size` elements.
    pub fn new(concentration: f64, rate: f64, size: Option<usize>) -> Result<Self> {
        let n = size.unwrap_or(1);
        if n == 0 {
            return Err(Error::config("prior size must be at least 1"));
        }
        Self::from_arrays(
            Array1::from_elem(n, concentration),
            Array1::from_elem(n, rate),
        )
    }

    /// Build from equal-shaped parameter arrays.
    pub fn from_arrays(concentration: Array1<f64>, rate: Array1<f64>) -> Result<Self> {
        if concentration.len() != rate.len() {
            return Err(Error::config(format!(
                "concentration and rate must have the same shape, got {} and {}",
                concentration.len(),
                rate.len()
            )));
        }
        if concentration.is_empty() {
            return Err(Error::config("prior parameters are empty"));
        }
        let distributions = concentration
            .iter()
            .zip(rate.iter())
            .map(|(&c, &r)| {
                Gamma::new(c, r).map_err(|e| Error::config(format!("invalid gamma prior: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            concentration,
            rate,
            distributions,
            log_transform: false,
        })
    }

    /// Interpret attached parameter values as logs, exponentiating before
    /// density evaluation.
    pub fn with_log_transform(mut self, log_transform: bool) -> Self {
        self.log_transform = log_transform;
        self
    }

    pub fn concentration(&self) -> &Array1<f64> {
        &self.concentration
    }

    pub fn rate(&self) -> &Array1<f64> {
        &self.rate
    }
}

impl Prior for GammaPrior {
    fn is_in_support(&self, value: &ArrayD<f64>) -> bool {
        value.iter().all(|&v| v > 0.0)
    }

    fn log_prob(&self, value: &ArrayD<f64>) -> Result<f64> {
        let n = self.distributions.len();
        if value.len() != n && n != 1 {
            return Err(Error::shape_mismatch(
                "gamma prior log_prob",
                &[n],
                value.shape(),
            ));
        }
        let mut total = 0.0;
        for (i, &raw) in value.iter().enumerate() {
            let v = if self.log_transform { raw.exp() } else { raw };
            if v <= 0.0 {
                return Ok(f64::NEG_INFINITY);
            }
            total += self.distributions[i % n].ln_pdf(v);
        }
        Ok(total)
    }

    fn name(&self) -> &'static str {
        "GammaPrior"
    }
}

/// Uniform plateau on `[lower, upper]` with Gaussian falloff outside.
///
/// The smoothing keeps the log-density differentiable everywhere, which is
/// what lets the deprecated bounds-pair configuration act as a soft
/// constraint instead of a hard clamp.
#[derive(Debug, Clone)]
pub struct SmoothedBoxPrior {
    lower: Array1<f64>,
    upper: Array1<f64>,
    sigma: f64,
    log_transform: bool,
}

impl SmoothedBoxPrior {
    const DEFAULT_SIGMA: f64 = 0.01;

    /// Build from scalar bounds, broadcast to `size` elements.
    pub fn new(lower: f64, upper: f64, size: Option<usize>) -> Result<Self> {
        let n = size.unwrap_or(1);
        if n == 0 {
            return Err(Error::config("prior size must be at least 1"));
        }
        Self::from_arrays(
            Array1::from_elem(n, lower),
            Array1::from_elem(n, upper),
            Self::DEFAULT_SIGMA,
        )
    }

    /// Build from equal-shaped bound arrays and an explicit edge width.
    pub fn from_arrays(lower: Array1<f64>, upper: Array1<f64>, sigma: f64) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(Error::config(format!(
                "lower and upper bounds must have the same shape, got {} and {}",
                lower.len(),
                upper.len()
            )));
        }
        if lower.is_empty() {
            return Err(Error::config("prior parameters are empty"));
        }
        if lower.iter().zip(upper.iter()).any(|(&a, &b)| a >= b) {
            return Err(Error::config("lower bound must be below upper bound"));
        }
        // Normal::new validates the edge width
        Normal::new(0.0, sigma).map_err(|e| Error::config(format!("invalid box prior: {e}")))?;
        Ok(Self {
            lower,
            upper,
            sigma,
            log_transform: false,
        })
    }

    pub fn with_log_transform(mut self, log_transform: bool) -> Self {
        self.log_transform = log_transform;
        self
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }
}

impl Prior for SmoothedBoxPrior {
    fn is_in_support(&self, value: &ArrayD<f64>) -> bool {
        value.iter().all(|v| v.is_finite())
    }

    fn log_prob(&self, value: &ArrayD<f64>) -> Result<f64> {
        let n = self.lower.len();
        if value.len() != n && n != 1 {
            return Err(Error::shape_mismatch(
                "smoothed box prior log_prob",
                &[n],
                value.shape(),
            ));
        }
        let mut total = 0.0;
        for (i, &raw) in value.iter().enumerate() {
            let v = if self.log_transform { raw.exp() } else { raw };
            let lo = self.lower[i % n];
            let hi = self.upper[i % n];
            let outside = (lo - v).max(v - hi).max(0.0);
            let norm = (hi - lo) + self.sigma * (2.0 * PI).sqrt();
            total += -outside * outside / (2.0 * self.sigma * self.sigma) - norm.ln();
        }
        Ok(total)
    }

    fn name(&self) -> &'static str {
        "SmoothedBoxPrior"
    }
}

/// Structured deprecation record returned to the caller, who decides
/// whether and how to surface it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    pub code: &'static str,
    pub message: String,
}

/// Resolve an explicit prior and a legacy bounds pair into a single prior.
///
/// An explicit prior always wins. A bounds pair still works, mapped onto a
/// [`SmoothedBoxPrior`] over the log-parameter, but yields a [`Deprecation`]
/// record alongside.
pub fn bounds_to_prior(
    prior: Option<Box<dyn Prior>>,
    bounds: Option<(f64, f64)>,
    batch_size: usize,
) -> Result<(Option<Box<dyn Prior>>, Option<Deprecation>)> {
    if let Some(prior) = prior {
        return Ok((Some(prior), None));
    }
    match bounds {
        Some((lower, upper)) => {
            let prior =
                SmoothedBoxPrior::new(lower, upper, Some(batch_size))?.with_log_transform(true);
            let deprecation = Deprecation {
                code: "parameter-bounds",
                message: "parameter bounds are deprecated and will be removed in a future \
                          release; pass a SmoothedBoxPrior instead"
                    .to_string(),
            };
            Ok((Some(Box::new(prior)), Some(deprecation)))
        }
        None => Ok((None, None)),
    }
}
