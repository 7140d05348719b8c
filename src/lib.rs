//! Lazily composable covariance kernels with a hand-differentiated Matérn
//! family
//!
//! This crate re-exports the gramian workspace:
//!
//! - [`gramian_core`] — error type, broadcast helpers, the pairwise distance
//!   engine, parameter records and priors
//! - [`gramian_kernels`] — the kernel capability, lazy evaluation, additive
//!   and product composition, and the Matérn operator
//!
//! # Example
//!
//! ```
//! use gramian::{Kernel, MaternKernel};
//! use ndarray::array;
//!
//! let kernel = MaternKernel::new(2.5).unwrap();
//! let x = array![[0.0], [1.0]].into_dyn();
//! let gram = kernel.invoke(&x, None, None).unwrap().evaluate().unwrap();
//! assert!((gram[[0, 0]] - 1.0).abs() < 1e-12);
//! ```

pub use gramian_core::{
    bounds_to_prior, Deprecation, DistanceMetric, DistanceState, Error, EuclideanDistance,
    GammaPrior, PositiveParameter, Prior, Result, SmoothedBoxPrior, DIST_EPS,
};
pub use gramian_kernels::{
    additive, product, AdditiveKernel, Kernel, KernelBase, KernelOptions,
    LazyEvaluatedKernelMatrix, MaternCovariance, MaternGrads, MaternKernel, MaternNu, MaternState,
    ProductKernel,
};
