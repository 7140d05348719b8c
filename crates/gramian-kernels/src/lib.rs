//! Composable covariance kernels over batched point sets
//!
//! A [`Kernel`] owns its hyperparameters (a lengthscale under a positivity
//! transform, an optional prior, an optional column subset) and exposes a
//! single evaluation entry point. Invoking a kernel returns a
//! [`LazyEvaluatedKernelMatrix`] descriptor instead of a dense matrix, so
//! composites combine children without forcing premature materialization.
//!
//! The Matérn family is the one covariance function specified in depth:
//! [`MaternCovariance`] is a two-phase forward/backward unit whose analytic
//! gradient stays finite at zero distance, and [`MaternKernel`] wraps it in
//! the kernel capability.
//!
//! ```
//! use gramian_kernels::{additive, Kernel, MaternKernel};
//! use ndarray::array;
//!
//! let k1 = MaternKernel::new(1.5).unwrap();
//! let k2 = MaternKernel::new(2.5).unwrap();
//! let sum = additive(vec![
//!     Box::new(k1) as Box<dyn Kernel>,
//!     Box::new(k2) as Box<dyn Kernel>,
//! ])
//! .unwrap();
//!
//! let x = array![[0.0], [1.0], [2.0]].into_dyn();
//! let gram = sum.invoke(&x, None, None).unwrap().evaluate().unwrap();
//! assert_eq!(gram.shape(), &[3, 3]);
//! ```

pub mod composite;
pub mod covariance;
pub mod lazy;
pub mod matern;
pub mod traits;

// Re-export core types
pub use composite::{additive, product, AdditiveKernel, ProductKernel};
pub use covariance::{MaternCovariance, MaternGrads, MaternNu, MaternState};
pub use lazy::LazyEvaluatedKernelMatrix;
pub use matern::MaternKernel;
pub use traits::{Kernel, KernelBase, KernelOptions};
