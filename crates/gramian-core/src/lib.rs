//! Core numeric building blocks for covariance kernel computation
//!
//! This crate provides the pieces the kernel layer is assembled from:
//!
//! - A unified [`Error`] type shared by every gramian crate
//! - Shape promotion and broadcast helpers over dynamically-ranked arrays
//! - The pairwise [`distance`] engine with its manually chained backward pass
//! - Parameter records and [`prior`] bindings for kernel hyperparameters
//!
//! Everything here is a pure, synchronous function of its inputs; the only
//! mutable state is the raw parameter tensor, mutated by an external
//! optimizer between calls.

pub mod broadcast;
pub mod distance;
pub mod error;
pub mod param;
pub mod prior;

// Re-export core types
pub use error::{Error, Result};

pub use distance::{DistanceMetric, DistanceState, EuclideanDistance, DIST_EPS};
pub use param::PositiveParameter;
pub use prior::{bounds_to_prior, Deprecation, GammaPrior, Prior, SmoothedBoxPrior};
