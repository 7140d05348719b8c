//! Pairwise Euclidean distances over batched point sets
//!
//! Distances are computed through the `‖a‖² + ‖b‖² − 2·a·bᵀ` expansion
//! rather than materializing all pairwise differences, which keeps the
//! memory footprint at `O(n·m)` and lets the cross term go through a single
//! matrix product per batch. Both inputs are centered on the first input's
//! column means before expanding; distances are translation invariant, so
//! this only tightens the floating-point cancellation.
//!
//! The forward pass returns a [`DistanceState`] holding exactly what the
//! backward pass needs, so callers that chain further gradients (the Matérn
//! operator) never re-derive intermediates.

use ndarray::{Array1, Array3, ArrayD, Axis, IxDyn};

use crate::{Error, Result};

/// Cutoff below which a distance is treated as exactly zero in the backward
/// pass. The pairwise-difference numerator vanishes at the same entries, so
/// the resulting gradient contribution is an exact, finite zero instead of a
/// division blow-up.
pub const DIST_EPS: f64 = 1e-12;

/// Forward intermediates consumed by [`DistanceMetric::backward`].
///
/// The stored inputs are the centered copies; pairwise differences are
/// identical to those of the raw inputs.
#[derive(Debug, Clone)]
pub struct DistanceState {
    x1: ArrayD<f64>,
    x2: ArrayD<f64>,
    dist: ArrayD<f64>,
}

impl DistanceState {
    /// The distance matrix produced by the matching forward call.
    pub fn dist(&self) -> &ArrayD<f64> {
        &self.dist
    }
}

/// Pairwise distance with a manually chained backward pass.
pub trait DistanceMetric: Send + Sync {
    /// Compute pairwise distances between `[..., n, d]` and `[..., m, d]`
    /// point batches, producing `[..., n, m]`.
    ///
    /// `x1_eq_x2` is a caller-supplied hint that both arguments are the same
    /// batch; the self-distance diagonal is then written as an exact zero
    /// instead of being recovered from the expansion.
    fn forward(
        &self,
        x1: &ArrayD<f64>,
        x2: &ArrayD<f64>,
        x1_eq_x2: bool,
    ) -> Result<(ArrayD<f64>, DistanceState)>;

    /// Chain `dL/dDistance` back to `(dL/dx1, dL/dx2)`.
    fn backward(
        &self,
        state: &DistanceState,
        upstream: &ArrayD<f64>,
    ) -> Result<(ArrayD<f64>, ArrayD<f64>)>;

    /// Name of this metric for debugging/logging
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Euclidean distance with the identical-inputs fast path.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl EuclideanDistance {
    pub fn new() -> Self {
        Self
    }

    /// Squared pairwise distances, `[..., n, m]`.
    ///
    /// Negative-due-to-rounding entries are clamped to zero, so square roots
    /// taken downstream cannot produce NaN.
    pub fn squared(
        &self,
        x1: &ArrayD<f64>,
        x2: &ArrayD<f64>,
        x1_eq_x2: bool,
    ) -> Result<ArrayD<f64>> {
        let (sq, _, _, meta) = centered_sq_dist(x1, x2, x1_eq_x2)?;
        into_dyn(sq, &meta.batch_shape, meta.n, meta.m)
    }
}

impl DistanceMetric for EuclideanDistance {
    fn forward(
        &self,
        x1: &ArrayD<f64>,
        x2: &ArrayD<f64>,
        x1_eq_x2: bool,
    ) -> Result<(ArrayD<f64>, DistanceState)> {
        let (sq, x1c, x2c, meta) = centered_sq_dist(x1, x2, x1_eq_x2)?;
        let dist = into_dyn(sq.mapv(f64::sqrt), &meta.batch_shape, meta.n, meta.m)?;
        let state = DistanceState {
            x1: into_dyn(x1c, &meta.batch_shape, meta.n, meta.d)?,
            x2: into_dyn(x2c, &meta.batch_shape, meta.m, meta.d)?,
            dist: dist.clone(),
        };
        Ok((dist, state))
    }

    fn backward(
        &self,
        state: &DistanceState,
        upstream: &ArrayD<f64>,
    ) -> Result<(ArrayD<f64>, ArrayD<f64>)> {
        if upstream.shape() != state.dist.shape() {
            return Err(Error::shape_mismatch(
                "distance backward",
                state.dist.shape(),
                upstream.shape(),
            ));
        }
        let meta = check_pair(&state.x1, &state.x2)?;
        let x1c = into_batched(&state.x1, meta.b, meta.n, meta.d)?;
        let x2c = into_batched(&state.x2, meta.b, meta.m, meta.d)?;
        let dist = into_batched(&state.dist, meta.b, meta.n, meta.m)?;
        let mut weights = into_batched(upstream, meta.b, meta.n, meta.m)?;
        weights.zip_mut_with(&dist, |g, &d| {
            if d > DIST_EPS {
                *g /= d;
            } else {
                *g = 0.0;
            }
        });

        let mut grad1 = Array3::<f64>::zeros((meta.b, meta.n, meta.d));
        let mut grad2 = Array3::<f64>::zeros((meta.b, meta.m, meta.d));
        for b in 0..meta.b {
            let wb = weights.index_axis(Axis(0), b);
            let x1b = x1c.index_axis(Axis(0), b);
            let x2b = x2c.index_axis(Axis(0), b);

            let row_totals = wb.sum_axis(Axis(1)).insert_axis(Axis(1));
            let col_totals = wb.sum_axis(Axis(0)).insert_axis(Axis(1));
            let g1 = &x1b * &row_totals - wb.dot(&x2b);
            let g2 = &x2b * &col_totals - wb.t().dot(&x1b);
            grad1.index_axis_mut(Axis(0), b).assign(&g1);
            grad2.index_axis_mut(Axis(0), b).assign(&g2);
        }
        Ok((
            into_dyn(grad1, &meta.batch_shape, meta.n, meta.d)?,
            into_dyn(grad2, &meta.batch_shape, meta.m, meta.d)?,
        ))
    }

    fn name(&self) -> &'static str {
        "EuclideanDistance"
    }
}

struct PairMeta {
    batch_shape: Vec<usize>,
    b: usize,
    n: usize,
    m: usize,
    d: usize,
}

fn check_pair(x1: &ArrayD<f64>, x2: &ArrayD<f64>) -> Result<PairMeta> {
    if x1.ndim() < 2 || x2.ndim() < 2 {
        return Err(Error::config(
            "point batches must have at least two dimensions",
        ));
    }
    if x1.ndim() != x2.ndim() || x1.shape()[..x1.ndim() - 2] != x2.shape()[..x2.ndim() - 2] {
        return Err(Error::shape_mismatch(
            "pairwise distance batch dimensions",
            x1.shape(),
            x2.shape(),
        ));
    }
    let d = x1.shape()[x1.ndim() - 1];
    if d != x2.shape()[x2.ndim() - 1] {
        return Err(Error::shape_mismatch(
            "pairwise distance feature dimension",
            x1.shape(),
            x2.shape(),
        ));
    }
    let batch_shape = x1.shape()[..x1.ndim() - 2].to_vec();
    Ok(PairMeta {
        b: batch_shape.iter().product(),
        n: x1.shape()[x1.ndim() - 2],
        m: x2.shape()[x2.ndim() - 2],
        d,
        batch_shape,
    })
}

fn into_batched(x: &ArrayD<f64>, b: usize, rows: usize, cols: usize) -> Result<Array3<f64>> {
    let flat: Vec<f64> = x.iter().copied().collect();
    Array3::from_shape_vec((b, rows, cols), flat).map_err(|e| Error::Other(e.into()))
}

fn into_dyn(
    x: Array3<f64>,
    batch_shape: &[usize],
    rows: usize,
    cols: usize,
) -> Result<ArrayD<f64>> {
    let mut shape = batch_shape.to_vec();
    shape.push(rows);
    shape.push(cols);
    ArrayD::from_shape_vec(IxDyn(&shape), x.into_raw_vec()).map_err(|e| Error::Other(e.into()))
}

fn centered_sq_dist(
    x1: &ArrayD<f64>,
    x2: &ArrayD<f64>,
    x1_eq_x2: bool,
) -> Result<(Array3<f64>, Array3<f64>, Array3<f64>, PairMeta)> {
    let meta = check_pair(x1, x2)?;
    let x1b = into_batched(x1, meta.b, meta.n, meta.d)?;
    let x2b = into_batched(x2, meta.b, meta.m, meta.d)?;

    let mut sq = Array3::<f64>::zeros((meta.b, meta.n, meta.m));
    let mut x1c = Array3::<f64>::zeros((meta.b, meta.n, meta.d));
    let mut x2c = Array3::<f64>::zeros((meta.b, meta.m, meta.d));
    for b in 0..meta.b {
        let x1s = x1b.index_axis(Axis(0), b);
        let x2s = x2b.index_axis(Axis(0), b);
        let mean = x1s
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(meta.d));
        let x1cs = &x1s - &mean;
        let x2cs = &x2s - &mean;

        let n1 = x1cs.mapv(|v| v * v).sum_axis(Axis(1));
        let n2 = x2cs.mapv(|v| v * v).sum_axis(Axis(1));
        let mut sq_b = x1cs.dot(&x2cs.t()) * -2.0;
        sq_b += &n1.insert_axis(Axis(1));
        sq_b += &n2.insert_axis(Axis(0));
        sq_b.mapv_inplace(|v| v.max(0.0));
        if x1_eq_x2 {
            for i in 0..meta.n.min(meta.m) {
                sq_b[[i, i]] = 0.0;
            }
        }

        sq.index_axis_mut(Axis(0), b).assign(&sq_b);
        x1c.index_axis_mut(Axis(0), b).assign(&x1cs);
        x2c.index_axis_mut(Axis(0), b).assign(&x2cs);
    }
    Ok((sq, x1c, x2c, meta))
}
