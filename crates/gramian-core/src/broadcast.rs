//! Shape promotion and broadcasting helpers for batched arrays
//!
//! Point batches are dynamically-ranked arrays of shape `[..., n, d]`;
//! hyperparameters are stored with their own (usually singleton-padded)
//! shapes and broadcast against matrix-shaped operands on use. These helpers
//! centralize the promotion, selection, and broadcast-reduction rules so the
//! distance engine and kernels agree on them.

use ndarray::{ArrayD, Axis, IxDyn};

use crate::{Error, Result};

/// Promote a 1-D array `[n]` to a column batch `[n, 1]`.
///
/// Higher-ranked inputs pass through untouched.
pub fn atleast_2d(x: ArrayD<f64>) -> ArrayD<f64> {
    if x.ndim() == 1 {
        x.insert_axis(Axis(1))
    } else {
        x
    }
}

/// Select a column subset along the last axis, in the given order.
pub fn select_dims(x: &ArrayD<f64>, dims: &[usize]) -> Result<ArrayD<f64>> {
    if dims.is_empty() {
        return Err(Error::config("active dimension list is empty"));
    }
    if x.ndim() == 0 {
        return Err(Error::config(
            "cannot select active dimensions of a zero-dimensional array",
        ));
    }
    let last = x.ndim() - 1;
    let width = x.shape()[last];
    for &d in dims {
        if d >= width {
            return Err(Error::config(format!(
                "active dimension {d} out of range for input with {width} columns"
            )));
        }
    }
    Ok(x.select(Axis(last), dims))
}

/// Broadcast `x` to `shape`, materializing the result.
///
/// Leading singleton axes of `x` are dropped first when its rank exceeds the
/// target rank, so a `[1, 1, 1]` parameter can meet an unbatched `[n, m]`
/// matrix. Any other rank or extent conflict is a shape error.
pub fn broadcast_to(x: &ArrayD<f64>, shape: &[usize], context: &str) -> Result<ArrayD<f64>> {
    let mut view = x.view();
    while view.ndim() > shape.len() {
        if view.shape()[0] == 1 {
            view = view.index_axis_move(Axis(0), 0);
        } else {
            return Err(Error::shape_mismatch(context, shape, x.shape()));
        }
    }
    view.broadcast(IxDyn(shape))
        .map(|v| v.to_owned())
        .ok_or_else(|| Error::shape_mismatch(context, shape, x.shape()))
}

/// Sum `grad` down to `shape`, undoing broadcasting.
///
/// Standard broadcast-gradient reduction: extra leading axes are summed
/// away, then every axis the target holds at extent 1 is summed with the
/// axis kept.
pub fn reduce_like(grad: &ArrayD<f64>, shape: &[usize]) -> ArrayD<f64> {
    let mut g = grad.to_owned();
    while g.ndim() > shape.len() {
        g = g.sum_axis(Axis(0));
    }
    for (i, &extent) in shape.iter().enumerate() {
        if extent == 1 && g.shape()[i] != 1 {
            g = g.sum_axis(Axis(i)).insert_axis(Axis(i));
        }
    }
    g
}
