//! Reconstruction of samples on their minimal regular grid

// crate modules
use crate::error::Result;
use crate::modes::{Criterion, InterpolationMethod};
use crate::sample::ScalarFieldSample;
use crate::spatial::distance;

// hidra modules
use hidra_utils::{linspace, SliceExt};

// external crates
use log::{debug, warn};

/// Values on every node of a regular grid, x outermost and z innermost
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GridValues {
    pub points: Vec<[f64; 3]>,
    pub values: Vec<f64>,
    pub errors: Vec<f64>,
}

/// Regularly spaced nodes along one axis
pub(crate) fn grid_axis(coordinates: &[f64], resolution: f64) -> Result<Vec<f64>> {
    let unique = coordinates.unique_within(resolution);
    let (min, max) = coordinates.try_finite_range()?;
    match unique.len() {
        0 | 1 => Ok(vec![min]),
        n => Ok(linspace(min, max, n)?),
    }
}

/// Index of the node closest to `value`, lowest on ties
fn closest_node(axis: &[f64], value: f64) -> usize {
    let mut best = (0, f64::INFINITY);
    for (i, node) in axis.iter().enumerate() {
        let d = (node - value).abs();
        if d < best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// Sample values spread over the grid spanned by its own coordinates
///
/// The sample is expected to be free of coincident points already.
pub(crate) fn interpolate(
    sample: &ScalarFieldSample,
    method: InterpolationMethod,
    resolution: f64,
) -> Result<GridValues> {
    let axes = [
        grid_axis(&sample.x(), resolution)?,
        grid_axis(&sample.y(), resolution)?,
        grid_axis(&sample.z(), resolution)?,
    ];
    let shape = [axes[0].len(), axes[1].len(), axes[2].len()];
    let flat = |i: usize, j: usize, k: usize| (i * shape[1] + j) * shape[2] + k;

    let num_nodes = shape.iter().product();
    let mut points = Vec::with_capacity(num_nodes);
    for x in &axes[0] {
        for y in &axes[1] {
            for z in &axes[2] {
                points.push([*x, *y, *z]);
            }
        }
    }

    // place every measured point on its closest node
    let mut values = vec![f64::NAN; num_nodes];
    let mut errors = vec![f64::NAN; num_nodes];
    let mut collisions = 0;
    for ((p, v), e) in sample
        .coordinates()
        .iter()
        .zip(sample.values())
        .zip(sample.errors())
    {
        if !v.is_finite() {
            continue;
        }

        let n = flat(
            closest_node(&axes[0], p[0]),
            closest_node(&axes[1], p[1]),
            closest_node(&axes[2], p[2]),
        );

        if values[n].is_finite() {
            collisions += 1;
            let current = [errors[n], *e];
            if Criterion::MinError.winner(&[0, 1], &current) == Some(0) {
                continue;
            }
        }
        values[n] = *v;
        errors[n] = *e;
    }

    if collisions > 0 {
        warn!("{collisions} point(s) share a grid node with another, the smallest error is kept");
    }

    let known: Vec<bool> = values.iter().map(|v| v.is_finite()).collect();
    let vacant = known.iter().filter(|k| !**k).count();
    debug!(
        "Interpolating {vacant} vacant node(s) of a {}x{}x{} grid by {method}",
        shape[0], shape[1], shape[2]
    );

    let (filled_values, filled_errors): (Vec<f64>, Vec<f64>) = (0..num_nodes)
        .map(|n| {
            if known[n] {
                return (values[n], errors[n]);
            }
            let k = n % shape[2];
            let j = (n / shape[2]) % shape[1];
            let i = n / (shape[1] * shape[2]);
            match method {
                InterpolationMethod::Linear => {
                    linear_estimate(&axes, [i, j, k], &values, &errors, &known, &flat)
                }
                InterpolationMethod::Nearest => {
                    nearest_estimate(&points, n, &values, &errors, &known)
                }
            }
        })
        .unzip();

    Ok(GridValues {
        points,
        values: filled_values,
        errors: filled_errors,
    })
}

/// Average of the linear estimates along every axis with known nodes on both sides
fn linear_estimate(
    axes: &[Vec<f64>; 3],
    node: [usize; 3],
    values: &[f64],
    errors: &[f64],
    known: &[bool],
    flat: &dyn Fn(usize, usize, usize) -> usize,
) -> (f64, f64) {
    let mut estimates = Vec::with_capacity(3);

    for (axis, nodes) in axes.iter().enumerate() {
        if nodes.len() < 2 {
            continue;
        }

        let index_at = |position: usize| {
            let mut at = node;
            at[axis] = position;
            flat(at[0], at[1], at[2])
        };

        let below = (0..node[axis]).rev().find(|p| known[index_at(*p)]);
        let above = (node[axis] + 1..nodes.len()).find(|p| known[index_at(*p)]);

        if let (Some(lo), Some(hi)) = (below, above) {
            let weight = (nodes[node[axis]] - nodes[lo]) / (nodes[hi] - nodes[lo]);
            let (a, b) = (index_at(lo), index_at(hi));
            estimates.push((
                (1.0 - weight) * values[a] + weight * values[b],
                (1.0 - weight) * errors[a] + weight * errors[b],
            ));
        }
    }

    if estimates.is_empty() {
        return (f64::NAN, f64::NAN);
    }

    let n = estimates.len() as f64;
    let value = estimates.iter().map(|e| e.0).sum::<f64>() / n;
    let error = estimates.iter().map(|e| e.1).sum::<f64>() / n;
    (value, error)
}

/// Copy of the closest known node, lowest index on ties
fn nearest_estimate(
    points: &[[f64; 3]],
    node: usize,
    values: &[f64],
    errors: &[f64],
    known: &[bool],
) -> (f64, f64) {
    let mut best: Option<(usize, f64)> = None;
    for (n, p) in points.iter().enumerate() {
        if !known[n] {
            continue;
        }
        let d = distance(p, &points[node]);
        match best {
            Some((_, bd)) if bd <= d => (),
            _ => best = Some((n, d)),
        }
    }

    match best {
        Some((n, _)) => (values[n], errors[n]),
        None => (f64::NAN, f64::NAN),
    }
}
