//! Index level fusion and stacking of point lists
//!
//! These only work out which input point ends up where. Samples, and the
//! strain fields built on top of them, use the indices to carry their own
//! values along.

// crate modules
use crate::modes::{Criterion, StackMode};
use crate::point_list::PointList;
use crate::spatial::cluster_points;

// external crates
use log::debug;

/// Shared point list of several stacked inputs
///
/// `sources[n][i]` is the index of the point in input `n` that supplies
/// output point `i`, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedPoints {
    /// Shared output points
    pub point_list: PointList,
    /// Per input, the contributing point for every output point
    pub sources: Vec<Vec<Option<usize>>>,
}

/// Winning point of every coincident group, in order of first appearance
///
/// ```rust
/// # use hidra_fields::{coalesce_indices, Criterion, PointList};
/// let points = PointList::new(vec![0.0, 1.0, 0.005], vec![0.0; 3], vec![0.0; 3]).unwrap();
/// let errors = [0.2, 0.5, 0.1];
/// let winners = coalesce_indices(&points, &errors, Criterion::MinError, 0.01);
/// assert_eq!(winners, vec![2, 1]);
/// ```
pub fn coalesce_indices(
    points: &PointList,
    errors: &[f64],
    criterion: Criterion,
    resolution: f64,
) -> Vec<usize> {
    let clusters = points.cluster(resolution);

    let resolved = points.len() - clusters.len();
    if resolved > 0 {
        debug!("Coalescing {resolved} coincident point(s) by {criterion}");
    }

    clusters
        .iter()
        .filter_map(|members| criterion.winner(members, errors))
        .collect()
}

/// Stack several point lists onto one shared point list
///
/// Each input is a point list and the errors used to choose between
/// coincident points of the same input. Output points sit at the mean of all
/// coincident points across the inputs, ordered by first appearance.
pub fn stack_point_lists(
    inputs: &[(&PointList, &[f64])],
    mode: StackMode,
    resolution: f64,
) -> StackedPoints {
    // tag every aggregated point with its input and index within it
    let mut aggregated: Vec<[f64; 3]> = Vec::new();
    let mut owners: Vec<(usize, usize)> = Vec::new();
    for (n, (points, _)) in inputs.iter().enumerate() {
        aggregated.extend_from_slice(points.coordinates());
        owners.extend((0..points.len()).map(|i| (n, i)));
    }

    let clusters = cluster_points(&aggregated, resolution);
    let all = PointList::from_coordinates(aggregated);

    let mut coordinates = Vec::with_capacity(clusters.len());
    let mut sources = vec![Vec::with_capacity(clusters.len()); inputs.len()];

    for members in &clusters {
        let per_input: Vec<Option<usize>> = inputs
            .iter()
            .enumerate()
            .map(|(n, (_, errors))| {
                let candidates: Vec<usize> = members
                    .iter()
                    .map(|m| owners[*m])
                    .filter(|(owner, _)| *owner == n)
                    .map(|(_, i)| i)
                    .collect();
                Criterion::MinError.winner(&candidates, errors)
            })
            .collect();

        if mode == StackMode::Intersection && per_input.iter().any(|s| s.is_none()) {
            continue;
        }

        if let Some(centre) = all.mean(members) {
            coordinates.push(centre);
            for (source, index) in sources.iter_mut().zip(per_input) {
                source.push(index);
            }
        }
    }

    debug!(
        "Stacked {} input(s) with {} point(s) onto {} {mode} point(s)",
        inputs.len(),
        all.len(),
        coordinates.len()
    );

    StackedPoints {
        point_list: PointList::from_coordinates(coordinates),
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: &[f64]) -> PointList {
        x.iter().map(|x| [*x, 0.0, 0.0]).collect()
    }

    #[test]
    fn union_keeps_everything() {
        let a = line(&[0.0, 1.0, 2.0]);
        let b = line(&[1.002, 3.0]);
        let stacked = stack_point_lists(
            &[(&a, [0.1; 3].as_slice()), (&b, [0.1; 2].as_slice())],
            StackMode::Union,
            0.01,
        );

        assert_eq!(stacked.point_list.len(), 4);
        assert_eq!(stacked.sources[0], vec![Some(0), Some(1), Some(2), None]);
        assert_eq!(stacked.sources[1], vec![None, Some(0), None, Some(1)]);
        assert!((stacked.point_list.x()[1] - 1.001).abs() < 1e-12);
    }

    #[test]
    fn intersection_needs_every_input() {
        let a = line(&[0.0, 1.0, 2.0]);
        let b = line(&[1.002, 3.0]);
        let stacked = stack_point_lists(
            &[(&a, [0.1; 3].as_slice()), (&b, [0.1; 2].as_slice())],
            StackMode::Intersection,
            0.01,
        );

        assert_eq!(stacked.point_list.len(), 1);
        assert_eq!(stacked.sources, vec![vec![Some(1)], vec![Some(0)]]);
    }

    #[test]
    fn duplicates_within_one_input() {
        let a = line(&[0.0, 0.001]);
        let b = line(&[0.002]);
        let stacked = stack_point_lists(
            &[(&a, [0.5, 0.2].as_slice()), (&b, [0.1].as_slice())],
            StackMode::Union,
            0.01,
        );
        assert_eq!(stacked.sources, vec![vec![Some(1)], vec![Some(0)]]);
    }
}
