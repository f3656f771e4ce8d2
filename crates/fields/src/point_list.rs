//! Ordered lists of sample coordinates

// crate modules
use crate::error::{Error, Result};
use crate::spatial::{cluster_points, distance, SpatialIndex};

// external crates
use serde::{Deserialize, Serialize};

/// Distance (mm) below which two points are the same physical sample point
pub const DEFAULT_POINT_RESOLUTION: f64 = 0.01;

/// Ordered list of sample point coordinates
///
/// The order is the insertion order. Spatial identity is only ever decided
/// by comparing coordinates within a resolution, never by index.
///
/// ```rust
/// # use hidra_fields::PointList;
/// let points = PointList::new(
///     vec![0.0, 1.0, 0.004],
///     vec![0.0, 0.0, 0.0],
///     vec![0.0, 0.0, 0.0],
/// ).unwrap();
///
/// assert_eq!(points.len(), 3);
/// assert!(points.has_overlapping_points(0.01));
/// assert!(!points.has_overlapping_points(0.001));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointList {
    points: Vec<[f64; 3]>,
}

impl PointList {
    /// Build from separate x, y and z coordinates of equal length
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        check_length("y coordinates", x.len(), y.len())?;
        check_length("z coordinates", x.len(), z.len())?;

        Ok(Self {
            points: x
                .into_iter()
                .zip(y)
                .zip(z)
                .map(|((x, y), z)| [x, y, z])
                .collect(),
        })
    }

    /// Build from a list of (x, y, z) triplets
    pub fn from_coordinates(points: Vec<[f64; 3]>) -> Self {
        Self { points }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All x coordinates
    pub fn x(&self) -> Vec<f64> {
        self.points.iter().map(|p| p[0]).collect()
    }

    /// All y coordinates
    pub fn y(&self) -> Vec<f64> {
        self.points.iter().map(|p| p[1]).collect()
    }

    /// All z coordinates
    pub fn z(&self) -> Vec<f64> {
        self.points.iter().map(|p| p[2]).collect()
    }

    /// Coordinates of a single point
    pub fn point(&self, index: usize) -> Option<[f64; 3]> {
        self.points.get(index).copied()
    }

    /// All points as (x, y, z) triplets
    pub fn coordinates(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Iterator over the (x, y, z) triplets
    pub fn iter(&self) -> impl Iterator<Item = &[f64; 3]> {
        self.points.iter()
    }

    /// New list with the selected points, in the order given
    pub fn extract(&self, indices: &[usize]) -> Result<Self> {
        let points = indices
            .iter()
            .map(|i| {
                self.point(*i).ok_or(Error::IndexOutOfBounds {
                    index: *i,
                    length: self.len(),
                })
            })
            .collect::<Result<Vec<[f64; 3]>>>()?;

        Ok(Self { points })
    }

    /// Concatenation of both lists, duplicates included
    pub fn aggregate(&self, other: &PointList) -> Self {
        let mut points = Vec::with_capacity(self.len() + other.len());
        points.extend_from_slice(&self.points);
        points.extend_from_slice(&other.points);
        Self { points }
    }

    /// Groups of coincident points
    ///
    /// Coincidence is transitive, so a chain of points each within the
    /// resolution of the next ends up in one group. Groups are ordered by
    /// their first member, members are in ascending order.
    pub fn cluster(&self, resolution: f64) -> Vec<Vec<usize>> {
        cluster_points(&self.points, resolution)
    }

    /// True if any two points are within the resolution of each other
    pub fn has_overlapping_points(&self, resolution: f64) -> bool {
        let index = SpatialIndex::new(&self.points, resolution);
        self.points
            .iter()
            .any(|p| index.neighbours(p).len() > 1)
    }

    /// True if both lists have the same points in the same order
    pub fn is_equal_within_resolution(&self, other: &PointList, resolution: f64) -> bool {
        self.len() == other.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| distance(a, b) <= resolution)
    }

    /// Indices of points in each list that coincide with a point in the other
    pub fn intersection_indices(
        &self,
        other: &PointList,
        resolution: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        let this_index = SpatialIndex::new(&self.points, resolution);
        let other_index = SpatialIndex::new(&other.points, resolution);

        let from_self = (0..self.len())
            .filter(|i| other_index.nearest(&self.points[*i]).is_some())
            .collect();
        let from_other = (0..other.len())
            .filter(|i| this_index.nearest(&other.points[*i]).is_some())
            .collect();

        (from_self, from_other)
    }

    /// Closest coincident point in `other` for every point of this list
    pub fn index_in(&self, other: &PointList, resolution: f64) -> Vec<Option<usize>> {
        let index = SpatialIndex::new(&other.points, resolution);
        self.points.iter().map(|p| index.nearest(p)).collect()
    }

    /// Centroid of the selected points
    pub fn mean(&self, indices: &[usize]) -> Option<[f64; 3]> {
        let selected: Vec<&[f64; 3]> = indices.iter().filter_map(|i| self.points.get(*i)).collect();
        if selected.is_empty() {
            return None;
        }

        let n = selected.len() as f64;
        let mut centroid = [0.0; 3];
        for p in selected {
            centroid[0] += p[0];
            centroid[1] += p[1];
            centroid[2] += p[2];
        }
        Some(centroid.map(|c| c / n))
    }
}

impl FromIterator<[f64; 3]> for PointList {
    fn from_iter<I: IntoIterator<Item = [f64; 3]>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

pub(crate) fn check_length(quantity: &str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(Error::ShapeMismatch {
            quantity: quantity.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x: &[f64]) -> PointList {
        x.iter().map(|x| [*x, 0.0, 0.0]).collect()
    }

    #[test]
    fn mismatched_coordinates() {
        let result = PointList::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]);
        assert!(matches!(
            result,
            Err(Error::ShapeMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn extract_keeps_order() {
        let points = line(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(points.extract(&[3, 1]).unwrap().x(), vec![3.0, 1.0]);
        assert!(points.extract(&[4]).is_err());
    }

    #[test]
    fn intersection_on_both_sides() {
        let a = line(&[0.0, 1.0, 2.0]);
        let b = line(&[2.001, 5.0, 0.005, 0.006]);
        let (from_a, from_b) = a.intersection_indices(&b, DEFAULT_POINT_RESOLUTION);
        assert_eq!(from_a, vec![0, 2]);
        assert_eq!(from_b, vec![0, 2, 3]);
    }

    #[test]
    fn equality_needs_order() {
        let a = line(&[0.0, 1.0]);
        assert!(a.is_equal_within_resolution(&line(&[0.001, 1.0]), 0.01));
        assert!(!a.is_equal_within_resolution(&line(&[1.0, 0.0]), 0.01));
        assert!(!a.is_equal_within_resolution(&line(&[0.0]), 0.01));
    }

    #[test]
    fn centroid() {
        let points = line(&[0.0, 1.0, 2.0]);
        assert_eq!(points.mean(&[0, 2]), Some([1.0, 0.0, 0.0]));
        assert_eq!(points.mean(&[]), None);
    }
}
