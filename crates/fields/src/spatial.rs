//! Hashed grid index for coincidence searches
//!
//! Points are bucketed into cubic cells with sides equal to the resolution.
//! Any two points within the resolution of each other are then in the same or
//! adjacent cells, so a search only needs to look at 27 cells.

// standard library
use std::collections::HashMap;

/// Smallest usable cell size, used when the resolution is zero
const MIN_CELL_SIZE: f64 = 1e-9;

type Cell = (i64, i64, i64);

/// Euclidean distance between two points
pub(crate) fn distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

/// Spatial index over a fixed set of points
#[derive(Debug, Clone)]
pub(crate) struct SpatialIndex<'a> {
    points: &'a [[f64; 3]],
    resolution: f64,
    cell_size: f64,
    cells: HashMap<Cell, Vec<usize>>,
}

impl<'a> SpatialIndex<'a> {
    pub(crate) fn new(points: &'a [[f64; 3]], resolution: f64) -> Self {
        let cell_size = resolution.max(MIN_CELL_SIZE);
        let mut cells: HashMap<Cell, Vec<usize>> = HashMap::new();

        for (i, p) in points.iter().enumerate() {
            cells.entry(cell_of(p, cell_size)).or_default().push(i);
        }

        Self {
            points,
            resolution,
            cell_size,
            cells,
        }
    }

    /// Indices of all points within the resolution of `p`, ascending
    pub(crate) fn neighbours(&self, p: &[f64; 3]) -> Vec<usize> {
        let (cx, cy, cz) = cell_of(p, self.cell_size);
        let mut found = Vec::new();

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    if let Some(members) = self.cells.get(&key) {
                        found.extend(
                            members
                                .iter()
                                .filter(|i| distance(&self.points[**i], p) <= self.resolution),
                        );
                    }
                }
            }
        }

        found.sort_unstable();
        found
    }

    /// Closest point within the resolution of `p`, lowest index on ties
    pub(crate) fn nearest(&self, p: &[f64; 3]) -> Option<usize> {
        self.neighbours(p)
            .into_iter()
            .map(|i| (i, distance(&self.points[i], p)))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((i, d)),
            })
            .map(|(i, _)| i)
    }
}

fn cell_of(p: &[f64; 3], cell_size: f64) -> Cell {
    // float to int casts saturate, NAN maps to 0
    (
        (p[0] / cell_size).floor() as i64,
        (p[1] / cell_size).floor() as i64,
        (p[2] / cell_size).floor() as i64,
    )
}

/// Single-linkage clusters of points within the resolution of each other
///
/// Clusters are ordered by their first member and members are ascending, so
/// the result only depends on the input order.
pub(crate) fn cluster_points(points: &[[f64; 3]], resolution: f64) -> Vec<Vec<usize>> {
    let index = SpatialIndex::new(points, resolution);
    let mut parent: Vec<usize> = (0..points.len()).collect();

    for (i, p) in points.iter().enumerate() {
        for j in index.neighbours(p) {
            if j > i {
                union(&mut parent, i, j);
            }
        }
    }

    let mut order: Vec<usize> = Vec::new();
    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..points.len() {
        let root = find(&mut parent, i);
        let group = groups.entry(root).or_default();
        if group.is_empty() {
            order.push(root);
        }
        group.push(i);
    }

    order
        .into_iter()
        .filter_map(|root| groups.remove(&root))
        .collect()
}

fn find(parent: &mut [usize], i: usize) -> usize {
    let mut root = i;
    while parent[root] != root {
        root = parent[root];
    }

    // path compression
    let mut current = i;
    while parent[current] != root {
        let next = parent[current];
        parent[current] = root;
        current = next;
    }
    root
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // keep the smaller index as the root
        let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[high] = low;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbours_within_resolution() {
        let points = [[0.0, 0.0, 0.0], [0.009, 0.0, 0.0], [0.011, 0.0, 0.0], [5.0, 5.0, 5.0]];
        let index = SpatialIndex::new(&points, 0.01);
        assert_eq!(index.neighbours(&points[0]), vec![0, 1]);
        assert_eq!(index.neighbours(&points[1]), vec![0, 1, 2]);
        assert_eq!(index.nearest(&[0.0105, 0.0, 0.0]), Some(2));
        assert_eq!(index.nearest(&[1.0, 1.0, 1.0]), None);
    }

    #[test]
    fn single_linkage_chains() {
        // 0 and 2 are too far apart but both touch 1
        let points = [[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.016, 0.0, 0.0], [0.008, 0.0, 0.0]];
        let clusters = cluster_points(&points, 0.01);
        assert_eq!(clusters, vec![vec![0, 2, 3], vec![1]]);
    }

    #[test]
    fn zero_resolution_is_exact() {
        let points = [[1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [1.0, 2.0, 3.000001]];
        let clusters = cluster_points(&points, 0.0);
        assert_eq!(clusters, vec![vec![0, 1], vec![2]]);
    }
}
