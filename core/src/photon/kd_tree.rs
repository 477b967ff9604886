//! Point kd-tree

use crate::geometry::*;
use crate::pbrt::*;

/// A node of the implicit tree. The node for the index range `[lo, hi)`
/// sits at `lo + (hi - lo) / 2`, its children cover the two halves.
#[derive(Copy, Clone, Debug)]
struct KdNode {
    /// Position of the point.
    pos: Point3f,

    /// Index of the point in the slice the tree was built from.
    index: usize,

    /// Split axis. Unused for leaves.
    axis: Axis,
}

/// A balanced 3-d tree over a set of points stored in a flat array. Built
/// once, then queried concurrently.
#[derive(Clone, Debug, Default)]
pub struct KdTree {
    nodes: Vec<KdNode>,
}

impl KdTree {
    /// Builds a tree over `points` by recursive median splits on the axis of
    /// largest extent.
    ///
    /// * `points` - The points. Query results refer to indices into it.
    pub fn new(points: &[Point3f]) -> Self {
        let mut nodes: Vec<KdNode> = points
            .iter()
            .enumerate()
            .map(|(index, pos)| KdNode {
                pos: *pos,
                index,
                axis: Axis::X,
            })
            .collect();
        Self::build_range(&mut nodes);
        Self { nodes }
    }

    fn build_range(nodes: &mut [KdNode]) {
        if nodes.len() <= 1 {
            return;
        }

        let bounds = nodes
            .iter()
            .skip(1)
            .fold(Bounds3f::from(nodes[0].pos), |b, n| b.union(&n.pos));
        let axis = bounds.maximum_extent();

        let mid = nodes.len() / 2;
        nodes.select_nth_unstable_by(mid, |a, b| a.pos[axis].total_cmp(&b.pos[axis]));
        nodes[mid].axis = axis;

        let (left, right) = nodes.split_at_mut(mid);
        Self::build_range(left);
        Self::build_range(&mut right[1..]);
    }

    /// Returns the number of points in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visits every point closer than the current squared search radius.
    /// The visitor receives the point index, its squared distance and the
    /// search radius, which it may shrink. Returns the final radius.
    ///
    /// * `p`           - Query position.
    /// * `max_dist_sq` - Initial squared search radius.
    /// * `visit`       - Visitor.
    pub fn lookup<F>(&self, p: &Point3f, max_dist_sq: Float, mut visit: F) -> Float
    where
        F: FnMut(usize, Float, &mut Float),
    {
        let mut dist_sq = max_dist_sq;
        self.lookup_range(0, self.nodes.len(), p, &mut dist_sq, &mut visit);
        dist_sq
    }

    fn lookup_range<F>(&self, lo: usize, hi: usize, p: &Point3f, dist_sq: &mut Float, visit: &mut F)
    where
        F: FnMut(usize, Float, &mut Float),
    {
        if lo >= hi {
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let node = self.nodes[mid];

        if hi - lo > 1 {
            let delta = p[node.axis] - node.pos[node.axis];
            let (near, far) = if delta < 0.0 {
                ((lo, mid), (mid + 1, hi))
            } else {
                ((mid + 1, hi), (lo, mid))
            };
            self.lookup_range(near.0, near.1, p, dist_sq, visit);
            if delta * delta < *dist_sq {
                self.lookup_range(far.0, far.1, p, dist_sq, visit);
            }
        }

        let d2 = node.pos.distance_squared(p);
        if d2 < *dist_sq {
            visit(node.index, d2, dist_sq);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RNG;
    use proptest::prelude::*;

    fn random_points(n: usize, seed: u64) -> Vec<Point3f> {
        let mut rng = RNG::new(seed);
        (0..n)
            .map(|_| Point3f::new(rng.uniform_float(), rng.uniform_float(), rng.uniform_float()))
            .collect()
    }

    #[test]
    fn empty_tree_visits_nothing() {
        let tree = KdTree::new(&[]);
        assert!(tree.is_empty());
        let mut visited = 0;
        tree.lookup(&Point3f::zero(), 1.0, |_, _, _| visited += 1);
        assert_eq!(visited, 0);
    }

    #[test]
    fn finds_all_points_within_radius() {
        let points = random_points(500, 3);
        let tree = KdTree::new(&points);
        assert_eq!(tree.len(), 500);

        let q = Point3f::new(0.5, 0.5, 0.5);
        let r2 = 0.04;
        let mut found: Vec<usize> = Vec::new();
        tree.lookup(&q, r2, |i, _, _| found.push(i));
        found.sort_unstable();

        let expected: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].distance_squared(&q) < r2)
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn shrinking_radius_finds_nearest() {
        let points = random_points(300, 11);
        let tree = KdTree::new(&points);
        let q = Point3f::new(0.2, 0.7, 0.4);

        let mut best = None;
        tree.lookup(&q, INFINITY, |i, d2, max_d2| {
            best = Some(i);
            *max_d2 = d2;
        });

        let expected = (0..points.len())
            .min_by(|&a, &b| {
                points[a]
                    .distance_squared(&q)
                    .total_cmp(&points[b].distance_squared(&q))
            })
            .unwrap();
        assert_eq!(best, Some(expected));
    }

    proptest! {
        #[test]
        fn visited_points_are_inside_radius(
            seed in 0..1000u64,
            x in 0.0..1.0f32,
            y in 0.0..1.0f32,
            z in 0.0..1.0f32,
            r2 in 0.001..0.5f32,
        ) {
            let points = random_points(64, seed);
            let tree = KdTree::new(&points);
            let q = Point3f::new(x, y, z);
            let mut ok = true;
            tree.lookup(&q, r2, |i, d2, _| {
                ok &= d2 < r2 && (points[i].distance_squared(&q) - d2).abs() < 1e-6;
            });
            prop_assert!(ok);
        }
    }
}
