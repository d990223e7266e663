//! One randomized partition tree, stored as a node arena.

use super::average_path_length;
use crate::error::{DetectError, Result};
use crate::features::FeatureMatrixView;
use ndarray::ArrayView1;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Feature draws attempted on a node before it falls back to a leaf.
const MAX_SPLIT_ATTEMPTS: usize = 8;

/// Handle of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// Records with `value < threshold` go left, the rest right.
    Split {
        feature: usize,
        threshold: f64,
        left: NodeId,
        right: NodeId,
    },
    /// Depth at which the leaf was reached and how many records it holds.
    Leaf { depth: usize, size: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionTree {
    nodes: Vec<Node>,
    max_depth: usize,
}

impl PartitionTree {
    pub const ROOT: NodeId = NodeId(0);

    /// Height limit `ceil(log2(psi))` for a subsample of `psi` records.
    pub fn height_limit(psi: usize) -> usize {
        if psi <= 1 {
            0
        } else {
            (usize::BITS - (psi - 1).leading_zeros()) as usize
        }
    }

    /// Grow a tree over the records of `data` listed in `rows`.
    ///
    /// Every draw comes from `rng`, so a seeded generator reproduces the tree
    /// exactly.
    pub fn build<R: Rng + ?Sized>(
        data: FeatureMatrixView<'_>,
        rows: &[usize],
        rng: &mut R,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(DetectError::invalid("cannot build a tree from an empty subsample"));
        }
        if data.ncols() == 0 {
            return Err(DetectError::invalid("cannot build a tree without features"));
        }
        if let Some(&r) = rows.iter().find(|&&r| r >= data.nrows()) {
            return Err(DetectError::invalid(format!(
                "subsample row {r} out of range for {} records",
                data.nrows()
            )));
        }

        let mut builder = Builder {
            data,
            max_depth: Self::height_limit(rows.len()),
            nodes: Vec::with_capacity(2 * rows.len()),
        };
        let mut scratch = rows.to_vec();
        builder.grow(&mut scratch, 0, rng);

        Ok(Self {
            nodes: builder.nodes,
            max_depth: builder.max_depth,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Depth of the leaf `record` lands in plus `c(leaf size)`.
    ///
    /// `record` must have at least as many values as the tree has features.
    pub fn path_length(&self, record: ArrayView1<'_, f64>) -> f64 {
        let mut id = Self::ROOT;
        loop {
            match self.nodes[id.index()] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if record[feature] < threshold { left } else { right };
                }
                Node::Leaf { depth, size } => {
                    return depth as f64 + average_path_length(size);
                }
            }
        }
    }
}

struct Builder<'a> {
    data: FeatureMatrixView<'a>,
    max_depth: usize,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn grow<R: Rng + ?Sized>(&mut self, rows: &mut [usize], depth: usize, rng: &mut R) -> NodeId {
        // Reserve the slot first so a parent always precedes its children.
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Leaf {
            depth,
            size: rows.len(),
        });
        if depth >= self.max_depth || rows.len() <= 1 {
            return id;
        }
        let Some((feature, threshold)) = self.draw_split(rows, rng) else {
            return id;
        };

        let data = self.data;
        let mid = partition(rows, |r| data[[r, feature]] < threshold);
        let (left_rows, right_rows) = rows.split_at_mut(mid);
        let left = self.grow(left_rows, depth + 1, rng);
        let right = self.grow(right_rows, depth + 1, rng);
        self.nodes[id.index()] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    /// Random feature with a non-degenerate range and a threshold in `[min, max)`.
    fn draw_split<R: Rng + ?Sized>(&self, rows: &[usize], rng: &mut R) -> Option<(usize, f64)> {
        for _ in 0..MAX_SPLIT_ATTEMPTS {
            let feature = rng.gen_range(0..self.data.ncols());
            let (min, max) = rows.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &r| {
                    let v = self.data[[r, feature]];
                    (lo.min(v), hi.max(v))
                },
            );
            if min < max {
                return Some((feature, draw_threshold(min, max, rng)));
            }
        }
        None
    }
}

/// Uniform value in `[min, max)`, also when `max - min` overflows.
fn draw_threshold<R: Rng + ?Sized>(min: f64, max: f64, rng: &mut R) -> f64 {
    let u: f64 = rng.gen();
    let span = max - min;
    let t = if span.is_finite() {
        min + u * span
    } else {
        min * (1.0 - u) + max * u
    };
    if t >= min && t < max {
        t
    } else {
        min
    }
}

/// In-place, unordered partition. Returns how many rows matched `pred`.
fn partition<F: Fn(usize) -> bool>(rows: &mut [usize], pred: F) -> usize {
    let mut mid = 0;
    for i in 0..rows.len() {
        if pred(rows[i]) {
            rows.swap(i, mid);
            mid += 1;
        }
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(n: usize, width: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, width), |(i, j)| (i * (j + 1)) as f64)
    }

    #[test]
    fn height_limit_is_ceil_log2() {
        assert_eq!(PartitionTree::height_limit(1), 0);
        assert_eq!(PartitionTree::height_limit(2), 1);
        assert_eq!(PartitionTree::height_limit(3), 2);
        assert_eq!(PartitionTree::height_limit(256), 8);
        assert_eq!(PartitionTree::height_limit(257), 9);
    }

    #[test]
    fn empty_subsample_is_rejected() {
        let data = grid(4, 2);
        let mut rng = StdRng::seed_from_u64(1);
        let err = PartitionTree::build(data.view(), &[], &mut rng).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));
    }

    #[test]
    fn out_of_range_row_is_rejected() {
        let data = grid(4, 2);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(PartitionTree::build(data.view(), &[0, 9], &mut rng).is_err());
    }

    #[test]
    fn single_record_is_a_root_leaf() {
        let data = grid(4, 2);
        let mut rng = StdRng::seed_from_u64(1);
        let tree = PartitionTree::build(data.view(), &[2], &mut rng).unwrap();
        assert_eq!(tree.nodes(), &[Node::Leaf { depth: 0, size: 1 }]);
        assert_eq!(tree.path_length(data.row(0)), 0.0);
    }

    #[test]
    fn constant_data_falls_back_to_leaf() {
        let data = Array2::from_elem((16, 3), 7.0);
        let rows: Vec<usize> = (0..16).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let tree = PartitionTree::build(data.view(), &rows, &mut rng).unwrap();
        assert_eq!(tree.nodes(), &[Node::Leaf { depth: 0, size: 16 }]);
        let expected = average_path_length(16);
        assert!((tree.path_length(data.row(0)) - expected).abs() < 1e-12);
    }

    #[test]
    fn leaves_cover_the_subsample_within_height_limit() {
        let data = grid(64, 3);
        let rows: Vec<usize> = (0..64).collect();
        let mut rng = StdRng::seed_from_u64(11);
        let tree = PartitionTree::build(data.view(), &rows, &mut rng).unwrap();

        let mut total = 0;
        for node in tree.nodes() {
            match *node {
                Node::Leaf { depth, size } => {
                    assert!(depth <= tree.max_depth());
                    total += size;
                }
                Node::Split { left, right, .. } => {
                    assert!(tree.node(left).is_some());
                    assert!(tree.node(right).is_some());
                }
            }
        }
        assert_eq!(total, 64);
        assert_eq!(tree.max_depth(), 6);
    }

    #[test]
    fn same_seed_builds_same_tree() {
        let data = grid(32, 4);
        let rows: Vec<usize> = (0..32).collect();
        let a = PartitionTree::build(data.view(), &rows, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = PartitionTree::build(data.view(), &rows, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn path_length_follows_threshold_test() {
        let tree = PartitionTree {
            nodes: vec![
                Node::Split {
                    feature: 1,
                    threshold: 0.5,
                    left: NodeId(1),
                    right: NodeId(2),
                },
                Node::Leaf { depth: 1, size: 1 },
                Node::Leaf { depth: 1, size: 3 },
            ],
            max_depth: 1,
        };
        assert_eq!(tree.path_length(array![9.0, 0.0].view()), 1.0);
        let right = tree.path_length(array![-9.0, 0.5].view());
        assert!((right - (1.0 + average_path_length(3))).abs() < 1e-12);
    }

    #[test]
    fn threshold_stays_in_range_when_spread_overflows() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..1000 {
            let t = draw_threshold(-1.7e308, 1.7e308, &mut rng);
            assert!(t.is_finite() && (-1.7e308..1.7e308).contains(&t));
            let t = draw_threshold(1.0, 1.0 + f64::EPSILON, &mut rng);
            assert!((1.0..1.0 + f64::EPSILON).contains(&t));
        }
    }

    #[test]
    fn extreme_spread_column_builds() {
        let mut data = grid(16, 2);
        data[[0, 0]] = -1.7e308;
        data[[1, 0]] = 1.7e308;
        let rows: Vec<usize> = (0..16).collect();
        let tree = PartitionTree::build(data.view(), &rows, &mut StdRng::seed_from_u64(2)).unwrap();
        let total: usize = tree
            .nodes()
            .iter()
            .map(|n| match *n {
                Node::Leaf { size, .. } => size,
                Node::Split { .. } => 0,
            })
            .sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn partition_splits_by_predicate() {
        let mut rows = vec![5, 1, 4, 2, 3];
        let mid = partition(&mut rows, |r| r < 3);
        assert_eq!(mid, 2);
        let mut left = rows[..mid].to_vec();
        left.sort_unstable();
        assert_eq!(left, vec![1, 2]);
    }
}
