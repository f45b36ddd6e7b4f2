//! Regression trees grown on binned gradients.

use crate::model::histogram::{BinMapper, BinnedMatrix, MISSING_BIN};
use crate::preprocessing::error::PreprocessingError;
use ndarray::ArrayView1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A node of a flattened tree. The root is node 0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        /// Direction taken by NaN.
        default_left: bool,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Build a tree from raw nodes, checking that it is well formed.
    pub fn from_nodes(nodes: Vec<Node>, n_features: usize) -> Result<Self, PreprocessingError> {
        let tree = Self { nodes };
        tree.validate(n_features)?;
        Ok(tree)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Value of the leaf `row` falls into.
    ///
    /// A row goes left iff `row[feature] <= threshold`; NaN follows `default_left`.
    pub fn predict(&self, row: &ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } => {
                    let v = row[*feature];
                    let go_left = if v.is_nan() {
                        *default_left
                    } else {
                        v <= *threshold
                    };
                    idx = if go_left { *left } else { *right };
                }
            }
        }
    }

    /// Children must point forward, which rules out cycles.
    pub fn validate(&self, n_features: usize) -> Result<(), PreprocessingError> {
        if self.nodes.is_empty() {
            return Err(PreprocessingError::InvalidParameter(
                "Tree has no nodes".to_string(),
            ));
        }
        let n = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } if !value.is_finite() => {
                    return Err(PreprocessingError::InvalidParameter(format!(
                        "Leaf {} has non-finite value",
                        idx
                    )));
                }
                Node::Leaf { .. } => {}
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(PreprocessingError::InvalidParameter(format!(
                            "Node {} splits on feature {} of {}",
                            idx, feature, n_features
                        )));
                    }
                    if threshold.is_nan() {
                        return Err(PreprocessingError::InvalidParameter(format!(
                            "Node {} has NaN threshold",
                            idx
                        )));
                    }
                    for &child in [left, right] {
                        if child <= idx || child >= n {
                            return Err(PreprocessingError::InvalidParameter(format!(
                                "Node {} has child index {} out of range",
                                idx, child
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Settings for growing a single tree.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GrowConfig {
    pub max_depth: usize,
    pub reg_lambda: f64,
    pub min_child_weight: f64,
    pub learning_rate: f64,
}

#[derive(Clone, Copy, Debug)]
struct SplitCandidate {
    feature: usize,
    bin: usize,
    default_left: bool,
    gain: f64,
}

#[derive(Clone, Copy, Default)]
struct GradStats {
    g: f64,
    h: f64,
}

impl GradStats {
    fn add(&mut self, g: f64, h: f64) {
        self.g += g;
        self.h += h;
    }

    fn score(&self, lambda: f64) -> f64 {
        self.g * self.g / (self.h + lambda)
    }

    fn weight(&self, lambda: f64) -> f64 {
        -self.g / (self.h + lambda)
    }
}

/// Grows one tree on the given rows and features.
pub(crate) struct TreeGrower<'a> {
    pub binned: &'a BinnedMatrix,
    pub mapper: &'a BinMapper,
    pub grad: &'a [f64],
    pub hess: &'a [f64],
    pub features: &'a [usize],
    pub config: GrowConfig,
}

impl TreeGrower<'_> {
    pub fn grow(&self, rows: Vec<usize>) -> RegressionTree {
        let mut nodes = Vec::new();
        self.grow_node(&mut nodes, rows, 0);
        RegressionTree { nodes }
    }

    fn grow_node(&self, nodes: &mut Vec<Node>, rows: Vec<usize>, depth: usize) -> usize {
        let idx = nodes.len();
        let mut total = GradStats::default();
        for &r in &rows {
            total.add(self.grad[r], self.hess[r]);
        }
        let leaf = Node::Leaf {
            value: self.config.learning_rate * total.weight(self.config.reg_lambda),
        };
        nodes.push(leaf);

        if depth >= self.config.max_depth || rows.len() < 2 {
            return idx;
        }
        let Some(split) = self.best_split(&rows, total) else {
            return idx;
        };

        let column = self.binned.column(split.feature);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows.into_iter().partition(|&r| {
            let bin = column[r];
            if bin == MISSING_BIN {
                split.default_left
            } else {
                usize::from(bin) <= split.bin
            }
        });

        let left = self.grow_node(nodes, left_rows, depth + 1);
        let right = self.grow_node(nodes, right_rows, depth + 1);
        nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: self.mapper.cuts(split.feature)[split.bin],
            default_left: split.default_left,
            left,
            right,
        };
        idx
    }

    /// Best split over all candidate features. Ties go to the lower feature index.
    fn best_split(&self, rows: &[usize], total: GradStats) -> Option<SplitCandidate> {
        let candidates: Vec<Option<SplitCandidate>> = self
            .features
            .par_iter()
            .map(|&f| self.best_split_for_feature(f, rows, total))
            .collect();

        candidates
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, cand| match best {
                Some(b) if b.gain > cand.gain || (b.gain == cand.gain && b.feature < cand.feature) => {
                    Some(b)
                }
                _ => Some(cand),
            })
    }

    fn best_split_for_feature(
        &self,
        feature: usize,
        rows: &[usize],
        total: GradStats,
    ) -> Option<SplitCandidate> {
        let n_bins = self.mapper.n_bins(feature);
        if n_bins < 2 {
            return None;
        }

        let column = self.binned.column(feature);
        let mut hist = vec![GradStats::default(); n_bins];
        let mut missing = GradStats::default();
        for &r in rows {
            let bin = column[r];
            if bin == MISSING_BIN {
                missing.add(self.grad[r], self.hess[r]);
            } else {
                hist[usize::from(bin)].add(self.grad[r], self.hess[r]);
            }
        }

        let lambda = self.config.reg_lambda;
        let parent = total.score(lambda);
        let mut best: Option<SplitCandidate> = None;
        let mut left = GradStats::default();

        for (bin, stats) in hist.iter().enumerate().take(n_bins - 1) {
            left.add(stats.g, stats.h);
            for default_left in [false, true] {
                let mut l = left;
                if default_left {
                    l.add(missing.g, missing.h);
                }
                let r = GradStats {
                    g: total.g - l.g,
                    h: total.h - l.h,
                };
                if l.h < self.config.min_child_weight || r.h < self.config.min_child_weight {
                    continue;
                }
                let gain = 0.5 * (l.score(lambda) + r.score(lambda) - parent);
                if gain > 1e-12 && best.is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        bin,
                        default_left,
                        gain,
                    });
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn leaf(value: f64) -> Node {
        Node::Leaf { value }
    }

    fn stump(default_left: bool) -> RegressionTree {
        RegressionTree::from_nodes(
            vec![
                Node::Split {
                    feature: 0,
                    threshold: 2.0,
                    default_left,
                    left: 1,
                    right: 2,
                },
                leaf(-1.0),
                leaf(1.0),
            ],
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_predict_threshold_is_inclusive() {
        let tree = stump(false);
        assert_eq!(tree.predict(&array![2.0].view()), -1.0);
        assert_eq!(tree.predict(&array![2.5].view()), 1.0);
    }

    #[test]
    fn test_predict_missing_follows_default() {
        assert_eq!(stump(true).predict(&array![f64::NAN].view()), -1.0);
        assert_eq!(stump(false).predict(&array![f64::NAN].view()), 1.0);
    }

    #[test]
    fn test_validate_rejects_bad_children() {
        let nodes = vec![Node::Split {
            feature: 0,
            threshold: 1.0,
            default_left: true,
            left: 1,
            right: 7,
        }];
        assert!(RegressionTree::from_nodes(nodes, 1).is_err());

        let cyclic = vec![
            Node::Split {
                feature: 0,
                threshold: 1.0,
                default_left: true,
                left: 0,
                right: 1,
            },
            leaf(0.0),
        ];
        assert!(RegressionTree::from_nodes(cyclic, 1).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_feature() {
        let nodes = vec![
            Node::Split {
                feature: 3,
                threshold: 1.0,
                default_left: true,
                left: 1,
                right: 2,
            },
            leaf(0.0),
            leaf(0.0),
        ];
        assert!(RegressionTree::from_nodes(nodes, 2).is_err());
        assert!(RegressionTree::from_nodes(vec![], 2).is_err());
    }

    #[test]
    fn test_grower_separates_step_function() {
        let x: Array2<f64> = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [0.0, 0.0, 10.0, 10.0];
        let grad: Vec<f64> = y.iter().map(|t| 0.0 - t).collect();
        let hess = vec![1.0; 4];
        let mapper = BinMapper::fit(&x, 256);
        let binned = mapper.transform(&x);

        let grower = TreeGrower {
            binned: &binned,
            mapper: &mapper,
            grad: &grad,
            hess: &hess,
            features: &[0],
            config: GrowConfig {
                max_depth: 1,
                reg_lambda: 0.0,
                min_child_weight: 1.0,
                learning_rate: 1.0,
            },
        };
        let tree = grower.grow((0..4).collect());

        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(&array![1.5].view()), 0.0);
        assert_eq!(tree.predict(&array![3.5].view()), 10.0);
    }

    #[test]
    fn test_grower_learns_missing_direction() {
        // Missing rows behave like the high group.
        let x: Array2<f64> = array![[1.0], [1.0], [5.0], [f64::NAN]];
        let grad = vec![0.0, 0.0, -10.0, -10.0];
        let hess = vec![1.0; 4];
        let mapper = BinMapper::fit(&x, 256);
        let binned = mapper.transform(&x);

        let grower = TreeGrower {
            binned: &binned,
            mapper: &mapper,
            grad: &grad,
            hess: &hess,
            features: &[0],
            config: GrowConfig {
                max_depth: 1,
                reg_lambda: 0.0,
                min_child_weight: 1.0,
                learning_rate: 1.0,
            },
        };
        let tree = grower.grow((0..4).collect());
        assert_eq!(tree.predict(&array![f64::NAN].view()), 10.0);
        assert_eq!(tree.predict(&array![1.0].view()), 0.0);
    }
}
