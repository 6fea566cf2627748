//! Multi-class gradient-boosted regression trees.
//!
//! Softmax objective over `num_class` margins. Each boosting round fits one
//! tree per class to the second-order expansion of the multi-class log loss
//! (gradient `p - y`, hessian `2p(1 - p)`), using exact greedy splits and
//! L2-regularised leaf weights.

use crate::error::{LensError, Result};
use crate::features::FeatureMatrix;
use crate::settings::BoosterParams;

const MIN_HESSIAN: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

impl Tree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = self.root;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] < *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a FeatureMatrix,
    grad: &'a [f64],
    hess: &'a [f64],
    params: &'a BoosterParams,
    nodes: Vec<Node>,
}

impl<'a> TreeBuilder<'a> {
    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn leaf(&mut self, g: f64, h: f64) -> usize {
        let value = -g / (h + self.params.lambda) * self.params.learning_rate;
        self.nodes.push(Node::Leaf { value });
        self.nodes.len() - 1
    }

    fn best_split(&self, rows: &[usize], g_total: f64, h_total: f64) -> Option<BestSplit> {
        let parent = self.score(g_total, h_total);
        let mut best: Option<BestSplit> = None;
        let mut sorted = rows.to_vec();

        for feature in 0..self.x.n_cols() {
            sorted.sort_by(|&a, &b| {
                self.x
                    .get(a, feature)
                    .total_cmp(&self.x.get(b, feature))
                    .then(a.cmp(&b))
            });

            let (mut g_left, mut h_left) = (0.0, 0.0);
            for pos in 0..sorted.len() - 1 {
                let r = sorted[pos];
                g_left += self.grad[r];
                h_left += self.hess[r];

                let here = self.x.get(r, feature);
                let next = self.x.get(sorted[pos + 1], feature);
                if here == next {
                    continue;
                }
                let g_right = g_total - g_left;
                let h_right = h_total - h_left;
                if h_left < self.params.min_child_weight || h_right < self.params.min_child_weight {
                    continue;
                }

                let gain = 0.5 * (self.score(g_left, h_left) + self.score(g_right, h_right) - parent);
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (here + next) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }

    fn grow(&mut self, rows: &[usize], depth: usize) -> usize {
        let g: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h: f64 = rows.iter().map(|&r| self.hess[r]).sum();

        if depth >= self.params.max_depth || rows.len() < 2 {
            return self.leaf(g, h);
        }
        let Some(split) = self.best_split(rows, g, h) else {
            return self.leaf(g, h);
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.x.get(r, split.feature) < split.threshold);
        let left = self.grow(&left_rows, depth + 1);
        let right = self.grow(&right_rows, depth + 1);
        self.nodes.push(Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        });
        self.nodes.len() - 1
    }
}

fn fit_tree(x: &FeatureMatrix, grad: &[f64], hess: &[f64], params: &BoosterParams) -> Tree {
    let rows: Vec<usize> = (0..x.n_rows()).collect();
    let mut builder = TreeBuilder {
        x,
        grad,
        hess,
        params,
        nodes: Vec::new(),
    };
    let root = builder.grow(&rows, 0);
    Tree {
        nodes: builder.nodes,
        root,
    }
}

/// Numerically stable softmax, in place.
fn softmax(margins: &mut [f64]) {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for m in margins.iter_mut() {
        *m = (*m - max).exp();
        sum += *m;
    }
    for m in margins.iter_mut() {
        *m /= sum;
    }
}

#[derive(Debug, Clone)]
pub struct Booster {
    num_class: usize,
    n_features: usize,
    /// One entry per round, one tree per class.
    rounds: Vec<Vec<Tree>>,
}

impl Booster {
    pub fn fit(
        x: &FeatureMatrix,
        y: &[usize],
        num_class: usize,
        params: &BoosterParams,
    ) -> Result<Self> {
        if x.n_rows() != y.len() {
            return Err(LensError::Model(format!(
                "{} feature rows but {} labels",
                x.n_rows(),
                y.len()
            )));
        }
        if x.n_rows() == 0 {
            return Err(LensError::Model("no training rows".to_string()));
        }
        if num_class < 2 {
            return Err(LensError::InsufficientClasses(num_class));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= num_class) {
            return Err(LensError::Model(format!(
                "label {bad} out of range for {num_class} classes"
            )));
        }

        let n = x.n_rows();
        let mut margins = vec![0.0; n * num_class];
        let mut probs = vec![0.0; n * num_class];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut rounds = Vec::with_capacity(params.rounds);

        for round in 0..params.rounds {
            probs.copy_from_slice(&margins);
            for row in probs.chunks_mut(num_class) {
                softmax(row);
            }

            let mut trees = Vec::with_capacity(num_class);
            for k in 0..num_class {
                for i in 0..n {
                    let p = probs[i * num_class + k];
                    let target = if y[i] == k { 1.0 } else { 0.0 };
                    grad[i] = p - target;
                    hess[i] = (2.0 * p * (1.0 - p)).max(MIN_HESSIAN);
                }
                let tree = fit_tree(x, &grad, &hess, params);
                for i in 0..n {
                    margins[i * num_class + k] += tree.predict(x.row(i));
                }
                trees.push(tree);
            }
            rounds.push(trees);

            if round % 10 == 0 {
                tracing::debug!(round, loss = log_loss(&margins, y, num_class), "Boosting round");
            }
        }

        tracing::debug!(
            rounds = rounds.len(),
            leaves = rounds.iter().flatten().map(Tree::leaf_count).sum::<usize>(),
            "Booster fitted"
        );
        Ok(Self {
            num_class,
            n_features: x.n_cols(),
            rounds,
        })
    }

    fn margins(&self, row: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.num_class];
        for trees in &self.rounds {
            for (k, tree) in trees.iter().enumerate() {
                out[k] += tree.predict(row);
            }
        }
        out
    }

    /// Class probabilities per row, each row summing to one.
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        if x.n_cols() != self.n_features {
            return Err(LensError::Model(format!(
                "model expects {} features, got {}",
                self.n_features,
                x.n_cols()
            )));
        }
        Ok((0..x.n_rows())
            .map(|i| {
                let mut m = self.margins(x.row(i));
                softmax(&mut m);
                m
            })
            .collect())
    }

    /// Most probable class per row; ties go to the lower code.
    pub fn predict(&self, x: &FeatureMatrix) -> Result<Vec<usize>> {
        Ok(self
            .predict_proba(x)?
            .iter()
            .map(|p| {
                p.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (k, &v)| {
                        if v > best.1 {
                            (k, v)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect())
    }
}

/// Mean multi-class log loss for raw margins.
fn log_loss(margins: &[f64], y: &[usize], num_class: usize) -> f64 {
    let total: f64 = margins
        .chunks(num_class)
        .zip(y)
        .map(|(m, &label)| {
            let mut p = m.to_vec();
            softmax(&mut p);
            -p[label].max(1e-15).ln()
        })
        .sum();
    total / y.len() as f64
}
