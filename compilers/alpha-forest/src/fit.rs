//! CART induction with Gini impurity, one tree per bootstrap sample.

use alpha_protocol::{DecisionTree, TreeNode};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::{Dataset, ForestConfig};

struct Split {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

pub(crate) struct TreeGrower<'a> {
    data: &'a Dataset,
    config: &'a ForestConfig,
    /// Class index of every row.
    targets: Vec<usize>,
    n_classes: usize,
    n_try: usize,
}

impl<'a> TreeGrower<'a> {
    pub(crate) fn new(data: &'a Dataset, config: &'a ForestConfig, classes: &[i32]) -> Self {
        let targets = data
            .labels()
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();
        Self {
            data,
            config,
            targets,
            n_classes: classes.len(),
            n_try: config.max_features.resolve(data.n_features()),
        }
    }

    /// Draws the rows a tree is trained on.
    pub(crate) fn sample(&self, rng: &mut Xoshiro256StarStar) -> Vec<usize> {
        let n = self.data.len();
        if self.config.bootstrap {
            (0..n).map(|_| rng.gen_range(0..n)).collect()
        } else {
            (0..n).collect()
        }
    }

    pub(crate) fn grow(&self, rows: Vec<usize>, rng: &mut Xoshiro256StarStar) -> DecisionTree {
        let placeholder = || TreeNode::Leaf { distribution: Vec::new() };
        let mut nodes = vec![placeholder()];
        let mut pending = vec![(0usize, rows, 0usize)];

        while let Some((slot, rows, depth)) = pending.pop() {
            let counts = self.class_counts(&rows);
            let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
            let depth_left = self.config.max_depth.map_or(true, |max| depth < max);

            let split = if !pure && depth_left && rows.len() >= self.config.min_samples_split {
                self.best_split(&rows, &counts, rng)
            } else {
                None
            };

            let partition = split.map(|split| {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .iter()
                    .partition(|&&r| self.data.rows()[r][split.feature] <= split.threshold);
                (split, left_rows, right_rows)
            });

            match partition {
                // A split that keeps every row on one side would be grown again forever.
                Some((split, left_rows, right_rows))
                    if !left_rows.is_empty() && !right_rows.is_empty() =>
                {
                    let left = nodes.len();
                    nodes.push(placeholder());
                    let right = nodes.len();
                    nodes.push(placeholder());
                    nodes[slot] = TreeNode::Split {
                        feature: split.feature as u32,
                        threshold: split.threshold,
                        left: left as u32,
                        right: right as u32,
                    };
                    pending.push((right, right_rows, depth + 1));
                    pending.push((left, left_rows, depth + 1));
                }
                _ => {
                    let total = rows.len().max(1) as f32;
                    nodes[slot] = TreeNode::Leaf {
                        distribution: counts.iter().map(|&c| c as f32 / total).collect(),
                    };
                }
            }
        }

        DecisionTree { nodes }
    }

    fn class_counts(&self, rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &r in rows {
            counts[self.targets[r]] += 1;
        }
        counts
    }

    /// Examines features in random order until `n_try` non-constant ones
    /// have been tried.
    fn best_split(
        &self,
        rows: &[usize],
        counts: &[usize],
        rng: &mut Xoshiro256StarStar,
    ) -> Option<Split> {
        let mut features: Vec<usize> = (0..self.data.n_features()).collect();
        features.shuffle(rng);

        let mut best: Option<Split> = None;
        let mut tried = 0;
        let mut column: Vec<(f32, usize)> = Vec::with_capacity(rows.len());

        for feature in features {
            if tried >= self.n_try {
                break;
            }
            column.clear();
            column.extend(
                rows.iter()
                    .map(|&r| (self.data.rows()[r][feature], self.targets[r])),
            );
            column.sort_by(|a, b| a.0.total_cmp(&b.0));
            if column.first().map(|c| c.0) == column.last().map(|c| c.0) {
                continue;
            }
            tried += 1;

            if let Some(candidate) = self.scan_feature(feature, &column, counts) {
                if best.as_ref().map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn scan_feature(&self, feature: usize, column: &[(f32, usize)], counts: &[usize]) -> Option<Split> {
        let n = column.len();
        let min_leaf = self.config.min_samples_leaf;
        let mut left = vec![0usize; self.n_classes];
        let mut best: Option<Split> = None;

        for i in 0..n - 1 {
            left[column[i].1] += 1;
            let (value, next) = (column[i].0, column[i + 1].0);
            let n_left = i + 1;
            let n_right = n - n_left;
            if value == next || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let right: Vec<usize> = counts.iter().zip(&left).map(|(t, l)| t - l).collect();
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                // Rounding may land on `next` and a wide gap may overflow;
                // keep the threshold finite and strictly below `next`.
                if !threshold.is_finite() || threshold >= next {
                    threshold = value;
                }
                if !threshold.is_finite() {
                    continue;
                }
                best = Some(Split { feature, threshold, impurity });
            }
        }

        best
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}
