//! A single least-squares regression tree, grown leaf-wise.
//!
//! Each round the open leaf with the largest loss reduction is split, until
//! the leaf budget is spent or no leaf has a split that keeps
//! `min_child_samples` rows on both sides. Split thresholds sit halfway
//! between adjacent distinct feature values.

use crate::gbm::GbmParams;

/// Gains at or below this are treated as rounding noise.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
enum Node {
  Leaf {
    value: f64,
  },
  Split {
    feature:   usize,
    threshold: f64,
    left:      usize,
    right:     usize,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RegressionTree {
  nodes: Vec<Node>,
}

struct SplitCandidate {
  feature:   usize,
  threshold: f64,
  gain:      f64,
  left:      Vec<usize>,
  right:     Vec<usize>,
}

struct OpenLeaf {
  node: usize,
  best: Option<SplitCandidate>,
}

impl RegressionTree {
  /// Fit a tree whose leaves predict the Newton step `-Σg / (n + λ)` for the
  /// squared-error gradients `gradients` (hessian 1 per row).
  pub(crate) fn fit(x: &[Vec<f64>], gradients: &[f64], params: &GbmParams) -> Self {
    let all: Vec<usize> = (0..x.len().min(gradients.len())).collect();
    let mut nodes = vec![Node::Leaf { value: leaf_value(gradients, &all, params.lambda_l2) }];
    let mut open = vec![OpenLeaf { node: 0, best: best_split(x, gradients, &all, params) }];
    let mut leaves = 1;

    while leaves < params.num_leaves {
      let Some(pos) = open
        .iter()
        .enumerate()
        .filter_map(|(i, leaf)| leaf.best.as_ref().map(|b| (i, b.gain)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
      else {
        break;
      };

      let leaf = open.swap_remove(pos);
      let Some(split) = leaf.best else { break };

      let left = nodes.len();
      nodes.push(Node::Leaf {
        value: leaf_value(gradients, &split.left, params.lambda_l2),
      });
      let right = nodes.len();
      nodes.push(Node::Leaf {
        value: leaf_value(gradients, &split.right, params.lambda_l2),
      });
      nodes[leaf.node] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
      };

      open.push(OpenLeaf {
        node: left,
        best: best_split(x, gradients, &split.left, params),
      });
      open.push(OpenLeaf {
        node: right,
        best: best_split(x, gradients, &split.right, params),
      });
      leaves += 1;
    }

    Self { nodes }
  }

  pub(crate) fn predict(&self, row: &[f64]) -> f64 {
    let mut idx = 0;
    loop {
      match self.nodes[idx] {
        Node::Leaf { value } => return value,
        Node::Split { feature, threshold, left, right } => {
          let v = row.get(feature).copied().unwrap_or(0.0);
          idx = if v <= threshold { left } else { right };
        }
      }
    }
  }

  pub(crate) fn leaf_count(&self) -> usize {
    self
      .nodes
      .iter()
      .filter(|n| matches!(n, Node::Leaf { .. }))
      .count()
  }
}

fn leaf_value(gradients: &[f64], samples: &[usize], lambda: f64) -> f64 {
  let denom = samples.len() as f64 + lambda;
  if denom <= 0.0 {
    return 0.0;
  }
  -samples.iter().map(|&i| gradients[i]).sum::<f64>() / denom
}

fn score(grad_sum: f64, count: usize, lambda: f64) -> f64 {
  let denom = count as f64 + lambda;
  if denom <= 0.0 { 0.0 } else { grad_sum * grad_sum / denom }
}

fn best_split(
  x: &[Vec<f64>],
  gradients: &[f64],
  samples: &[usize],
  params: &GbmParams,
) -> Option<SplitCandidate> {
  let min_child = params.min_child_samples.max(1);
  let n = samples.len();
  if n < 2 * min_child {
    return None;
  }

  let lambda = params.lambda_l2;
  let total: f64 = samples.iter().map(|&i| gradients[i]).sum();
  let parent = score(total, n, lambda);
  let n_features = x[samples[0]].len();

  // (feature, threshold, gain)
  let mut best: Option<(usize, f64, f64)> = None;
  let mut order = samples.to_vec();

  for feature in 0..n_features {
    order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

    let mut left_sum = 0.0;
    for k in 0..n - 1 {
      left_sum += gradients[order[k]];
      let n_left = k + 1;
      let n_right = n - n_left;
      if n_left < min_child || n_right < min_child {
        continue;
      }

      let lo = x[order[k]][feature];
      let hi = x[order[k + 1]][feature];
      if lo >= hi {
        continue;
      }

      let gain = score(left_sum, n_left, lambda) + score(total - left_sum, n_right, lambda)
        - parent;
      if gain > params.min_split_gain.max(MIN_GAIN) && best.is_none_or(|b| gain > b.2) {
        best = Some((feature, lo + (hi - lo) / 2.0, gain));
      }
    }
  }

  let (feature, threshold, gain) = best?;
  let (left, right) = samples
    .iter()
    .partition(|&&i| x[i][feature] <= threshold);

  Some(SplitCandidate { feature, threshold, gain, left, right })
}
