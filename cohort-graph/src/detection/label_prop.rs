// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Weighted label propagation
//!
//! Each node adopts the label carrying the most edge weight among its
//! neighbors. Runs in O(E) per sweep.

use super::{renumber, seeded_rng, CommunityDetection};
use crate::view::EntityGraphView;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Label propagation community detection
#[derive(Debug, Clone)]
pub struct LabelPropagation {
    max_iter: usize,
    seed: Option<u64>,
}

impl LabelPropagation {
    pub fn new() -> Self {
        Self {
            max_iter: 100,
            seed: None,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for LabelPropagation {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for LabelPropagation {
    fn detect(&self, graph: &EntityGraphView) -> Vec<u32> {
        let n = graph.node_count();
        if n == 0 {
            return Vec::new();
        }

        let mut labels: Vec<u32> = (0..n as u32).collect();
        let mut rng = seeded_rng(self.seed);

        for _ in 0..self.max_iter {
            let mut changed = false;

            let mut order: Vec<usize> = (0..n).collect();
            order.shuffle(&mut rng);

            for &node in &order {
                let mut label_weights: BTreeMap<u32, f64> = BTreeMap::new();
                for &(j, w) in graph.neighbors(node) {
                    *label_weights.entry(labels[j]).or_default() += w;
                }

                if label_weights.is_empty() {
                    continue;
                }

                let max_weight = label_weights.values().copied().fold(f64::MIN, f64::max);
                let candidates: Vec<u32> = label_weights
                    .iter()
                    .filter(|(_, &w)| (w - max_weight).abs() < 1e-9)
                    .map(|(&label, _)| label)
                    .collect();

                // Keeping the current label on a tie guarantees convergence
                if candidates.contains(&labels[node]) {
                    continue;
                }

                let new_label = if candidates.len() == 1 {
                    candidates[0]
                } else {
                    candidates[rng.gen_range(0..candidates.len())]
                };

                labels[node] = new_label;
                changed = true;
            }

            if !changed {
                break;
            }
        }

        renumber(&labels)
    }

    fn name(&self) -> &'static str {
        "label_propagation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_propagation_basic() {
        // Two disconnected edges
        let view = EntityGraphView::build(["n0", "n1", "n2", "n3"], [("n0", "n1"), ("n2", "n3")]);

        let labels = LabelPropagation::new().with_seed(42).detect(&view);

        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_label_propagation_isolated_node_keeps_own_label() {
        let view = EntityGraphView::build(["a", "b", "lonely"], [("a", "b")]);

        let labels = LabelPropagation::new().with_seed(1).detect(&view);

        assert_eq!(labels[0], labels[1]);
        assert_ne!(labels[2], labels[0]);
    }

    #[test]
    fn test_label_propagation_empty() {
        let view = EntityGraphView::default();
        assert!(LabelPropagation::new().detect(&view).is_empty());
    }
}
