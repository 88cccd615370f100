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

//! In-process community detection over an [`EntityGraphView`]

mod label_prop;
mod leiden;

pub use label_prop::LabelPropagation;
pub use leiden::{LeidenClustering, LeidenConfig};

use crate::view::EntityGraphView;
use cohort_core::{ClusteringAlgorithm, ClusteringConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;

/// A clustering algorithm
///
/// Returns one cluster label per node index, numbered contiguously from 0
/// in order of first appearance.
pub trait CommunityDetection: Send + Sync {
    fn detect(&self, graph: &EntityGraphView) -> Vec<u32>;

    fn name(&self) -> &'static str;
}

/// Build the detector selected by configuration
pub fn from_config(config: &ClusteringConfig) -> Arc<dyn CommunityDetection> {
    match config.algorithm {
        ClusteringAlgorithm::Leiden => Arc::new(LeidenClustering::with_config(LeidenConfig {
            resolution: config.resolution,
            max_iterations: config.max_iterations,
            seed: config.seed,
            ..Default::default()
        })),
        ClusteringAlgorithm::LabelPropagation => {
            let lp = LabelPropagation::new().with_max_iter(config.max_iterations);
            match config.seed {
                Some(seed) => Arc::new(lp.with_seed(seed)),
                None => Arc::new(lp),
            }
        }
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Renumber labels to be contiguous in order of first appearance
fn renumber(labels: &[u32]) -> Vec<u32> {
    let mut mapping: HashMap<u32, u32> = HashMap::new();
    labels
        .iter()
        .map(|&label| {
            let next = mapping.len() as u32;
            *mapping.entry(label).or_insert(next)
        })
        .collect()
}
