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

//! Weighted, undirected snapshot of the entity graph

use std::collections::{BTreeMap, HashMap};

/// Entity graph projection used by in-process clustering
///
/// Nodes are addressed by dense indices in insertion order. Parallel
/// relationships between the same pair collapse into one edge whose weight
/// is the instance count; direction and self-loops are ignored.
#[derive(Debug, Clone, Default)]
pub struct EntityGraphView {
    uuids: Vec<String>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

impl EntityGraphView {
    /// Build a view from node uuids and relationship endpoints
    ///
    /// Relationships whose endpoints are not among `nodes` are skipped.
    pub fn build<'a, N, R>(nodes: N, relationships: R) -> Self
    where
        N: IntoIterator<Item = &'a str>,
        R: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut uuids = Vec::new();
        let mut index = HashMap::new();
        for uuid in nodes {
            if !index.contains_key(uuid) {
                index.insert(uuid.to_string(), uuids.len());
                uuids.push(uuid.to_string());
            }
        }

        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (source, target) in relationships {
            let (Some(&a), Some(&b)) = (index.get(source), index.get(target)) else {
                continue;
            };
            if a == b {
                continue;
            }
            *weights.entry((a.min(b), a.max(b))).or_default() += 1.0;
        }

        let mut adjacency = vec![Vec::new(); uuids.len()];
        for ((a, b), weight) in weights {
            adjacency[a].push((b, weight));
            adjacency[b].push((a, weight));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_by_key(|(j, _)| *j);
        }

        Self { uuids, adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.uuids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uuids.is_empty()
    }

    pub fn uuid(&self, idx: usize) -> &str {
        &self.uuids[idx]
    }

    /// Neighbors of `idx` with edge weights, sorted by index
    pub fn neighbors(&self, idx: usize) -> &[(usize, f64)] {
        &self.adjacency[idx]
    }

    /// Weighted degree
    pub fn degree(&self, idx: usize) -> f64 {
        self.adjacency[idx].iter().map(|(_, w)| w).sum()
    }

    /// Sum of all edge weights (each undirected edge counted once)
    pub fn total_weight(&self) -> f64 {
        (0..self.node_count()).map(|i| self.degree(i)).sum::<f64>() / 2.0
    }

}
