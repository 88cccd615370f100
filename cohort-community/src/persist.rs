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

//! Bulk persistence with independent per-item outcomes

use cohort_core::{CohortResult, CommunityEdge, CommunityNode};
use cohort_graph::GraphStore;
use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

/// Counts of saved and failed items from a bulk write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    pub saved: usize,
    pub failed: usize,
}

impl PersistReport {
    fn record(&mut self, kind: &str, uuid: &str, result: CohortResult<()>) {
        match result {
            Ok(()) => self.saved += 1,
            Err(e) => {
                warn!(kind, uuid, error = %e, "Failed to persist item");
                self.failed += 1;
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Save every community, then every edge
///
/// Items within a wave are dispatched concurrently; one failure does not
/// stop the others.
pub async fn persist_all(
    store: &dyn GraphStore,
    communities: &[CommunityNode],
    edges: &[CommunityEdge],
) -> PersistReport {
    let mut report = PersistReport::default();

    let results = join_all(communities.iter().map(|c| store.save_community(c))).await;
    for (community, result) in communities.iter().zip(results) {
        report.record("community", &community.uuid, result);
    }

    let results = join_all(edges.iter().map(|e| store.save_community_edge(e))).await;
    for (edge, result) in edges.iter().zip(results) {
        report.record("community_edge", &edge.uuid, result);
    }

    report
}
