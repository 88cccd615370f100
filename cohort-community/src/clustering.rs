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

//! Clustering invocation against the graph store

use cohort_core::{CohortError, CohortResult, EntityNode};
use cohort_graph::{ClusterAssignment, GraphStore, ProjectionHandle};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Drives the projection lifecycle and turns a cluster stream into
/// groups of entity records
#[derive(Clone)]
pub struct ClusteringInvoker {
    store: Arc<dyn GraphStore>,
    projection_name: String,
}

/// Group a cluster stream by cluster id
///
/// Member order follows the stream. An entity reported twice is rejected.
pub fn group_assignments(
    assignments: Vec<ClusterAssignment>,
) -> CohortResult<BTreeMap<i64, Vec<String>>> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut groups: BTreeMap<i64, Vec<String>> = BTreeMap::new();

    for assignment in assignments {
        if !seen.insert(assignment.entity_uuid.clone()) {
            return Err(CohortError::DuplicateClusterMember {
                cluster_id: assignment.cluster_id,
                uuid: assignment.entity_uuid,
            });
        }
        groups
            .entry(assignment.cluster_id)
            .or_default()
            .push(assignment.entity_uuid);
    }

    Ok(groups)
}

impl ClusteringInvoker {
    pub fn new(store: Arc<dyn GraphStore>, projection_name: impl Into<String>) -> Self {
        Self {
            store,
            projection_name: projection_name.into(),
        }
    }

    pub fn projection_name(&self) -> &str {
        &self.projection_name
    }

    /// Materialize the weighted entity projection
    ///
    /// Every handle returned here must be passed to [`destroy_projection`](Self::destroy_projection).
    pub async fn build_projection(&self) -> CohortResult<ProjectionHandle> {
        let handle = self.store.build_projection(&self.projection_name).await?;
        debug!(projection = handle.name(), "Projection built");
        Ok(handle)
    }

    /// Run clustering and resolve every cluster to entity records
    pub async fn get_clusters(&self, handle: &ProjectionHandle) -> CohortResult<Vec<Vec<EntityNode>>> {
        let assignments = self.store.stream_clusters(handle).await?;
        let groups = group_assignments(assignments)?;
        info!(
            projection = handle.name(),
            clusters = groups.len(),
            "Retrieved clusters"
        );

        try_join_all(
            groups
                .into_iter()
                .map(|(cluster_id, uuids)| self.resolve_cluster(cluster_id, uuids)),
        )
        .await
    }

    /// Release the projection; failures are logged and swallowed
    pub async fn destroy_projection(&self, handle: ProjectionHandle) {
        match self.store.drop_projection(&handle).await {
            Ok(()) => debug!(projection = handle.name(), "Projection dropped"),
            Err(e) => warn!(
                projection = handle.name(),
                error = %e,
                "Failed to drop projection; it may need manual cleanup"
            ),
        }
    }

    async fn resolve_cluster(
        &self,
        cluster_id: i64,
        uuids: Vec<String>,
    ) -> CohortResult<Vec<EntityNode>> {
        let entities = self.store.get_entities_by_uuids(&uuids).await?;

        let requested: HashSet<&str> = uuids.iter().map(String::as_str).collect();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entity in &entities {
            *counts.entry(entity.uuid.as_str()).or_default() += 1;
        }
        if let Some((uuid, _)) = counts.iter().find(|(_, &n)| n > 1) {
            return Err(CohortError::DuplicateClusterMember {
                cluster_id,
                uuid: uuid.to_string(),
            });
        }

        let found = counts.keys().filter(|u| requested.contains(*u)).count();
        if found != uuids.len() || entities.len() != uuids.len() {
            return Err(CohortError::UnresolvedEntities {
                cluster_id,
                expected: uuids.len(),
                found,
            });
        }

        Ok(entities)
    }
}
