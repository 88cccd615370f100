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

use async_trait::async_trait;
use cohort_core::{CohortResult, CommunityEdge, CommunityNode, EntityNode};
use serde::{Deserialize, Serialize};

/// Name of a materialized clustering projection held by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectionHandle {
    name: String,
}

impl ProjectionHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One row of a clustering stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub entity_uuid: String,
    pub cluster_id: i64,
}

/// Graph operations consumed by the community engine
///
/// Every save is a single-item upsert with no cross-item transaction.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Materialize an undirected view over entities and `RELATES_TO` edges,
    /// weighted by the number of relationship instances per pair
    async fn build_projection(&self, name: &str) -> CohortResult<ProjectionHandle>;

    /// Run clustering against a projection
    async fn stream_clusters(&self, handle: &ProjectionHandle)
        -> CohortResult<Vec<ClusterAssignment>>;

    /// Release a projection
    async fn drop_projection(&self, handle: &ProjectionHandle) -> CohortResult<()>;

    /// Batch fetch; unknown uuids are silently absent from the result
    async fn get_entities_by_uuids(&self, uuids: &[String]) -> CohortResult<Vec<EntityNode>>;

    async fn get_entity(&self, uuid: &str) -> CohortResult<EntityNode>;

    async fn get_community(&self, uuid: &str) -> CohortResult<CommunityNode>;

    async fn get_communities(&self) -> CohortResult<Vec<CommunityNode>>;

    /// Communities with a direct `HAS_MEMBER` edge to the entity
    async fn get_entity_communities(&self, entity_uuid: &str) -> CohortResult<Vec<CommunityNode>>;

    /// One row per (community, neighbor) membership, where the neighbor is
    /// linked to the entity by `RELATES_TO` in either direction
    async fn get_neighbor_communities(&self, entity_uuid: &str)
        -> CohortResult<Vec<CommunityNode>>;

    async fn get_community_members(&self, community_uuid: &str) -> CohortResult<Vec<EntityNode>>;

    async fn save_entity(&self, entity: &EntityNode) -> CohortResult<()>;

    async fn save_community(&self, community: &CommunityNode) -> CohortResult<()>;

    async fn save_community_edge(&self, edge: &CommunityEdge) -> CohortResult<()>;

    /// Detach-delete every community; returns how many were removed
    async fn delete_communities(&self) -> CohortResult<u64>;
}
