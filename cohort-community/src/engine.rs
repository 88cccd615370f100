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

//! Community engine
//!
//! Entry points for full rebuilds, teardown, incremental assignment and
//! periodic re-aggregation.
//!
//! Incremental updates take no lock: two updates racing to join the same
//! community both read the pre-update summary and the later save wins.

use crate::assignment::{self, CommunityAssignment};
use crate::builder::{build_community, build_community_edges};
use crate::clustering::ClusteringInvoker;
use crate::persist::{persist_all, PersistReport};
use crate::summarizer::HierarchicalSummarizer;
use chrono::Utc;
use cohort_core::{CohortResult, CommunityEdge, CommunityNode, EntityNode};
use cohort_graph::GraphStore;
use cohort_llm::{EmbeddingClient, LLMClient};
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Default name of the clustering projection
pub const DEFAULT_PROJECTION_NAME: &str = "communities";

/// Result of [`CommunityEngine::rebuild`]
#[derive(Debug, Clone, Serialize)]
pub struct RebuildReport {
    /// Communities removed by the reset, if one ran
    pub deleted: u64,
    pub communities: Vec<CommunityNode>,
    pub edges: usize,
    pub persisted: PersistReport,
}

/// Result of [`CommunityEngine::add_entity`]
#[derive(Debug, Clone, Serialize)]
pub struct AddEntityOutcome {
    pub entity: EntityNode,
    pub community: Option<CommunityNode>,
}

/// Builds and maintains communities over a graph store
pub struct CommunityEngine {
    store: Arc<dyn GraphStore>,
    summarizer: HierarchicalSummarizer,
    embedder: Arc<dyn EmbeddingClient>,
    invoker: ClusteringInvoker,
}

impl CommunityEngine {
    pub fn new(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn LLMClient>,
        embedder: Arc<dyn EmbeddingClient>,
    ) -> Self {
        Self {
            invoker: ClusteringInvoker::new(store.clone(), DEFAULT_PROJECTION_NAME),
            summarizer: HierarchicalSummarizer::new(llm),
            store,
            embedder,
        }
    }

    /// Use a different projection name
    pub fn with_projection_name(mut self, name: impl Into<String>) -> Self {
        self.invoker = ClusteringInvoker::new(self.store.clone(), name);
        self
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    pub fn summarizer(&self) -> &HierarchicalSummarizer {
        &self.summarizer
    }

    /// Cluster the whole graph and build one community per cluster
    ///
    /// Nothing is persisted. The projection is dropped once all builds finish,
    /// and also when clustering or building fails.
    pub async fn build_communities(&self) -> CohortResult<(Vec<CommunityNode>, Vec<CommunityEdge>)> {
        let handle = self.invoker.build_projection().await?;

        let built = async {
            let clusters = self.invoker.get_clusters(&handle).await?;
            try_join_all(
                clusters
                    .iter()
                    .map(|entities| build_community(&self.summarizer, entities)),
            )
            .await
        }
        .await;

        self.invoker.destroy_projection(handle).await;

        let mut communities = Vec::new();
        let mut edges = Vec::new();
        for (community, community_edges) in built?.into_iter().flatten() {
            communities.push(community);
            edges.extend(community_edges);
        }

        info!(
            communities = communities.len(),
            edges = edges.len(),
            "Built communities"
        );
        Ok((communities, edges))
    }

    /// Delete every community and its membership edges
    pub async fn reset_communities(&self) -> CohortResult<u64> {
        let deleted = self.store.delete_communities().await?;
        info!(deleted, "Removed communities");
        Ok(deleted)
    }

    /// Which community the entity belongs to or should join
    pub async fn determine_entity_community(
        &self,
        entity: &EntityNode,
    ) -> CohortResult<CommunityAssignment> {
        assignment::determine_entity_community(self.store.as_ref(), entity).await
    }

    /// Fold one entity into its community
    ///
    /// The new summary merges only the entity's summary with the current
    /// community summary. Returns `None` when the entity has no community.
    pub async fn update_community(&self, entity: &EntityNode) -> CohortResult<Option<CommunityNode>> {
        let CommunityAssignment { community, is_new } =
            self.determine_entity_community(entity).await?;
        let Some(mut community) = community else {
            return Ok(None);
        };

        let summary = self
            .summarizer
            .summarize_pair(&entity.summary, &community.summary)
            .await?;
        let name = self.summarizer.name_from_summary(&summary).await?;
        community.summary = summary;
        community.name = name;

        if is_new {
            let edges =
                build_community_edges(std::slice::from_ref(entity), &community, Utc::now());
            for edge in &edges {
                self.store.save_community_edge(edge).await?;
            }
        }

        community.name_embedding = Some(self.embedder.embed(&community.name).await?);
        self.store.save_community(&community).await?;

        debug!(
            entity = %entity.uuid,
            community = %community.uuid,
            is_new,
            "Updated community"
        );
        Ok(Some(community))
    }

    /// Optionally reset, then build, embed and persist every community
    pub async fn rebuild(&self, reset: bool) -> CohortResult<RebuildReport> {
        let deleted = if reset {
            self.reset_communities().await?
        } else {
            0
        };

        let (mut communities, edges) = self.build_communities().await?;

        let embeddings =
            try_join_all(communities.iter().map(|c| self.embedder.embed(&c.name))).await?;
        for (community, embedding) in communities.iter_mut().zip(embeddings) {
            community.name_embedding = Some(embedding);
        }

        let persisted = persist_all(self.store.as_ref(), &communities, &edges).await;
        info!(
            saved = persisted.saved,
            failed = persisted.failed,
            "Persisted communities"
        );

        Ok(RebuildReport {
            deleted,
            edges: edges.len(),
            communities,
            persisted,
        })
    }

    /// Recompute a community's summary from all of its current members
    ///
    /// Returns `None` and leaves the community untouched when it has no members.
    pub async fn refresh_community(&self, community_uuid: &str) -> CohortResult<Option<CommunityNode>> {
        let mut community = self.store.get_community(community_uuid).await?;
        let members = self.store.get_community_members(community_uuid).await?;
        if members.is_empty() {
            debug!(community = community_uuid, "Community has no members");
            return Ok(None);
        }

        let summary = self
            .summarizer
            .reduce(members.iter().map(|m| m.summary.clone()).collect())
            .await?;
        community.name = self.summarizer.name_from_summary(&summary).await?;
        community.summary = summary;
        community.name_embedding = Some(self.embedder.embed(&community.name).await?);
        self.store.save_community(&community).await?;

        debug!(
            community = community_uuid,
            members = members.len(),
            "Refreshed community"
        );
        Ok(Some(community))
    }

    /// Refresh every community concurrently
    pub async fn refresh_communities(&self) -> CohortResult<Vec<CommunityNode>> {
        let communities = self.store.get_communities().await?;
        let refreshed =
            try_join_all(communities.iter().map(|c| self.refresh_community(&c.uuid))).await?;
        let refreshed: Vec<CommunityNode> = refreshed.into_iter().flatten().collect();

        info!(
            total = communities.len(),
            refreshed = refreshed.len(),
            "Refreshed communities"
        );
        Ok(refreshed)
    }

    /// Register an entity with a name embedding, then optionally assign it
    pub async fn add_entity(
        &self,
        entity: EntityNode,
        update: bool,
    ) -> CohortResult<AddEntityOutcome> {
        let mut entity = entity;
        entity.name_embedding = Some(self.embedder.embed(&entity.name).await?);
        self.store.save_entity(&entity).await?;
        debug!(entity = %entity.uuid, "Saved entity");

        let community = if update {
            self.update_community(&entity).await?
        } else {
            None
        };

        Ok(AddEntityOutcome { entity, community })
    }
}
