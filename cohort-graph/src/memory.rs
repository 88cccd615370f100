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

//! In-memory graph store
//!
//! Keeps entities, relationships, communities and membership edges in
//! process, runs clustering with a [`CommunityDetection`] implementation,
//! and can snapshot itself to a JSON file. Used for local runs and tests.

use crate::detection::{CommunityDetection, LeidenClustering};
use crate::store::{ClusterAssignment, GraphStore, ProjectionHandle};
use crate::view::EntityGraphView;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cohort_core::{CohortError, CohortResult, CommunityEdge, CommunityNode, EntityNode};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A `RELATES_TO` instance between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_uuid: String,
    pub target_uuid: String,
    pub created_at: DateTime<Utc>,
}

/// Store counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    pub entities: usize,
    pub relationships: usize,
    pub communities: usize,
    pub community_edges: usize,
    pub projections: usize,
    /// Successful saves and deletes since the store was created
    pub writes: u64,
}

#[derive(Serialize, Deserialize, Default)]
struct GraphSnapshot {
    entities: Vec<EntityNode>,
    relationships: Vec<Relationship>,
    communities: Vec<CommunityNode>,
    community_edges: Vec<CommunityEdge>,
}

/// In-memory [`GraphStore`]
pub struct MemoryGraphStore {
    entities: RwLock<BTreeMap<String, EntityNode>>,
    relationships: RwLock<Vec<Relationship>>,
    communities: RwLock<BTreeMap<String, CommunityNode>>,
    /// Membership edges in insertion order
    community_edges: RwLock<Vec<CommunityEdge>>,
    projections: DashMap<String, EntityGraphView>,
    detector: Arc<dyn CommunityDetection>,
    persist_path: Option<PathBuf>,
    writes: AtomicU64,
}

impl MemoryGraphStore {
    /// Create an empty store clustering with default Leiden
    pub fn new() -> Self {
        Self::with_detector(Arc::new(LeidenClustering::new()))
    }

    /// Create an empty store with a specific clustering algorithm
    pub fn with_detector(detector: Arc<dyn CommunityDetection>) -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            relationships: RwLock::new(Vec::new()),
            communities: RwLock::new(BTreeMap::new()),
            community_edges: RwLock::new(Vec::new()),
            projections: DashMap::new(),
            detector,
            persist_path: None,
            writes: AtomicU64::new(0),
        }
    }

    /// Load from (or later save to) a JSON snapshot
    ///
    /// A missing file yields an empty store bound to `path`.
    pub fn with_persistence(
        path: impl AsRef<Path>,
        detector: Arc<dyn CommunityDetection>,
    ) -> CohortResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self::with_detector(detector);

        if path.exists() {
            let file = File::open(&path)?;
            let snapshot: GraphSnapshot = serde_json::from_reader(BufReader::new(file))?;
            info!(
                path = %path.display(),
                entities = snapshot.entities.len(),
                communities = snapshot.communities.len(),
                "Loaded graph snapshot"
            );

            store.entities = RwLock::new(
                snapshot
                    .entities
                    .into_iter()
                    .map(|e| (e.uuid.clone(), e))
                    .collect(),
            );
            store.relationships = RwLock::new(snapshot.relationships);
            store.communities = RwLock::new(
                snapshot
                    .communities
                    .into_iter()
                    .map(|c| (c.uuid.clone(), c))
                    .collect(),
            );
            store.community_edges = RwLock::new(snapshot.community_edges);
        }

        store.persist_path = Some(path);
        Ok(store)
    }

    /// Write the snapshot file (temp file + rename); no-op without a path
    pub async fn save_to_disk(&self) -> CohortResult<()> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }

        let snapshot = GraphSnapshot {
            entities: self.entities.read().await.values().cloned().collect(),
            relationships: self.relationships.read().await.clone(),
            communities: self.communities.read().await.values().cloned().collect(),
            community_edges: self.community_edges.read().await.clone(),
        };

        let temp_path = path.with_extension("tmp");
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;
        std::fs::rename(&temp_path, path)?;

        debug!(path = %path.display(), "Saved graph snapshot");
        Ok(())
    }

    /// Record a `RELATES_TO` instance between two existing entities
    pub async fn add_relationship(&self, source_uuid: &str, target_uuid: &str) -> CohortResult<()> {
        {
            let entities = self.entities.read().await;
            for uuid in [source_uuid, target_uuid] {
                if !entities.contains_key(uuid) {
                    return Err(CohortError::EntityNotFound(uuid.to_string()));
                }
            }
        }

        self.relationships.write().await.push(Relationship {
            source_uuid: source_uuid.to_string(),
            target_uuid: target_uuid.to_string(),
            created_at: Utc::now(),
        });
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub async fn stats(&self) -> StoreStats {
        StoreStats {
            entities: self.entities.read().await.len(),
            relationships: self.relationships.read().await.len(),
            communities: self.communities.read().await.len(),
            community_edges: self.community_edges.read().await.len(),
            projections: self.projections.len(),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }

    /// All membership edges, in insertion order
    pub async fn community_edges(&self) -> Vec<CommunityEdge> {
        self.community_edges.read().await.clone()
    }

    async fn communities_with_member(&self, entity_uuid: &str) -> Vec<CommunityNode> {
        let communities = self.communities.read().await;
        self.community_edges
            .read()
            .await
            .iter()
            .filter(|e| e.target_node_uuid == entity_uuid)
            .filter_map(|e| communities.get(&e.source_node_uuid).cloned())
            .collect()
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn build_projection(&self, name: &str) -> CohortResult<ProjectionHandle> {
        let view = {
            let entities = self.entities.read().await;
            let relationships = self.relationships.read().await;
            EntityGraphView::build(
                entities.keys().map(String::as_str),
                relationships
                    .iter()
                    .map(|r| (r.source_uuid.as_str(), r.target_uuid.as_str())),
            )
        };

        let nodes = view.node_count();
        match self.projections.entry(name.to_string()) {
            Entry::Occupied(_) => {
                return Err(CohortError::Graph(format!(
                    "Projection already exists: {}",
                    name
                )))
            }
            Entry::Vacant(slot) => {
                slot.insert(view);
            }
        }

        debug!(projection = name, nodes, "Built projection");
        Ok(ProjectionHandle::new(name))
    }

    async fn stream_clusters(
        &self,
        handle: &ProjectionHandle,
    ) -> CohortResult<Vec<ClusterAssignment>> {
        let view = self
            .projections
            .get(handle.name())
            .ok_or_else(|| CohortError::Graph(format!("No such projection: {}", handle.name())))?;

        let labels = self.detector.detect(&view);
        debug!(
            projection = handle.name(),
            algorithm = self.detector.name(),
            "Streamed clusters"
        );

        Ok(labels
            .into_iter()
            .enumerate()
            .map(|(idx, label)| ClusterAssignment {
                entity_uuid: view.uuid(idx).to_string(),
                cluster_id: label as i64,
            })
            .collect())
    }

    async fn drop_projection(&self, handle: &ProjectionHandle) -> CohortResult<()> {
        self.projections
            .remove(handle.name())
            .map(|_| ())
            .ok_or_else(|| CohortError::Graph(format!("No such projection: {}", handle.name())))
    }

    async fn get_entities_by_uuids(&self, uuids: &[String]) -> CohortResult<Vec<EntityNode>> {
        let entities = self.entities.read().await;
        Ok(uuids.iter().filter_map(|u| entities.get(u).cloned()).collect())
    }

    async fn get_entity(&self, uuid: &str) -> CohortResult<EntityNode> {
        self.entities
            .read()
            .await
            .get(uuid)
            .cloned()
            .ok_or_else(|| CohortError::EntityNotFound(uuid.to_string()))
    }

    async fn get_community(&self, uuid: &str) -> CohortResult<CommunityNode> {
        self.communities
            .read()
            .await
            .get(uuid)
            .cloned()
            .ok_or_else(|| CohortError::CommunityNotFound(uuid.to_string()))
    }

    async fn get_communities(&self) -> CohortResult<Vec<CommunityNode>> {
        Ok(self.communities.read().await.values().cloned().collect())
    }

    async fn get_entity_communities(&self, entity_uuid: &str) -> CohortResult<Vec<CommunityNode>> {
        Ok(self.communities_with_member(entity_uuid).await)
    }

    async fn get_neighbor_communities(
        &self,
        entity_uuid: &str,
    ) -> CohortResult<Vec<CommunityNode>> {
        let neighbors: Vec<String> = {
            let relationships = self.relationships.read().await;
            let mut seen = HashSet::new();
            relationships
                .iter()
                .filter_map(|r| {
                    if r.source_uuid == entity_uuid {
                        Some(r.target_uuid.clone())
                    } else if r.target_uuid == entity_uuid {
                        Some(r.source_uuid.clone())
                    } else {
                        None
                    }
                })
                .filter(|n| n != entity_uuid && seen.insert(n.clone()))
                .collect()
        };

        let mut rows = Vec::new();
        let mut seen_pairs = HashSet::new();
        for neighbor in &neighbors {
            for community in self.communities_with_member(neighbor).await {
                if seen_pairs.insert((community.uuid.clone(), neighbor.clone())) {
                    rows.push(community);
                }
            }
        }
        Ok(rows)
    }

    async fn get_community_members(&self, community_uuid: &str) -> CohortResult<Vec<EntityNode>> {
        let entities = self.entities.read().await;
        let mut seen = HashSet::new();
        Ok(self
            .community_edges
            .read()
            .await
            .iter()
            .filter(|e| e.source_node_uuid == community_uuid)
            .filter(|e| seen.insert(e.target_node_uuid.clone()))
            .filter_map(|e| entities.get(&e.target_node_uuid).cloned())
            .collect())
    }

    async fn save_entity(&self, entity: &EntityNode) -> CohortResult<()> {
        let mut entities = self.entities.write().await;
        let mut stored = entity.clone();
        if let Some(existing) = entities.get(&entity.uuid) {
            stored.created_at = existing.created_at;
        }
        entities.insert(stored.uuid.clone(), stored);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn save_community(&self, community: &CommunityNode) -> CohortResult<()> {
        let mut communities = self.communities.write().await;
        let mut stored = community.clone();
        if let Some(existing) = communities.get(&community.uuid) {
            stored.created_at = existing.created_at;
        }
        communities.insert(stored.uuid.clone(), stored);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn save_community_edge(&self, edge: &CommunityEdge) -> CohortResult<()> {
        if !self
            .communities
            .read()
            .await
            .contains_key(&edge.source_node_uuid)
        {
            return Err(CohortError::CommunityNotFound(edge.source_node_uuid.clone()));
        }
        if !self
            .entities
            .read()
            .await
            .contains_key(&edge.target_node_uuid)
        {
            return Err(CohortError::EntityNotFound(edge.target_node_uuid.clone()));
        }

        let mut edges = self.community_edges.write().await;
        match edges.iter_mut().find(|e| e.uuid == edge.uuid) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = edge.clone();
                existing.created_at = created_at;
            }
            None => edges.push(edge.clone()),
        }
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete_communities(&self) -> CohortResult<u64> {
        let mut communities = self.communities.write().await;
        let mut edges = self.community_edges.write().await;

        let deleted = communities.len() as u64;
        edges.retain(|e| !communities.contains_key(&e.source_node_uuid));
        communities.clear();

        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(deleted)
    }
}
