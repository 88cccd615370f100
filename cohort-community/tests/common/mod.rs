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

//! Shared mocks for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cohort_community::CommunityEngine;
use cohort_core::{CohortError, CohortResult, CommunityEdge, CommunityNode, EntityNode};
use cohort_graph::{
    ClusterAssignment, GraphStore, LeidenClustering, LeidenConfig, MemoryGraphStore,
    ProjectionHandle,
};
use cohort_llm::{EmbedError, EmbeddingClient, LLMClient, LLMError, LLMResponse, Message, TokenUsage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Deterministic language model
///
/// Merges become "(left+right)" and descriptions become "name:<summary>".
/// A merge that includes `fail_on` returns an API error.
#[derive(Default)]
pub struct MockLLMClient {
    pub pair_calls: AtomicUsize,
    pub name_calls: AtomicUsize,
    pub fail_on: Option<&'static str>,
}

impl MockLLMClient {
    pub fn failing_on(summary: &'static str) -> Self {
        Self {
            fail_on: Some(summary),
            ..Default::default()
        }
    }

    pub fn total_calls(&self) -> usize {
        self.pair_calls.load(Ordering::SeqCst) + self.name_calls.load(Ordering::SeqCst)
    }
}

fn between<'a>(body: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = body.find(open)? + open.len();
    let end = body.find(close)?;
    Some(body[start..end].trim())
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_response(&self, messages: Vec<Message>) -> Result<LLMResponse, LLMError> {
        let body = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let content = if let Some(block) = between(&body, "<SUMMARIES>", "</SUMMARIES>") {
            self.pair_calls.fetch_add(1, Ordering::SeqCst);
            let items: Vec<serde_json::Value> = serde_json::from_str(block)?;
            let parts: Vec<&str> = items
                .iter()
                .map(|i| i["summary"].as_str().unwrap_or_default())
                .collect();
            if let Some(bad) = self.fail_on {
                if parts.contains(&bad) {
                    return Err(LLMError::ApiError(format!("refused to merge {}", bad)));
                }
            }
            serde_json::json!({ "summary": format!("({})", parts.join("+")) }).to_string()
        } else if let Some(block) = between(&body, "<SUMMARY>", "</SUMMARY>") {
            self.name_calls.fetch_add(1, Ordering::SeqCst);
            let summary: String = serde_json::from_str(block)?;
            serde_json::json!({ "description": format!("name:{}", summary) }).to_string()
        } else {
            return Err(LLMError::InvalidResponse("unexpected prompt".to_string()));
        };

        Ok(LLMResponse {
            content,
            usage: TokenUsage::default(),
            model: "mock".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Embeds text as [length, 1.0] and counts calls
#[derive(Default)]
pub struct MockEmbeddingClient {
    pub calls: AtomicUsize,
}

impl MockEmbeddingClient {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![text.len() as f64, 1.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, EmbedError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Memory store wrapper that can fail clustering, corrupt batch fetches or
/// fail projection teardown
pub struct FaultyStore {
    pub inner: MemoryGraphStore,
    pub fail_stream: AtomicBool,
    pub fail_drop: AtomicBool,
    pub drops: AtomicUsize,
    /// Batch fetches leave this entity out
    pub omit_entity: Mutex<Option<String>>,
    /// Batch fetches return this entity twice
    pub repeat_entity: Mutex<Option<String>>,
}

impl FaultyStore {
    pub fn new(inner: MemoryGraphStore) -> Self {
        Self {
            inner,
            fail_stream: AtomicBool::new(false),
            fail_drop: AtomicBool::new(false),
            drops: AtomicUsize::new(0),
            omit_entity: Mutex::new(None),
            repeat_entity: Mutex::new(None),
        }
    }
}

#[async_trait]
impl GraphStore for FaultyStore {
    async fn build_projection(&self, name: &str) -> CohortResult<ProjectionHandle> {
        self.inner.build_projection(name).await
    }

    async fn stream_clusters(
        &self,
        handle: &ProjectionHandle,
    ) -> CohortResult<Vec<ClusterAssignment>> {
        if self.fail_stream.load(Ordering::SeqCst) {
            return Err(CohortError::Graph("leiden procedure failed".to_string()));
        }
        self.inner.stream_clusters(handle).await
    }

    async fn drop_projection(&self, handle: &ProjectionHandle) -> CohortResult<()> {
        self.drops.fetch_add(1, Ordering::SeqCst);
        if self.fail_drop.load(Ordering::SeqCst) {
            return Err(CohortError::Graph("drop failed".to_string()));
        }
        self.inner.drop_projection(handle).await
    }

    async fn get_entities_by_uuids(&self, uuids: &[String]) -> CohortResult<Vec<EntityNode>> {
        let mut entities = self.inner.get_entities_by_uuids(uuids).await?;
        let omit = self.omit_entity.lock().unwrap().clone();
        if let Some(omit) = omit {
            entities.retain(|e| e.uuid != omit);
        }
        let repeat = self.repeat_entity.lock().unwrap().clone();
        if let Some(repeat) = repeat {
            if let Some(entity) = entities.iter().find(|e| e.uuid == repeat).cloned() {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    async fn get_entity(&self, uuid: &str) -> CohortResult<EntityNode> {
        self.inner.get_entity(uuid).await
    }

    async fn get_community(&self, uuid: &str) -> CohortResult<CommunityNode> {
        self.inner.get_community(uuid).await
    }

    async fn get_communities(&self) -> CohortResult<Vec<CommunityNode>> {
        self.inner.get_communities().await
    }

    async fn get_entity_communities(&self, entity_uuid: &str) -> CohortResult<Vec<CommunityNode>> {
        self.inner.get_entity_communities(entity_uuid).await
    }

    async fn get_neighbor_communities(
        &self,
        entity_uuid: &str,
    ) -> CohortResult<Vec<CommunityNode>> {
        self.inner.get_neighbor_communities(entity_uuid).await
    }

    async fn get_community_members(&self, community_uuid: &str) -> CohortResult<Vec<EntityNode>> {
        self.inner.get_community_members(community_uuid).await
    }

    async fn save_entity(&self, entity: &EntityNode) -> CohortResult<()> {
        self.inner.save_entity(entity).await
    }

    async fn save_community(&self, community: &CommunityNode) -> CohortResult<()> {
        self.inner.save_community(community).await
    }

    async fn save_community_edge(&self, edge: &CommunityEdge) -> CohortResult<()> {
        self.inner.save_community_edge(edge).await
    }

    async fn delete_communities(&self) -> CohortResult<u64> {
        self.inner.delete_communities().await
    }
}

/// Memory store with seeded Leiden
pub fn memory_store() -> MemoryGraphStore {
    MemoryGraphStore::with_detector(Arc::new(LeidenClustering::with_config(LeidenConfig {
        seed: Some(42),
        ..Default::default()
    })))
}

pub async fn add_entity(store: &MemoryGraphStore, uuid: &str, group_id: &str, summary: &str) {
    store
        .save_entity(
            &EntityNode::new(uuid.to_uppercase(), group_id)
                .with_uuid(uuid)
                .with_summary(summary),
        )
        .await
        .unwrap();
}

/// Two disconnected triangles: a1-a2-a3 and b1-b2-b3
pub async fn two_triangles(store: &MemoryGraphStore) {
    add_entity(store, "a1", "team-a", "sa1").await;
    add_entity(store, "a2", "team-x", "sa2").await;
    add_entity(store, "a3", "team-x", "sa3").await;
    add_entity(store, "b1", "team-b", "sb1").await;
    add_entity(store, "b2", "team-b", "sb2").await;
    add_entity(store, "b3", "team-b", "sb3").await;

    for (s, t) in [
        ("a1", "a2"),
        ("a2", "a3"),
        ("a3", "a1"),
        ("b1", "b2"),
        ("b2", "b3"),
        ("b3", "b1"),
    ] {
        store.add_relationship(s, t).await.unwrap();
    }
}

/// Save a community and link it to the given members
pub async fn seed_community(
    store: &dyn GraphStore,
    uuid: &str,
    summary: &str,
    members: &[&str],
) -> CommunityNode {
    let community =
        CommunityNode::new(format!("name:{}", summary), "team-a", summary, chrono::Utc::now())
            .with_uuid(uuid);
    store.save_community(&community).await.unwrap();
    for member in members {
        let entity = store.get_entity(member).await.unwrap();
        store
            .save_community_edge(&CommunityEdge::new(&community, &entity, chrono::Utc::now()))
            .await
            .unwrap();
    }
    community
}

pub struct Harness<S> {
    pub store: Arc<S>,
    pub llm: Arc<MockLLMClient>,
    pub embedder: Arc<MockEmbeddingClient>,
    pub engine: CommunityEngine,
}

pub fn harness<S: GraphStore + 'static>(store: S) -> Harness<S> {
    harness_with_llm(store, MockLLMClient::default())
}

pub fn harness_with_llm<S: GraphStore + 'static>(store: S, llm: MockLLMClient) -> Harness<S> {
    let store = Arc::new(store);
    let llm = Arc::new(llm);
    let embedder = Arc::new(MockEmbeddingClient::default());
    let engine = CommunityEngine::new(store.clone(), llm.clone(), embedder.clone());
    Harness {
        store,
        llm,
        embedder,
        engine,
    }
}
