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

//! Full rebuild, teardown and clustering lifecycle

mod common;

use cohort_community::{build_community, HierarchicalSummarizer};
use cohort_core::{CohortError, EntityNode, COMMUNITY_LABEL};
use cohort_graph::GraphStore;
use common::*;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;

#[tokio::test]
async fn test_build_communities_from_two_triangles() {
    let store = memory_store();
    two_triangles(&store).await;
    let h = harness(store);

    let (communities, edges) = h.engine.build_communities().await.unwrap();

    assert_eq!(communities.len(), 2);
    assert_eq!(edges.len(), 6);

    let a = communities
        .iter()
        .find(|c| c.summary == "((sa1+sa2)+sa3)")
        .expect("triangle a community");
    assert_eq!(a.name, "name:((sa1+sa2)+sa3)");
    assert_eq!(a.group_id, "team-a");
    assert_eq!(a.labels, vec![COMMUNITY_LABEL.to_string()]);

    let a_edges: Vec<_> = edges
        .iter()
        .filter(|e| e.source_node_uuid == a.uuid)
        .collect();
    assert_eq!(a_edges.len(), 3);
    assert!(a_edges.iter().all(|e| e.created_at == a.created_at));
    assert!(a_edges.iter().all(|e| e.group_id == "team-a"));
    let targets: HashSet<_> = a_edges.iter().map(|e| e.target_node_uuid.as_str()).collect();
    assert_eq!(targets, HashSet::from(["a1", "a2", "a3"]));

    // Building persists nothing and releases the projection
    let stats = h.store.stats().await;
    assert_eq!(stats.communities, 0);
    assert_eq!(stats.community_edges, 0);
    assert_eq!(stats.projections, 0);
}

#[tokio::test]
async fn test_single_entity_cluster_skips_summarization() {
    let store = memory_store();
    add_entity(&store, "solo", "g", "Solo works alone").await;
    let h = harness(store);

    let (communities, edges) = h.engine.build_communities().await.unwrap();

    assert_eq!(communities.len(), 1);
    assert_eq!(edges.len(), 1);
    assert_eq!(communities[0].summary, "Solo works alone");
    assert_eq!(communities[0].name, "name:Solo works alone");
    assert_eq!(h.llm.pair_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.llm.total_calls(), 1);
}

#[tokio::test]
async fn test_build_community_empty_cluster_is_none() {
    let llm = Arc::new(MockLLMClient::default());
    let summarizer = HierarchicalSummarizer::new(llm.clone());

    let built = build_community(&summarizer, &[]).await.unwrap();

    assert!(built.is_none());
    assert_eq!(llm.total_calls(), 0);
}

#[tokio::test]
async fn test_build_community_group_from_first_entity() {
    let llm = Arc::new(MockLLMClient::default());
    let summarizer = HierarchicalSummarizer::new(llm);
    let entities = vec![
        EntityNode::new("B", "second-group").with_summary("b"),
        EntityNode::new("A", "first-group").with_summary("a"),
    ];

    let (community, edges) = build_community(&summarizer, &entities).await.unwrap().unwrap();

    assert_eq!(community.group_id, "second-group");
    assert_eq!(community.summary, "(b+a)");
    assert_eq!(edges[0].target_node_uuid, entities[0].uuid);
    assert_eq!(edges[1].target_node_uuid, entities[1].uuid);
}

#[tokio::test]
async fn test_rebuild_persists_with_embeddings() {
    let store = memory_store();
    two_triangles(&store).await;
    let h = harness(store);

    let report = h.engine.rebuild(true).await.unwrap();

    assert_eq!(report.deleted, 0);
    assert_eq!(report.communities.len(), 2);
    assert_eq!(report.edges, 6);
    assert_eq!(report.persisted.saved, 8);
    assert!(report.persisted.is_complete());
    assert_eq!(h.embedder.calls(), 2);

    let stored = h.store.get_communities().await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|c| c.name_embedding.is_some()));
}

#[tokio::test]
async fn test_reset_then_build_leaves_no_residual_edges() {
    let store = memory_store();
    two_triangles(&store).await;
    let h = harness(store);

    let first = h.engine.rebuild(false).await.unwrap();
    let old: HashSet<String> = first.communities.iter().map(|c| c.uuid.clone()).collect();

    let deleted = h.engine.reset_communities().await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(h.store.stats().await.community_edges, 0);

    let second = h.engine.rebuild(false).await.unwrap();
    assert_eq!(second.communities.len(), 2);

    let edges = h.store.community_edges().await;
    assert_eq!(edges.len(), 6);
    assert!(edges.iter().all(|e| !old.contains(&e.source_node_uuid)));
}

#[tokio::test]
async fn test_rebuild_with_reset_replaces_communities() {
    let store = memory_store();
    two_triangles(&store).await;
    let h = harness(store);

    h.engine.rebuild(false).await.unwrap();
    let report = h.engine.rebuild(true).await.unwrap();

    assert_eq!(report.deleted, 2);
    let stats = h.store.stats().await;
    assert_eq!(stats.communities, 2);
    assert_eq!(stats.community_edges, 6);
}

#[tokio::test]
async fn test_reset_is_idempotent() {
    let h = harness(memory_store());
    assert_eq!(h.engine.reset_communities().await.unwrap(), 0);
    assert_eq!(h.engine.reset_communities().await.unwrap(), 0);
}

#[tokio::test]
async fn test_projection_dropped_when_clustering_fails() {
    let inner = memory_store();
    two_triangles(&inner).await;
    let store = FaultyStore::new(inner);
    store.fail_stream.store(true, Ordering::SeqCst);
    let h = harness(store);

    let err = h.engine.build_communities().await.unwrap_err();

    assert!(matches!(err, CohortError::Graph(_)));
    assert_eq!(h.store.drops.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.inner.stats().await.projections, 0);
}

#[tokio::test]
async fn test_drop_failure_is_not_escalated() {
    let inner = memory_store();
    two_triangles(&inner).await;
    let store = FaultyStore::new(inner);
    store.fail_drop.store(true, Ordering::SeqCst);
    let h = harness(store);

    let (communities, _) = h.engine.build_communities().await.unwrap();

    assert_eq!(communities.len(), 2);
    assert_eq!(h.store.drops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_projection_name_is_configurable() {
    let store = memory_store();
    two_triangles(&store).await;
    let store = Arc::new(store);
    let engine = cohort_community::CommunityEngine::new(
        store.clone(),
        Arc::new(MockLLMClient::default()),
        Arc::new(MockEmbeddingClient::default()),
    )
    .with_projection_name("nightly");

    // A stale projection under the default name does not interfere
    store.build_projection("communities").await.unwrap();
    let (communities, _) = engine.build_communities().await.unwrap();

    assert_eq!(communities.len(), 2);
    assert_eq!(store.stats().await.projections, 1);
}

#[tokio::test]
async fn test_unresolved_cluster_member_fails_build() {
    let inner = memory_store();
    two_triangles(&inner).await;
    let store = FaultyStore::new(inner);
    *store.omit_entity.lock().unwrap() = Some("a2".to_string());
    let h = harness(store);

    let err = h.engine.build_communities().await.unwrap_err();

    match err {
        CohortError::UnresolvedEntities {
            expected, found, ..
        } => {
            assert_eq!(expected, 3);
            assert_eq!(found, 2);
        }
        other => panic!("expected UnresolvedEntities, got {other:?}"),
    }
    assert_eq!(h.store.drops.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.inner.stats().await.projections, 0);
}

#[tokio::test]
async fn test_duplicate_record_from_batch_fetch_fails_build() {
    let inner = memory_store();
    two_triangles(&inner).await;
    let store = FaultyStore::new(inner);
    *store.repeat_entity.lock().unwrap() = Some("b1".to_string());
    let h = harness(store);

    let err = h.engine.build_communities().await.unwrap_err();

    assert!(
        matches!(err, CohortError::DuplicateClusterMember { ref uuid, .. } if uuid == "b1"),
        "unexpected error: {err:?}"
    );
    assert_eq!(h.store.drops.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.inner.stats().await.projections, 0);
}

#[tokio::test]
async fn test_failed_pair_fails_reduce() {
    let summarizer = HierarchicalSummarizer::new(Arc::new(MockLLMClient::failing_on("c")));
    let summaries = ["a", "b", "c", "d"].map(String::from).to_vec();

    // First round pairs (a, c) and (b, d)
    let err = summarizer.reduce(summaries).await.unwrap_err();

    assert!(matches!(err, CohortError::Llm(ref msg) if msg.contains("refused to merge c")));
}

#[tokio::test]
async fn test_failed_pair_fails_build_and_releases_projection() {
    let store = memory_store();
    two_triangles(&store).await;
    let h = harness_with_llm(store, MockLLMClient::failing_on("sb2"));

    let err = h.engine.build_communities().await.unwrap_err();

    assert!(matches!(err, CohortError::Llm(_)));
    let stats = h.store.stats().await;
    assert_eq!(stats.projections, 0);
    assert_eq!(stats.communities, 0);
    assert_eq!(stats.community_edges, 0);
}
