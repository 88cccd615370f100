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

//! Incremental assignment, update and re-aggregation

mod common;

use cohort_core::{CohortError, EntityNode};
use cohort_graph::{GraphStore, MemoryGraphStore};
use common::*;

/// x1..x3 in community X, y1/y2 in Y, z1 in Z, plus a newcomer `n`
async fn neighborhood() -> Harness<MemoryGraphStore> {
    let store = memory_store();
    for uuid in ["x1", "x2", "x3", "y1", "y2", "z1"] {
        add_entity(&store, uuid, "team-a", &format!("s{}", uuid)).await;
    }
    add_entity(&store, "n", "team-n", "newcomer").await;

    seed_community(&store, "X", "sx", &["x1", "x2", "x3"]).await;
    seed_community(&store, "Y", "sy", &["y1", "y2"]).await;
    seed_community(&store, "Z", "sz", &["z1"]).await;

    harness(store)
}

#[tokio::test]
async fn test_direct_membership_wins_over_votes() {
    let h = neighborhood().await;
    // Neighbors vote for Y, but n already belongs to X
    h.store.add_relationship("n", "y1").await.unwrap();
    h.store.add_relationship("n", "y2").await.unwrap();
    let n = h.store.get_entity("n").await.unwrap();
    let x = h.store.get_community("X").await.unwrap();
    h.store
        .save_community_edge(&cohort_core::CommunityEdge::new(&x, &n, chrono::Utc::now()))
        .await
        .unwrap();

    let assignment = h.engine.determine_entity_community(&n).await.unwrap();

    assert_eq!(assignment.community.unwrap().uuid, "X");
    assert!(!assignment.is_new);
}

#[tokio::test]
async fn test_majority_of_neighbors() {
    let h = neighborhood().await;
    h.store.add_relationship("z1", "n").await.unwrap();
    h.store.add_relationship("n", "y1").await.unwrap();
    h.store.add_relationship("y2", "n").await.unwrap();
    let n = h.store.get_entity("n").await.unwrap();

    let assignment = h.engine.determine_entity_community(&n).await.unwrap();

    assert_eq!(assignment.community.unwrap().uuid, "Y");
    assert!(assignment.is_new);
}

#[tokio::test]
async fn test_repeated_relationships_do_not_add_votes() {
    let h = neighborhood().await;
    // Three observations of one Z neighbor vs two distinct Y neighbors
    for _ in 0..3 {
        h.store.add_relationship("n", "z1").await.unwrap();
    }
    h.store.add_relationship("n", "y1").await.unwrap();
    h.store.add_relationship("n", "y2").await.unwrap();
    let n = h.store.get_entity("n").await.unwrap();

    let assignment = h.engine.determine_entity_community(&n).await.unwrap();

    assert_eq!(assignment.community.unwrap().uuid, "Y");
}

#[tokio::test]
async fn test_tie_goes_to_first_counted() {
    let h = neighborhood().await;
    h.store.add_relationship("n", "z1").await.unwrap();
    h.store.add_relationship("n", "x1").await.unwrap();
    let n = h.store.get_entity("n").await.unwrap();

    let assignment = h.engine.determine_entity_community(&n).await.unwrap();

    assert_eq!(assignment.community.unwrap().uuid, "Z");
}

#[tokio::test]
async fn test_no_neighbors_is_unassigned() {
    let h = neighborhood().await;
    let n = h.store.get_entity("n").await.unwrap();

    let assignment = h.engine.determine_entity_community(&n).await.unwrap();

    assert!(assignment.community.is_none());
    assert!(!assignment.is_new);
}

#[tokio::test]
async fn test_update_without_community_writes_nothing() {
    let h = neighborhood().await;
    let n = h.store.get_entity("n").await.unwrap();
    let writes_before = h.store.stats().await.writes;

    let updated = h.engine.update_community(&n).await.unwrap();

    assert!(updated.is_none());
    assert_eq!(h.store.stats().await.writes, writes_before);
    assert_eq!(h.llm.total_calls(), 0);
    assert_eq!(h.embedder.calls(), 0);
}

#[tokio::test]
async fn test_update_new_member_adds_one_edge_and_one_embedding() {
    let h = neighborhood().await;
    h.store.add_relationship("n", "y1").await.unwrap();
    let n = h.store.get_entity("n").await.unwrap();
    let edges_before = h.store.stats().await.community_edges;

    let updated = h.engine.update_community(&n).await.unwrap().unwrap();

    assert_eq!(updated.uuid, "Y");
    assert_eq!(updated.summary, "(newcomer+sy)");
    assert_eq!(updated.name, "name:(newcomer+sy)");
    assert_eq!(updated.group_id, "team-a");
    assert_eq!(h.embedder.calls(), 1);
    assert_eq!(h.llm.pair_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    let edges = h.store.community_edges().await;
    assert_eq!(edges.len(), edges_before + 1);
    let new_edge = edges.last().unwrap();
    assert_eq!(new_edge.source_node_uuid, "Y");
    assert_eq!(new_edge.target_node_uuid, "n");
    assert_eq!(new_edge.group_id, "team-a");

    let stored = h.store.get_community("Y").await.unwrap();
    assert_eq!(stored.summary, "(newcomer+sy)");
    assert_eq!(stored.name_embedding, updated.name_embedding);

    // A second update finds direct membership and adds no edge
    let again = h.engine.update_community(&n).await.unwrap().unwrap();
    assert_eq!(again.summary, "(newcomer+(newcomer+sy))");
    assert_eq!(h.store.stats().await.community_edges, edges_before + 1);
}

#[tokio::test]
async fn test_refresh_reaggregates_all_members() {
    let h = neighborhood().await;
    h.store.add_relationship("n", "y1").await.unwrap();
    let n = h.store.get_entity("n").await.unwrap();
    h.engine.update_community(&n).await.unwrap();

    let refreshed = h.engine.refresh_community("Y").await.unwrap().unwrap();

    // Members in join order: y1, y2, n
    assert_eq!(refreshed.summary, "((sy1+sy2)+newcomer)");
    assert_eq!(refreshed.name, "name:((sy1+sy2)+newcomer)");
    assert_eq!(
        h.store.get_community("Y").await.unwrap().summary,
        "((sy1+sy2)+newcomer)"
    );
}

#[tokio::test]
async fn test_refresh_missing_and_empty_communities() {
    let h = neighborhood().await;
    assert!(matches!(
        h.engine.refresh_community("nope").await,
        Err(CohortError::CommunityNotFound(_))
    ));

    seed_community(h.store.as_ref(), "E", "empty", &[]).await;
    assert!(h.engine.refresh_community("E").await.unwrap().is_none());
    assert_eq!(h.store.get_community("E").await.unwrap().summary, "empty");
}

#[tokio::test]
async fn test_refresh_communities_skips_empty() {
    let h = neighborhood().await;
    seed_community(h.store.as_ref(), "E", "empty", &[]).await;

    let refreshed = h.engine.refresh_communities().await.unwrap();

    assert_eq!(refreshed.len(), 3);
    assert_eq!(h.embedder.calls(), 3);
}

#[tokio::test]
async fn test_add_entity_embeds_saves_and_assigns() {
    let h = neighborhood().await;
    h.store
        .save_entity(&EntityNode::new("Late", "team-a").with_uuid("late"))
        .await
        .unwrap();
    h.store.add_relationship("late", "x1").await.unwrap();

    let entity = EntityNode::new("Late", "team-a")
        .with_uuid("late")
        .with_summary("joined late");
    let outcome = h.engine.add_entity(entity, true).await.unwrap();

    assert!(outcome.entity.name_embedding.is_some());
    assert_eq!(outcome.community.unwrap().uuid, "X");
    assert_eq!(h.embedder.calls(), 2);
    assert_eq!(h.store.get_entity("late").await.unwrap().summary, "joined late");
}

#[tokio::test]
async fn test_add_entity_without_update() {
    let h = neighborhood().await;

    let outcome = h
        .engine
        .add_entity(EntityNode::new("Fresh", "g").with_uuid("fresh"), false)
        .await
        .unwrap();

    assert!(outcome.community.is_none());
    assert_eq!(h.embedder.calls(), 1);
    assert!(h.store.get_entity("fresh").await.is_ok());
    assert_eq!(h.llm.total_calls(), 0);
}
