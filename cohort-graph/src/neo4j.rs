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

//! Neo4j graph store
//!
//! Clustering runs inside the database through the Graph Data Science
//! library: `gds.graph.project` builds the weighted projection,
//! `gds.leiden.stream` yields (node, community) pairs and `gds.graph.drop`
//! releases it.

use crate::store::{ClusterAssignment, GraphStore, ProjectionHandle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cohort_core::{
    CohortError, CohortResult, CommunityEdge, CommunityNode, EntityNode, GraphConfig,
    COMMUNITY_LABEL, ENTITY_LABEL, HAS_MEMBER, RELATES_TO,
};
use neo4rs::{query, ConfigBuilder, Graph, Query, Row};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Cypher text, built from the shared label and relationship names
mod cypher {
    use super::{COMMUNITY_LABEL, ENTITY_LABEL, HAS_MEMBER, RELATES_TO};

    const ENTITY_RETURN: &str = "n.uuid AS uuid, n.name AS name, n.group_id AS group_id, \
         coalesce(n.summary, '') AS summary, n.name_embedding AS name_embedding, \
         toString(n.created_at) AS created_at";

    const COMMUNITY_RETURN: &str = "c.uuid AS uuid, c.name AS name, c.group_id AS group_id, \
         labels(c) AS labels, coalesce(c.summary, '') AS summary, \
         c.name_embedding AS name_embedding, toString(c.created_at) AS created_at";

    pub fn indexes() -> Vec<String> {
        vec![
            format!("CREATE INDEX entity_uuid IF NOT EXISTS FOR (n:{ENTITY_LABEL}) ON (n.uuid)"),
            format!(
                "CREATE INDEX community_uuid IF NOT EXISTS FOR (n:{COMMUNITY_LABEL}) ON (n.uuid)"
            ),
            format!(
                "CREATE INDEX has_member_uuid IF NOT EXISTS FOR ()-[e:{HAS_MEMBER}]-() ON (e.uuid)"
            ),
        ]
    }

    /// Undirected projection weighted by the number of relates-to edges per pair
    pub fn project() -> String {
        format!(
            "CALL gds.graph.project($projection_name, '{ENTITY_LABEL}', {{
                {RELATES_TO}: {{
                    type: '{RELATES_TO}',
                    orientation: 'UNDIRECTED',
                    properties: {{weight: {{property: '*', aggregation: 'COUNT'}}}}
                }}
            }})
            YIELD graphName, nodeCount, relationshipCount
            RETURN graphName, nodeCount, relationshipCount"
        )
    }

    pub const LEIDEN_STREAM: &str =
        "CALL gds.leiden.stream($projection_name, {relationshipWeightProperty: 'weight'})
        YIELD nodeId, communityId
        RETURN gds.util.asNode(nodeId).uuid AS entity_uuid, communityId AS cluster_id";

    pub const DROP_PROJECTION: &str =
        "CALL gds.graph.drop($projection_name) YIELD graphName RETURN graphName";

    pub fn entities_by_uuids() -> String {
        format!("MATCH (n:{ENTITY_LABEL}) WHERE n.uuid IN $uuids RETURN {ENTITY_RETURN}")
    }

    pub fn entity() -> String {
        format!("MATCH (n:{ENTITY_LABEL} {{uuid: $uuid}}) RETURN {ENTITY_RETURN}")
    }

    pub fn community() -> String {
        format!("MATCH (c:{COMMUNITY_LABEL} {{uuid: $uuid}}) RETURN {COMMUNITY_RETURN}")
    }

    pub fn communities() -> String {
        format!(
            "MATCH (c:{COMMUNITY_LABEL}) RETURN {COMMUNITY_RETURN} ORDER BY c.created_at, c.uuid"
        )
    }

    pub fn entity_communities() -> String {
        format!(
            "MATCH (c:{COMMUNITY_LABEL})-[:{HAS_MEMBER}]->(n:{ENTITY_LABEL} {{uuid: $entity_uuid}})
            RETURN {COMMUNITY_RETURN}"
        )
    }

    /// One row per distinct (community, neighbor) pair, self excluded
    pub fn neighbor_communities() -> String {
        format!(
            "MATCH (c:{COMMUNITY_LABEL})-[:{HAS_MEMBER}]->(m:{ENTITY_LABEL})-[:{RELATES_TO}]-(n:{ENTITY_LABEL} {{uuid: $entity_uuid}})
            WHERE m.uuid <> n.uuid
            WITH DISTINCT c, m
            RETURN {COMMUNITY_RETURN}"
        )
    }

    pub fn community_members() -> String {
        format!(
            "MATCH (c:{COMMUNITY_LABEL} {{uuid: $community_uuid}})-[e:{HAS_MEMBER}]->(n:{ENTITY_LABEL})
            WITH n, min(e.created_at) AS joined
            RETURN {ENTITY_RETURN} ORDER BY joined, n.uuid"
        )
    }

    /// Upsert a node; `created_at` is only written when the node is created
    fn save_node(label: &str, var: &str) -> String {
        format!(
            "MERGE ({var}:{label} {{uuid: $uuid}})
            ON CREATE SET {var}.created_at = datetime($created_at)
            SET {var}.name = $name,
                {var}.group_id = $group_id,
                {var}.summary = $summary,
                {var}.name_embedding = CASE WHEN size($name_embedding) = 0
                    THEN {var}.name_embedding ELSE $name_embedding END"
        )
    }

    pub fn save_entity() -> String {
        save_node(ENTITY_LABEL, "n")
    }

    pub fn save_community() -> String {
        save_node(COMMUNITY_LABEL, "c")
    }

    pub fn save_community_edge() -> String {
        format!(
            "MATCH (c:{COMMUNITY_LABEL} {{uuid: $source_uuid}})
            MATCH (n:{ENTITY_LABEL} {{uuid: $target_uuid}})
            MERGE (c)-[e:{HAS_MEMBER} {{uuid: $uuid}}]->(n)
            ON CREATE SET e.created_at = datetime($created_at)
            SET e.group_id = $group_id
            RETURN e.uuid AS uuid"
        )
    }

    pub fn delete_communities() -> String {
        format!("MATCH (c:{COMMUNITY_LABEL}) DETACH DELETE c RETURN count(*) AS deleted")
    }
}

/// [`GraphStore`] backed by Neo4j with the GDS plugin
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
}

fn graph_err(e: impl Display) -> CohortError {
    CohortError::Graph(e.to_string())
}

/// Parse a stored timestamp
///
/// Missing or unparsable values fall back to now with a warning. Saves never
/// overwrite an existing `created_at`, so the fallback is not written back.
fn parse_timestamp(uuid: &str, raw: Option<String>) -> DateTime<Utc> {
    let parsed = raw
        .as_deref()
        .map(|s| s.split('[').next().unwrap_or(s))
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    match parsed {
        Some(dt) => dt,
        None => {
            warn!(uuid, raw = ?raw, "Missing or invalid created_at; using current time");
            Utc::now()
        }
    }
}

fn entity_from_row(row: &Row) -> CohortResult<EntityNode> {
    let uuid: String = row.get("uuid").map_err(graph_err)?;
    let created_at = parse_timestamp(&uuid, row.get("created_at").map_err(graph_err)?);
    Ok(EntityNode {
        name: row.get::<Option<String>>("name").map_err(graph_err)?.unwrap_or_default(),
        group_id: row
            .get::<Option<String>>("group_id")
            .map_err(graph_err)?
            .unwrap_or_default(),
        summary: row.get("summary").map_err(graph_err)?,
        name_embedding: row.get("name_embedding").map_err(graph_err)?,
        created_at,
        uuid,
    })
}

fn community_from_row(row: &Row) -> CohortResult<CommunityNode> {
    let uuid: String = row.get("uuid").map_err(graph_err)?;
    let created_at = parse_timestamp(&uuid, row.get("created_at").map_err(graph_err)?);
    Ok(CommunityNode {
        name: row.get::<Option<String>>("name").map_err(graph_err)?.unwrap_or_default(),
        group_id: row
            .get::<Option<String>>("group_id")
            .map_err(graph_err)?
            .unwrap_or_default(),
        labels: row.get("labels").map_err(graph_err)?,
        summary: row.get("summary").map_err(graph_err)?,
        name_embedding: row.get("name_embedding").map_err(graph_err)?,
        created_at,
        uuid,
    })
}

impl Neo4jGraphStore {
    /// Connect using the graph section of the configuration
    pub async fn connect(config: &GraphConfig) -> CohortResult<Self> {
        let uri = config
            .uri
            .as_deref()
            .ok_or_else(|| CohortError::Config("Neo4j URI is not set".to_string()))?;

        let mut builder = ConfigBuilder::default()
            .uri(uri)
            .user(config.user.as_str())
            .password(config.password.as_str());
        if let Some(db) = config.database.as_deref() {
            builder = builder.db(db);
        }
        let neo4j_config = builder.build().map_err(graph_err)?;

        let graph = Graph::connect(neo4j_config).await.map_err(graph_err)?;
        info!(uri, "Connected to Neo4j");

        let store = Self {
            graph: Arc::new(graph),
        };
        store.init_indexes().await;
        Ok(store)
    }

    async fn init_indexes(&self) {
        for index in cypher::indexes() {
            if let Err(e) = self.graph.run(query(&index)).await {
                warn!("Failed to create index: {}", e);
            }
        }
    }

    async fn fetch(&self, q: Query) -> CohortResult<Vec<Row>> {
        let mut stream = self.graph.execute(q).await.map_err(graph_err)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(graph_err)? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn fetch_communities(&self, q: Query) -> CohortResult<Vec<CommunityNode>> {
        self.fetch(q).await?.iter().map(community_from_row).collect()
    }

    async fn fetch_entities(&self, q: Query) -> CohortResult<Vec<EntityNode>> {
        self.fetch(q).await?.iter().map(entity_from_row).collect()
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn build_projection(&self, name: &str) -> CohortResult<ProjectionHandle> {
        let q = query(&cypher::project()).param("projection_name", name);

        let rows = self.fetch(q).await?;
        if let Some(row) = rows.first() {
            let nodes: i64 = row.get("nodeCount").unwrap_or_default();
            let relationships: i64 = row.get("relationshipCount").unwrap_or_default();
            debug!(projection = name, nodes, relationships, "Built projection");
        }
        Ok(ProjectionHandle::new(name))
    }

    async fn stream_clusters(
        &self,
        handle: &ProjectionHandle,
    ) -> CohortResult<Vec<ClusterAssignment>> {
        let q = query(cypher::LEIDEN_STREAM).param("projection_name", handle.name());

        self.fetch(q)
            .await?
            .iter()
            .map(|row| {
                Ok(ClusterAssignment {
                    entity_uuid: row.get("entity_uuid").map_err(graph_err)?,
                    cluster_id: row.get("cluster_id").map_err(graph_err)?,
                })
            })
            .collect()
    }

    async fn drop_projection(&self, handle: &ProjectionHandle) -> CohortResult<()> {
        let q = query(cypher::DROP_PROJECTION).param("projection_name", handle.name());
        self.fetch(q).await?;
        debug!(projection = handle.name(), "Dropped projection");
        Ok(())
    }

    async fn get_entities_by_uuids(&self, uuids: &[String]) -> CohortResult<Vec<EntityNode>> {
        if uuids.is_empty() {
            return Ok(Vec::new());
        }
        let q = query(&cypher::entities_by_uuids()).param("uuids", uuids.to_vec());
        self.fetch_entities(q).await
    }

    async fn get_entity(&self, uuid: &str) -> CohortResult<EntityNode> {
        let q = query(&cypher::entity()).param("uuid", uuid);
        self.fetch_entities(q)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CohortError::EntityNotFound(uuid.to_string()))
    }

    async fn get_community(&self, uuid: &str) -> CohortResult<CommunityNode> {
        let q = query(&cypher::community()).param("uuid", uuid);
        self.fetch_communities(q)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CohortError::CommunityNotFound(uuid.to_string()))
    }

    async fn get_communities(&self) -> CohortResult<Vec<CommunityNode>> {
        self.fetch_communities(query(&cypher::communities())).await
    }

    async fn get_entity_communities(&self, entity_uuid: &str) -> CohortResult<Vec<CommunityNode>> {
        let q = query(&cypher::entity_communities()).param("entity_uuid", entity_uuid);
        self.fetch_communities(q).await
    }

    async fn get_neighbor_communities(
        &self,
        entity_uuid: &str,
    ) -> CohortResult<Vec<CommunityNode>> {
        let q = query(&cypher::neighbor_communities()).param("entity_uuid", entity_uuid);
        self.fetch_communities(q).await
    }

    async fn get_community_members(&self, community_uuid: &str) -> CohortResult<Vec<EntityNode>> {
        let q = query(&cypher::community_members()).param("community_uuid", community_uuid);
        self.fetch_entities(q).await
    }

    async fn save_entity(&self, entity: &EntityNode) -> CohortResult<()> {
        let q = query(&cypher::save_entity())
            .param("uuid", entity.uuid.as_str())
            .param("name", entity.name.as_str())
            .param("group_id", entity.group_id.as_str())
            .param("summary", entity.summary.as_str())
            .param("created_at", entity.created_at.to_rfc3339())
            .param("name_embedding", entity.name_embedding.clone().unwrap_or_default());

        self.graph.run(q).await.map_err(graph_err)
    }

    async fn save_community(&self, community: &CommunityNode) -> CohortResult<()> {
        let q = query(&cypher::save_community())
            .param("uuid", community.uuid.as_str())
            .param("name", community.name.as_str())
            .param("group_id", community.group_id.as_str())
            .param("summary", community.summary.as_str())
            .param("created_at", community.created_at.to_rfc3339())
            .param(
                "name_embedding",
                community.name_embedding.clone().unwrap_or_default(),
            );

        self.graph.run(q).await.map_err(graph_err)
    }

    async fn save_community_edge(&self, edge: &CommunityEdge) -> CohortResult<()> {
        let q = query(&cypher::save_community_edge())
            .param("uuid", edge.uuid.as_str())
            .param("source_uuid", edge.source_node_uuid.as_str())
            .param("target_uuid", edge.target_node_uuid.as_str())
            .param("group_id", edge.group_id.as_str())
            .param("created_at", edge.created_at.to_rfc3339());

        if self.fetch(q).await?.is_empty() {
            return Err(CohortError::Graph(format!(
                "Cannot link community {} to entity {}: endpoint missing",
                edge.source_node_uuid, edge.target_node_uuid
            )));
        }
        Ok(())
    }

    async fn delete_communities(&self) -> CohortResult<u64> {
        let q = query(&cypher::delete_communities());
        let deleted = match self.fetch(q).await?.first() {
            Some(row) => row.get::<i64>("deleted").map_err(graph_err)?,
            None => 0,
        };
        Ok(deleted.max(0) as u64)
    }
}
