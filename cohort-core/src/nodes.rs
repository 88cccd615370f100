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

//! Graph vertices
//!
//! Entities are owned by the graph store; this engine only reads them and
//! their community membership. Communities are derived vertices created by a
//! full rebuild or by the first incremental assignment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label carried by entity vertices
pub const ENTITY_LABEL: &str = "Entity";

/// Label carried by community vertices
pub const COMMUNITY_LABEL: &str = "Community";

/// An extracted real-world entity with a free-text summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
    /// Stable identity
    pub uuid: String,
    /// Entity name
    pub name: String,
    /// Tenant/partition key
    pub group_id: String,
    /// Free text describing the entity
    #[serde(default)]
    pub summary: String,
    /// Embedding of `name`, if one was generated
    #[serde(default)]
    pub name_embedding: Option<Vec<f64>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl EntityNode {
    /// Create a new entity with a generated uuid
    pub fn new(name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            name: name.into(),
            group_id: group_id.into(),
            summary: String::new(),
            name_embedding: None,
            created_at: Utc::now(),
        }
    }

    /// Use an existing uuid
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }

    /// Set the summary
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }
}

/// A cluster of entities with a rollup summary and a short name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityNode {
    pub uuid: String,
    /// Short descriptive label derived from `summary`
    pub name: String,
    /// Inherited from the founding member; never recomputed
    pub group_id: String,
    pub labels: Vec<String>,
    /// Rollup text over the members' summaries
    pub summary: String,
    /// Embedding of `name`
    #[serde(default)]
    pub name_embedding: Option<Vec<f64>>,
    pub created_at: DateTime<Utc>,
}

impl CommunityNode {
    /// Create a new community tagged with the community label
    pub fn new(
        name: impl Into<String>,
        group_id: impl Into<String>,
        summary: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            name: name.into(),
            group_id: group_id.into(),
            labels: vec![COMMUNITY_LABEL.to_string()],
            summary: summary.into(),
            name_embedding: None,
            created_at,
        }
    }

    /// Use an existing uuid
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = uuid.into();
        self
    }
}
