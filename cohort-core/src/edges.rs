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

//! Graph edges

use crate::nodes::{CommunityNode, EntityNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relationship type from a community to one of its entities
pub const HAS_MEMBER: &str = "HAS_MEMBER";

/// Relationship type between two entities (pre-existing input)
pub const RELATES_TO: &str = "RELATES_TO";

/// Directed `HAS_MEMBER` edge from a community to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityEdge {
    pub uuid: String,
    /// Community uuid
    pub source_node_uuid: String,
    /// Entity uuid
    pub target_node_uuid: String,
    /// Inherited from the community
    pub group_id: String,
    pub created_at: DateTime<Utc>,
}

impl CommunityEdge {
    /// Create a membership edge from `community` to `entity`
    pub fn new(community: &CommunityNode, entity: &EntityNode, created_at: DateTime<Utc>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            source_node_uuid: community.uuid.clone(),
            target_node_uuid: entity.uuid.clone(),
            group_id: community.group_id.clone(),
            created_at,
        }
    }
}
