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

//! Entity to community assignment

use cohort_core::{CohortResult, CommunityNode, EntityNode};
use cohort_graph::GraphStore;
use serde::Serialize;
use tracing::debug;

/// Outcome of [`determine_entity_community`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityAssignment {
    pub community: Option<CommunityNode>,
    /// True when the entity is joining `community` for the first time
    pub is_new: bool,
}

impl CommunityAssignment {
    pub fn unassigned() -> Self {
        Self {
            community: None,
            is_new: false,
        }
    }
}

/// Pick the community with the most votes (one row per vote)
///
/// Counts are tallied in row order; a later community only takes the lead
/// with a strictly greater count.
pub fn select_by_vote(rows: Vec<CommunityNode>) -> Option<CommunityNode> {
    let mut tally: Vec<(String, usize)> = Vec::new();
    for row in &rows {
        match tally.iter_mut().find(|(uuid, _)| *uuid == row.uuid) {
            Some((_, count)) => *count += 1,
            None => tally.push((row.uuid.clone(), 1)),
        }
    }

    let mut leader: Option<&str> = None;
    let mut max_count = 0;
    for (uuid, count) in &tally {
        if *count > max_count {
            leader = Some(uuid.as_str());
            max_count = *count;
        }
    }

    let leader = leader?.to_string();
    rows.into_iter().find(|c| c.uuid == leader)
}

/// Decide which community, if any, an entity belongs to
pub async fn determine_entity_community(
    store: &dyn GraphStore,
    entity: &EntityNode,
) -> CohortResult<CommunityAssignment> {
    if let Some(existing) = store
        .get_entity_communities(&entity.uuid)
        .await?
        .into_iter()
        .next()
    {
        debug!(entity = %entity.uuid, community = %existing.uuid, "Entity already assigned");
        return Ok(CommunityAssignment {
            community: Some(existing),
            is_new: false,
        });
    }

    let rows = store.get_neighbor_communities(&entity.uuid).await?;
    let votes = rows.len();
    match select_by_vote(rows) {
        Some(community) => {
            debug!(
                entity = %entity.uuid,
                community = %community.uuid,
                votes,
                "Entity joins neighbor community"
            );
            Ok(CommunityAssignment {
                community: Some(community),
                is_new: true,
            })
        }
        None => {
            debug!(entity = %entity.uuid, "No neighboring community");
            Ok(CommunityAssignment::unassigned())
        }
    }
}
