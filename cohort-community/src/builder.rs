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

//! Community construction from one cluster of entities

use crate::summarizer::HierarchicalSummarizer;
use chrono::{DateTime, Utc};
use cohort_core::{CohortResult, CommunityEdge, CommunityNode, EntityNode};
use tracing::debug;

/// One `HAS_MEMBER` edge per entity, all stamped with `created_at`
pub fn build_community_edges(
    entities: &[EntityNode],
    community: &CommunityNode,
    created_at: DateTime<Utc>,
) -> Vec<CommunityEdge> {
    entities
        .iter()
        .map(|entity| CommunityEdge::new(community, entity, created_at))
        .collect()
}

/// Summarize and name a cluster; does not persist anything
///
/// The community inherits `group_id` from the first entity. An empty cluster
/// yields `None`.
pub async fn build_community(
    summarizer: &HierarchicalSummarizer,
    entities: &[EntityNode],
) -> CohortResult<Option<(CommunityNode, Vec<CommunityEdge>)>> {
    let Some(founder) = entities.first() else {
        return Ok(None);
    };

    let summaries = entities.iter().map(|e| e.summary.clone()).collect();
    let summary = summarizer.reduce(summaries).await?;
    let name = summarizer.name_from_summary(&summary).await?;

    let now = Utc::now();
    let community = CommunityNode::new(name, founder.group_id.clone(), summary, now);
    let edges = build_community_edges(entities, &community, now);

    debug!(
        community = %community.uuid,
        members = entities.len(),
        "Built community"
    );
    Ok(Some((community, edges)))
}
