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

//! Community detection and maintenance
//!
//! ```text
//! ┌──────────────────┐   uuid groups   ┌──────────────────┐  summaries  ┌────────────────────────┐
//! │ ClusteringInvoker│ ──────────────▶ │ build_community  │ ──────────▶ │ HierarchicalSummarizer │
//! └──────────────────┘                 └──────────────────┘             └────────────────────────┘
//!          │                                    │
//!          ▼                                    ▼
//!   GraphStore projection            CommunityNode + HAS_MEMBER edges
//! ```
//!
//! [`CommunityEngine`] exposes the entry points: `build_communities`,
//! `reset_communities`, `update_community` and `determine_entity_community`,
//! plus `rebuild`, `refresh_community(ies)` and `add_entity` for maintenance.

pub mod assignment;
pub mod builder;
pub mod clustering;
pub mod engine;
pub mod persist;
pub mod summarizer;

pub use assignment::{determine_entity_community, select_by_vote, CommunityAssignment};
pub use builder::{build_community, build_community_edges};
pub use clustering::ClusteringInvoker;
pub use engine::{AddEntityOutcome, CommunityEngine, RebuildReport, DEFAULT_PROJECTION_NAME};
pub use persist::{persist_all, PersistReport};
pub use summarizer::{split_round, HierarchicalSummarizer};
