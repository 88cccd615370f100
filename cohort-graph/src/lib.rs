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

//! Graph store capability
//!
//! [`GraphStore`] is everything the community engine asks of the underlying
//! property graph: projection lifecycle, cluster streaming, entity and
//! community lookups, and single-item persistence.
//!
//! Two implementations ship with the crate:
//! - [`Neo4jGraphStore`]: Cypher over Bolt, clustering delegated to the GDS
//!   `gds.leiden.stream` procedure
//! - [`MemoryGraphStore`]: in-process maps with a pluggable
//!   [`CommunityDetection`] algorithm and optional JSON snapshots

pub mod detection;
pub mod memory;
pub mod neo4j;
pub mod store;
pub mod view;

pub use detection::{CommunityDetection, LabelPropagation, LeidenClustering, LeidenConfig};
pub use memory::{MemoryGraphStore, Relationship, StoreStats};
pub use neo4j::Neo4jGraphStore;
pub use store::{ClusterAssignment, GraphStore, ProjectionHandle};
pub use view::EntityGraphView;
