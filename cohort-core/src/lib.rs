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

//! Cohort Core
//!
//! Shared types for the cohort community engine:
//! - **Nodes**: entity vertices read from the graph and the community
//!   vertices derived from them
//! - **Edges**: `HAS_MEMBER` edges linking a community to its entities
//! - **Errors**: the error taxonomy shared by every crate in the workspace
//! - **Config**: TOML + environment configuration for the store, language
//!   model, embedder and in-process clustering
//!
//! ```text
//! ┌────────────┐  HAS_MEMBER   ┌────────────┐  RELATES_TO  ┌────────────┐
//! │ Community  │ ────────────▶ │   Entity   │ ──────────── │   Entity   │
//! └────────────┘               └────────────┘              └────────────┘
//! ```

pub mod config;
pub mod edges;
pub mod error;
pub mod nodes;

pub use config::{
    ClusteringAlgorithm, ClusteringConfig, CohortConfig, EmbedderConfig, GraphBackend,
    GraphConfig, LLMConfig, LLMProvider,
};
pub use edges::{CommunityEdge, HAS_MEMBER, RELATES_TO};
pub use error::{CohortError, CohortResult};
pub use nodes::{CommunityNode, EntityNode, COMMUNITY_LABEL, ENTITY_LABEL};
