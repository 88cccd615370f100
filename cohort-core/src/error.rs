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

//! Community engine error types

use thiserror::Error;

/// Result type for community operations
pub type CohortResult<T> = Result<T, CohortError>;

/// Errors that can occur while building or maintaining communities
#[derive(Debug, Error)]
pub enum CohortError {
    /// Graph query, clustering invocation or persistence failure
    #[error("Graph error: {0}")]
    Graph(String),

    /// Language-model service failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding service failure
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Hierarchical reduction was asked to reduce zero summaries
    #[error("Cannot reduce an empty list of summaries")]
    EmptyInput,

    /// The clustering step reported the same entity twice in one cluster
    #[error("Entity {uuid} appears more than once in cluster {cluster_id}")]
    DuplicateClusterMember { cluster_id: i64, uuid: String },

    /// Some uuids of a cluster did not resolve to entity records
    #[error("Cluster {cluster_id} resolved {found} of {expected} entities")]
    UnresolvedEntities {
        cluster_id: i64,
        expected: usize,
        found: usize,
    },

    /// Entity not found
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Community not found
    #[error("Community not found: {0}")]
    CommunityNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CohortError {
    fn from(e: serde_json::Error) -> Self {
        CohortError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for CohortError {
    fn from(e: toml::de::Error) -> Self {
        CohortError::Config(e.to_string())
    }
}
